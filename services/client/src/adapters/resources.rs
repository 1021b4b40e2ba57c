//! services/client/src/adapters/resources.rs
//!
//! CRUD endpoints of the storybook backend: stories, chapters, illustrations,
//! PDFs and user favorites. Every call here is authenticated.

use bytes::Bytes;
use reqwest::Method;
use storybook_core::ports::PortResult;

use super::api_client::HttpApiClient;
use super::records::{
    ChapterResponse, ChapterRecord, ChapterUpdate, ChaptersResponse, Dashboard,
    FavoritesResponse, IllustrationResponse, IllustrationRecord, IllustrationsResponse,
    NewChapter, NewStory, PdfResponse, PdfRecord, PdfRequestBody, PdfsResponse, StoryResponse,
    StoryPage, StoryRecord, StoryUpdate,
};

/// Stand-in body type for requests sent without one.
type NoBody = ();

impl HttpApiClient {
    //=====================================================================================
    // Stories
    //=====================================================================================

    pub async fn create_story(&self, story: &NewStory) -> PortResult<StoryRecord> {
        let response: StoryResponse = self.send_json(Method::POST, "/stories", Some(story)).await?;
        Ok(response.into_inner())
    }

    pub async fn list_stories(&self, page: u32, limit: u32) -> PortResult<StoryPage> {
        self.get_json(&format!("/stories?page={}&limit={}", page, limit))
            .await
    }

    pub async fn get_story(&self, story_id: &str) -> PortResult<StoryRecord> {
        let response: StoryResponse = self.get_json(&format!("/stories/{}", story_id)).await?;
        Ok(response.into_inner())
    }

    pub async fn update_story(&self, story_id: &str, update: &StoryUpdate) -> PortResult<StoryRecord> {
        let response: StoryResponse = self
            .send_json(Method::PUT, &format!("/stories/{}", story_id), Some(update))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn delete_story(&self, story_id: &str) -> PortResult<()> {
        self.send_empty(Method::DELETE, &format!("/stories/{}", story_id))
            .await
    }

    pub async fn list_public_stories(&self, page: u32, limit: u32) -> PortResult<StoryPage> {
        self.get_json(&format!("/stories/public?page={}&limit={}", page, limit))
            .await
    }

    pub async fn toggle_story_visibility(&self, story_id: &str) -> PortResult<StoryRecord> {
        let response: StoryResponse = self
            .send_json::<NoBody, _>(
                Method::PATCH,
                &format!("/stories/{}/toggle-visibility", story_id),
                None,
            )
            .await?;
        Ok(response.into_inner())
    }

    //=====================================================================================
    // Chapters
    //=====================================================================================

    pub async fn create_chapter(&self, chapter: &NewChapter) -> PortResult<ChapterRecord> {
        let response: ChapterResponse = self
            .send_json(Method::POST, "/chapters", Some(chapter))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn list_chapters(&self, story_id: &str) -> PortResult<Vec<ChapterRecord>> {
        let response: ChaptersResponse = self
            .get_json(&format!("/chapters/story/{}", story_id))
            .await?;
        let mut chapters = response.into_inner();
        chapters.sort_by_key(|c| c.chapter_number);
        Ok(chapters)
    }

    pub async fn get_chapter(&self, chapter_id: &str) -> PortResult<ChapterRecord> {
        let response: ChapterResponse = self.get_json(&format!("/chapters/{}", chapter_id)).await?;
        Ok(response.into_inner())
    }

    pub async fn update_chapter(
        &self,
        chapter_id: &str,
        update: &ChapterUpdate,
    ) -> PortResult<ChapterRecord> {
        let response: ChapterResponse = self
            .send_json(Method::PUT, &format!("/chapters/{}", chapter_id), Some(update))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn delete_chapter(&self, chapter_id: &str) -> PortResult<()> {
        self.send_empty(Method::DELETE, &format!("/chapters/{}", chapter_id))
            .await
    }

    //=====================================================================================
    // Illustrations
    //=====================================================================================

    pub async fn list_illustrations(&self, story_id: &str) -> PortResult<Vec<IllustrationRecord>> {
        let response: IllustrationsResponse = self
            .get_json(&format!("/illustrations/story/{}", story_id))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn get_illustration(&self, illustration_id: &str) -> PortResult<IllustrationRecord> {
        let response: IllustrationResponse = self
            .get_json(&format!("/illustrations/{}", illustration_id))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn regenerate_illustration(
        &self,
        illustration_id: &str,
    ) -> PortResult<IllustrationRecord> {
        let response: IllustrationResponse = self
            .send_json::<NoBody, _>(
                Method::POST,
                &format!("/illustrations/regenerate/{}", illustration_id),
                None,
            )
            .await?;
        Ok(response.into_inner())
    }

    pub async fn delete_illustration(&self, illustration_id: &str) -> PortResult<()> {
        self.send_empty(Method::DELETE, &format!("/illustrations/{}", illustration_id))
            .await
    }

    //=====================================================================================
    // PDFs
    //=====================================================================================

    pub async fn generate_story_pdf(&self, story_id: &str) -> PortResult<PdfRecord> {
        let response: PdfResponse = self
            .send_json(Method::POST, "/pdfs/generate", Some(&PdfRequestBody { story_id }))
            .await?;
        Ok(response.into_inner())
    }

    pub async fn list_pdfs(&self, story_id: &str) -> PortResult<Vec<PdfRecord>> {
        let response: PdfsResponse = self.get_json(&format!("/pdfs/story/{}", story_id)).await?;
        Ok(response.into_inner())
    }

    /// Downloads a generated PDF as raw bytes.
    pub async fn download_pdf(&self, pdf_id: &str) -> PortResult<Bytes> {
        self.send_for_bytes::<NoBody>(Method::GET, &format!("/pdfs/download/{}", pdf_id), None)
            .await
    }

    //=====================================================================================
    // Users
    //=====================================================================================

    pub async fn dashboard(&self) -> PortResult<Dashboard> {
        self.get_json("/users/dashboard").await
    }

    pub async fn favorites(&self) -> PortResult<Vec<StoryRecord>> {
        let response: FavoritesResponse = self.get_json("/users/favorites").await?;
        Ok(response.into_inner())
    }

    pub async fn add_favorite(&self, story_id: &str) -> PortResult<()> {
        self.send_empty(Method::POST, &format!("/users/favorites/{}", story_id))
            .await
    }

    pub async fn remove_favorite(&self, story_id: &str) -> PortResult<()> {
        self.send_empty(Method::DELETE, &format!("/users/favorites/{}", story_id))
            .await
    }
}
