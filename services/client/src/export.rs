//! services/client/src/export.rs
//!
//! Downloads a story as a PDF storybook. Stories the backend knows about use the
//! stored-PDF endpoints; anything else, or any failure there, falls back to
//! generating the PDF directly from the story's attributes.

use bytes::Bytes;
use storybook_core::ports::{PortResult, StoryTextRequest};
use storybook_core::{Gender, Story};
use tracing::{info, warn};

use crate::adapters::HttpApiClient;

/// Where the exported bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfSource {
    Stored,
    Generated,
}

#[derive(Debug, Clone)]
pub struct PdfExport {
    pub filename: String,
    pub bytes: Bytes,
    pub source: PdfSource,
}

/// `"Mara & the Moon!"` -> `"Mara___the_Moon__storybook.pdf"`
pub fn pdf_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_storybook.pdf", stem)
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

/// The direct-generation request for a story, with defaults for missing attributes.
pub fn pdf_request(story: &Story, target_age: &str) -> StoryTextRequest {
    StoryTextRequest {
        theme: non_empty_or(&story.theme, "adventure"),
        art_style: non_empty_or(&story.art_style, "watercolor"),
        character_name: non_empty_or(&story.character_name, "Alex"),
        character_age: Some(story.character_age.unwrap_or(10)),
        character_gender: Some(story.character_gender.unwrap_or(Gender::NonBinary)),
        target_age: target_age.to_string(),
    }
}

fn is_backend_story(story: &Story) -> bool {
    !story.id.trim().is_empty() && !story.id.starts_with("offline-")
}

pub async fn export_pdf(
    client: &HttpApiClient,
    story: &Story,
    target_age: &str,
) -> PortResult<PdfExport> {
    let filename = pdf_filename(&story.title);

    if is_backend_story(story) {
        match stored_pdf(client, &story.id).await {
            Ok(bytes) => {
                info!(story_id = %story.id, "Downloaded stored PDF.");
                return Ok(PdfExport {
                    filename,
                    bytes,
                    source: PdfSource::Stored,
                });
            }
            Err(e) => warn!("PDF API failed, generating directly instead: {}", e),
        }
    }

    let bytes = client.generate_pdf(&pdf_request(story, target_age)).await?;
    info!(story_id = %story.id, size = bytes.len(), "Generated PDF directly.");
    Ok(PdfExport {
        filename,
        bytes,
        source: PdfSource::Generated,
    })
}

async fn stored_pdf(client: &HttpApiClient, story_id: &str) -> PortResult<Bytes> {
    let pdf = client.generate_story_pdf(story_id).await?;
    client.download_pdf(&pdf.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use storybook_core::mock::mock_story;
    use storybook_core::GenerationRequest;

    #[test]
    fn filename_replaces_non_alphanumerics() {
        assert_eq!(pdf_filename("Mara & the Moon!"), "Mara___the_Moon__storybook.pdf");
        assert_eq!(pdf_filename("Plain"), "Plain_storybook.pdf");
    }

    #[test]
    fn pdf_request_fills_defaults() {
        let mut story = mock_story(&GenerationRequest::new("Mara", "fantasy", "watercolor"));
        story.art_style.clear();
        story.character_name.clear();

        let request = pdf_request(&story, "children");
        assert_eq!(request.theme, "fantasy");
        assert_eq!(request.art_style, "watercolor");
        assert_eq!(request.character_name, "Alex");
        assert_eq!(request.character_age, Some(10));
        assert_eq!(request.character_gender, Some(Gender::NonBinary));
    }

    #[test]
    fn offline_stories_skip_the_stored_pdf_path() {
        let story = mock_story(&GenerationRequest::new("Mara", "fantasy", "watercolor"));
        assert!(!is_backend_story(&story));
    }
}
