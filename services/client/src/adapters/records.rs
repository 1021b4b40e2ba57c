//! services/client/src/adapters/records.rs
//!
//! Request bodies and response shapes of the storybook backend. Responses are
//! parsed into these types at the boundary; anything that does not fit is a
//! `PortError::Parse`.

use serde::{Deserialize, Deserializer, Serialize};
use storybook_core::Gender;

/// Accepts ids sent either as JSON strings or as numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(id)| id))
}

/// Declares a response the backend sends either wrapped as `{"<key>": ...}`
/// or as the bare value.
macro_rules! wrapped_or_bare {
    ($name:ident, $key:ident, $inner:ty) => {
        #[derive(Debug, Deserialize)]
        #[serde(untagged)]
        pub enum $name {
            Wrapped { $key: $inner },
            Bare($inner),
        }

        impl $name {
            pub fn into_inner(self) -> $inner {
                match self {
                    Self::Wrapped { $key } | Self::Bare($key) => $key,
                }
            }
        }
    };
}

//=========================================================================================
// Errors
//=========================================================================================

/// Error payload of a failed request. Either field may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or_else(|| match self.detail {
                Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => Some(detail),
                _ => None,
            })
    }
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub username: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

wrapped_or_bare!(ProfileResponse, user, UserRecord);

//=========================================================================================
// AI Generation
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct GeneratedStoryRecord {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateStoryResponse {
    pub story: GeneratedStoryRecord,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedIllustrationRecord {
    pub image_url: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateIllustrationResponse {
    pub illustration: GeneratedIllustrationRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IllustrationStatus {
    pub status: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

//=========================================================================================
// Stories
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub art_style: Option<String>,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub character_age: Option<u32>,
    #[serde(default)]
    pub character_gender: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStory {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub theme: String,
    pub art_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_gender: Option<Gender>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

wrapped_or_bare!(StoryResponse, story, StoryRecord);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryPage {
    pub stories: Vec<StoryRecord>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
}

//=========================================================================================
// Chapters
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChapterRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub story_id: String,
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChapter {
    pub story_id: String,
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChapterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

wrapped_or_bare!(ChapterResponse, chapter, ChapterRecord);

wrapped_or_bare!(ChaptersResponse, chapters, Vec<ChapterRecord>);

//=========================================================================================
// Illustrations
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IllustrationRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub story_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub chapter_id: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

wrapped_or_bare!(IllustrationResponse, illustration, IllustrationRecord);

wrapped_or_bare!(IllustrationsResponse, illustrations, Vec<IllustrationRecord>);

//=========================================================================================
// PDFs
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PdfRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub story_id: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PdfRequestBody<'a> {
    pub story_id: &'a str,
}

wrapped_or_bare!(PdfResponse, pdf, PdfRecord);

wrapped_or_bare!(PdfsResponse, pdfs, Vec<PdfRecord>);

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub total_stories: u64,
    #[serde(default)]
    pub total_illustrations: u64,
    #[serde(default)]
    pub total_pdfs: u64,
    #[serde(default)]
    pub recent_stories: Vec<StoryRecord>,
}

wrapped_or_bare!(FavoritesResponse, favorites, Vec<StoryRecord>);
