//! crates/storybook_core/src/domain.rs
//!
//! Defines the pure, core data structures for the storybook client.
//! They derive `serde` traits because both the library store and the session
//! store persist them as JSON records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Themes offered by the generator, as the string ids the backend expects.
pub const THEMES: &[&str] = &[
    "adventure",
    "fantasy",
    "friendship",
    "space-journey",
    "underwater-world",
    "magical-forest",
    "superheroes",
    "time-travel",
    "fairy-tales",
    "science-fiction",
    "jungle-safari",
    "mythical-creatures",
    "pirates-&-treasure-hunt",
    "robot-world",
];

/// Illustration styles offered by the generator.
pub const ART_STYLES: &[&str] = &[
    "anime",
    "3d-animation",
    "watercolor",
    "pixel-art",
    "claymation",
    "classic-storybook",
    "comic-book",
    "flat-illustration",
];

/// The logged-in user together with the bearer token used for API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    /// Sent when a PDF is requested for a story with no gender on record.
    NonBinary,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::NonBinary => "non-binary",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "non-binary" | "nonbinary" => Ok(Gender::NonBinary),
            other => Err(format!("'{}' is not a valid gender", other)),
        }
    }
}

/// The character/theme/style choices for one generation run. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub character_name: String,
    pub character_age: Option<u32>,
    pub character_gender: Option<Gender>,
    pub theme: String,
    pub art_style: String,
}

impl GenerationRequest {
    pub fn new(
        character_name: impl Into<String>,
        theme: impl Into<String>,
        art_style: impl Into<String>,
    ) -> Self {
        Self {
            character_name: character_name.into(),
            theme: theme.into(),
            art_style: art_style.into(),
            ..Default::default()
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.character_age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.character_gender = Some(gender);
        self
    }
}

/// One numbered narrative segment of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub title: String,
    pub content: String,
    pub word_count: usize,
    pub illustration_url: Option<String>,
    /// The prompt used for the illustration, or the reason it is missing.
    pub illustration_prompt: String,
}

/// A generated (or offline) story. Chapter numbers run 1..=n in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub theme: String,
    pub art_style: String,
    pub character_name: String,
    pub character_age: Option<u32>,
    pub character_gender: Option<Gender>,
    pub chapters: Vec<Chapter>,
}

impl Story {
    pub fn illustrated_chapters(&self) -> usize {
        self.chapters
            .iter()
            .filter(|c| c.illustration_url.is_some())
            .count()
    }

    pub fn word_count(&self) -> usize {
        self.chapters.iter().map(|c| c.word_count).sum()
    }
}

/// A story kept in the local library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStory {
    #[serde(flatten)]
    pub story: Story,
    pub saved_at: DateTime<Utc>,
}

/// Coarse-grained progress of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_wire_names_match_display_and_parse() {
        for gender in [Gender::Male, Gender::Female, Gender::Other, Gender::NonBinary] {
            let wire = serde_json::to_value(gender).unwrap();
            assert_eq!(wire, serde_json::Value::String(gender.to_string()));
            assert_eq!(gender.to_string().parse::<Gender>(), Ok(gender));
        }
        assert_eq!(
            serde_json::to_string(&Gender::NonBinary).unwrap(),
            "\"non-binary\""
        );
        assert!("robot".parse::<Gender>().is_err());
    }

    #[test]
    fn story_word_count_sums_chapters() {
        let chapter = |number: u32, words: usize| Chapter {
            number,
            title: format!("Chapter {}", number),
            content: String::new(),
            word_count: words,
            illustration_url: None,
            illustration_prompt: String::new(),
        };
        let story = Story {
            id: "s1".to_string(),
            title: "T".to_string(),
            theme: "fantasy".to_string(),
            art_style: "watercolor".to_string(),
            character_name: "Mara".to_string(),
            character_age: None,
            character_gender: None,
            chapters: vec![chapter(1, 4), chapter(2, 6)],
        };
        assert_eq!(story.word_count(), 10);
    }
}
