//! crates/storybook_core/src/mock.rs
//!
//! The offline story used when the backend cannot be reached. Everything here
//! is deterministic: the same request always yields the same story.

use crate::chapters::split_into_chapters;
use crate::domain::{GenerationRequest, Story};

const CHAPTER_TITLES: [&str; 5] = [
    "The Beginning",
    "The Discovery",
    "The Journey Begins",
    "The Challenge",
    "The Happy Ending",
];

/// Prompt recorded on every offline chapter in place of an illustration.
pub const OFFLINE_ILLUSTRATION: &str = "Illustration unavailable: the story was created offline";

/// `space-journey` -> `space journey`
pub fn theme_label(theme: &str) -> String {
    theme.trim().replace('-', " ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn slug(text: &str) -> String {
    let mut slug = String::new();
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn narrative(name: &str, theme: &str) -> String {
    format!(
        "Once upon a time, a brave child named {name} lived in a cozy house at the edge of a {theme} land, \
         wondering every morning what adventures waited beyond the tall, whispering trees. \
         One sunny morning, {name} discovered a glowing map hidden behind the old oak tree, \
         its path winding deep into the {theme} wilds past mysterious shimmering symbols. \
         Without hesitation, {name} packed a small backpack with snacks and set off, greeted by talking squirrels, \
         butterflies that sparkled like gems and flowers that chimed like tiny bells. \
         Soon a wide river blocked the path, until a wise old turtle surfaced and offered to carry {name} across \
         in exchange for the answer to a riddle. \
         {name} cleverly solved the riddle, crossed the river and found a garden of wishing fruit, \
         and wished for every creature of the {theme} land to be happy forever."
    )
}

/// Synthesizes the offline story for a request.
///
/// The title combines the character name and the theme; chapters come from the
/// same sentence splitter used for generated stories, and none has an illustration.
pub fn mock_story(request: &GenerationRequest) -> Story {
    let name = request.character_name.trim();
    let theme = theme_label(&request.theme);

    let mut chapters = split_into_chapters(&narrative(name, &theme));
    for (chapter, title) in chapters.iter_mut().zip(CHAPTER_TITLES) {
        chapter.title = title.to_string();
        chapter.illustration_prompt = OFFLINE_ILLUSTRATION.to_string();
    }

    Story {
        id: format!("offline-{}-{}", slug(name), slug(&request.theme)),
        title: format!("{} and the {} Quest", name, capitalize(&theme)),
        theme: request.theme.clone(),
        art_style: request.art_style.clone(),
        character_name: name.to_string(),
        character_age: request.character_age,
        character_gender: request.character_gender,
        chapters,
    }
}
