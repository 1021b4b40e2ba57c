//! crates/storybook_core/src/chapters.rs
//!
//! Splits a narrative into numbered chapters, one sentence per chapter.

use crate::domain::Chapter;

/// A story never has more chapters than this; extra sentences are discarded.
pub const MAX_CHAPTERS: usize = 5;

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 5] = ['"', '\'', ')', '\u{201D}', '\u{2019}'];

/// Splits text into sentences on `.`, `!` and `?`, keeping the terminator.
///
/// Runs of terminators (`?!`, `...`) and closing quotes stay with the sentence
/// they end. Fragments without any alphanumeric content are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if !TERMINATORS.contains(&c) {
            continue;
        }
        while let Some(&next) = chars.peek() {
            if TERMINATORS.contains(&next) || CLOSERS.contains(&next) {
                current.push(next);
                chars.next();
            } else {
                break;
            }
        }
        push_fragment(&mut sentences, &current);
        current.clear();
    }
    push_fragment(&mut sentences, &current);

    sentences
}

fn push_fragment(sentences: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Builds up to [`MAX_CHAPTERS`] chapters from a narrative, numbered from 1.
///
/// Illustrations are not attached here; every chapter starts with no URL and
/// an empty prompt.
pub fn split_into_chapters(text: &str) -> Vec<Chapter> {
    split_sentences(text)
        .into_iter()
        .take(MAX_CHAPTERS)
        .enumerate()
        .map(|(index, content)| {
            let number = index as u32 + 1;
            Chapter {
                number,
                title: format!("Chapter {}", number),
                word_count: word_count(&content),
                content,
                illustration_url: None,
                illustration_prompt: String::new(),
            }
        })
        .collect()
}
