//! Per-block quality filters.

use std::fmt;

use crate::config::SelectorConfig;
use crate::dom::css::is_hidden;
use crate::dom::filter::is_chrome;
use crate::dom::{Document, NodeId};
use crate::select::extract::TextBlock;

const SENTENCE_END: &[char] = &['.', '!', '?', '…', '。', '！', '？'];

/// Uppercase ratio is only meaningful with this many letters
const MIN_LETTERS_FOR_CASE_CHECK: usize = 10;

/// Why a block was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Hidden,
    TooSmall,
    OffCanvas,
    Chrome,
    Shouting,
    TooFewWords,
    NoSentencePunctuation,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::Hidden => "hidden",
            Rejection::TooSmall => "too small on screen",
            Rejection::OffCanvas => "positioned off-canvas",
            Rejection::Chrome => "page chrome",
            Rejection::Shouting => "mostly uppercase",
            Rejection::TooFewWords => "too few words",
            Rejection::NoSentencePunctuation => "long text without sentence punctuation",
        })
    }
}

pub fn check(
    doc: &Document,
    block: &TextBlock,
    container: NodeId,
    config: &SelectorConfig,
    viewport_width: f32,
) -> Result<(), Rejection> {
    let id = block.element;
    if is_hidden(doc, id) {
        return Err(Rejection::Hidden);
    }

    let rect = doc.bounds(id);
    if rect.width() < config.min_element_width || rect.height() < config.min_element_height {
        return Err(Rejection::TooSmall);
    }
    let margin = config.offscreen_margin;
    if rect.right < -margin
        || rect.bottom < -margin
        || rect.left < -margin
        || rect.top < -margin
        || rect.left > viewport_width + margin
    {
        return Err(Rejection::OffCanvas);
    }

    let scope = (id != container).then_some(container);
    if is_chrome(doc, id, scope) {
        return Err(Rejection::Chrome);
    }

    if is_shouting(&block.text, config.max_uppercase_ratio) {
        return Err(Rejection::Shouting);
    }
    if block.text.split_whitespace().count() < config.min_words {
        return Err(Rejection::TooFewWords);
    }
    if !block.content_hint
        && block.text.chars().count() >= config.punctuation_check_length
        && !block.text.contains(SENTENCE_END)
    {
        return Err(Rejection::NoSentencePunctuation);
    }
    Ok(())
}

fn is_shouting(text: &str, max_ratio: f32) -> bool {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if letters < MIN_LETTERS_FOR_CASE_CHECK {
        return false;
    }
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    upper as f32 / letters as f32 > max_ratio
}
