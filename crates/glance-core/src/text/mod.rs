//! Token stream construction: normalization, fragment classification and the
//! punctuation merge pass.

mod merge;
mod normalize;

use alloc::{string::String, vec::Vec};

pub use merge::{merge_fragments, remerge};
pub use normalize::normalize;

/// Glyph shown in place of a paragraph marker.
pub const PARAGRAPH_GLYPH: char = '¶';

/// One unit of the reading stream.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Token {
    Word(String),
    ParagraphBreak,
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Self::Word(text.into())
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Self::Word(_))
    }

    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(text) => Some(text),
            Self::ParagraphBreak => None,
        }
    }
}

/// Ordered tokens of one document, indexed in token-index space.
pub type TokenStream = Vec<Token>;

/// Pre-merge classification of a whitespace-delimited fragment.
///
/// Punctuation only ever exists here; [`merge_fragments`] folds it into words.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Fragment<'a> {
    Word(&'a str),
    Punctuation(&'a str),
    ParagraphBreak,
}

impl<'a> Fragment<'a> {
    pub fn classify(fragment: &'a str) -> Self {
        if is_word_like(fragment) {
            Self::Word(fragment)
        } else {
            Self::Punctuation(fragment)
        }
    }
}

/// A fragment is word-like when it carries at least one letter or digit.
pub fn is_word_like(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Turn raw text into a merged token stream.
///
/// Never fails: empty, whitespace-only or punctuation-only input yields an
/// empty stream.
pub fn tokenize(text: &str) -> TokenStream {
    let normalized = normalize(text);
    let mut fragments = Vec::new();

    for paragraph in normalized.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }
        if !fragments.is_empty() {
            fragments.push(Fragment::ParagraphBreak);
        }
        fragments.extend(paragraph.split_whitespace().map(Fragment::classify));
    }

    merge_fragments(fragments)
}

/// Number of word tokens in a stream.
pub fn count_words(tokens: &[Token]) -> usize {
    tokens.iter().filter(|token| token.is_word()).count()
}
