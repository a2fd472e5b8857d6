//! Optimal Recognition Point placement.

use alloc::string::String;

/// Drawn at the fixation point when there is nothing to show.
pub const PLACEHOLDER_PIVOT: char = '•';

/// Pivot character index (in chars, not bytes) for a word.
pub fn pivot_index(word: &str) -> usize {
    let len = word.chars().count();
    let banded = match len {
        0..=2 => 0,
        3..=5 => 1,
        6..=9 => 2,
        10..=13 => 3,
        _ => 4,
    };
    banded.min(len.saturating_sub(1))
}

/// A word cut around its pivot, ready to be aligned on the fixation point.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WordParts {
    pub left: String,
    pub pivot: char,
    pub right: String,
}

pub fn split_word(word: &str) -> WordParts {
    let pivot_at = pivot_index(word);
    let Some((byte_at, pivot)) = word.char_indices().nth(pivot_at) else {
        return WordParts {
            left: String::new(),
            pivot: PLACEHOLDER_PIVOT,
            right: String::new(),
        };
    };

    WordParts {
        left: String::from(&word[..byte_at]),
        pivot,
        right: String::from(&word[byte_at + pivot.len_utf8()..]),
    }
}
