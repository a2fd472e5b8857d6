//! Imported documents: token stream plus page metadata, versioned so derived
//! caches know when to rebuild.

use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::fmt;

use log::info;

use crate::{
    index::WordIndexMap,
    pages::{PageLines, PageRange, SegmentOptions, page_for_word, ranges_from_counts, segment_pages},
    text::{Token, count_words, merge_fragments, remerge, tokenize, Fragment},
};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Bumped whenever `tokens` changes.
    pub version: u32,
    pub tokens: Vec<Token>,
    /// Present for paginated sources only.
    pub page_ranges: Option<Vec<PageRange>>,
}

impl Document {
    pub fn from_text(id: impl Into<DocumentId>, title: impl Into<String>, text: &str) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            version: 0,
            tokens: tokenize(text),
            page_ranges: None,
        }
    }

    pub fn from_pages(
        id: impl Into<DocumentId>,
        title: impl Into<String>,
        pages: &[PageLines],
        options: &SegmentOptions,
    ) -> Self {
        let segmented = segment_pages(pages, options);
        Self {
            id: id.into(),
            title: title.into(),
            version: 0,
            tokens: segmented.tokens,
            page_ranges: Some(segmented.page_ranges),
        }
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.tokens)
    }

    /// A document with no words has nothing to play.
    pub fn is_readable(&self) -> bool {
        self.tokens.iter().any(Token::is_word)
    }

    pub fn page_for_word(&self, word_index: usize) -> Option<u32> {
        self.page_ranges
            .as_deref()
            .and_then(|ranges| page_for_word(ranges, word_index))
    }

    pub fn replace_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
        self.page_ranges = None;
        self.version = self.version.wrapping_add(1);
    }

    /// Re-run the current merge rule over a loaded stream.
    ///
    /// Returns `true` (and bumps `version`) when the stored stream was written
    /// by an older rule and had to change. Paginated documents are healed page
    /// by page so their ranges stay aligned with the new word indices.
    pub fn heal(&mut self) -> bool {
        let healed = match self.page_ranges.as_deref() {
            None => remerge(&self.tokens).map(|tokens| (tokens, None)),
            Some(ranges) => heal_paginated(&self.tokens, ranges)
                .map(|(tokens, ranges)| (tokens, Some(ranges))),
        };

        let Some((tokens, page_ranges)) = healed else {
            return false;
        };

        info!(
            "document: healed id={} version={} tokens {} -> {}",
            self.id,
            self.version,
            self.tokens.len(),
            tokens.len()
        );
        self.tokens = tokens;
        self.page_ranges = page_ranges;
        self.version = self.version.wrapping_add(1);
        true
    }
}

fn heal_paginated(tokens: &[Token], ranges: &[PageRange]) -> Option<(Vec<Token>, Vec<PageRange>)> {
    let map = WordIndexMap::build(tokens);
    let mut by_page: BTreeMap<u32, Vec<&Token>> = BTreeMap::new();

    for (token_index, token) in tokens.iter().enumerate() {
        let word_index = map.word_index_for_token(token_index);
        let page = page_for_word(ranges, word_index)
            .or_else(|| ranges.first().map(|range| range.page))
            .unwrap_or(1);
        by_page.entry(page).or_default().push(token);
    }

    let mut healed_tokens = Vec::with_capacity(tokens.len());
    let mut counts = Vec::with_capacity(ranges.len());
    for range in ranges {
        let page_tokens = by_page.remove(&range.page).unwrap_or_default();
        let merged = merge_fragments(page_tokens.into_iter().map(|token| match token {
            Token::Word(text) => Fragment::classify(text),
            Token::ParagraphBreak => Fragment::ParagraphBreak,
        }));
        counts.push((range.page, count_words(&merged)));
        healed_tokens.extend(merged);
    }

    let healed_ranges = ranges_from_counts(counts);
    if healed_tokens.as_slice() == tokens && healed_ranges.as_slice() == ranges {
        None
    } else {
        Some((healed_tokens, healed_ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::{PageLine, is_partition};
    use alloc::vec;

    #[test]
    fn healthy_text_document_is_untouched() {
        let mut document = Document::from_text("a", "A", "Fine text, already merged.");
        assert!(!document.heal());
        assert_eq!(document.version, 0);
    }

    #[test]
    fn heals_legacy_text_stream() {
        let mut document = Document {
            id: DocumentId::new("legacy"),
            title: String::from("Legacy"),
            version: 3,
            tokens: vec![Token::word("Hi"), Token::word("!"), Token::word("there")],
            page_ranges: None,
        };

        assert!(document.heal());
        assert_eq!(document.version, 4);
        assert_eq!(document.tokens, [Token::word("Hi!"), Token::word("there")]);
        assert!(!document.heal());
    }

    #[test]
    fn heals_paginated_stream_and_rebuilds_ranges() {
        // page 1: "One", "," ; page 2: "—", "two", "three"
        let mut document = Document {
            id: DocumentId::new("paged"),
            title: String::from("Paged"),
            version: 0,
            tokens: vec![
                Token::word("One"),
                Token::word(","),
                Token::word("—"),
                Token::word("two"),
                Token::word("three"),
            ],
            page_ranges: Some(vec![PageRange::new(1, 0, 2), PageRange::new(2, 2, 3)]),
        };

        assert!(document.heal());
        assert_eq!(
            document.tokens,
            [Token::word("One,"), Token::word("—two"), Token::word("three")]
        );
        let ranges = document.page_ranges.clone().unwrap();
        assert_eq!(ranges, [PageRange::new(1, 0, 1), PageRange::new(2, 1, 2)]);
        assert!(is_partition(&ranges, 3));
        assert!(!document.heal());
    }

    #[test]
    fn paginated_import_records_ranges() {
        let pages = vec![
            PageLines {
                page_index: 0,
                page_height: 100.0,
                lines: vec![PageLine::new("first page words", 50.0)],
            },
            PageLines {
                page_index: 1,
                page_height: 100.0,
                lines: vec![PageLine::new("second", 50.0)],
            },
        ];
        let document = Document::from_pages("p", "P", &pages, &SegmentOptions::default());
        assert_eq!(document.word_count(), 4);
        assert_eq!(document.page_for_word(3), Some(2));
        assert!(document.is_readable());
    }

    #[test]
    fn punctuation_only_text_is_not_readable() {
        let document = Document::from_text("p", "P", "?! …");
        assert!(!document.is_readable());
        assert_eq!(document.page_for_word(0), None);
    }
}
