//! Word-index ↔ token-index mapping and its per-document cache.

use alloc::{collections::BTreeMap, vec::Vec};

use log::debug;

use crate::{
    document::{Document, DocumentId},
    text::Token,
};

/// Lookup tables between the two coordinate systems of one token stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordIndexMap {
    word_to_token: Vec<usize>,
    token_to_word: Vec<Option<usize>>,
}

impl WordIndexMap {
    pub fn build(tokens: &[Token]) -> Self {
        let mut word_to_token = Vec::new();
        let mut token_to_word = Vec::with_capacity(tokens.len());

        for (token_index, token) in tokens.iter().enumerate() {
            if token.is_word() {
                token_to_word.push(Some(word_to_token.len()));
                word_to_token.push(token_index);
            } else {
                token_to_word.push(None);
            }
        }

        Self {
            word_to_token,
            token_to_word,
        }
    }

    pub fn word_count(&self) -> usize {
        self.word_to_token.len()
    }

    pub fn token_count(&self) -> usize {
        self.token_to_word.len()
    }

    /// Direct word-index of a token, `None` for non-word or out-of-range
    /// positions.
    pub fn exact_word_index(&self, token_index: usize) -> Option<usize> {
        self.token_to_word.get(token_index).copied().flatten()
    }

    /// Word-index for any token position.
    ///
    /// Non-word positions resolve to the nearest preceding word, or `0` when
    /// there is none. Out-of-range positions clamp to the last token.
    pub fn word_index_for_token(&self, token_index: usize) -> usize {
        if self.token_to_word.is_empty() {
            return 0;
        }

        let clamped = token_index.min(self.token_to_word.len() - 1);
        self.token_to_word[..=clamped]
            .iter()
            .rev()
            .find_map(|slot| *slot)
            .unwrap_or(0)
    }

    /// Token-index of a word; out-of-range word indices clamp to the stream.
    pub fn token_index_for_word(&self, word_index: usize) -> usize {
        match self.word_to_token.len() {
            0 => 0,
            len => self.word_to_token[word_index.min(len - 1)],
        }
    }
}

/// Derived maps keyed by `(document id, stream version)`.
///
/// A lookup with a newer version than the cached one rebuilds the entry, so a
/// healed or re-imported stream never reads stale tables.
#[derive(Debug, Default)]
pub struct IndexCache {
    entries: BTreeMap<DocumentId, (u32, WordIndexMap)>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, document: &Document) -> &WordIndexMap {
        let stale = match self.entries.get(&document.id) {
            Some((version, _)) => *version != document.version,
            None => true,
        };

        if stale {
            debug!(
                "index: rebuild document={} version={} tokens={}",
                document.id,
                document.version,
                document.tokens.len()
            );
            self.entries.insert(
                document.id.clone(),
                (document.version, WordIndexMap::build(&document.tokens)),
            );
        }

        &self.entries[&document.id].1
    }

    pub fn invalidate(&mut self, id: &DocumentId) {
        self.entries.remove(id);
    }

    pub fn cached_version(&self, id: &DocumentId) -> Option<u32> {
        self.entries.get(id).map(|(version, _)| *version)
    }
}
