//! View models handed to the host renderer.

use alloc::string::String;

use crate::{
    document::DocumentId,
    orp::{WordParts, split_word},
    text::PARAGRAPH_GLYPH,
};

pub const PARAGRAPH_LABEL: &str = "paragraph";

/// What to put on the focus line for one step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RenderEvent {
    /// A word or a space-joined chunk, cut around its pivot.
    Word { text: String, parts: WordParts },
    /// A non-word token shown as a literal glyph.
    Glyph { glyph: char, label: &'static str },
}

impl RenderEvent {
    pub fn word(text: String) -> Self {
        let parts = split_word(&text);
        Self::Word { text, parts }
    }

    pub const fn paragraph() -> Self {
        Self::Glyph {
            glyph: PARAGRAPH_GLYPH,
            label: PARAGRAPH_LABEL,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressView {
    /// 0..=100, reaching 100 on the last word.
    pub percent_complete: u8,
    pub word_index: usize,
    pub total_words: usize,
    pub page: Option<u32>,
}

impl ProgressView {
    pub fn new(word_index: usize, total_words: usize, page: Option<u32>) -> Self {
        let percent_complete = if total_words == 0 {
            0
        } else {
            ((word_index.min(total_words - 1) + 1) * 100 / total_words) as u8
        };
        Self {
            percent_complete,
            word_index,
            total_words,
            page,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SessionStatsView {
    pub elapsed_ms: u64,
    pub words_shown: u32,
    pub pause_count: u32,
    pub average_wpm: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Store call that failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageOperation {
    LoadDocument,
    SaveDocument,
    LoadProgress,
    SaveProgress,
}

/// Events queued by the engine and drained by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Render(RenderEvent),
    Progress(ProgressView),
    PageSync(u32),
    State(PlaybackState),
    /// Content for the document is still resolving; playback will start once
    /// it arrives.
    Loading(DocumentId),
    NoReadableText(DocumentId),
    StorageWarning(StorageOperation),
    Finished(SessionStatsView),
}
