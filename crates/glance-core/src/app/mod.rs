//! Playback engine: one open document, tick-driven stepping, navigation and
//! the event queue the host drains.

use alloc::{string::String, vec::Vec};

use heapless::Deque;
use log::{debug, info, warn};

use crate::{
    document::{Document, DocumentId},
    index::IndexCache,
    input::{CommandProvider, ReaderCommand},
    pages::start_word_for_page,
    render::{
        EngineEvent, PlaybackState, ProgressView, RenderEvent, SessionStatsView, StorageOperation,
    },
    settings::{Bookmark, ReaderSettings, ReadingProgress},
    store::DocumentStore,
    text::Token,
    timing::{ends_sentence, pause_for},
};

/// Events kept for the host between drains; the oldest is dropped when full.
pub const EVENT_QUEUE_CAPACITY: usize = 64;
/// Quiet period before a page change is reported to the page view.
pub const PAGE_SYNC_DEBOUNCE_MS: u64 = 150;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

/// A scheduled callback handed to the host.
///
/// The generation changes on every document switch and hard reset; a wakeup
/// from an older generation is ignored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Wakeup {
    pub generation: u32,
    pub at_ms: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum EngineState {
    Idle,
    Playing { next_step_ms: u64 },
    Paused,
}

impl EngineState {
    fn public(self) -> PlaybackState {
        match self {
            Self::Idle => PlaybackState::Idle,
            Self::Playing { .. } => PlaybackState::Playing,
            Self::Paused => PlaybackState::Paused,
        }
    }
}

/// Per-document playback state.
#[derive(Debug)]
struct OpenDocument {
    document: Document,
    /// Last token shown (or the resume point before anything was shown).
    token_index: usize,
    /// Whether `token_index` has already been played by a step.
    primed: bool,
    bookmarks: Vec<Bookmark>,
}

#[derive(Clone, Copy, Debug, Default)]
struct SessionStats {
    accumulated_ms: u64,
    running_since_ms: Option<u64>,
    words_shown: u32,
    pause_count: u32,
}

impl SessionStats {
    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .running_since_ms
            .map_or(0, |since| now_ms.saturating_sub(since));
        self.accumulated_ms + running
    }

    fn resume(&mut self, now_ms: u64) {
        if self.running_since_ms.is_none() {
            self.running_since_ms = Some(now_ms);
        }
    }

    fn suspend(&mut self, now_ms: u64) {
        if let Some(since) = self.running_since_ms.take() {
            self.accumulated_ms += now_ms.saturating_sub(since);
        }
    }

    fn view(&self, now_ms: u64) -> SessionStatsView {
        let elapsed_ms = self.elapsed_ms(now_ms);
        let average_wpm = if elapsed_ms == 0 {
            0
        } else {
            (self.words_shown as u64 * 60_000 / elapsed_ms) as u32
        };
        SessionStatsView {
            elapsed_ms,
            words_shown: self.words_shown,
            pause_count: self.pause_count,
            average_wpm,
        }
    }
}

/// Trailing debounce for page-sync notifications.
#[derive(Clone, Copy, Debug, Default)]
struct PageSyncState {
    reported: Option<u32>,
    pending: Option<(u32, u64)>,
}

pub struct ReaderApp<ST, IN>
where
    ST: DocumentStore,
    IN: CommandProvider,
{
    store: ST,
    commands: IN,
    settings: ReaderSettings,
    index: IndexCache,
    open: Option<OpenDocument>,
    /// Document requested but not yet resolved.
    loading: Option<DocumentId>,
    /// Play requested while loading.
    pending_start: bool,
    generation: u32,
    state: EngineState,
    stats: SessionStats,
    events: Deque<EngineEvent, EVENT_QUEUE_CAPACITY>,
    pending_scrub: Option<usize>,
    page_sync: PageSyncState,
    storage_degraded: bool,
    render_requested: bool,
}

include!("view.rs");
include!("input.rs");
include!("runtime.rs");
include!("navigation.rs");
include!("step_span.rs");
