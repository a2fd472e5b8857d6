//! Command abstraction layer.

mod queue;

use alloc::string::String;

pub use queue::{CommandQueue, NoCommands};

use crate::{document::DocumentId, settings::ReaderSettings};

/// Logical actions consumed by the reader engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReaderCommand {
    Open(DocumentId),
    Play,
    Pause,
    TogglePlay,
    /// Hard stop: back to idle with session stats cleared.
    Reset,
    /// Move by whole words; negative steps go back.
    Step(i32),
    SentenceBack,
    SentenceForward,
    /// Jump to a word index. Bursts are coalesced to the latest value.
    Scrub(usize),
    JumpToPage(u32),
    AddBookmark { note: Option<String> },
    RemoveBookmark { word_index: usize },
    JumpToBookmark(usize),
    UpdateSettings(ReaderSettings),
}

/// Polled command provider.
pub trait CommandProvider {
    type Error;

    fn poll_command(&mut self) -> Result<Option<ReaderCommand>, Self::Error>;
}
