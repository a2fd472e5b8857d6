//! Persisted user settings and reading progress.

use alloc::{string::String, vec::Vec};

use crate::timing::{DEFAULT_PAUSE_INTENSITY, DEFAULT_WPM, MAX_PAUSE_INTENSITY, MAX_WPM, MIN_WPM, base_delay_ms};

pub const MIN_CHUNK_SIZE: u8 = 1;
pub const MAX_CHUNK_SIZE: u8 = 4;

/// User-tunable reading settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReaderSettings {
    pub wpm: u16,
    /// 0..=200, where 100 applies the punctuation factors unscaled.
    pub pause_intensity: u16,
    pub auto_pause: bool,
    /// Consecutive words shown per step, 1..=4.
    pub chunk_size: u8,
    pub strip_headers_footers: bool,
    /// Newline-separated literal phrases removed from paginated imports.
    pub ignore_phrases: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            wpm: DEFAULT_WPM,
            pause_intensity: DEFAULT_PAUSE_INTENSITY,
            auto_pause: true,
            chunk_size: MIN_CHUNK_SIZE,
            strip_headers_footers: true,
            ignore_phrases: String::new(),
        }
    }
}

impl ReaderSettings {
    /// Clamp every field into its legal range.
    pub fn sanitized(mut self) -> Self {
        self.wpm = self.wpm.clamp(MIN_WPM, MAX_WPM);
        self.pause_intensity = self.pause_intensity.min(MAX_PAUSE_INTENSITY);
        self.chunk_size = self.chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        self
    }

    pub fn ignore_phrases(&self) -> impl Iterator<Item = &str> {
        self.ignore_phrases
            .lines()
            .map(str::trim)
            .filter(|phrase| !phrase.is_empty())
    }

    pub fn base_delay_ms(&self) -> u32 {
        base_delay_ms(self.wpm)
    }
}

/// Abstract settings persistence backend.
pub trait SettingsStore {
    type Error;

    fn load(&mut self) -> Result<Option<ReaderSettings>, Self::Error>;
    fn save(&mut self, settings: &ReaderSettings) -> Result<(), Self::Error>;
}

/// Saved place inside a document, optionally annotated.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bookmark {
    pub word_index: usize,
    pub note: Option<String>,
}

/// Reading location used to resume a document.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReadingProgress {
    pub token_index: usize,
    pub word_index: usize,
    pub bookmarks: Vec<Bookmark>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_ranges() {
        let settings = ReaderSettings {
            wpm: 5_000,
            pause_intensity: 999,
            chunk_size: 9,
            ..ReaderSettings::default()
        }
        .sanitized();

        assert_eq!(settings.wpm, MAX_WPM);
        assert_eq!(settings.pause_intensity, MAX_PAUSE_INTENSITY);
        assert_eq!(settings.chunk_size, MAX_CHUNK_SIZE);

        let low = ReaderSettings {
            wpm: 0,
            chunk_size: 0,
            ..ReaderSettings::default()
        }
        .sanitized();
        assert_eq!((low.wpm, low.chunk_size), (MIN_WPM, MIN_CHUNK_SIZE));
    }

    #[test]
    fn ignore_phrases_are_split_per_line() {
        let settings = ReaderSettings {
            ignore_phrases: String::from("Confidential\n\n  Draft copy  \r\n"),
            ..ReaderSettings::default()
        };
        let phrases: Vec<&str> = settings.ignore_phrases().collect();
        assert_eq!(phrases, ["Confidential", "Draft copy"]);
    }
}
