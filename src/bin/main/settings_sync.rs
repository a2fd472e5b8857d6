use glance_core::settings::{ReaderSettings, SettingsStore};
use log::{info, warn};

use super::SETTINGS_SAVE_DEBOUNCE_MS;

/// Debounced settings persistence: a burst of edits is written once.
pub(super) struct SettingsSyncState {
    last_saved: ReaderSettings,
    pending: Option<(ReaderSettings, u64)>,
}

impl SettingsSyncState {
    pub(super) fn new(initial: ReaderSettings) -> Self {
        Self {
            last_saved: initial,
            pending: None,
        }
    }

    pub(super) fn track_current(&mut self, current: &ReaderSettings, now_ms: u64) {
        if *current == self.last_saved {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some((pending, changed_at_ms)) => {
                if pending != current {
                    *pending = current.clone();
                    *changed_at_ms = now_ms;
                }
            }
            None => {
                self.pending = Some((current.clone(), now_ms));
            }
        }
    }

    pub(super) fn due_at(&self) -> Option<u64> {
        self.pending
            .as_ref()
            .map(|(_, changed_at_ms)| changed_at_ms + SETTINGS_SAVE_DEBOUNCE_MS)
    }

    pub(super) fn flush_if_due<S>(&mut self, store: &mut S, now_ms: u64)
    where
        S: SettingsStore,
        S::Error: std::fmt::Display,
    {
        let Some((candidate, changed_at_ms)) = self.pending.take() else {
            return;
        };

        if now_ms.saturating_sub(changed_at_ms) < SETTINGS_SAVE_DEBOUNCE_MS {
            self.pending = Some((candidate, changed_at_ms));
            return;
        }

        match store.save(&candidate) {
            Ok(()) => {
                info!(
                    "settings-save: flushed wpm={} chunk={}",
                    candidate.wpm, candidate.chunk_size
                );
                self.last_saved = candidate;
            }
            Err(error) => {
                warn!("settings-save: failed, retrying later: {error}");
                self.pending = Some((candidate, now_ms));
            }
        }
    }

    /// Write any pending change regardless of the debounce window.
    pub(super) fn flush_now<S>(&mut self, store: &mut S)
    where
        S: SettingsStore,
        S::Error: std::fmt::Display,
    {
        if let Some((_, changed_at_ms)) = self.pending.as_mut() {
            *changed_at_ms = 0;
        }
        self.flush_if_due(store, SETTINGS_SAVE_DEBOUNCE_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::store::MemoryStore;

    #[test]
    fn bursts_are_written_once_after_quiet_period() {
        let mut store = MemoryStore::new();
        let mut sync = SettingsSyncState::new(ReaderSettings::default());

        let first = ReaderSettings {
            wpm: 350,
            ..ReaderSettings::default()
        };
        let second = ReaderSettings {
            wpm: 400,
            ..ReaderSettings::default()
        };
        sync.track_current(&first, 0);
        sync.track_current(&second, 500);
        assert_eq!(sync.due_at(), Some(500 + SETTINGS_SAVE_DEBOUNCE_MS));

        sync.flush_if_due(&mut store, 600);
        assert_eq!(store.load().unwrap(), None);

        sync.flush_if_due(&mut store, 500 + SETTINGS_SAVE_DEBOUNCE_MS);
        assert_eq!(store.load().unwrap(), Some(second));
        assert_eq!(sync.due_at(), None);
    }

    #[test]
    fn flush_now_skips_the_wait() {
        let mut store = MemoryStore::new();
        let mut sync = SettingsSyncState::new(ReaderSettings::default());
        let changed = ReaderSettings {
            auto_pause: false,
            ..ReaderSettings::default()
        };
        sync.track_current(&changed, 10_000);
        sync.flush_now(&mut store);
        assert_eq!(store.load().unwrap(), Some(changed));
    }
}
