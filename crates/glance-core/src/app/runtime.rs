impl<ST, IN> ReaderApp<ST, IN>
where
    ST: DocumentStore,
    IN: CommandProvider,
{
    fn run_playback(&mut self, now_ms: u64) {
        let EngineState::Playing { next_step_ms } = self.state else {
            return;
        };
        if now_ms < next_step_ms {
            return;
        }

        let Some(delay_ms) = self.advance_step(now_ms) else {
            self.finish(now_ms);
            return;
        };

        // Deadlines accumulate from the previous deadline, not from `now`.
        let mut next_step_ms = next_step_ms + delay_ms as u64;
        if next_step_ms <= now_ms {
            debug!(
                "reader: resync behind_ms={} delay_ms={}",
                now_ms - next_step_ms,
                delay_ms
            );
            next_step_ms = now_ms + delay_ms as u64;
        }
        self.state = EngineState::Playing { next_step_ms };
    }

    /// Show the next token (or word chunk). Returns the delay until the
    /// following step, or `None` at end of stream.
    fn advance_step(&mut self, now_ms: u64) -> Option<u32> {
        let base_delay_ms = self.settings.base_delay_ms();
        let chunk_size = self.settings.chunk_size;
        let intensity = self.settings.pause_intensity;
        let auto_pause = self.settings.auto_pause;

        let open = self.open.as_mut()?;
        let start = if open.primed {
            open.token_index + 1
        } else {
            open.token_index
        };
        let tokens = &open.document.tokens;
        let span = step_span(tokens, start, chunk_size);
        let last = *span.last()?;

        let render = render_span(tokens, &span);
        let words = span.iter().filter(|&&index| tokens[index].is_word()).count() as u32;
        let pause = pause_for(&tokens[last], base_delay_ms, intensity, auto_pause);

        open.token_index = last;
        open.primed = true;

        self.stats.words_shown = self.stats.words_shown.saturating_add(words);
        if pause.counts_as_pause {
            self.stats.pause_count = self.stats.pause_count.saturating_add(1);
        }
        if let Some(render) = render {
            self.push_event(EngineEvent::Render(render));
        }
        self.after_move(now_ms);

        Some(base_delay_ms + pause.extra_delay_ms)
    }

    fn finish(&mut self, now_ms: u64) {
        self.set_state(EngineState::Paused, now_ms);
        let stats = self.stats.view(now_ms);
        if let Some(open) = &self.open {
            info!(
                "reader: finished document={} words_shown={} pauses={} elapsed_ms={}",
                open.document.id, stats.words_shown, stats.pause_count, stats.elapsed_ms
            );
        }
        self.push_event(EngineEvent::Finished(stats));
    }

    fn set_state(&mut self, state: EngineState, now_ms: u64) {
        let previous = self.state.public();
        self.state = state;

        match state {
            EngineState::Playing { .. } => self.stats.resume(now_ms),
            EngineState::Idle | EngineState::Paused => self.stats.suspend(now_ms),
        }

        if previous != state.public() {
            debug!("reader: state {:?} -> {:?}", previous, state.public());
            self.push_event(EngineEvent::State(state.public()));
        }
    }

    /// Report the new position: progress event, debounced page sync and a
    /// progress write.
    fn after_move(&mut self, now_ms: u64) {
        let Some((id, progress, total_words, page)) = self.snapshot() else {
            return;
        };

        self.push_event(EngineEvent::Progress(ProgressView::new(
            progress.word_index,
            total_words,
            page,
        )));
        if let Some(page) = page {
            self.schedule_page_sync(page, now_ms);
        }
        self.persist_progress(&id, &progress);
    }

    fn snapshot(&mut self) -> Option<(DocumentId, ReadingProgress, usize, Option<u32>)> {
        let open = self.open.as_ref()?;
        let map = self.index.get_or_build(&open.document);
        let word_index = map.word_index_for_token(open.token_index);
        let progress = ReadingProgress {
            token_index: open.token_index,
            word_index,
            bookmarks: open.bookmarks.clone(),
        };
        Some((
            open.document.id.clone(),
            progress,
            map.word_count(),
            open.document.page_for_word(word_index),
        ))
    }

    fn schedule_page_sync(&mut self, page: u32, now_ms: u64) {
        if self.page_sync.reported == Some(page) {
            self.page_sync.pending = None;
            return;
        }
        match self.page_sync.pending {
            Some((pending, _)) if pending == page => {}
            _ => self.page_sync.pending = Some((page, now_ms + PAGE_SYNC_DEBOUNCE_MS)),
        }
    }

    fn flush_page_sync(&mut self, now_ms: u64) {
        let Some((page, due_ms)) = self.page_sync.pending else {
            return;
        };
        if now_ms < due_ms {
            return;
        }
        self.page_sync = PageSyncState {
            reported: Some(page),
            pending: None,
        };
        self.push_event(EngineEvent::PageSync(page));
    }

    fn persist_progress(&mut self, id: &DocumentId, progress: &ReadingProgress) {
        match self.store.save_progress(id, progress) {
            Ok(()) => {
                if self.storage_degraded {
                    info!("store: progress writes recovered document={}", id);
                    self.storage_degraded = false;
                }
            }
            Err(error) => self.storage_failed(StorageOperation::SaveProgress, &error),
        }
    }

    fn storage_failed(&mut self, operation: StorageOperation, error: &ST::Error) {
        warn!("store: {:?} failed: {:?}", operation, error);
        if !self.storage_degraded {
            self.storage_degraded = true;
            self.push_event(EngineEvent::StorageWarning(operation));
        }
    }

    fn push_event(&mut self, event: EngineEvent) {
        if self.events.is_full() {
            let _ = self.events.pop_front();
            debug!("reader: event queue full, dropped oldest");
        }
        let _ = self.events.push_back(event);
        self.render_requested = true;
    }
}
