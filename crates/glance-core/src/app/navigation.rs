impl<ST, IN> ReaderApp<ST, IN>
where
    ST: DocumentStore,
    IN: CommandProvider,
{
    fn open_document(&mut self, id: DocumentId, now_ms: u64) {
        if self.loading.is_none()
            && self
                .open
                .as_ref()
                .is_some_and(|open| open.document.id == id)
        {
            debug!("reader: document={} already open", id);
            return;
        }

        self.close_current(now_ms);
        match self.store.load_document(&id) {
            Ok(Some(document)) => self.activate(document, now_ms),
            Ok(None) => self.await_content(id),
            Err(error) => {
                self.storage_failed(StorageOperation::LoadDocument, &error);
                self.await_content(id);
            }
        }
    }

    fn await_content(&mut self, id: DocumentId) {
        info!("reader: waiting for content document={}", id);
        self.loading = Some(id.clone());
        self.push_event(EngineEvent::Loading(id));
    }

    /// Save the open document's place and cancel everything scheduled for it.
    fn close_current(&mut self, now_ms: u64) {
        if let Some((id, progress, _, _)) = self.snapshot() {
            self.persist_progress(&id, &progress);
            self.index.invalidate(&id);
            debug!(
                "reader: closed document={} word_index={}",
                id, progress.word_index
            );
        }

        self.set_state(EngineState::Idle, now_ms);
        self.stats = SessionStats::default();
        self.open = None;
        self.loading = None;
        self.pending_scrub = None;
        self.page_sync = PageSyncState::default();
        self.generation = self.generation.wrapping_add(1);
    }

    fn activate(&mut self, mut document: Document, now_ms: u64) {
        self.index.invalidate(&document.id);
        let healed = document.heal();
        if healed {
            if let Err(error) = self.store.save_document(&document) {
                self.storage_failed(StorageOperation::SaveDocument, &error);
            }
        }

        let progress = match self.store.load_progress(&document.id) {
            Ok(progress) => progress.unwrap_or_default(),
            Err(error) => {
                self.storage_failed(StorageOperation::LoadProgress, &error);
                ReadingProgress::default()
            }
        };

        let map = self.index.get_or_build(&document);
        // Saved token indices only hold for the stream they were taken from;
        // after a heal or a re-import the word index wins.
        let token_still_matches = !healed
            && progress.token_index < document.tokens.len()
            && map.word_index_for_token(progress.token_index) == progress.word_index;
        let token_index = if token_still_matches {
            progress.token_index
        } else {
            map.token_index_for_word(progress.word_index)
        };
        info!(
            "reader: opened document={} version={} words={} tokens={} resume_token={}",
            document.id,
            document.version,
            map.word_count(),
            document.tokens.len(),
            token_index
        );

        let id = document.id.clone();
        let readable = document.is_readable();
        self.loading = None;
        self.open = Some(OpenDocument {
            document,
            token_index,
            primed: false,
            bookmarks: progress.bookmarks,
        });

        if !readable {
            self.pending_start = false;
            self.push_event(EngineEvent::NoReadableText(id));
            return;
        }

        self.preview_current();
        if let Some((_, progress, total_words, page)) = self.snapshot() {
            self.push_event(EngineEvent::Progress(ProgressView::new(
                progress.word_index,
                total_words,
                page,
            )));
            if let Some(page) = page {
                self.page_sync.reported = Some(page);
                self.push_event(EngineEvent::PageSync(page));
            }
        }

        if core::mem::take(&mut self.pending_start) {
            debug!("reader: deferred start document={}", id);
            self.play(now_ms);
        }
    }

    fn play(&mut self, now_ms: u64) {
        if let Some(id) = &self.loading {
            let id = id.clone();
            self.pending_start = true;
            self.push_event(EngineEvent::Loading(id));
            return;
        }
        if matches!(self.state, EngineState::Playing { .. }) {
            return;
        }
        let Some(open) = self.open.as_mut() else {
            debug!("reader: play ignored, no document");
            return;
        };
        if !open.document.is_readable() {
            let id = open.document.id.clone();
            self.push_event(EngineEvent::NoReadableText(id));
            return;
        }

        if open.primed && open.token_index + 1 >= open.document.tokens.len() {
            debug!("reader: restart from beginning document={}", open.document.id);
            open.token_index = 0;
            open.primed = false;
        }
        self.set_state(
            EngineState::Playing {
                next_step_ms: now_ms,
            },
            now_ms,
        );
    }

    fn pause(&mut self, now_ms: u64) {
        self.pending_start = false;
        if matches!(self.state, EngineState::Playing { .. }) {
            self.set_state(EngineState::Paused, now_ms);
        }
    }

    /// Hard stop: idle, stats cleared, scheduled work cancelled.
    fn reset(&mut self, now_ms: u64) {
        self.set_state(EngineState::Idle, now_ms);
        self.stats = SessionStats::default();
        self.pending_start = false;
        self.pending_scrub = None;
        self.page_sync.pending = None;
        self.generation = self.generation.wrapping_add(1);
        info!("reader: reset generation={}", self.generation);
    }

    fn step_words(&mut self, delta: i32, now_ms: u64) {
        self.pause(now_ms);
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let map = self.index.get_or_build(&open.document);
        let word_count = map.word_count();
        if word_count == 0 {
            return;
        }

        let current = map.word_index_for_token(open.token_index);
        let distance = delta.unsigned_abs() as usize;
        let target_word = if delta < 0 {
            current.saturating_sub(distance)
        } else {
            current.saturating_add(distance).min(word_count - 1)
        };
        let target = map.token_index_for_word(target_word);
        debug!(
            "nav: step delta={} word {} -> {}",
            delta, current, target_word
        );
        self.reposition(target, now_ms);
    }

    fn sentence_back(&mut self, now_ms: u64) {
        self.pause(now_ms);
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let target = sentence_start_before(&open.document.tokens, open.token_index);
        debug!("nav: sentence back token {} -> {}", open.token_index, target);
        self.reposition(target, now_ms);
    }

    fn sentence_forward(&mut self, now_ms: u64) {
        self.pause(now_ms);
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let target = sentence_start_after(&open.document.tokens, open.token_index);
        debug!("nav: sentence forward token {} -> {}", open.token_index, target);
        self.reposition(target, now_ms);
    }

    fn flush_scrub(&mut self, now_ms: u64) {
        let Some(word_index) = self.pending_scrub.take() else {
            return;
        };
        self.pause(now_ms);
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let target = self
            .index
            .get_or_build(&open.document)
            .token_index_for_word(word_index);
        debug!("nav: scrub word={} token={}", word_index, target);
        self.reposition(target, now_ms);
    }

    fn jump_to_page(&mut self, page: u32, now_ms: u64) {
        self.pause(now_ms);
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let Some(ranges) = open.document.page_ranges.as_deref() else {
            debug!("nav: page jump ignored, document={} has no pages", open.document.id);
            return;
        };
        let Some(start_word) = start_word_for_page(ranges, page) else {
            debug!("nav: page jump ignored, unknown page={}", page);
            return;
        };
        let target = self
            .index
            .get_or_build(&open.document)
            .token_index_for_word(start_word);
        debug!("nav: page={} start_word={} token={}", page, start_word, target);
        self.reposition(target, now_ms);
    }

    fn add_bookmark(&mut self, note: Option<String>) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let word_index = self
            .index
            .get_or_build(&open.document)
            .word_index_for_token(open.token_index);
        let note = note.filter(|note| !note.trim().is_empty());

        match open
            .bookmarks
            .binary_search_by_key(&word_index, |bookmark| bookmark.word_index)
        {
            Ok(at) => open.bookmarks[at].note = note,
            Err(at) => open.bookmarks.insert(at, Bookmark { word_index, note }),
        }
        debug!("nav: bookmark added word={} total={}", word_index, open.bookmarks.len());
        self.save_bookmarks();
    }

    fn remove_bookmark(&mut self, word_index: usize) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let before = open.bookmarks.len();
        open.bookmarks
            .retain(|bookmark| bookmark.word_index != word_index);
        if open.bookmarks.len() != before {
            debug!("nav: bookmark removed word={}", word_index);
            self.save_bookmarks();
        }
    }

    fn jump_to_bookmark(&mut self, slot: usize, now_ms: u64) {
        self.pause(now_ms);
        let Some(open) = self.open.as_ref() else {
            return;
        };
        let Some(bookmark) = open.bookmarks.get(slot) else {
            debug!("nav: no bookmark in slot={}", slot);
            return;
        };
        let target = self
            .index
            .get_or_build(&open.document)
            .token_index_for_word(bookmark.word_index);
        debug!("nav: bookmark slot={} word={}", slot, bookmark.word_index);
        self.reposition(target, now_ms);
    }

    fn save_bookmarks(&mut self) {
        if let Some((id, progress, _, _)) = self.snapshot() {
            self.persist_progress(&id, &progress);
        }
    }

    /// Move to `token_index` without touching session counters and show the
    /// token there.
    fn reposition(&mut self, token_index: usize, now_ms: u64) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let Some(last) = open.document.tokens.len().checked_sub(1) else {
            return;
        };
        open.token_index = token_index.min(last);
        open.primed = true;

        self.preview_current();
        self.after_move(now_ms);
    }

    fn preview_current(&mut self) {
        let render = self.open.as_ref().and_then(|open| {
            render_span(&open.document.tokens, &[open.token_index])
        });
        if let Some(render) = render {
            self.push_event(EngineEvent::Render(render));
        }
    }
}

/// Start of the sentence holding `index`, or of the previous sentence when
/// `index` already starts one.
fn sentence_start_before(tokens: &[Token], index: usize) -> usize {
    let Some(mut cursor) = index.min(tokens.len()).checked_sub(1) else {
        return 0;
    };

    while cursor > 0
        && (!tokens[cursor].is_word() || ends_sentence(&tokens[cursor]))
    {
        cursor -= 1;
    }
    let start = (0..cursor)
        .rev()
        .find(|&at| ends_sentence(&tokens[at]))
        .map_or(0, |at| at + 1);
    first_word_from(tokens, start)
}

/// Start of the sentence after the one holding `index`.
fn sentence_start_after(tokens: &[Token], index: usize) -> usize {
    let Some(last) = tokens.len().checked_sub(1) else {
        return 0;
    };
    let start = (index..tokens.len())
        .find(|&at| ends_sentence(&tokens[at]))
        .map_or(last, |at| (at + 1).min(last));
    first_word_from(tokens, start)
}

fn first_word_from(tokens: &[Token], index: usize) -> usize {
    (index..tokens.len())
        .find(|&at| tokens[at].is_word())
        .unwrap_or(index)
}
