impl<ST, IN> ReaderApp<ST, IN>
where
    ST: DocumentStore,
    IN: CommandProvider,
{
    pub fn new(store: ST, commands: IN, settings: ReaderSettings) -> Self {
        Self {
            store,
            commands,
            settings: settings.sanitized(),
            index: IndexCache::new(),
            open: None,
            loading: None,
            pending_start: false,
            generation: 0,
            state: EngineState::Idle,
            stats: SessionStats::default(),
            events: Deque::new(),
            pending_scrub: None,
            page_sync: PageSyncState::default(),
            storage_degraded: false,
            render_requested: false,
        }
    }

    /// Drain commands, apply a coalesced scrub, run at most one playback step
    /// and flush a due page sync.
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        self.render_requested = false;

        self.process_commands(now_ms);
        self.flush_scrub(now_ms);
        self.run_playback(now_ms);
        self.flush_page_sync(now_ms);

        if self.render_requested {
            TickResult::RenderRequested
        } else {
            TickResult::NoRender
        }
    }

    /// Earliest moment the engine needs a tick without new commands.
    pub fn next_wakeup(&self) -> Option<Wakeup> {
        let step = match self.state {
            EngineState::Playing { next_step_ms } => Some(next_step_ms),
            EngineState::Idle | EngineState::Paused => None,
        };
        let sync = self.page_sync.pending.map(|(_, due_ms)| due_ms);

        let at_ms = match (step, sync) {
            (Some(step), Some(sync)) => step.min(sync),
            (Some(at), None) | (None, Some(at)) => at,
            (None, None) => return None,
        };
        Some(Wakeup {
            generation: self.generation,
            at_ms,
        })
    }

    pub fn on_wakeup(&mut self, wakeup: Wakeup, now_ms: u64) -> TickResult {
        if wakeup.generation != self.generation {
            debug!(
                "reader: stale wakeup generation={} current={}",
                wakeup.generation, self.generation
            );
            return TickResult::NoRender;
        }
        self.tick(now_ms)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        core::iter::from_fn(|| self.events.pop_front())
    }

    /// Content for a document, from an import or a late-resolving store.
    ///
    /// The document is written to the store. When it is the one being waited
    /// on (or the one already open) it becomes the active document.
    pub fn provide_document(&mut self, document: Document, now_ms: u64) {
        if let Err(error) = self.store.save_document(&document) {
            self.storage_failed(StorageOperation::SaveDocument, &error);
        }

        let awaited = self.loading.as_ref() == Some(&document.id);
        let reopened = self
            .open
            .as_ref()
            .is_some_and(|open| open.document.id == document.id);
        if awaited {
            self.activate(document, now_ms);
        } else if reopened {
            self.close_current(now_ms);
            self.activate(document, now_ms);
        } else {
            debug!("reader: stored document={} without opening", document.id);
        }
    }

    pub fn progress(&mut self) -> Option<ProgressView> {
        let open = self.open.as_ref()?;
        let map = self.index.get_or_build(&open.document);
        let word_index = map.word_index_for_token(open.token_index);
        Some(ProgressView::new(
            word_index,
            map.word_count(),
            open.document.page_for_word(word_index),
        ))
    }

    pub fn session_stats(&self, now_ms: u64) -> SessionStatsView {
        self.stats.view(now_ms)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state.public()
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn document(&self) -> Option<&Document> {
        self.open.as_ref().map(|open| &open.document)
    }

    pub fn token_index(&self) -> Option<usize> {
        self.open.as_ref().map(|open| open.token_index)
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        match &self.open {
            Some(open) => &open.bookmarks,
            None => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn commands_mut(&mut self) -> &mut IN {
        &mut self.commands
    }

    pub fn store_mut(&mut self) -> &mut ST {
        &mut self.store
    }
}
