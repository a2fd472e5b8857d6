impl<ST, IN> ReaderApp<ST, IN>
where
    ST: DocumentStore,
    IN: CommandProvider,
{
    fn process_commands(&mut self, now_ms: u64) {
        loop {
            match self.commands.poll_command() {
                Ok(Some(ReaderCommand::Scrub(word_index))) => {
                    self.pending_scrub = Some(word_index);
                }
                Ok(Some(command)) => {
                    self.flush_scrub(now_ms);
                    self.apply_command(command, now_ms);
                }
                Ok(None) => break,
                Err(_) => {
                    warn!("reader: command provider failed");
                    break;
                }
            }
        }
    }

    fn apply_command(&mut self, command: ReaderCommand, now_ms: u64) {
        debug!("reader: command={:?} state={:?}", command, self.state);

        match command {
            ReaderCommand::Open(id) => self.open_document(id, now_ms),
            ReaderCommand::Play => self.play(now_ms),
            ReaderCommand::Pause => self.pause(now_ms),
            ReaderCommand::TogglePlay => {
                if matches!(self.state, EngineState::Playing { .. }) {
                    self.pause(now_ms);
                } else {
                    self.play(now_ms);
                }
            }
            ReaderCommand::Reset => self.reset(now_ms),
            ReaderCommand::Step(delta) => self.step_words(delta, now_ms),
            ReaderCommand::SentenceBack => self.sentence_back(now_ms),
            ReaderCommand::SentenceForward => self.sentence_forward(now_ms),
            ReaderCommand::Scrub(word_index) => self.pending_scrub = Some(word_index),
            ReaderCommand::JumpToPage(page) => self.jump_to_page(page, now_ms),
            ReaderCommand::AddBookmark { note } => self.add_bookmark(note),
            ReaderCommand::RemoveBookmark { word_index } => self.remove_bookmark(word_index),
            ReaderCommand::JumpToBookmark(slot) => self.jump_to_bookmark(slot, now_ms),
            ReaderCommand::UpdateSettings(settings) => self.update_settings(settings),
        }
    }

    fn update_settings(&mut self, settings: ReaderSettings) {
        let settings = settings.sanitized();
        if settings == self.settings {
            return;
        }
        info!(
            "reader: settings wpm={} intensity={} auto_pause={} chunk={}",
            settings.wpm, settings.pause_intensity, settings.auto_pause, settings.chunk_size
        );
        self.settings = settings;
    }
}
