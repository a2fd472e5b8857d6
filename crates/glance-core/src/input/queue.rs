use alloc::collections::VecDeque;

use super::{CommandProvider, ReaderCommand};

/// FIFO of commands pushed by the host between ticks.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<ReaderCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: ReaderCommand) {
        self.pending.push_back(command);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl CommandProvider for CommandQueue {
    type Error = core::convert::Infallible;

    fn poll_command(&mut self) -> Result<Option<ReaderCommand>, Self::Error> {
        Ok(self.pending.pop_front())
    }
}

/// Source that never yields a command.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoCommands;

impl CommandProvider for NoCommands {
    type Error = core::convert::Infallible;

    fn poll_command(&mut self) -> Result<Option<ReaderCommand>, Self::Error> {
        Ok(None)
    }
}
