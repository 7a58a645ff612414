//! Line input for the chat loop.
//!
//! Thin wrapper over `rustyline_async` so the loop sees three outcomes:
//! a submitted line, a cancel (Ctrl+C), or exit (Ctrl+D / terminal gone).

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};
use tracing::debug;

/// Outcome of one read from the terminal.
#[derive(Debug)]
pub enum InputEvent {
    /// A submitted line, already trimmed.
    Line(String),
    /// Ctrl+C: drop the current line, keep the session.
    Cancel,
    /// Ctrl+D or a broken terminal: leave the chat.
    Exit,
}

/// Async line reader for the chat prompt.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Build the reader plus the `SharedWriter` background tasks print
    /// through without clobbering the prompt line.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt)?;
        Ok((Self { rl }, writer))
    }

    /// Wait for the next input event.
    pub async fn next(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(ReadlineEvent::Line(line)) => InputEvent::Line(line.trim().to_string()),
            Ok(ReadlineEvent::Interrupted) => InputEvent::Cancel,
            Ok(ReadlineEvent::Eof) => InputEvent::Exit,
            Err(e) => {
                debug!(error = %e, "readline failed, leaving chat");
                InputEvent::Exit
            }
        }
    }

    /// Clear the terminal screen.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}
