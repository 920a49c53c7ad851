//! A single table being replayed.

use crate::report::{LineStatus, ReplayReport};
use modernart_core::{ErrorKind, Event, EventError, GameState, Outcome, Rules};
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("line {line}: {source}")]
    MalformedEvent {
        line: usize,
        #[source]
        source: EventError,
    },

    #[error("failed to read event log: {0}")]
    Io(#[from] std::io::Error),
}

/// Replays events into one game, counting what happened to each
pub struct Session {
    state: GameState,
    report: ReplayReport,
    /// Abort on the first line that is not an event
    strict: bool,
    line: usize,
}

impl Session {
    pub fn new(rules: Rules, strict: bool) -> Self {
        Self {
            state: GameState::with_rules(rules),
            report: ReplayReport::default(),
            strict,
            line: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Counts so far, with standings from the current state
    pub fn report(&self) -> ReplayReport {
        self.report.clone().with_standings(&self.state)
    }

    /// Apply one line of the log. Blank lines are skipped.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<LineStatus>, SessionError> {
        self.line += 1;
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let event = match Event::from_json(line) {
            Ok(event) => event,
            Err(source) if self.strict => {
                return Err(SessionError::MalformedEvent {
                    line: self.line,
                    source,
                });
            }
            Err(e) => {
                warn!(line = self.line, error = %e, "skipping malformed event");
                self.report.record(LineStatus::Malformed);
                return Ok(Some(LineStatus::Malformed));
            }
        };

        let status = match self.state.apply(&event) {
            Outcome::Applied(next) => {
                debug!(line = self.line, event = event.name(), "applied");
                self.state = next;
                LineStatus::Applied
            }
            Outcome::Rejected(e) if e.kind() == ErrorKind::NotApplicable => {
                debug!(line = self.line, event = event.name(), reason = %e, "nothing to apply");
                LineStatus::Rejected
            }
            Outcome::Rejected(e) => {
                warn!(line = self.line, event = event.name(), error = %e, "skipping invalid event");
                LineStatus::Rejected
            }
            Outcome::Faulted(e) => {
                error!(line = self.line, event = event.name(), error = %e, "failed to reduce");
                LineStatus::Faulted
            }
        };

        self.report.record(status);
        Ok(Some(status))
    }

    /// Apply every line from `reader`
    pub async fn replay<R>(&mut self, reader: R) -> Result<(), SessionError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            self.handle_line(&line)?;
        }
        Ok(())
    }
}
