//! Summary of a replayed event log.

use modernart_core::{GameState, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened to each line of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Applied,
    Rejected,
    Faulted,
    Malformed,
}

/// Counts per outcome and the standings at the end of the log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Non-blank lines read
    pub events: usize,
    pub applied: usize,
    pub rejected: usize,
    pub faulted: usize,
    /// Lines that did not decode as an event
    pub malformed: usize,
    pub round_index: u32,
    /// Total score per user over closed rounds
    pub scores: BTreeMap<UserId, i64>,
}

impl ReplayReport {
    /// Count one line
    pub fn record(&mut self, status: LineStatus) {
        self.events += 1;
        match status {
            LineStatus::Applied => self.applied += 1,
            LineStatus::Rejected => self.rejected += 1,
            LineStatus::Faulted => self.faulted += 1,
            LineStatus::Malformed => self.malformed += 1,
        }
    }

    /// Fill in the standings from the final state
    pub fn with_standings(mut self, state: &GameState) -> Self {
        self.round_index = state.round_index;
        self.scores = state
            .users
            .keys()
            .map(|id| (id.clone(), state.total_score(id)))
            .collect();
        self
    }
}
