//! Deposit status state machine
//!
//! RECEIVED → REGISTERED → IN_PROGRESS → COMPLETED | REJECTED | FAILED
//!
//! History is append-only: a record only ever gains transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TrackingId;

/// Lifecycle state of a deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    /// Accepted by the service
    Received,
    /// Tracking recorded, awaiting downstream pickup
    Registered,
    /// Downstream processing started
    InProgress,
    /// Published successfully
    Completed,
    /// Refused by downstream review
    Rejected,
    /// Processing failed
    Failed,
}

impl SubmissionState {
    pub const ALL: [SubmissionState; 6] = [
        SubmissionState::Received,
        SubmissionState::Registered,
        SubmissionState::InProgress,
        SubmissionState::Completed,
        SubmissionState::Rejected,
        SubmissionState::Failed,
    ];

    /// Stored and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Received => "RECEIVED",
            SubmissionState::Registered => "REGISTERED",
            SubmissionState::InProgress => "IN_PROGRESS",
            SubmissionState::Completed => "COMPLETED",
            SubmissionState::Rejected => "REJECTED",
            SubmissionState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Completed | SubmissionState::Rejected | SubmissionState::Failed
        )
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;

        matches!(
            (self, next),
            (Received, Registered)
                | (Registered, InProgress)
                | (InProgress, Completed)
                | (InProgress, Rejected)
                | (InProgress, Failed)
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubmissionState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown submission state: {}", s))
    }
}

/// One entry of a record's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    /// `None` for the initial entry
    pub from: Option<SubmissionState>,
    pub to: SubmissionState,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// Status of one deposit as returned to its owner
#[derive(Debug, Clone, Serialize)]
pub struct StatusRecord {
    pub tracking_id: TrackingId,
    pub username: String,
    pub state: SubmissionState,
    pub created_at: DateTime<Utc>,
    /// Oldest first
    pub history: Vec<StateTransition>,
}
