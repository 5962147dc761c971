// src/error.rs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data_structures::LaneId;

/// Everything that can go wrong inside the junction.
///
/// Only [`JunctionError::GuardPoisoned`] is fatal. The rest are absorbed by the
/// worker that hit them and show up as log lines or counters.
#[derive(Debug, Error)]
pub enum JunctionError {
    #[error("lane {lane} is full, vehicle {vehicle_id} dropped")]
    QueueFull { lane: LaneId, vehicle_id: String },

    #[error("lane {lane} has no vehicle to serve")]
    QueueEmpty { lane: LaneId },

    #[error("malformed record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("vehicle source {} unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("junction state guard poisoned by a panicked worker")]
    GuardPoisoned,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl JunctionError {
    /// True for the kinds a worker logs and moves past.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, JunctionError::GuardPoisoned)
    }
}

pub type JunctionResult<T> = Result<T, JunctionError>;
