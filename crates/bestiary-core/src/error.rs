//! Error types.
//!
//! Only persistence and configuration surface errors to callers. Everything
//! inside the running simulation (stale fight events, clamped moves, observer
//! panics) is recovered locally and logged.

use glam::IVec2;
use thiserror::Error;

use crate::entity::{Bounds, Kind};

/// An entity could not be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The requested position lies outside the world rectangle.
    #[error("{kind} at ({}, {}) is outside the world (0..={}, 0..={})", .position.x, .position.y, .bounds.max_x, .bounds.max_y)]
    OutOfBounds {
        /// Kind that was requested
        kind: Kind,
        /// Offending position
        position: IVec2,
        /// World bounds at the time
        bounds: Bounds,
    },
}

/// A single record in a save file could not be turned into an entity.
///
/// Record errors are not fatal to a load: the record is skipped and the
/// error is reported alongside the entities that did load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The kind tag is not one of the known kinds.
    #[error("record {record}: unknown kind tag {tag:?}")]
    UnknownKind {
        /// Zero-based record index
        record: usize,
        /// Raw tag token
        tag: String,
    },

    /// A coordinate token is not an integer.
    #[error("record {record}: invalid {axis} coordinate {value:?}")]
    InvalidCoordinate {
        /// Zero-based record index
        record: usize,
        /// `"x"` or `"y"`
        axis: &'static str,
        /// Raw coordinate token
        value: String,
    },

    /// The record parsed but the factory refused it.
    #[error("record {record}: {source}")]
    Spawn {
        /// Zero-based record index
        record: usize,
        /// Underlying factory error
        #[source]
        source: SpawnError,
    },

    /// The input ended before this record was complete.
    #[error("record {record}: input ended early")]
    Truncated {
        /// Zero-based record index
        record: usize,
    },
}

impl RecordError {
    /// Zero-based index of the record this error refers to.
    #[must_use]
    pub const fn record(&self) -> usize {
        match self {
            Self::UnknownKind { record, .. }
            | Self::InvalidCoordinate { record, .. }
            | Self::Spawn { record, .. }
            | Self::Truncated { record } => *record,
        }
    }
}

/// A save file could not be read or written at all.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input was empty.
    #[error("missing entity count")]
    MissingCount,

    /// The leading count is not a non-negative integer.
    #[error("invalid entity count {0:?}")]
    InvalidCount(String),
}

/// A world configuration could not be loaded or is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid JSON for a `WorldConfig`.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the simulation cannot run with.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}
