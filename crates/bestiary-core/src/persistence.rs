//! Save and load of entity populations.
//!
//! # Format
//!
//! Plain text, whitespace separated. The first token is the number of
//! records; each record is exactly three integers: the kind tag (see
//! [`Kind::tag`]), then `x`, then `y`. [`save`] writes one token per line:
//!
//! ```text
//! 2
//! 2
//! 10
//! 10
//! 1
//! 12
//! 11
//! ```
//!
//! # Policy
//!
//! Only living entities are saved, and every loaded entity is alive. A
//! malformed record is reported and skipped without aborting the load; only
//! an unreadable input or a bad leading count fails the whole load.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

use crate::entity::{Entity, EntityFactory, EntityRecord, Kind};
use crate::error::{PersistenceError, RecordError};

/// Writes `records` in the save format. Returns the number written.
///
/// # Errors
///
/// Returns any I/O error from `writer`.
pub fn write_records<W: Write>(records: &[EntityRecord], mut writer: W) -> std::io::Result<usize> {
    writeln!(writer, "{}", records.len())?;
    for record in records {
        writeln!(writer, "{}", record.kind.tag())?;
        writeln!(writer, "{}", record.position.x)?;
        writeln!(writer, "{}", record.position.y)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Saves every living entity. Returns the number of entities written.
///
/// Each entity is snapshotted under its own lock, so saving a running world
/// yields a per-entity consistent, not globally atomic, picture.
///
/// # Errors
///
/// Returns any I/O error from `writer`.
pub fn save<W: Write>(entities: &[Arc<Entity>], writer: W) -> std::io::Result<usize> {
    let records: Vec<EntityRecord> = entities
        .iter()
        .map(|entity| entity.snapshot())
        .filter(|snapshot| snapshot.alive)
        .map(|snapshot| EntityRecord::from(&snapshot))
        .collect();
    write_records(&records, writer)
}

/// Saves every living entity to the file at `path`, replacing it.
///
/// # Errors
///
/// Returns [`PersistenceError::Io`] if the file cannot be created or written.
pub fn save_to_path(entities: &[Arc<Entity>], path: impl AsRef<Path>) -> Result<usize, PersistenceError> {
    let file = File::create(path)?;
    Ok(save(entities, BufWriter::new(file))?)
}

/// Outcome of a load: what was rebuilt and what was skipped.
#[derive(Debug)]
pub struct LoadReport {
    /// Entities rebuilt from well-formed records, in file order
    pub entities: Vec<Arc<Entity>>,
    /// One diagnostic per skipped record
    pub errors: Vec<RecordError>,
    /// Record count announced by the file header
    pub expected: usize,
}

impl LoadReport {
    /// Returns `true` if every announced record loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.entities.len() == self.expected
    }

    /// Discards the diagnostics and returns the loaded entities.
    #[must_use]
    pub fn into_entities(self) -> Vec<Arc<Entity>> {
        self.entities
    }
}

fn parse_record(record: usize, tag: &str, x: &str, y: &str) -> Result<EntityRecord, RecordError> {
    let kind = tag
        .parse::<u8>()
        .ok()
        .and_then(Kind::from_tag)
        .ok_or_else(|| RecordError::UnknownKind {
            record,
            tag: tag.to_owned(),
        })?;
    let coordinate = |axis: &'static str, value: &str| {
        value
            .parse::<i32>()
            .map_err(|_| RecordError::InvalidCoordinate {
                record,
                axis,
                value: value.to_owned(),
            })
    };
    Ok(EntityRecord::new(kind, coordinate("x", x)?, coordinate("y", y)?))
}

/// Reads a population in the save format, building entities with `factory`.
///
/// Malformed records are collected in [`LoadReport::errors`] and skipped. If
/// the input ends early, a single [`RecordError::Truncated`] is reported for
/// the first missing record. Tokens past the announced count are ignored.
///
/// # Errors
///
/// Returns [`PersistenceError`] if the input cannot be read or its leading
/// count is missing or not a non-negative integer.
pub fn load<R: Read>(mut reader: R, factory: &EntityFactory) -> Result<LoadReport, PersistenceError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    let mut tokens = input.split_whitespace();
    let count = tokens.next().ok_or(PersistenceError::MissingCount)?;
    let expected: usize = count
        .parse()
        .map_err(|_| PersistenceError::InvalidCount(count.to_owned()))?;

    let mut report = LoadReport {
        entities: Vec::with_capacity(expected.min(4096)),
        errors: Vec::new(),
        expected,
    };

    for record in 0..expected {
        let (Some(tag), Some(x), Some(y)) = (tokens.next(), tokens.next(), tokens.next()) else {
            tracing::warn!(record, expected, "save data ended early");
            report.errors.push(RecordError::Truncated { record });
            break;
        };

        let loaded = parse_record(record, tag, x, y).and_then(|parsed| {
            factory
                .from_record(&parsed)
                .map_err(|source| RecordError::Spawn { record, source })
        });
        match loaded {
            Ok(entity) => report.entities.push(entity),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed record");
                report.errors.push(err);
            }
        }
    }

    if tokens.next().is_some() {
        tracing::debug!(expected, "ignoring data past the last record");
    }

    tracing::info!(
        loaded = report.entities.len(),
        skipped = report.errors.len(),
        expected,
        "population loaded"
    );
    Ok(report)
}

/// Loads a population from the file at `path`.
///
/// # Errors
///
/// Same as [`load`], plus [`PersistenceError::Io`] if the file cannot be
/// opened.
pub fn load_from_path(path: impl AsRef<Path>, factory: &EntityFactory) -> Result<LoadReport, PersistenceError> {
    let file = File::open(path)?;
    load(file, factory)
}
