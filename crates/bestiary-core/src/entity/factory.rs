//! Entity construction.
//!
//! The factory is the single place entities are born, whether freshly
//! generated at startup or rebuilt from a save file. It hands out unique
//! [`EntityId`]s and enforces that every starting position lies inside the
//! world bounds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Bounds, Entity, EntityId, EntitySnapshot, Kind};
use crate::error::SpawnError;

/// The persisted shape of an entity: kind and position, nothing else.
///
/// Liveness is not part of a record. Only living entities are saved, and
/// every entity rebuilt from a record starts alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity kind
    pub kind: Kind,
    /// Position in world coordinates
    pub position: IVec2,
}

impl EntityRecord {
    /// Creates a record for `kind` at `(x, y)`.
    #[must_use]
    pub const fn new(kind: Kind, x: i32, y: i32) -> Self {
        Self {
            kind,
            position: IVec2::new(x, y),
        }
    }
}

impl From<&EntitySnapshot> for EntityRecord {
    fn from(snapshot: &EntitySnapshot) -> Self {
        Self {
            kind: snapshot.kind,
            position: snapshot.position,
        }
    }
}

/// Builds entities with unique ids inside a fixed world rectangle.
///
/// The id counter is atomic, so a factory can be shared between threads.
///
/// # Example
///
/// ```
/// use bestiary_core::entity::{Bounds, EntityFactory, Kind};
/// use glam::IVec2;
///
/// let factory = EntityFactory::new(Bounds::new(100, 100));
/// let dragon = factory.create(Kind::Dragon, IVec2::new(12, 11)).unwrap();
/// let knight = factory.create(Kind::Knight, IVec2::new(10, 10)).unwrap();
///
/// assert_ne!(dragon.id(), knight.id());
/// assert!(factory.create(Kind::Knight, IVec2::new(101, 0)).is_err());
/// ```
#[derive(Debug)]
pub struct EntityFactory {
    bounds: Bounds,
    next_id: AtomicU64,
}

impl EntityFactory {
    /// Creates a factory for the given world bounds. Ids start at 0.
    #[must_use]
    pub const fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns the world bounds this factory validates against.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn next_id(&self) -> EntityId {
        EntityId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a living entity of `kind` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::OutOfBounds`] if `position` is outside the
    /// factory's bounds. No id is consumed in that case.
    pub fn create(&self, kind: Kind, position: IVec2) -> Result<Arc<Entity>, SpawnError> {
        if !self.bounds.contains(position) {
            return Err(SpawnError::OutOfBounds {
                kind,
                position,
                bounds: self.bounds,
            });
        }
        Ok(Arc::new(Entity::new(self.next_id(), kind, position)))
    }

    /// Rebuilds a living entity from a persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::OutOfBounds`] if the record's position is
    /// outside the factory's bounds.
    pub fn from_record(&self, record: &EntityRecord) -> Result<Arc<Entity>, SpawnError> {
        self.create(record.kind, record.position)
    }

    /// Creates an entity of a uniformly random kind at a uniformly random
    /// in-bounds position.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Arc<Entity> {
        let kind = Kind::ALL[rng.gen_range(0..Kind::COUNT)];
        let position = IVec2::new(
            rng.gen_range(0..=self.bounds.max_x.max(0)),
            rng.gen_range(0..=self.bounds.max_y.max(0)),
        );
        Arc::new(Entity::new(self.next_id(), kind, position))
    }

    /// Creates `count` random entities.
    pub fn populate<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<Arc<Entity>> {
        (0..count).map(|_| self.random(rng)).collect()
    }
}
