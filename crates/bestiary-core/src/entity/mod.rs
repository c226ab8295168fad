//! Entity module for the world simulation.
//!
//! This module provides the core unit types:
//! - [`EntityId`]: Unique identifier for entities
//! - [`Kind`]: The concrete unit type (Dragon, Knight, `BlackKnight`)
//! - [`Bounds`]: The world rectangle positions are clamped to
//! - [`Entity`]: A unit with its `(position, alive)` state behind a per-entity lock
//! - [`EntitySnapshot`]: A consistent copy of one entity's state
//!
//! # Locking
//!
//! Every entity owns its own `RwLock`. Readers (detector, renderer) take the
//! shared lock, writers (mover, fight manager) take the exclusive lock, and
//! no code path ever holds two entities' locks at once. Cross-entity logic
//! works from snapshots taken one entity at a time.
//!
//! # Example
//!
//! ```
//! use bestiary_core::entity::{Bounds, Entity, EntityId, Kind};
//! use glam::IVec2;
//!
//! let knight = Entity::new(EntityId::new(1), Kind::Knight, IVec2::new(10, 10));
//! knight.move_by(IVec2::new(-50, 5), Bounds::new(100, 100));
//!
//! assert_eq!(knight.position(), IVec2::new(0, 15));
//! assert!(knight.kill());
//! assert!(!knight.is_alive());
//! ```

pub mod factory;

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glam::IVec2;
use serde::{Deserialize, Serialize};

pub use factory::{EntityFactory, EntityRecord};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Identifiers are handed out by
/// an [`EntityFactory`] and are unique within it; they are what a fight event
/// compares to reject an entity attacking itself.
///
/// # Example
///
/// ```
/// use bestiary_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// The concrete type of a unit.
///
/// `Kind` is the only thing combat resolution looks at: the outcome of a fight
/// is a pure function of the ordered `(attacker, defender)` kind pair (see
/// [`CombatResolver`](crate::resolver::CombatResolver)).
///
/// # Persistence Tags
///
/// Each kind has a stable numeric tag used by the save format:
/// `Dragon = 1`, `Knight = 2`, `BlackKnight = 3`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// Slays knights, falls to knights and black knights
    Dragon,
    /// Slays dragons, falls to other knights and black knights
    Knight,
    /// Lethal to every kind, including other black knights
    BlackKnight,
}

impl Kind {
    /// Number of kinds.
    pub const COUNT: usize = 3;

    /// All kinds in tag order.
    pub const ALL: [Self; Self::COUNT] = [Self::Dragon, Self::Knight, Self::BlackKnight];

    /// Dense index in `0..Kind::COUNT`, used to address rule tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Dragon => 0,
            Self::Knight => 1,
            Self::BlackKnight => 2,
        }
    }

    /// Numeric tag written by the save format.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Dragon => 1,
            Self::Knight => 2,
            Self::BlackKnight => 3,
        }
    }

    /// Looks up a kind by its save-format tag.
    ///
    /// Returns `None` for any tag other than 1, 2 or 3.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Dragon),
            2 => Some(Self::Knight),
            3 => Some(Self::BlackKnight),
            _ => None,
        }
    }

    /// Single-character glyph used by the grid renderer.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Dragon => 'D',
            Self::Knight => 'K',
            Self::BlackKnight => 'B',
        }
    }

    /// Lower-case human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dragon => "dragon",
            Self::Knight => "knight",
            Self::BlackKnight => "black knight",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The world rectangle `[0, max_x] x [0, max_y]`.
///
/// Both edges are inclusive: a unit standing exactly on `max_x` is in bounds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Largest valid x coordinate
    pub max_x: i32,
    /// Largest valid y coordinate
    pub max_y: i32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

impl Bounds {
    /// Creates bounds with the given inclusive maxima.
    #[must_use]
    pub const fn new(max_x: i32, max_y: i32) -> Self {
        Self { max_x, max_y }
    }

    /// Returns the inclusive maximum corner.
    #[must_use]
    pub const fn max(self) -> IVec2 {
        IVec2::new(self.max_x, self.max_y)
    }

    /// Returns `true` if `position` lies inside the rectangle.
    #[must_use]
    pub const fn contains(self, position: IVec2) -> bool {
        position.x >= 0 && position.x <= self.max_x && position.y >= 0 && position.y <= self.max_y
    }

    /// Pins each axis of `position` into the rectangle independently.
    #[must_use]
    pub fn clamp(self, position: IVec2) -> IVec2 {
        IVec2::new(
            position.x.min(self.max_x).max(0),
            position.y.min(self.max_y).max(0),
        )
    }
}

/// Returns `true` if `a` and `b` are at most `distance` apart.
///
/// Compares squared Euclidean distance in unsigned 64-bit integers, without a
/// square root. Each squared term fits in a `u64`; their sum saturates, which
/// only happens when it already exceeds any `distance` squared.
#[must_use]
pub fn within_distance(a: IVec2, b: IVec2, distance: u32) -> bool {
    let dx = u64::from(a.x.abs_diff(b.x));
    let dy = u64::from(a.y.abs_diff(b.y));
    let limit = u64::from(distance);
    (dx * dx).saturating_add(dy * dy) <= limit * limit
}

/// Mutable state guarded by an entity's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntityState {
    position: IVec2,
    alive: bool,
}

/// A unit in the world.
///
/// `id` and `kind` never change and are readable without locking. The
/// `(position, alive)` pair lives behind a per-entity `RwLock` so the mover,
/// detector, renderer and fight manager never observe a torn triple.
///
/// # Invariants
///
/// - Death is terminal: once [`Entity::kill`] succeeds, `is_alive` stays `false`
/// - Dead entities do not move
///
/// Entities are normally built through an [`EntityFactory`], which also
/// guarantees the starting position is inside the world bounds.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: Kind,
    state: RwLock<EntityState>,
}

impl Entity {
    /// Creates a living entity at `position`.
    ///
    /// The position is taken as-is; use [`EntityFactory::create`] for a
    /// bounds-checked constructor.
    #[must_use]
    pub fn new(id: EntityId, kind: Kind, position: IVec2) -> Self {
        Self {
            id,
            kind,
            state: RwLock::new(EntityState {
                position,
                alive: true,
            }),
        }
    }

    // The guarded state is two plain values, so a writer that panicked cannot
    // leave it half-updated in a way readers care about.
    fn read(&self) -> RwLockReadGuard<'_, EntityState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, EntityState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's kind.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Returns the current position under a shared lock.
    #[must_use]
    pub fn position(&self) -> IVec2 {
        self.read().position
    }

    /// Returns `true` while the entity has not been killed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.read().alive
    }

    /// Moves the entity by `delta`, clamping each axis into `bounds`.
    ///
    /// Deltas that would leave the world are truncated at the boundary rather
    /// than rejected, and coordinates never wrap. Dead entities stay put.
    ///
    /// Returns the position after the move.
    pub fn move_by(&self, delta: IVec2, bounds: Bounds) -> IVec2 {
        let mut state = self.write();
        if state.alive {
            let target = IVec2::new(
                state.position.x.saturating_add(delta.x),
                state.position.y.saturating_add(delta.y),
            );
            state.position = bounds.clamp(target);
        }
        state.position
    }

    /// Marks the entity dead.
    ///
    /// Idempotent. Returns `true` only for the call that actually performed
    /// the transition, which lets callers fire exactly one notification per
    /// death.
    pub fn kill(&self) -> bool {
        let mut state = self.write();
        let was_alive = state.alive;
        state.alive = false;
        was_alive
    }

    /// Copies `(id, kind, position, alive)` under a single shared lock.
    #[must_use]
    pub fn snapshot(&self) -> EntitySnapshot {
        let state = *self.read();
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            position: state.position,
            alive: state.alive,
        }
    }

    /// Returns `true` if `other` is within `distance` of this entity.
    ///
    /// The two positions are read one after the other, never under both locks
    /// at once, so the answer may be slightly stale under concurrent movement.
    #[must_use]
    pub fn is_close(&self, other: &Self, distance: u32) -> bool {
        let here = self.position();
        let there = other.position();
        within_distance(here, there, distance)
    }
}

/// A consistent copy of one entity's state.
///
/// Each snapshot is internally consistent; a collection of snapshots taken
/// one after another may reflect slightly different instants per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity identifier
    pub id: EntityId,
    /// Entity kind
    pub kind: Kind,
    /// Position at snapshot time
    pub position: IVec2,
    /// Liveness at snapshot time
    pub alive: bool,
}

impl EntitySnapshot {
    /// Returns `true` if `other` is within `distance` of this snapshot.
    #[must_use]
    pub fn is_close(&self, other: &Self, distance: u32) -> bool {
        within_distance(self.position, other.position, distance)
    }
}

impl fmt::Display for EntitySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {{ x:{}, y:{} }}",
            self.kind, self.position.x, self.position.y
        )
    }
}
