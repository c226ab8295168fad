//! Combat resolution.
//!
//! A resolver answers one question: when `attacker` engages `defender`, does
//! the defender die? The answer depends only on the two [`Kind`]s, in order,
//! so resolution needs no locks and no access to world state.
//!
//! # Invariants
//!
//! - Resolvers MUST be pure: the same `(attacker, defender)` pair always
//!   yields the same verdict
//! - Resolvers MUST be total over every kind pair
//! - Order matters: `resolve(a, b)` and `resolve(b, a)` are independent
//!
//! # Available Resolvers
//!
//! - [`CombatResolver`]: Data-driven rule table, with the standard bestiary
//!   rules as its default

mod combat;

pub use combat::{CombatResolver, RuleTable};

use crate::entity::Kind;

/// Decides the outcome of a one-directional fight.
///
/// The fight manager calls this once per fight event, from its own worker
/// thread, so implementations must be `Send + Sync`. Mutual kills are not
/// modelled here: each ordering of a pair is a separate event.
///
/// # Example
///
/// ```
/// use bestiary_core::entity::Kind;
/// use bestiary_core::resolver::Resolver;
///
/// /// Everyone survives everything.
/// struct Pacifist;
///
/// impl Resolver for Pacifist {
///     fn resolve(&self, _attacker: Kind, _defender: Kind) -> bool {
///         false
///     }
/// }
///
/// assert!(!Pacifist.resolve(Kind::BlackKnight, Kind::Dragon));
/// ```
pub trait Resolver: Send + Sync {
    /// Returns `true` if `defender` dies when attacked by `attacker`.
    fn resolve(&self, attacker: Kind, defender: Kind) -> bool;
}
