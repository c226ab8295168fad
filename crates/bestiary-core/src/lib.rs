//! # Bestiary Core
//!
//! Concurrent world simulation of roaming dragons and knights.
//!
//! A fixed population wanders a bounded 2D world on its own threads. Units
//! that come close enough fight; a rule table decides who dies, and a single
//! fight manager applies every death so no unit is ever killed twice.
//!
//! ## Architecture
//!
//! - **Entities**: [`entity::Entity`] with per-unit `RwLock` state, built by
//!   an [`entity::EntityFactory`]
//! - **Resolvers**: [`resolver::CombatResolver`], the kind-vs-kind rule table
//! - **Observers**: [`observer::Notifier`] fan-out of kills to listeners
//! - **Fight manager**: [`fight::FightManager`], the serializing consumer of
//!   fight events
//! - **World**: [`world::World`] and its mover, detector and renderer threads
//!
//! Persistence ([`persistence`]) and rendering ([`render`]) are the two
//! boundaries to the outside world.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use bestiary_core::{FightManager, LogObserver, Notifier, World, WorldConfig};
//! use bestiary_core::entity::EntitySnapshot;
//!
//! let mut notifier = Notifier::new();
//! notifier.subscribe(Arc::new(LogObserver));
//!
//! let world = World::generate(WorldConfig { population: 10, ..WorldConfig::default() });
//! let running = world
//!     .start(
//!         FightManager::with_standard_rules(notifier),
//!         Box::new(|_: &[EntitySnapshot]| {}),
//!     )
//!     .unwrap();
//! let world = running.into_world();
//! assert!(world.alive_count() <= 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod entity;
pub mod error;
pub mod fight;
pub mod observer;
pub mod persistence;
pub mod render;
pub mod resolver;
pub mod shutdown;
pub mod world;

pub use config::WorldConfig;
pub use entity::{Bounds, Entity, EntityFactory, EntityId, EntitySnapshot, Kind};
pub use fight::{FightEvent, FightManager, FightQueue, FightStats};
pub use observer::{FightLog, FightObserver, LogObserver, Notifier};
pub use render::{GridRenderer, Renderer};
pub use resolver::{CombatResolver, Resolver};
pub use world::{RunningWorld, World, WorldStatus};

#[cfg(test)]
mod tests;
