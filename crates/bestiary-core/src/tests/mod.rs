//! Cross-module tests.
//!
//! - `integration.rs`: fight scenarios and full world runs
//! - `properties.rs`: property tests over rules, movement and persistence
//! - `helpers.rs`: shared setup

mod helpers;
mod properties;

pub use helpers::*;
