//! World configuration.
//!
//! Every tunable of a run lives in [`WorldConfig`]. Missing fields fall back
//! to the defaults below, so a JSON file only needs to name what it changes:
//!
//! ```json
//! { "population": 80, "proximity_distance": 25, "seed": 7 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::Bounds;
use crate::error::ConfigError;

/// Largest accepted `grid_size`.
pub const MAX_GRID_SIZE: usize = 1024;

/// Configuration for a world and its activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World rectangle, inclusive on both edges
    pub bounds: Bounds,
    /// Number of entities generated by `World::generate`
    pub population: usize,
    /// Two entities within this distance fight
    pub proximity_distance: u32,
    /// Largest per-axis displacement of one move tick
    pub max_step: i32,
    /// Mover tick interval in milliseconds
    pub move_interval_ms: u64,
    /// Detector tick interval in milliseconds
    pub detect_interval_ms: u64,
    /// Renderer tick interval in milliseconds
    pub render_interval_ms: u64,
    /// Cells per side of the rendered grid
    pub grid_size: usize,
    /// Seed for population generation and movement
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(100, 100),
            population: 50,
            proximity_distance: 40,
            max_step: 10,
            move_interval_ms: 50,
            detect_interval_ms: 50,
            render_interval_ms: 1000,
            grid_size: 20,
            seed: 42,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`WorldConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that the simulation can run with these values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.bounds.max_x < 0 || self.bounds.max_y < 0 {
            return Err(invalid("bounds", "maxima must be non-negative"));
        }
        if self.max_step < 0 {
            return Err(invalid("max_step", "must be non-negative"));
        }
        if self.move_interval_ms == 0 {
            return Err(invalid("move_interval_ms", "must be positive"));
        }
        if self.detect_interval_ms == 0 {
            return Err(invalid("detect_interval_ms", "must be positive"));
        }
        if self.render_interval_ms == 0 {
            return Err(invalid("render_interval_ms", "must be positive"));
        }
        if self.grid_size == 0 {
            return Err(invalid("grid_size", "must be positive"));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(invalid("grid_size", format!("must be at most {MAX_GRID_SIZE}")));
        }
        Ok(())
    }

    /// Mover tick interval.
    #[must_use]
    pub const fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }

    /// Detector tick interval.
    #[must_use]
    pub const fn detect_interval(&self) -> Duration {
        Duration::from_millis(self.detect_interval_ms)
    }

    /// Renderer tick interval.
    #[must_use]
    pub const fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        WorldConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config = WorldConfig::from_json_str(r#"{ "population": 7, "seed": 9 }"#).unwrap();
        assert_eq!(config.population, 7);
        assert_eq!(config.seed, 9);
        assert_eq!(config.bounds, Bounds::new(100, 100));
        assert_eq!(config.proximity_distance, 40);
    }

    #[test]
    fn nested_bounds_parse() {
        let config =
            WorldConfig::from_json_str(r#"{ "bounds": { "max_x": 30, "max_y": 40 } }"#).unwrap();
        assert_eq!(config.bounds, Bounds::new(30, 40));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = WorldConfig::from_json_str("{ population: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_interval_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "detect_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "detect_interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn oversized_grid_rejected() {
        let at_cap = WorldConfig {
            grid_size: MAX_GRID_SIZE,
            ..WorldConfig::default()
        };
        at_cap.validate().unwrap();

        let err = WorldConfig::from_json_str(r#"{ "grid_size": 1000000000 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "grid_size",
                ..
            }
        ));
    }

    #[test]
    fn negative_bounds_rejected() {
        let config = WorldConfig {
            bounds: Bounds::new(-1, 10),
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = WorldConfig::from_path("/nonexistent/bestiary.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn intervals_convert() {
        let config = WorldConfig::default();
        assert_eq!(config.move_interval(), Duration::from_millis(50));
        assert_eq!(config.render_interval(), Duration::from_secs(1));
    }
}
