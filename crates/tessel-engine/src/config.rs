//! World tuning parameters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::WorldError;

/// Pixels per meter. Gameplay speeds and sizes are expressed in multiples
/// of this.
pub const PPM: f32 = 32.0;

/// Resistance every body is reset to after each fixed step.
pub const DEFAULT_AIR_RESISTANCE: Vec2 = Vec2::new(1.035, 1.025);

/// Seconds per fixed step.
pub const DEFAULT_FIXED_STEP: f32 = 1.0 / 150.0;

/// Parameters for a [`WorldSystem`](crate::world_system::WorldSystem).
///
/// ```
/// use tessel_engine::config::WorldConfig;
///
/// let config = WorldConfig::from_json_str(
///     r#"{ "air_resistance": [1.05, 1.0], "fixed_step": 0.01 }"#,
/// ).unwrap();
/// assert_eq!(config.fixed_step, 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Resistance every body is reset to after a fixed step.
    pub air_resistance: Vec2,
    /// Seconds of simulated time per fixed step. Must be positive and finite.
    pub fixed_step: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            air_resistance: DEFAULT_AIR_RESISTANCE,
            fixed_step: DEFAULT_FIXED_STEP,
        }
    }
}

impl WorldConfig {
    /// Replace the air resistance.
    pub fn with_air_resistance(mut self, air_resistance: Vec2) -> Self {
        self.air_resistance = air_resistance;
        self
    }

    /// Replace the fixed step.
    pub fn with_fixed_step(mut self, fixed_step: f32) -> Self {
        self.fixed_step = fixed_step;
        self
    }

    /// The fixed step must be positive and finite, and both air resistance
    /// components finite.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.fixed_step.is_finite() || self.fixed_step <= 0.0 {
            return Err(WorldError::InvalidFixedStep {
                fixed_step: self.fixed_step,
            });
        }
        if !self.air_resistance.is_finite() {
            return Err(WorldError::InvalidAirResistance {
                x: self.air_resistance.x,
                y: self.air_resistance.y,
            });
        }
        Ok(())
    }

    /// Parse from JSON, filling missing fields from [`Default`], and
    /// validate.
    pub fn from_json_str(json: &str) -> Result<Self, WorldError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialise as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
