//! Session configuration.
//!
//! [`EngineConfig`] gathers every tunable of a session: map size, cave
//! generation rules, sight radius, spawn counts and the passive heal. It is
//! plain serde data so it can be embedded in snapshots or loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

// ---------------------------------------------------------------------------
// CaveRule
// ---------------------------------------------------------------------------

/// One cellular-automata smoothing pass.
///
/// A cell becomes a wall iff the walls in its radius-1 square number at least
/// `near_walls`, or (when `far_walls_max` is set) the walls in its radius-2
/// square number at most `far_walls_max`. Otherwise it becomes floor. The
/// pass is applied `reps` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveRule {
    pub near_walls: u32,
    pub far_walls_max: Option<u32>,
    pub reps: u32,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Configuration for one dungeon session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid width in cells.
    pub map_width: i32,
    /// Grid height in cells.
    pub map_height: i32,
    /// Probability that a cell starts out as floor before smoothing.
    pub initial_floor_probability: f64,
    /// Smoothing passes, applied in order.
    pub cave_rules: Vec<CaveRule>,
    /// The connected cave must hold strictly more floor cells than this.
    pub min_cave_size: usize,
    /// Cap on whole-cave retries before giving up.
    pub max_generation_attempts: u32,
    /// Field of view radius.
    pub max_los: i32,
    /// Enemies spawned at session start; killing this many clears the level.
    pub enemy_count: u32,
    /// Items scattered at session start.
    pub item_count: u32,
    /// Chance per turn, in percent, that the player regains `heal_amount` HP.
    pub heal_chance_percent: u32,
    pub heal_amount: i32,
    /// Path cost of stepping onto a cell held by a living enemy.
    pub blocked_step_cost: u32,
    /// Fixed seed for the random source. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_width: 80,
            map_height: 19,
            initial_floor_probability: 0.58,
            cave_rules: vec![
                CaveRule {
                    near_walls: 5,
                    far_walls_max: Some(2),
                    reps: 4,
                },
                CaveRule {
                    near_walls: 5,
                    far_walls_max: None,
                    reps: 3,
                },
            ],
            min_cave_size: 400,
            max_generation_attempts: 1000,
            max_los: 10,
            enemy_count: 12,
            item_count: 5,
            heal_chance_percent: 50,
            heal_amount: 2,
            blocked_step_cost: 8,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values describe a usable session on a generated map.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_generation()?;
        self.validate_session()
    }

    /// Checks on the cave generation parameters only.
    pub fn validate_generation(&self) -> Result<(), ConfigError> {
        if self.map_width <= 0 || self.map_height <= 0 {
            return Err(ConfigError::Invalid {
                field: "map_width/map_height",
                reason: format!(
                    "map must be non-empty, got {}x{}",
                    self.map_width, self.map_height
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.initial_floor_probability) {
            return Err(ConfigError::Invalid {
                field: "initial_floor_probability",
                reason: format!("{} is not a probability", self.initial_floor_probability),
            });
        }
        let cells = self.map_width as usize * self.map_height as usize;
        if self.min_cave_size >= cells {
            return Err(ConfigError::Invalid {
                field: "min_cave_size",
                reason: format!("{} cannot be exceeded on a {cells}-cell map", self.min_cave_size),
            });
        }
        if self.max_generation_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_generation_attempts",
                reason: "at least one attempt is required".into(),
            });
        }
        Ok(())
    }

    /// Checks on the turn rules, which also apply to hand-built maps.
    pub fn validate_session(&self) -> Result<(), ConfigError> {
        if self.max_los < 0 {
            return Err(ConfigError::Invalid {
                field: "max_los",
                reason: format!("radius {} is negative", self.max_los),
            });
        }
        if self.heal_chance_percent > 100 {
            return Err(ConfigError::Invalid {
                field: "heal_chance_percent",
                reason: format!("{} exceeds 100", self.heal_chance_percent),
            });
        }
        if self.blocked_step_cost == 0 {
            return Err(ConfigError::Invalid {
                field: "blocked_step_cost",
                reason: "step costs must be positive".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
