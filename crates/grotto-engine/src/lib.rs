//! Grotto Engine -- turn-based cave crawler core.
//!
//! This crate builds on [`grotto_ecs`] to provide the game itself: cellular
//! automaton cave generation, symmetric shadowcasting field of view, A*
//! pathing for monsters, melee and item resolution, a message log, and a
//! turn resolver that sweeps every entity in spawn order after each player
//! action. Whole sessions can be captured into hashed snapshots and restored.
//!
//! # Quick Start
//!
//! ```
//! use grotto_engine::prelude::*;
//!
//! let mut game = Game::with_seed(42).unwrap();
//! assert_eq!(game.player_hp(), Some((30, 30)));
//!
//! let status = game.act(Intent::Wait).unwrap();
//! assert_eq!(status, TurnStatus::Ongoing);
//! assert_eq!(game.turn_count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod combat;
pub mod config;
pub mod fov;
pub mod game;
pub mod item;
pub mod log;
pub mod map;
pub mod path;
pub mod snapshot;
pub mod turn;

use grotto_ecs::point::Point;
use grotto_ecs::EcsError;

/// Re-export the ECS crate for convenience.
pub use grotto_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(String),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Map construction and sampling failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// Random floor sampling gave up.
    #[error("no floor cell found after {samples} samples")]
    NoFloor { samples: usize },

    /// Every generation attempt produced a cave below the minimum size.
    #[error("cave generation failed after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    #[error("invalid map size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
}

/// Failures while setting up a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] EcsError),

    /// The player would start inside a wall.
    #[error("cannot place the player on the wall at {at}")]
    Unwalkable { at: Point },
}

/// A player action that was refused. Refused actions never end the turn.
///
/// The messages are written for the player and land in the message log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("that way is blocked")]
    Blocked,

    #[error("you cannot pick that up")]
    NotAnItem,

    #[error("there is nothing here to pick up")]
    NothingToPickUp,

    #[error("you have no item in slot {index} (carrying {len})")]
    InventoryIndex { index: usize, len: usize },

    #[error("you have nothing to carry items in")]
    NoInventory,

    #[error("that item does not need a target")]
    NoTargetingNeeded,

    #[error("you have to choose a target")]
    TargetRequired,

    #[error("you cannot target where you cannot see")]
    TargetNotVisible,

    #[error("there is no enemy in range")]
    NoTargetInRange,

    #[error("there is no enemy in range of the explosion")]
    NoEnemyInBlast,

    #[error("your health is already full")]
    HealthFull,

    #[error("{actor} cannot use {item}")]
    CannotUse { actor: String, item: String },

    #[error("you are dead")]
    PlayerDead,

    /// A store failure with no player-facing meaning.
    #[error(transparent)]
    Store(EcsError),
}

impl From<EcsError> for ActionError {
    fn from(err: EcsError) -> Self {
        match err {
            EcsError::MissingEntity { .. } | EcsError::WrongKind { .. } => Self::NotAnItem,
            EcsError::MissingComponent {
                component: "inventory",
                ..
            } => Self::NoInventory,
            EcsError::MissingComponent {
                component: "position",
                ..
            } => Self::NothingToPickUp,
            EcsError::InventoryIndex { index, len } => Self::InventoryIndex { index, len },
            other => Self::Store(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use grotto_ecs::prelude::*;

    pub use crate::config::{CaveRule, EngineConfig};
    pub use crate::fov::{Bounds, Fov};
    pub use crate::game::{Game, MonsterKind, PLAYER_NAME};
    pub use crate::item::ItemAction;
    pub use crate::log::{LogEntry, MessageLog};
    pub use crate::map::{Cell, GameMap};
    pub use crate::path::{astar_path, connected_component, path_cost, AiPather, Pather};
    pub use crate::snapshot::GameSnapshot;
    pub use crate::turn::{Intent, TurnStatus, DEATH_MESSAGE};
    pub use crate::{ActionError, ConfigError, GameError, MapError};
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use grotto_ecs::entity::EntityId;

    #[test]
    fn store_errors_become_player_facing() {
        let missing = EcsError::MissingEntity {
            entity: EntityId::new(9),
        };
        assert_eq!(ActionError::from(missing), ActionError::NotAnItem);

        let no_bag = EcsError::MissingComponent {
            entity: EntityId::new(1),
            component: "inventory",
        };
        assert_eq!(ActionError::from(no_bag), ActionError::NoInventory);

        let slot = EcsError::InventoryIndex { index: 4, len: 2 };
        assert_eq!(
            ActionError::from(slot),
            ActionError::InventoryIndex { index: 4, len: 2 }
        );
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err = EcsError::PlayerAlreadySet {
            existing: EntityId::new(0),
        };
        let action = ActionError::from(err.clone());
        assert_eq!(action, ActionError::Store(err.clone()));
        assert_eq!(action.to_string(), err.to_string());
    }

    #[test]
    fn game_error_wraps_sources() {
        let err: GameError = MapError::GenerationExhausted { attempts: 3 }.into();
        assert_eq!(err.to_string(), "cave generation failed after 3 attempts");
    }
}
