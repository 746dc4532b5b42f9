//! Session snapshot and restore with BLAKE3 hashing.
//!
//! Provides [`GameSnapshot`] -- a serializable representation of a whole
//! session (configuration, map with exploration, entity store, message log,
//! kill and turn counters) with a BLAKE3 content hash for integrity checks.
//!
//! # Usage
//!
//! ```
//! use grotto_engine::prelude::*;
//!
//! let mut game = Game::with_seed(7).unwrap();
//! game.act(Intent::Wait).unwrap();
//!
//! let snapshot = game.capture_snapshot();
//! assert_eq!(snapshot.hash.len(), 64); // BLAKE3 hex digest
//!
//! let json = snapshot.to_json().unwrap();
//! let restored = Game::restore(&GameSnapshot::from_json(&json).unwrap(), 99).unwrap();
//! assert_eq!(restored.store(), game.store());
//! assert_eq!(restored.turn_count(), 1);
//! ```
//!
//! # What Is NOT Serialized
//!
//! - **The random source** -- a restored session is reseeded from the seed
//!   passed to [`Game::restore`]. Replaying the same intents after a restore
//!   does not reproduce the original session's rolls.
//! - **The field of view** -- recomputed from the player on restore.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use grotto_ecs::component::EntityKind;
use grotto_ecs::snapshot::StoreSnapshot;
use grotto_ecs::store::EntityStore;

use crate::config::EngineConfig;
use crate::fov::Fov;
use crate::game::Game;
use crate::log::MessageLog;
use crate::map::GameMap;

// ---------------------------------------------------------------------------
// GameSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of a full session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: EngineConfig,
    /// Terrain and explored cells.
    pub map: GameMap,
    /// All entities, components and the id counter.
    pub store: StoreSnapshot,
    pub log: MessageLog,
    pub kills: u32,
    pub turns: u64,
    /// BLAKE3 hex digest (64 lowercase hex chars) of every other field.
    pub hash: String,
}

impl GameSnapshot {
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("failed to serialize game snapshot")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse game snapshot")
    }

    /// Recompute the hash from the snapshot's contents.
    pub fn recompute_hash(&self) -> String {
        compute_hash(
            &self.config,
            &self.map,
            &self.store,
            &self.log,
            self.kills,
            self.turns,
        )
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest of the hashable session state. The hash field itself is
/// not included.
fn compute_hash(
    config: &EngineConfig,
    map: &GameMap,
    store: &StoreSnapshot,
    log: &MessageLog,
    kills: u32,
    turns: u64,
) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        config: &'a EngineConfig,
        map: &'a GameMap,
        store: &'a StoreSnapshot,
        log: &'a MessageLog,
        kills: u32,
        turns: u64,
    }

    let hashable = HashableState {
        config,
        map,
        store,
        log,
        kills,
        turns,
    };

    let json_bytes = serde_json::to_vec(&hashable)
        .expect("GameSnapshot state should always be JSON-serializable");

    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Game snapshot/restore methods
// ---------------------------------------------------------------------------

impl Game {
    /// Capture the whole session.
    pub fn capture_snapshot(&self) -> GameSnapshot {
        let store = self.store.capture_snapshot();
        let hash = compute_hash(
            &self.config,
            &self.map,
            &store,
            &self.log,
            self.kills,
            self.turns,
        );
        GameSnapshot {
            config: self.config.clone(),
            map: self.map.clone(),
            store,
            log: self.log.clone(),
            kills: self.kills,
            turns: self.turns,
            hash,
        }
    }

    /// Rebuild a session from a snapshot, with a fresh random source seeded
    /// from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the hash does not match the contents
    /// (corruption/tampering), the map grid is malformed, the store snapshot
    /// fails validation, or the snapshot has no player.
    pub fn restore(snapshot: &GameSnapshot, seed: u64) -> anyhow::Result<Self> {
        let expected_hash = snapshot.recompute_hash();
        if expected_hash != snapshot.hash {
            anyhow::bail!(
                "snapshot hash mismatch: recorded {} but recomputed {}. \
                 The snapshot may be corrupted or tampered with.",
                snapshot.hash,
                expected_hash
            );
        }
        if !snapshot.map.is_well_formed() {
            anyhow::bail!(
                "snapshot map grid does not match its {}x{} size",
                snapshot.map.width(),
                snapshot.map.height()
            );
        }
        snapshot
            .config
            .validate_session()
            .context("snapshot carries an invalid configuration")?;

        let store = EntityStore::from_snapshot(&snapshot.store)
            .context("failed to restore entity store from snapshot")?;
        let player = store
            .player()
            .context("snapshot has no player entity")?;
        if store.kind(player) != Some(EntityKind::Player) || store.position(player).is_none() {
            anyhow::bail!("snapshot player {player} is not a placed player entity");
        }

        let mut map = snapshot.map.clone();
        map.reseed(seed);

        let mut game = Self {
            config: snapshot.config.clone(),
            map,
            store,
            log: snapshot.log.clone(),
            fov: Fov::default(),
            player,
            kills: snapshot.kills,
            turns: snapshot.turns,
        };
        game.update_fov();

        tracing::info!(
            turns = game.turns,
            entities = game.store.len(),
            "session restored from snapshot"
        );
        Ok(game)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
