//! Session state and setup.
//!
//! A [`Game`] owns the map (and with it the random source), the entity
//! store, the message log and the current field of view. Construction
//! generates a cave, places the player, then fills the level from the
//! monster and item spawn tables. Turn logic lives in [`crate::turn`],
//! fighting in [`crate::combat`] and items in [`crate::item`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use grotto_ecs::component::{
    Color, EnemyAi, EntityKind, Inventory, ItemKind, RenderOrder, Status, Style,
};
use grotto_ecs::entity::EntityId;
use grotto_ecs::point::Point;
use grotto_ecs::store::EntityStore;

use crate::config::EngineConfig;
use crate::fov::{Bounds, Fov};
use crate::log::MessageLog;
use crate::map::GameMap;
use crate::{GameError, MapError};

// ---------------------------------------------------------------------------
// Spawn tables
// ---------------------------------------------------------------------------

/// Enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterKind {
    Orc,
    Troll,
}

impl MonsterKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Orc => "orc",
            Self::Troll => "troll",
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Orc => 'o',
            Self::Troll => 'T',
        }
    }

    pub fn status(self) -> Status {
        match self {
            Self::Orc => Status::new(10, 3, 0),
            Self::Troll => Status::new(16, 5, 1),
        }
    }

    /// Orcs 80% of the time, trolls otherwise.
    fn roll(rng: &mut Pcg64) -> Self {
        if rng.gen_range(0..100) < 80 {
            Self::Orc
        } else {
            Self::Troll
        }
    }
}

/// Healing potions 70%, magic arrow scrolls 20%, explosion scrolls 10%.
fn roll_item(rng: &mut Pcg64) -> ItemKind {
    let r: f64 = rng.gen();
    if r < 0.7 {
        ItemKind::HealingPotion { amount: 100 }
    } else if r < 0.9 {
        ItemKind::MagicArrow {
            damage: 3,
            range: 5,
        }
    } else {
        ItemKind::Explosion {
            damage: 100,
            radius: 10,
        }
    }
}

pub const PLAYER_NAME: &str = "You";

fn player_status() -> Status {
    Status::new(30, 5, 2)
}

/// Upper-case the first letter, for names at the start of a sentence.
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// One dungeon session.
#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) config: EngineConfig,
    pub(crate) map: GameMap,
    pub(crate) store: EntityStore,
    pub(crate) log: MessageLog,
    pub(crate) fov: Fov,
    pub(crate) player: EntityId,
    pub(crate) kills: u32,
    pub(crate) turns: u64,
}

impl Game {
    /// Start a fully populated session.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or no acceptable cave could be
    /// generated.
    pub fn new(config: EngineConfig) -> Result<Self, GameError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        let mut map = GameMap::generate(&config, rng)?;
        let start = map.rand_floor()?;

        let mut game = Self::from_map(config, map, start)?;
        for _ in 0..game.config.enemy_count {
            let at = game.free_floor_tile()?;
            let kind = MonsterKind::roll(game.map.rng_mut());
            game.spawn_monster(kind, at);
        }
        for _ in 0..game.config.item_count {
            let at = game.free_floor_tile()?;
            let kind = roll_item(game.map.rng_mut());
            game.spawn_item(kind, at);
        }
        game.update_fov();

        tracing::info!(
            seed = ?game.config.seed,
            entities = game.store.len(),
            floor = game.map.floor_count(),
            "session started"
        );
        Ok(game)
    }

    /// [`Game::new`] with the default configuration and a fixed seed.
    pub fn with_seed(seed: u64) -> Result<Self, GameError> {
        Self::new(EngineConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    /// A session on a prepared map holding only the player at `player_at`.
    /// Monsters and items can then be placed by hand.
    ///
    /// # Errors
    ///
    /// Fails if the turn rules are invalid or `player_at` is not floor. The
    /// generation parameters of `config` are not used.
    pub fn from_map(
        config: EngineConfig,
        map: GameMap,
        player_at: Point,
    ) -> Result<Self, GameError> {
        config.validate_session()?;
        if !map.is_walkable(player_at) {
            return Err(GameError::Unwalkable { at: player_at });
        }

        let mut store = EntityStore::new();
        let player = store.add_entity(EntityKind::Player, player_at);
        store.insert_status(player, player_status());
        store.insert_inventory(player, Inventory::default());
        store.set_name(player, PLAYER_NAME);
        store.set_style(
            player,
            Style {
                glyph: '@',
                color: Color::Player,
            },
        );
        store.set_player(player)?;

        let mut game = Self {
            config,
            map,
            store,
            log: MessageLog::new(),
            fov: Fov::default(),
            player,
            kills: 0,
            turns: 0,
        };
        game.update_fov();
        Ok(game)
    }

    // -- spawning -----------------------------------------------------------

    /// Place a monster at `at` with its full component set.
    pub fn spawn_monster(&mut self, kind: MonsterKind, at: Point) -> EntityId {
        let id = self.store.add_entity(EntityKind::Enemy, at);
        self.store.insert_status(id, kind.status());
        self.store.insert_ai(id, EnemyAi::default());
        self.store.set_name(id, kind.name());
        self.store.set_style(
            id,
            Style {
                glyph: kind.glyph(),
                color: Color::Enemy,
            },
        );
        tracing::debug!(entity = %id, ?kind, %at, "monster spawned");
        id
    }

    /// Place an item on the floor at `at`.
    pub fn spawn_item(&mut self, kind: ItemKind, at: Point) -> EntityId {
        let id = self.store.add_entity(EntityKind::Item(kind), at);
        self.store.set_name(id, kind.default_name());
        self.store.set_style(
            id,
            Style {
                glyph: kind.glyph(),
                color: Color::Consumable,
            },
        );
        id
    }

    /// A random floor cell that neither the player nor a living enemy holds.
    ///
    /// # Errors
    ///
    /// [`MapError::NoFloor`] if sampling keeps failing.
    pub fn free_floor_tile(&mut self) -> Result<Point, MapError> {
        let tries = self.map.floor_count().max(1) * 16;
        for _ in 0..tries {
            let p = self.map.rand_floor()?;
            if self.store.no_blocking_enemy_at(p) {
                return Ok(p);
            }
        }
        Err(MapError::NoFloor { samples: tries })
    }

    // -- visibility ---------------------------------------------------------

    /// Recompute the field of view from the player and mark it explored.
    pub fn update_fov(&mut self) {
        let Some(origin) = self.store.position(self.player) else {
            tracing::error!(player = %self.player, "player has no position");
            return;
        };
        let bounds = Bounds {
            width: self.map.width(),
            height: self.map.height(),
        };
        let map = &self.map;
        self.fov = Fov::compute(origin, self.config.max_los, bounds, |p| map.is_walkable(p));
        for p in self.fov.iter() {
            self.map.mark_explored(p);
        }
    }

    /// Visible this turn and within sight range of the player.
    pub fn in_fov(&self, p: Point) -> bool {
        self.fov.visible(p)
            && self
                .player_position()
                .is_some_and(|here| here.manhattan(p) <= self.config.max_los)
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Direct store access for scenario setup (adjusting HP, moving actors).
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Append a message to the log.
    pub fn logf(&mut self, text: impl Into<String>, color: Color) {
        self.log.push(text, color);
    }

    pub fn fov(&self) -> &Fov {
        &self.fov
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    pub fn player_position(&self) -> Option<Point> {
        self.store.position(self.player)
    }

    /// `(hp, max_hp)` for the status line.
    pub fn player_hp(&self) -> Option<(i32, i32)> {
        self.store
            .status(self.player)
            .map(|st| (st.hp(), st.max_hp()))
    }

    pub fn player_dead(&self) -> bool {
        self.store.dead(self.player)
    }

    pub fn is_walkable(&self, p: Point) -> bool {
        self.map.is_walkable(p)
    }

    pub fn is_explored(&self, p: Point) -> bool {
        self.map.is_explored(p)
    }

    pub fn display_name(&self, id: EntityId) -> &str {
        self.store.display_name(id)
    }

    pub fn display_style(&self, id: EntityId) -> Option<Style> {
        self.store.display_style(id)
    }

    pub fn render_order(&self, id: EntityId) -> RenderOrder {
        self.store.render_order(id)
    }

    /// Non-player actors killed so far.
    pub fn kills(&self) -> u32 {
        self.kills
    }

    /// Completed end-of-turn sweeps.
    pub fn turn_count(&self) -> u64 {
        self.turns
    }

    /// The kill count has reached the configured enemy count.
    pub fn cleared(&self) -> bool {
        self.kills >= self.config.enemy_count
    }

    /// Replace the random source with one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.map.reseed(seed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sessions_are_identical() {
        let a = Game::with_seed(42).unwrap();
        let b = Game::with_seed(42).unwrap();
        assert_eq!(a.map(), b.map());
        assert_eq!(a.store(), b.store());
    }

    #[test]
    fn new_session_is_fully_populated() {
        let game = Game::with_seed(5).unwrap();
        let config = game.config();
        let enemies = game
            .store()
            .ids()
            .filter(|&id| game.store().kind(id) == Some(EntityKind::Enemy))
            .count();
        let items = game
            .store()
            .ids()
            .filter(|&id| matches!(game.store().kind(id), Some(EntityKind::Item(_))))
            .count();
        assert_eq!(enemies as u32, config.enemy_count);
        assert_eq!(items as u32, config.item_count);
        assert_eq!(game.player(), EntityId::new(0));
        assert_eq!(game.player_hp(), Some((30, 30)));
    }

    #[test]
    fn actors_start_on_distinct_floor_cells() {
        let game = Game::with_seed(8).unwrap();
        let mut seen = std::collections::HashSet::new();
        for id in game.store().ids() {
            let p = game.store().position(id).unwrap();
            assert!(game.is_walkable(p));
            if game.store().kind(id).is_some_and(|k| k.is_actor()) {
                assert!(seen.insert(p), "two actors share {p}");
            }
        }
    }

    #[test]
    fn fov_is_explored_at_start() {
        let game = Game::with_seed(9).unwrap();
        let here = game.player_position().unwrap();
        assert!(game.in_fov(here));
        assert!(game.is_explored(here));
        for p in game.fov().iter() {
            assert!(game.is_explored(p));
        }
    }

    #[test]
    fn sight_range_follows_the_player() {
        let map = GameMap::open(30, 1);
        let mut game = Game::from_map(EngineConfig::default(), map, Point::new(0, 0)).unwrap();
        let near_start = Point::new(2, 0);
        assert!(game.in_fov(near_start));

        let pid = game.player();
        game.store_mut().move_entity(pid, Point::new(15, 0));
        assert!(game.fov().visible(near_start), "field not yet recomputed");
        assert!(!game.in_fov(near_start), "13 cells from the player");
    }

    #[test]
    fn player_cannot_start_in_a_wall() {
        let map = GameMap::from_rows(&["#.#"]).unwrap();
        assert!(matches!(
            Game::from_map(EngineConfig::default(), map, Point::new(0, 0)),
            Err(GameError::Unwalkable { .. })
        ));
    }

    #[test]
    fn capitalize_handles_edges() {
        assert_eq!(capitalize("orc"), "Orc");
        assert_eq!(capitalize("You"), "You");
        assert_eq!(capitalize(""), "");
    }
}
