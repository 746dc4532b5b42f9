//! The turn scheduler.
//!
//! A turn has two phases:
//!
//! 1. **Intent resolution** -- the player's [`Intent`] is applied through
//!    [`Game::act`]. A failed intent is reported and the world does not move.
//! 2. **End-of-turn sweep** -- [`Game::end_turn`] refreshes the field of view
//!    and then lets every entity act once, in store order, against the same
//!    progressively updated store. Enemies attack when adjacent, chase the
//!    player while in sight and wander otherwise. The player may regain a
//!    little health. The sweep stops the moment the player is dead.

use rand::Rng;
use serde::{Deserialize, Serialize};

use grotto_ecs::component::{Color, EntityKind};
use grotto_ecs::entity::EntityId;
use grotto_ecs::point::{Direction, Point};

use crate::game::Game;
use crate::path::{astar_path, AiPather};
use crate::ActionError;

// ---------------------------------------------------------------------------
// Intent / TurnStatus
// ---------------------------------------------------------------------------

/// Something the player wants to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Walk onto `Point`, or attack whatever enemy stands there.
    Bump(Point),
    /// Bump one step in a direction.
    Move(Direction),
    Wait,
    PickUp,
    /// Drop the item in this inventory slot.
    Drop(usize),
    /// Use the item in slot `index`, aiming at `target` if it needs one.
    Use { index: usize, target: Option<Point> },
}

/// State of the session after a completed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStatus {
    Ongoing,
    PlayerDied,
    /// Enough enemies have been killed.
    Cleared,
}

pub const DEATH_MESSAGE: &str = "You died";

impl Game {
    /// Resolve one player intent and, if it succeeded, run the end-of-turn
    /// sweep.
    ///
    /// # Errors
    ///
    /// The intent's failure. It is also written to the log, and no turn
    /// passes.
    pub fn act(&mut self, intent: Intent) -> Result<TurnStatus, ActionError> {
        match self.resolve(intent) {
            Ok(()) => Ok(self.end_turn()),
            Err(e) => {
                tracing::debug!(?intent, error = %e, "intent refused");
                self.logf(e.to_string(), Color::LogSpecial);
                Err(e)
            }
        }
    }

    fn resolve(&mut self, intent: Intent) -> Result<(), ActionError> {
        if self.player_dead() {
            return Err(ActionError::PlayerDead);
        }
        let player = self.player;
        match intent {
            Intent::Bump(target) => self.bump(target),
            Intent::Move(direction) => {
                let here = self.player_position().ok_or(ActionError::Blocked)?;
                self.bump(here.step(direction))
            }
            Intent::Wait => Ok(()),
            Intent::PickUp => self.pick_up(player).map(|_| ()),
            Intent::Drop(index) => self.inventory_remove(player, index).map(|_| ()),
            Intent::Use { index, target } => self.inventory_use(player, index, target),
        }
    }

    /// Move the player onto the neighbouring cell `target`, or attack the
    /// living enemy there.
    ///
    /// # Errors
    ///
    /// [`ActionError::Blocked`] if `target` is not walkable or not one
    /// cardinal step away from the player.
    pub fn bump(&mut self, target: Point) -> Result<(), ActionError> {
        let adjacent = self
            .player_position()
            .is_some_and(|here| here.manhattan(target) == 1);
        if !adjacent || !self.map.is_walkable(target) {
            return Err(ActionError::Blocked);
        }
        match self.store.enemy_at(target) {
            Some(enemy) => {
                self.attack(self.player, enemy);
            }
            None => self.store.move_entity(self.player, target),
        }
        Ok(())
    }

    /// Run the end-of-turn sweep.
    pub fn end_turn(&mut self) -> TurnStatus {
        if self.player_dead() {
            return TurnStatus::PlayerDied;
        }
        self.update_fov();
        self.turns += 1;

        let ids: Vec<EntityId> = self.store.ids().collect();
        for id in ids {
            if self.player_dead() {
                return self.on_player_death();
            }
            match self.store.kind(id) {
                Some(EntityKind::Enemy) => self.monster_turn(id),
                Some(EntityKind::Player) => self.passive_heal(),
                Some(EntityKind::Item(_)) | None => {}
            }
        }
        if self.player_dead() {
            return self.on_player_death();
        }

        if self.cleared() {
            TurnStatus::Cleared
        } else {
            TurnStatus::Ongoing
        }
    }

    fn on_player_death(&mut self) -> TurnStatus {
        tracing::info!(turn = self.turns, "player died");
        self.logf(DEATH_MESSAGE, Color::LogSpecial);
        TurnStatus::PlayerDied
    }

    fn passive_heal(&mut self) {
        let roll = self.map.rng_mut().gen_range(0..100);
        if roll < self.config.heal_chance_percent {
            let amount = self.config.heal_amount;
            if let Some(st) = self.store.status_mut(self.player) {
                st.heal(amount);
            }
        }
    }

    fn monster_turn(&mut self, id: EntityId) {
        if !self.store.alive(id) {
            return;
        }
        let (Some(here), Some(target)) = (self.store.position(id), self.player_position()) else {
            tracing::error!(entity = %id, "actor without position in sweep");
            return;
        };

        if here.manhattan(target) == 1 {
            self.attack(id, self.player);
            return;
        }

        if !self.in_fov(here) {
            let idle = self.store.ai(id).map_or(true, |ai| ai.path.is_empty());
            if idle {
                let dest = match self.map.rand_floor() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(entity = %id, error = %e, "no wander destination");
                        return;
                    }
                };
                self.set_path(id, here, dest);
            }
        } else {
            self.set_path(id, here, target);
        }
        self.ai_move(id);
    }

    fn set_path(&mut self, id: EntityId, from: Point, to: Point) {
        let pather = AiPather {
            map: &self.map,
            store: &self.store,
            blocked_step_cost: self.config.blocked_step_cost,
        };
        let path = astar_path(&pather, from, to);
        tracing::trace!(entity = %id, %from, %to, steps = path.len(), "path computed");
        if let Some(ai) = self.store.ai_mut(id) {
            ai.path = path.into();
        }
    }

    /// Advance `id` one step along its pending path.
    ///
    /// A head equal to the current position is dropped first. If the next
    /// cell is held by the player or a living enemy the actor waits and keeps
    /// its path.
    pub fn ai_move(&mut self, id: EntityId) {
        let Some(here) = self.store.position(id) else {
            return;
        };
        let next = {
            let Some(ai) = self.store.ai_mut(id) else {
                return;
            };
            if ai.path.front() == Some(&here) {
                ai.path.pop_front();
            }
            match ai.path.front() {
                Some(&p) => p,
                None => return,
            }
        };
        if self.store.no_blocking_enemy_at(next) {
            self.store.move_entity(id, next);
            if let Some(ai) = self.store.ai_mut(id) {
                ai.path.pop_front();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::MonsterKind;
    use crate::map::GameMap;

    fn no_heal() -> EngineConfig {
        EngineConfig {
            heal_chance_percent: 0,
            ..Default::default()
        }
    }

    fn corridor(len: i32) -> GameMap {
        GameMap::open(len, 1)
    }

    #[test]
    fn bumping_a_wall_costs_no_turn() {
        let map = GameMap::from_rows(&["#..", "..."]).unwrap();
        let mut game = Game::from_map(no_heal(), map, Point::new(1, 0)).unwrap();
        assert_eq!(
            game.act(Intent::Move(Direction::Left)),
            Err(ActionError::Blocked)
        );
        assert_eq!(game.turn_count(), 0);
        assert_eq!(game.player_position(), Some(Point::new(1, 0)));
        assert_eq!(game.log().last().unwrap().text, ActionError::Blocked.to_string());
        assert_eq!(game.log().last().unwrap().color, Color::LogSpecial);
    }

    #[test]
    fn moving_relocates_the_player() {
        let mut game = Game::from_map(no_heal(), corridor(5), Point::new(0, 0)).unwrap();
        assert_eq!(game.act(Intent::Move(Direction::Right)), Ok(TurnStatus::Ongoing));
        assert_eq!(game.player_position(), Some(Point::new(1, 0)));
        assert_eq!(game.turn_count(), 1);
    }

    #[test]
    fn visible_enemy_closes_in() {
        let mut game = Game::from_map(no_heal(), corridor(8), Point::new(0, 0)).unwrap();
        let orc = game.spawn_monster(MonsterKind::Orc, Point::new(5, 0));
        game.act(Intent::Wait).unwrap();
        assert_eq!(game.store().position(orc), Some(Point::new(4, 0)));
        game.act(Intent::Wait).unwrap();
        game.act(Intent::Wait).unwrap();
        assert_eq!(game.store().position(orc), Some(Point::new(2, 0)));
        game.act(Intent::Wait).unwrap();
        assert_eq!(game.store().position(orc), Some(Point::new(1, 0)));
        // Adjacent now: it attacks instead of stepping onto the player.
        game.act(Intent::Wait).unwrap();
        assert_eq!(game.store().position(orc), Some(Point::new(1, 0)));
        assert_eq!(game.player_hp(), Some((29, 30)));
    }

    #[test]
    fn blocked_enemy_waits_and_keeps_its_path() {
        let mut game = Game::from_map(no_heal(), corridor(6), Point::new(0, 0)).unwrap();
        let a = game.spawn_monster(MonsterKind::Orc, Point::new(2, 0));
        let b = game.spawn_monster(MonsterKind::Orc, Point::new(4, 0));
        game.store_mut()
            .ai_mut(b)
            .unwrap()
            .path
            .extend([Point::new(3, 0), Point::new(2, 0)]);
        game.store_mut().move_entity(a, Point::new(3, 0));

        game.ai_move(b);
        assert_eq!(game.store().position(b), Some(Point::new(4, 0)));
        assert_eq!(game.store().ai(b).unwrap().path.len(), 2);

        game.store_mut().move_entity(a, Point::new(1, 0));
        game.ai_move(b);
        assert_eq!(game.store().position(b), Some(Point::new(3, 0)));
        assert_eq!(
            game.store().ai(b).unwrap().path.iter().copied().collect::<Vec<_>>(),
            vec![Point::new(2, 0)]
        );
    }

    #[test]
    fn bump_only_reaches_neighbouring_cells() {
        let mut game = Game::from_map(no_heal(), corridor(6), Point::new(0, 0)).unwrap();
        let orc = game.spawn_monster(MonsterKind::Orc, Point::new(3, 0));

        assert_eq!(game.act(Intent::Bump(Point::new(4, 0))), Err(ActionError::Blocked));
        assert_eq!(game.act(Intent::Bump(Point::new(3, 0))), Err(ActionError::Blocked));
        assert_eq!(game.act(Intent::Bump(Point::new(0, 0))), Err(ActionError::Blocked));
        assert_eq!(game.player_position(), Some(Point::new(0, 0)));
        assert_eq!(game.store().status(orc).unwrap().hp(), 10);
        assert_eq!(game.turn_count(), 0);

        assert_eq!(game.act(Intent::Bump(Point::new(1, 0))), Ok(TurnStatus::Ongoing));
        assert_eq!(game.player_position(), Some(Point::new(1, 0)));
    }

    #[test]
    fn later_enemies_see_earlier_moves_in_the_same_sweep() {
        let mut game = Game::from_map(no_heal(), corridor(6), Point::new(0, 0)).unwrap();
        let first = game.spawn_monster(MonsterKind::Orc, Point::new(2, 0));
        let second = game.spawn_monster(MonsterKind::Orc, Point::new(3, 0));

        game.act(Intent::Wait).unwrap();
        assert_eq!(game.store().position(first), Some(Point::new(1, 0)));
        assert_eq!(
            game.store().position(second),
            Some(Point::new(2, 0)),
            "the cell vacated earlier in the sweep is free"
        );
    }

    #[test]
    fn wandering_enemy_follows_its_pending_path() {
        let map = GameMap::from_rows(&[
            "##############################",
            "#....######################..#",
            "#............................#",
            "#....######################..#",
            "##############################",
        ])
        .unwrap();
        let mut game = Game::from_map(no_heal(), map, Point::new(1, 1)).unwrap();
        let orc = game.spawn_monster(MonsterKind::Orc, Point::new(28, 2));
        game.store_mut()
            .ai_mut(orc)
            .unwrap()
            .path
            .extend((23..28).rev().map(|x| Point::new(x, 2)));

        game.act(Intent::Wait).unwrap();
        assert!(!game.in_fov(Point::new(27, 2)));
        assert_eq!(game.store().position(orc), Some(Point::new(27, 2)));
        let pending: Vec<Point> = game.store().ai(orc).unwrap().path.iter().copied().collect();
        assert_eq!(pending, (23..27).rev().map(|x| Point::new(x, 2)).collect::<Vec<_>>());

        game.act(Intent::Wait).unwrap();
        let after: Vec<Point> = game.store().ai(orc).unwrap().path.iter().copied().collect();
        assert_eq!(game.store().position(orc), Some(pending[0]));
        assert_eq!(after, pending[1..], "no fresh destination while a path is pending");
    }

    #[test]
    fn ai_move_drops_a_head_equal_to_the_current_cell() {
        let mut game = Game::from_map(no_heal(), corridor(6), Point::new(0, 0)).unwrap();
        let orc = game.spawn_monster(MonsterKind::Orc, Point::new(4, 0));
        game.store_mut()
            .ai_mut(orc)
            .unwrap()
            .path
            .extend([Point::new(4, 0), Point::new(3, 0)]);
        game.ai_move(orc);
        assert_eq!(game.store().position(orc), Some(Point::new(3, 0)));
        assert!(game.store().ai(orc).unwrap().path.is_empty());
    }

    #[test]
    fn sweep_stops_when_the_player_dies() {
        let mut game = Game::from_map(no_heal(), corridor(4), Point::new(1, 0)).unwrap();
        let pid = game.player();
        let first = game.spawn_monster(MonsterKind::Troll, Point::new(0, 0));
        let second = game.spawn_monster(MonsterKind::Orc, Point::new(3, 0));
        game.store_mut().status_mut(pid).unwrap().take_damage(27);

        assert_eq!(game.act(Intent::Wait), Ok(TurnStatus::PlayerDied));
        assert!(game.player_dead());
        assert_eq!(
            game.store().position(second),
            Some(Point::new(3, 0)),
            "entities after the death do not act"
        );
        assert!(game.store().alive(first));
        assert_eq!(game.log().last().unwrap().text, DEATH_MESSAGE);

        assert_eq!(game.act(Intent::Wait), Err(ActionError::PlayerDead));
        assert_eq!(game.end_turn(), TurnStatus::PlayerDied);
        let deaths = game
            .log()
            .entries()
            .iter()
            .filter(|e| e.text == DEATH_MESSAGE)
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn killing_the_last_enemy_clears_the_level() {
        let config = EngineConfig {
            enemy_count: 1,
            ..no_heal()
        };
        let mut game = Game::from_map(config, corridor(3), Point::new(0, 0)).unwrap();
        let orc = game.spawn_monster(MonsterKind::Orc, Point::new(1, 0));
        game.store_mut().status_mut(orc).unwrap().take_damage(8);
        assert_eq!(game.act(Intent::Bump(Point::new(1, 0))), Ok(TurnStatus::Cleared));
        assert!(game.cleared());
        assert_eq!(game.player_hp(), Some((30, 30)), "corpses do not strike back");
    }

    #[test]
    fn passive_heal_always_fires_at_full_chance() {
        let config = EngineConfig {
            heal_chance_percent: 100,
            heal_amount: 2,
            ..Default::default()
        };
        let mut game = Game::from_map(config, corridor(3), Point::new(0, 0)).unwrap();
        let pid = game.player();
        game.store_mut().status_mut(pid).unwrap().take_damage(5);
        game.act(Intent::Wait).unwrap();
        assert_eq!(game.player_hp(), Some((27, 30)));
    }

    #[test]
    fn unseen_enemy_wanders() {
        // Two rooms joined by a corridor, the enemy far out of sight.
        let wall = "#".repeat(30);
        let room = format!("#....{}..#", "#".repeat(22));
        let hall = format!("#{}#", ".".repeat(28));
        let rows = [wall.as_str(), room.as_str(), hall.as_str(), room.as_str(), wall.as_str()];
        let map = GameMap::from_rows(&rows).unwrap();

        let mut game = Game::from_map(no_heal(), map, Point::new(1, 1)).unwrap();
        let start = Point::new(28, 2);
        let orc = game.spawn_monster(MonsterKind::Orc, start);
        assert!(!game.in_fov(start));

        let mut moved = false;
        for _ in 0..10 {
            game.act(Intent::Wait).unwrap();
            moved |= game.store().position(orc) != Some(start);
        }
        assert!(moved, "a wandering enemy picks a destination and walks");
    }
}
