//! Melee resolution and kill accounting.

use grotto_ecs::component::Color;
use grotto_ecs::entity::EntityId;

use crate::game::{capitalize, Game};

impl Game {
    /// Melee: `attacker` strikes `defender` for `power - defence`.
    ///
    /// Non-positive damage changes nothing and logs a "no damage" line.
    /// Returns the HP the defender actually lost.
    pub fn attack(&mut self, attacker: EntityId, defender: EntityId) -> i32 {
        let (Some(a), Some(d)) = (self.store.status(attacker), self.store.status(defender))
        else {
            tracing::error!(%attacker, %defender, "melee between entities without status");
            return 0;
        };
        let damage = a.power() - d.defence();

        let by_player = attacker == self.player;
        let color = if by_player {
            Color::LogPlayerAttack
        } else {
            Color::LogEnemyAttack
        };
        let verb = if by_player { "attack" } else { "attacks" };
        let desc = format!(
            "{} {verb} {}",
            capitalize(self.store.display_name(attacker)),
            capitalize(self.store.display_name(defender))
        );

        if damage > 0 {
            self.logf(format!("{desc} for {damage} damage"), color);
            let lost = self.apply_damage(defender, damage);
            tracing::debug!(%attacker, %defender, damage, lost, "melee hit");
            lost
        } else {
            let tail = if by_player { "do" } else { "does" };
            self.logf(format!("{desc} but {tail} no damage"), color);
            0
        }
    }

    /// Take `amount` HP from `target` (clamped at zero) and count the kill if
    /// this brought a non-player from alive to dead. Returns the HP lost.
    pub(crate) fn apply_damage(&mut self, target: EntityId, amount: i32) -> i32 {
        let was_alive = self.store.alive(target);
        let Some(status) = self.store.status_mut(target) else {
            tracing::error!(%target, "damage applied to entity without status");
            return 0;
        };
        let lost = status.take_damage(amount);

        if was_alive && !self.store.alive(target) && target != self.player {
            self.kills += 1;
            let name = capitalize(self.store.name(target).unwrap_or_default());
            self.logf(format!("{name} dies"), Color::LogPlayerAttack);
            tracing::info!(%target, kills = self.kills, "enemy killed");
        }
        lost
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
