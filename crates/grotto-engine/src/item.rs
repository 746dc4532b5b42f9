//! Inventory operations and item effects.
//!
//! Item behaviour is a closed set ([`ItemKind`]), so activation is a single
//! exhaustive match. Only area items advertise a targeting radius, which
//! tells the caller to ask for a target cell before using them.

use grotto_ecs::component::{Color, ItemKind};
use grotto_ecs::entity::EntityId;
use grotto_ecs::point::Point;

use crate::game::{capitalize, Game};
use crate::ActionError;

/// Who is using an item, and on which cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemAction {
    pub actor: EntityId,
    pub target: Option<Point>,
}

impl Game {
    fn item_kind(&self, item: EntityId) -> Result<ItemKind, ActionError> {
        self.store
            .kind(item)
            .and_then(|k| k.item())
            .ok_or(ActionError::NotAnItem)
    }

    /// Put the floor item `item` into `actor`'s inventory.
    pub fn inventory_add(&mut self, actor: EntityId, item: EntityId) -> Result<(), ActionError> {
        self.item_kind(item)?;
        self.store.pick_up(actor, item)?;
        Ok(())
    }

    /// Drop the item in slot `index` at `actor`'s feet.
    pub fn inventory_remove(
        &mut self,
        actor: EntityId,
        index: usize,
    ) -> Result<EntityId, ActionError> {
        let item = self.store.drop_item(actor, index)?;
        let name = self.store.display_name(item).to_owned();
        self.logf(format!("You drop the {name}"), Color::Default);
        Ok(item)
    }

    /// Pick up the first item lying under `actor`.
    pub fn pick_up(&mut self, actor: EntityId) -> Result<EntityId, ActionError> {
        let here = self.store.position(actor).ok_or(ActionError::NothingToPickUp)?;
        let item = self
            .store
            .items_at(here)
            .next()
            .ok_or(ActionError::NothingToPickUp)?;
        self.inventory_add(actor, item)?;
        let name = self.store.display_name(item).to_owned();
        self.logf(format!("You pick up the {name}"), Color::StatusHealthy);
        Ok(item)
    }

    /// Radius of the area affected by the item in slot `index`.
    ///
    /// # Errors
    ///
    /// [`ActionError::NoTargetingNeeded`] if the item does not take a target.
    pub fn targeting_radius(&self, actor: EntityId, index: usize) -> Result<i32, ActionError> {
        let item = self.store.inventory_item(actor, index)?;
        self.item_kind(item)?
            .target_radius()
            .ok_or(ActionError::NoTargetingNeeded)
    }

    /// Use the item in slot `index`. The item is consumed only if its effect
    /// succeeded.
    pub fn inventory_use(
        &mut self,
        actor: EntityId,
        index: usize,
        target: Option<Point>,
    ) -> Result<(), ActionError> {
        let item = self.store.inventory_item(actor, index)?;
        let kind = self.item_kind(item)?;
        self.activate(kind, ItemAction { actor, target })?;
        self.store.take_from_inventory(actor, index)?;
        tracing::debug!(%actor, %item, ?kind, "item consumed");
        Ok(())
    }

    /// Apply the effect of an item of kind `kind`.
    pub fn activate(&mut self, kind: ItemKind, action: ItemAction) -> Result<(), ActionError> {
        match kind {
            ItemKind::HealingPotion { amount } => self.drink(kind, amount, action),
            ItemKind::MagicArrow { damage, range } => self.shoot_arrow(damage, range, action),
            ItemKind::Explosion { damage, radius } => self.explode(damage, radius, action),
        }
    }

    fn drink(&mut self, kind: ItemKind, amount: i32, action: ItemAction) -> Result<(), ActionError> {
        if self.store.status(action.actor).is_none() {
            return Err(ActionError::CannotUse {
                actor: self.store.display_name(action.actor).to_owned(),
                item: kind.default_name().to_owned(),
            });
        }
        let gained = self
            .store
            .status_mut(action.actor)
            .map_or(0, |st| st.heal(amount));
        if gained <= 0 {
            return Err(ActionError::HealthFull);
        }
        self.logf(
            format!("You drink the {} and recover {gained} HP", kind.default_name()),
            Color::StatusHealthy,
        );
        Ok(())
    }

    fn shoot_arrow(&mut self, damage: i32, range: i32, action: ItemAction) -> Result<(), ActionError> {
        let from = self
            .store
            .position(action.actor)
            .ok_or(ActionError::NoTargetInRange)?;

        let target = self
            .store
            .statuses()
            .ids()
            .filter(|&id| id != action.actor && self.store.alive(id))
            .filter_map(|id| self.store.position(id).map(|p| (id, p)))
            .filter(|&(_, p)| self.in_fov(p))
            .map(|(id, p)| (id, from.manhattan(p)))
            .filter(|&(_, dist)| dist < range + 1)
            .min_by_key(|&(_, dist)| dist)
            .map(|(id, _)| id)
            .ok_or(ActionError::NoTargetInRange)?;

        let name = capitalize(self.store.display_name(target));
        self.logf(
            format!("A lightning bolt strikes {name} for {damage} damage"),
            Color::StatusHealthy,
        );
        self.apply_damage(target, damage);
        Ok(())
    }

    fn explode(&mut self, damage: i32, radius: i32, action: ItemAction) -> Result<(), ActionError> {
        let target = action.target.ok_or(ActionError::TargetRequired)?;
        if !self.in_fov(target) {
            return Err(ActionError::TargetNotVisible);
        }
        let caster_at = self.store.position(action.actor);

        let victims: Vec<EntityId> = self
            .store
            .statuses()
            .ids()
            .filter(|&id| id != self.player && self.store.alive(id))
            .filter(|&id| {
                self.store
                    .position(id)
                    .is_some_and(|p| Some(p) != caster_at && p.manhattan(target) <= radius)
            })
            .collect();
        if victims.is_empty() {
            return Err(ActionError::NoEnemyInBlast);
        }

        for id in victims {
            let defence = self.store.status(id).map_or(0, |st| st.defence());
            let name = capitalize(self.store.display_name(id));
            self.logf(
                format!("{name} is engulfed in a vortex of mana"),
                Color::StatusHealthy,
            );
            self.apply_damage(id, (damage - defence).max(0));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
