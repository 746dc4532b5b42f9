//! Component tables and component value types.
//!
//! Every component lives in its own sparse [`ComponentTable`] keyed by
//! [`EntityId`]. An entity "has" a component exactly when its id is a key of
//! that table; there is no archetype bookkeeping beyond that.

use std::collections::{btree_map, BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::point::Point;

// ---------------------------------------------------------------------------
// ComponentTable
// ---------------------------------------------------------------------------

/// Sparse map from entity to one component value.
///
/// Iteration is in ascending [`EntityId`] order, which is also the order in
/// which entities were created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentTable<T> {
    rows: BTreeMap<EntityId, T>,
}

impl<T> Default for ComponentTable<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T> ComponentTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    /// Insert or overwrite the component for `id`, returning the old value.
    pub fn insert(&mut self, id: EntityId, value: T) -> Option<T> {
        self.rows.insert(id, value)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate `(id, &value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.rows.iter().map(|(id, v)| (*id, v))
    }

    /// Iterate the ids carrying this component.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.rows.keys().copied()
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }
}

impl<'a, T> IntoIterator for &'a ComponentTable<T> {
    type Item = (&'a EntityId, &'a T);
    type IntoIter = btree_map::Iter<'a, EntityId, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// ---------------------------------------------------------------------------
// Kind tag
// ---------------------------------------------------------------------------

/// Item behaviours. Each variant carries its own tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Restores `amount` HP to the user.
    HealingPotion { amount: i32 },
    /// Strikes the nearest visible actor within `range`, ignoring defence.
    MagicArrow { damage: i32, range: i32 },
    /// Blasts every actor within `radius` of a chosen target cell.
    Explosion { damage: i32, radius: i32 },
}

impl ItemKind {
    /// Radius of the area the item affects, for items that need the caller to
    /// pick a target cell first. `None` means no targeting step.
    pub fn target_radius(&self) -> Option<i32> {
        match *self {
            Self::Explosion { radius, .. } => Some(radius),
            Self::HealingPotion { .. } | Self::MagicArrow { .. } => None,
        }
    }

    /// Name shown in the inventory and in log lines.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::HealingPotion { .. } => "healing potion",
            Self::MagicArrow { .. } => "scroll of magic arrow",
            Self::Explosion { .. } => "scroll of explosion",
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Self::HealingPotion { .. } => '!',
            Self::MagicArrow { .. } | Self::Explosion { .. } => '?',
        }
    }
}

/// What sort of thing an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Item(ItemKind),
}

impl EntityKind {
    pub fn is_actor(&self) -> bool {
        matches!(self, Self::Player | Self::Enemy)
    }

    pub fn item(&self) -> Option<ItemKind> {
        match *self {
            Self::Item(kind) => Some(kind),
            Self::Player | Self::Enemy => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Combat statistics carried by actors.
///
/// `hp` is kept inside `0..=max_hp` by every mutating method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    hp: i32,
    max_hp: i32,
    power: i32,
    defence: i32,
}

impl Status {
    /// A fresh status at full health. Negative `max_hp` is treated as zero.
    pub fn new(max_hp: i32, power: i32, defence: i32) -> Self {
        let max_hp = max_hp.max(0);
        Self {
            hp: max_hp,
            max_hp,
            power,
            defence,
        }
    }

    /// Same status with `hp` set, clamped into `0..=max_hp`.
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn power(&self) -> i32 {
        self.power
    }

    pub fn defence(&self) -> i32 {
        self.defence
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Whether the invariant `0 <= hp <= max_hp` holds. Only values read back
    /// from a snapshot can violate it.
    pub fn is_consistent(&self) -> bool {
        self.max_hp >= 0 && (0..=self.max_hp).contains(&self.hp)
    }

    /// Restore up to `amount` HP, capped at `max_hp`. Returns the HP actually
    /// gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    /// Remove up to `amount` HP, never going below zero. Defence is not
    /// applied here. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
        before - self.hp
    }
}

// ---------------------------------------------------------------------------
// AI, style, inventory
// ---------------------------------------------------------------------------

/// Enemy behaviour state: the waypoints still to walk.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyAi {
    pub path: VecDeque<Point>,
}

/// Semantic colour palette. The presentation layer maps these to real colours.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Default,
    Player,
    Enemy,
    Consumable,
    LogPlayerAttack,
    LogEnemyAttack,
    LogSpecial,
    StatusHealthy,
    StatusWounded,
}

/// Default graphical representation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub glyph: char,
    pub color: Color,
}

/// Items carried by an actor, in pick-up order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<EntityId>,
}

/// Draw priority. Later variants are drawn on top of earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderOrder {
    None,
    Corpse,
    Item,
    Actor,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
