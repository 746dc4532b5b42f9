//! Grotto ECS -- sparse entity store for a turn-based dungeon.
//!
//! Entities are plain ids handed out by a monotonic counter and never reused.
//! Each component type lives in its own sparse table keyed by id, and every
//! table iterates in ascending id order so a sweep over the store visits
//! entities in the order they were spawned.
//!
//! # Quick Start
//!
//! ```
//! use grotto_ecs::prelude::*;
//!
//! let mut store = EntityStore::new();
//! let player = store.add_entity(EntityKind::Player, Point::new(1, 1));
//! store.insert_status(player, Status::new(30, 5, 2));
//! store.set_player(player).unwrap();
//!
//! let orc = store.add_entity(EntityKind::Enemy, Point::new(2, 1));
//! store.insert_status(orc, Status::new(10, 3, 0));
//!
//! assert_eq!(store.enemy_at(Point::new(2, 1)), Some(orc));
//! assert!(!store.no_blocking_enemy_at(Point::new(1, 1)));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod point;
pub mod snapshot;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// No entity with this id was ever spawned.
    #[error("entity {entity} does not exist")]
    MissingEntity { entity: entity::EntityId },

    /// The entity exists but lacks a component the operation needs.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: entity::EntityId,
        component: &'static str,
    },

    /// The entity is of the wrong kind for the operation.
    #[error("entity {entity} is not a {expected}")]
    WrongKind {
        entity: entity::EntityId,
        expected: &'static str,
    },

    /// An inventory slot outside the inventory was requested.
    #[error("inventory slot {index} does not exist (inventory holds {len} items)")]
    InventoryIndex { index: usize, len: usize },

    /// A different player has already been designated.
    #[error("player is already set to {existing}")]
    PlayerAlreadySet { existing: entity::EntityId },

    /// A snapshot failed validation and was not applied.
    #[error("invalid store snapshot: {details}")]
    InvalidSnapshot { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{
        Color, ComponentTable, EnemyAi, EntityKind, Inventory, ItemKind, RenderOrder, Status,
        Style,
    };
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::point::{Direction, Point};
    pub use crate::snapshot::{EntitySnapshot, StoreSnapshot};
    pub use crate::store::{EntityStore, CORPSE_NAME, CORPSE_STYLE};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn populated() -> (EntityStore, EntityId, Vec<EntityId>) {
        let mut store = EntityStore::new();
        let pid = store.add_entity(EntityKind::Player, Point::new(0, 0));
        store.insert_status(pid, Status::new(30, 5, 2));
        store.insert_inventory(pid, Inventory::default());
        store.set_player(pid).unwrap();

        let enemies = (1..=4)
            .map(|x| {
                let id = store.add_entity(EntityKind::Enemy, Point::new(x, 0));
                store.insert_status(id, Status::new(10, 3, 0));
                store.insert_ai(id, EnemyAi::default());
                id
            })
            .collect();
        (store, pid, enemies)
    }

    #[test]
    fn ids_are_spawn_ordered_and_never_reused() {
        let (mut store, pid, enemies) = populated();
        let ids: Vec<EntityId> = store.ids().collect();
        let mut expected = vec![pid];
        expected.extend(&enemies);
        assert_eq!(ids, expected);

        store.status_mut(enemies[0]).unwrap().take_damage(100);
        let next = store.add_entity(EntityKind::Enemy, Point::new(9, 9));
        assert_eq!(next.index(), 5);
        assert!(store.contains(enemies[0]), "corpses are not removed");
    }

    #[test]
    fn statuses_iterate_in_id_order() {
        let (store, pid, enemies) = populated();
        let order: Vec<EntityId> = store.statuses().ids().collect();
        assert_eq!(order[0], pid);
        assert_eq!(&order[1..], enemies.as_slice());
    }

    #[test]
    fn snapshot_survives_json() {
        let (mut store, pid, _) = populated();
        let potion = store.add_entity(
            EntityKind::Item(ItemKind::HealingPotion { amount: 4 }),
            Point::new(0, 0),
        );
        store.pick_up(pid, potion).unwrap();

        let json = serde_json::to_string(&store.capture_snapshot()).unwrap();
        let snap: StoreSnapshot = serde_json::from_str(&json).unwrap();
        let back = EntityStore::from_snapshot(&snap).unwrap();
        assert_eq!(back, store);
        assert_eq!(back.next_id(), store.next_id());
    }

    #[test]
    fn error_messages_name_the_entity() {
        let err = EcsError::MissingComponent {
            entity: EntityId::new(3),
            component: "inventory",
        };
        assert_eq!(err.to_string(), "entity #3 has no inventory component");
    }
}
