//! Entity store snapshot and restore support.
//!
//! Provides [`StoreSnapshot`] -- a fully serializable representation of the
//! entity store that can be captured, serialized to JSON, and used to rebuild
//! an equivalent store (same ids, same id counter, same components).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::component::{EnemyAi, EntityKind, Inventory, Status, Style};
use crate::entity::{EntityAllocator, EntityId};
use crate::point::Point;
use crate::store::EntityStore;
use crate::EcsError;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Serializable snapshot of a single entity's components. `None` means the
/// entity does not carry that component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub position: Option<Point>,
    pub status: Option<Status>,
    pub ai: Option<EnemyAi>,
    pub name: Option<String>,
    pub style: Option<Style>,
    pub inventory: Option<Inventory>,
}

/// A complete, serializable snapshot of an [`EntityStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Value of the id counter: the id the next spawned entity would get.
    pub next_id: u32,
    /// The designated player, if any.
    pub player: Option<EntityId>,
    /// Every entity, sorted by id.
    pub entities: Vec<EntitySnapshot>,
}

// ---------------------------------------------------------------------------
// EntityStore snapshot/restore impl
// ---------------------------------------------------------------------------

impl EntityStore {
    /// Capture a complete snapshot of the store.
    pub fn capture_snapshot(&self) -> StoreSnapshot {
        let entities = self
            .kinds
            .iter()
            .map(|(id, kind)| EntitySnapshot {
                entity_id: id,
                kind: *kind,
                position: self.positions.get(id).copied(),
                status: self.statuses.get(id).copied(),
                ai: self.ai.get(id).cloned(),
                name: self.names.get(id).cloned(),
                style: self.styles.get(id).copied(),
                inventory: self.inventories.get(id).cloned(),
            })
            .collect();

        StoreSnapshot {
            next_id: self.allocator.allocated(),
            player: self.player,
            entities,
        }
    }

    /// Build a new store from a snapshot.
    ///
    /// # Errors
    ///
    /// See [`restore_from_snapshot`](Self::restore_from_snapshot).
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Result<Self, EcsError> {
        let mut store = Self::new();
        store.restore_from_snapshot(snapshot)?;
        Ok(store)
    }

    /// Replace the contents of this store with the snapshot's.
    ///
    /// The snapshot is fully validated before anything is cleared, so a
    /// rejected snapshot leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidSnapshot`] if ids are duplicated or beyond
    /// the id counter, the player is missing or not a player, a status breaks
    /// `0 <= hp <= max_hp`, or an inventory references something that is not
    /// a contained item.
    pub fn restore_from_snapshot(&mut self, snapshot: &StoreSnapshot) -> Result<(), EcsError> {
        validate(snapshot)?;

        self.clear();
        self.allocator = EntityAllocator::resume_from(snapshot.next_id);
        self.player = snapshot.player;

        for e in &snapshot.entities {
            let id = e.entity_id;
            self.kinds.insert(id, e.kind);
            if let Some(p) = e.position {
                self.positions.insert(id, p);
            }
            if let Some(st) = e.status {
                self.statuses.insert(id, st);
            }
            if let Some(ai) = &e.ai {
                self.ai.insert(id, ai.clone());
            }
            if let Some(name) = &e.name {
                self.names.insert(id, name.clone());
            }
            if let Some(style) = e.style {
                self.styles.insert(id, style);
            }
            if let Some(inv) = &e.inventory {
                self.inventories.insert(id, inv.clone());
            }
        }

        tracing::debug!(
            entities = snapshot.entities.len(),
            next_id = snapshot.next_id,
            "entity store restored from snapshot"
        );
        Ok(())
    }
}

fn invalid(details: String) -> EcsError {
    EcsError::InvalidSnapshot { details }
}

fn validate(snapshot: &StoreSnapshot) -> Result<(), EcsError> {
    let mut seen = HashSet::new();
    for e in &snapshot.entities {
        if e.entity_id.index() >= snapshot.next_id {
            return Err(invalid(format!(
                "entity {} is at or beyond the id counter {}",
                e.entity_id, snapshot.next_id
            )));
        }
        if !seen.insert(e.entity_id) {
            return Err(invalid(format!("entity {} appears twice", e.entity_id)));
        }
        if let Some(st) = &e.status {
            if !st.is_consistent() {
                return Err(invalid(format!(
                    "entity {} has hp {} outside 0..={}",
                    e.entity_id,
                    st.hp(),
                    st.max_hp()
                )));
            }
        }
    }

    if let Some(pid) = snapshot.player {
        let player = snapshot
            .entities
            .iter()
            .find(|e| e.entity_id == pid)
            .ok_or_else(|| invalid(format!("player {pid} has no entity record")))?;
        if player.kind != EntityKind::Player {
            return Err(invalid(format!("player {pid} is a {:?}", player.kind)));
        }
    }

    let mut carried = HashSet::new();
    for e in &snapshot.entities {
        let Some(inv) = &e.inventory else { continue };
        for item in &inv.items {
            let record = snapshot
                .entities
                .iter()
                .find(|r| r.entity_id == *item)
                .ok_or_else(|| {
                    invalid(format!("inventory of {} holds unknown {item}", e.entity_id))
                })?;
            if record.kind.item().is_none() {
                return Err(invalid(format!(
                    "inventory of {} holds non-item {item}",
                    e.entity_id
                )));
            }
            if record.position.is_some() {
                return Err(invalid(format!(
                    "carried item {item} also lies on the floor"
                )));
            }
            if !carried.insert(*item) {
                return Err(invalid(format!("item {item} is carried twice")));
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Color, ItemKind};

    fn sample_store() -> EntityStore {
        let mut store = EntityStore::new();
        let pid = store.add_entity(EntityKind::Player, Point::new(1, 1));
        store.insert_status(pid, Status::new(30, 5, 2).with_hp(12));
        store.insert_inventory(pid, Inventory::default());
        store.set_name(pid, "You");
        store.set_style(
            pid,
            Style {
                glyph: '@',
                color: Color::Player,
            },
        );
        store.set_player(pid).unwrap();

        let orc = store.add_entity(EntityKind::Enemy, Point::new(3, 1));
        store.insert_status(orc, Status::new(10, 3, 0));
        let mut ai = EnemyAi::default();
        ai.path.push_back(Point::new(2, 1));
        store.insert_ai(orc, ai);

        let potion = store.add_entity(
            EntityKind::Item(ItemKind::HealingPotion { amount: 100 }),
            Point::new(1, 1),
        );
        store.pick_up(pid, potion).unwrap();
        store
    }

    #[test]
    fn capture_restore_round_trip() {
        let store = sample_store();
        let snap = store.capture_snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: StoreSnapshot = serde_json::from_str(&json).unwrap();
        let restored = EntityStore::from_snapshot(&back).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn restored_counter_never_reuses_ids() {
        let store = sample_store();
        let mut restored = EntityStore::from_snapshot(&store.capture_snapshot()).unwrap();
        let fresh = restored.add_entity(EntityKind::Enemy, Point::new(0, 0));
        assert_eq!(fresh, EntityId::new(3));
    }

    #[test]
    fn rejected_snapshot_leaves_store_untouched() {
        let mut store = sample_store();
        let before = store.clone();
        let mut snap = store.capture_snapshot();
        snap.entities.push(snap.entities[0].clone());
        assert!(matches!(
            store.restore_from_snapshot(&snap),
            Err(EcsError::InvalidSnapshot { .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn carried_item_on_floor_is_rejected() {
        let store = sample_store();
        let mut snap = store.capture_snapshot();
        snap.entities[2].position = Some(Point::new(0, 0));
        assert!(EntityStore::from_snapshot(&snap).is_err());
    }

    #[test]
    fn id_beyond_counter_is_rejected() {
        let store = sample_store();
        let mut snap = store.capture_snapshot();
        snap.next_id = 2;
        assert!(EntityStore::from_snapshot(&snap).is_err());
    }
}
