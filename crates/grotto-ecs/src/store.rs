//! The [`EntityStore`] is the shared substrate of the simulation. It owns the
//! id allocator and one sparse [`ComponentTable`] per component type.

use crate::component::{
    Color, ComponentTable, EnemyAi, EntityKind, Inventory, RenderOrder, Status, Style,
};
use crate::entity::{EntityAllocator, EntityId};
use crate::point::Point;
use crate::EcsError;

/// Name shown for any actor whose HP has dropped to zero.
pub const CORPSE_NAME: &str = "corpse";

/// Style shown for any actor whose HP has dropped to zero.
pub const CORPSE_STYLE: Style = Style {
    glyph: '%',
    color: Color::Default,
};

/// Parallel sparse component tables keyed by [`EntityId`].
///
/// `add_entity` only records the kind and position; spawn routines fill in
/// the remaining components afterwards. Entities are never removed: dead
/// actors keep their status (HP <= 0) and carried items merely lose their
/// position.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EntityStore {
    pub(crate) allocator: EntityAllocator,
    pub(crate) player: Option<EntityId>,
    pub(crate) kinds: ComponentTable<EntityKind>,
    pub(crate) positions: ComponentTable<Point>,
    pub(crate) statuses: ComponentTable<Status>,
    pub(crate) ai: ComponentTable<EnemyAi>,
    pub(crate) names: ComponentTable<String>,
    pub(crate) styles: ComponentTable<Style>,
    pub(crate) inventories: ComponentTable<Inventory>,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -- creation -----------------------------------------------------------

    /// Allocate the next id, record its kind and position, and return it.
    pub fn add_entity(&mut self, kind: EntityKind, position: Point) -> EntityId {
        let id = self.allocator.allocate();
        self.kinds.insert(id, kind);
        self.positions.insert(id, position);
        tracing::trace!(entity = %id, ?kind, %position, "entity added");
        id
    }

    /// Allocate an entity that starts out contained (no position).
    pub fn add_contained(&mut self, kind: EntityKind) -> EntityId {
        let id = self.allocator.allocate();
        self.kinds.insert(id, kind);
        id
    }

    /// Designate the player entity. The player id cannot change once set.
    ///
    /// # Errors
    ///
    /// Fails if a different player is already designated, if `id` does not
    /// exist, or if it is not of kind [`EntityKind::Player`].
    pub fn set_player(&mut self, id: EntityId) -> Result<(), EcsError> {
        if let Some(existing) = self.player {
            if existing != id {
                return Err(EcsError::PlayerAlreadySet { existing });
            }
            return Ok(());
        }
        match self.kinds.get(id) {
            None => Err(EcsError::MissingEntity { entity: id }),
            Some(EntityKind::Player) => {
                self.player = Some(id);
                Ok(())
            }
            Some(_) => Err(EcsError::WrongKind {
                entity: id,
                expected: "player",
            }),
        }
    }

    pub fn insert_status(&mut self, id: EntityId, status: Status) {
        self.statuses.insert(id, status);
    }

    pub fn insert_ai(&mut self, id: EntityId, ai: EnemyAi) {
        self.ai.insert(id, ai);
    }

    pub fn set_name(&mut self, id: EntityId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn set_style(&mut self, id: EntityId, style: Style) {
        self.styles.insert(id, style);
    }

    pub fn insert_inventory(&mut self, id: EntityId, inventory: Inventory) {
        self.inventories.insert(id, inventory);
    }

    /// Overwrite the position of `id`. No walkability check is made; callers
    /// validate the destination first.
    pub fn move_entity(&mut self, id: EntityId, position: Point) {
        self.positions.insert(id, position);
    }

    // -- component access ---------------------------------------------------

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.kinds.contains(id)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// All entity ids in store iteration order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.kinds.ids()
    }

    /// The id the next spawned entity will get.
    pub fn next_id(&self) -> EntityId {
        self.allocator.peek_next()
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.kinds.get(id).copied()
    }

    pub fn position(&self, id: EntityId) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn status(&self, id: EntityId) -> Option<&Status> {
        self.statuses.get(id)
    }

    pub fn status_mut(&mut self, id: EntityId) -> Option<&mut Status> {
        self.statuses.get_mut(id)
    }

    pub fn ai(&self, id: EntityId) -> Option<&EnemyAi> {
        self.ai.get(id)
    }

    pub fn ai_mut(&mut self, id: EntityId) -> Option<&mut EnemyAi> {
        self.ai.get_mut(id)
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn style(&self, id: EntityId) -> Option<Style> {
        self.styles.get(id).copied()
    }

    pub fn inventory(&self, id: EntityId) -> Option<&Inventory> {
        self.inventories.get(id)
    }

    pub fn positions(&self) -> &ComponentTable<Point> {
        &self.positions
    }

    pub fn statuses(&self) -> &ComponentTable<Status> {
        &self.statuses
    }

    // -- life and death -----------------------------------------------------

    /// Has a status and positive HP.
    pub fn alive(&self, id: EntityId) -> bool {
        self.statuses.get(id).is_some_and(Status::is_alive)
    }

    /// Has a status and HP at or below zero.
    pub fn dead(&self, id: EntityId) -> bool {
        self.statuses.get(id).is_some_and(|st| !st.is_alive())
    }

    pub fn player_position(&self) -> Option<Point> {
        self.player.and_then(|id| self.position(id))
    }

    pub fn player_dead(&self) -> bool {
        self.player.is_some_and(|id| self.dead(id))
    }

    // -- spatial queries ----------------------------------------------------

    /// First living enemy standing on `p`, in store order.
    pub fn enemy_at(&self, p: Point) -> Option<EntityId> {
        self.positions
            .iter()
            .filter(|&(_, q)| *q == p)
            .map(|(id, _)| id)
            .find(|&id| self.kind(id) == Some(EntityKind::Enemy) && self.alive(id))
    }

    /// `p` is not the player's cell and no living enemy occupies it.
    pub fn no_blocking_enemy_at(&self, p: Point) -> bool {
        self.player_position() != Some(p) && self.enemy_at(p).is_none()
    }

    /// Every entity lying on `p`, in store order.
    pub fn entities_at(&self, p: Point) -> impl Iterator<Item = EntityId> + '_ {
        self.positions
            .iter()
            .filter(move |&(_, q)| *q == p)
            .map(|(id, _)| id)
    }

    /// Items lying on the floor at `p`, in store order.
    pub fn items_at(&self, p: Point) -> impl Iterator<Item = EntityId> + '_ {
        self.entities_at(p)
            .filter(move |&id| matches!(self.kind(id), Some(EntityKind::Item(_))))
    }

    // -- presentation helpers -----------------------------------------------

    /// Draw priority: corpses below items below living actors.
    pub fn render_order(&self, id: EntityId) -> RenderOrder {
        match self.kind(id) {
            None => RenderOrder::None,
            Some(EntityKind::Player) => RenderOrder::Actor,
            Some(EntityKind::Enemy) if self.dead(id) => RenderOrder::Corpse,
            Some(EntityKind::Enemy) => RenderOrder::Actor,
            Some(EntityKind::Item(_)) => RenderOrder::Item,
        }
    }

    /// Name for display; dead actors read as [`CORPSE_NAME`].
    pub fn display_name(&self, id: EntityId) -> &str {
        if self.dead(id) {
            return CORPSE_NAME;
        }
        self.name(id).unwrap_or_default()
    }

    /// Style for display; dead actors use [`CORPSE_STYLE`].
    pub fn display_style(&self, id: EntityId) -> Option<Style> {
        if self.dead(id) {
            return Some(CORPSE_STYLE);
        }
        self.style(id)
    }

    // -- inventory ----------------------------------------------------------

    /// The item in slot `index` of `actor`'s inventory.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if `actor` has no inventory,
    /// [`EcsError::InventoryIndex`] if the slot does not exist.
    pub fn inventory_item(&self, actor: EntityId, index: usize) -> Result<EntityId, EcsError> {
        let inv = self
            .inventories
            .get(actor)
            .ok_or(EcsError::MissingComponent {
                entity: actor,
                component: "inventory",
            })?;
        inv.items
            .get(index)
            .copied()
            .ok_or(EcsError::InventoryIndex {
                index,
                len: inv.items.len(),
            })
    }

    /// Move a floor item into `actor`'s inventory: its position is removed and
    /// its id appended to the inventory.
    ///
    /// # Errors
    ///
    /// Fails without touching the store if `item` is not an item, is not on
    /// the floor, or `actor` has no inventory.
    pub fn pick_up(&mut self, actor: EntityId, item: EntityId) -> Result<(), EcsError> {
        match self.kind(item) {
            None => return Err(EcsError::MissingEntity { entity: item }),
            Some(EntityKind::Item(_)) => {}
            Some(_) => {
                return Err(EcsError::WrongKind {
                    entity: item,
                    expected: "item",
                })
            }
        }
        if !self.positions.contains(item) {
            return Err(EcsError::MissingComponent {
                entity: item,
                component: "position",
            });
        }
        let inv = self
            .inventories
            .get_mut(actor)
            .ok_or(EcsError::MissingComponent {
                entity: actor,
                component: "inventory",
            })?;
        inv.items.push(item);
        self.positions.remove(item);
        Ok(())
    }

    /// Take the item in slot `index` out of `actor`'s inventory and put it on
    /// the floor at `actor`'s position. Returns the dropped item.
    ///
    /// # Errors
    ///
    /// Fails without touching the store if the slot does not exist or `actor`
    /// has no position.
    pub fn drop_item(&mut self, actor: EntityId, index: usize) -> Result<EntityId, EcsError> {
        let here = self.position(actor).ok_or(EcsError::MissingComponent {
            entity: actor,
            component: "position",
        })?;
        let item = self.take_from_inventory(actor, index)?;
        self.positions.insert(item, here);
        Ok(item)
    }

    /// Remove slot `index` from `actor`'s inventory without placing the item
    /// anywhere (used when an item is consumed).
    ///
    /// # Errors
    ///
    /// Same as [`inventory_item`](Self::inventory_item).
    pub fn take_from_inventory(
        &mut self,
        actor: EntityId,
        index: usize,
    ) -> Result<EntityId, EcsError> {
        self.inventory_item(actor, index)?;
        let inv = self
            .inventories
            .get_mut(actor)
            .ok_or(EcsError::MissingComponent {
                entity: actor,
                component: "inventory",
            })?;
        Ok(inv.items.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.allocator = EntityAllocator::new();
        self.player = None;
        self.kinds.clear();
        self.positions.clear();
        self.statuses.clear();
        self.ai.clear();
        self.names.clear();
        self.styles.clear();
        self.inventories.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
