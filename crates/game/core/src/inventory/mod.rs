//! Capacity- and weight-bounded item store.
//!
//! An [`Inventory`] is owned by exactly one entity. It computes authoritative
//! add/consume results; gating those calls to the authoritative replica is the
//! world's job. Two counters drive replication:
//!
//! - the inventory's `items_key` moves whenever the item *set* changes and asks
//!   observers for a full refresh
//! - each [`Item`]'s own `rep_key` moves on field changes and asks for a patch
//!   of that item only
mod result;

pub use result::{AddResult, AddStatus};

use tracing::debug;

use crate::error::Rejection;
use crate::item::{Item, ItemDefinition, ItemKind};
use crate::signal::Signal;
use crate::types::{EntityId, ItemId};

/// Notifications raised by an [`Inventory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InventoryEvent {
    ItemAdded {
        item: ItemId,
        kind: ItemKind,
        quantity: u32,
    },
    ItemRemoved {
        item: ItemId,
        kind: ItemKind,
    },
    QuantityChanged {
        item: ItemId,
        quantity: u32,
    },
    /// Capacity changed or the whole list was replaced by the authority.
    Refreshed,
}

#[derive(Clone, Debug)]
pub struct Inventory {
    owner: EntityId,
    items: Vec<Item>,
    capacity: usize,
    weight_capacity: f32,
    items_key: u32,
    next_serial: u32,
    events: Signal<InventoryEvent>,
}

impl Inventory {
    pub fn new(owner: EntityId, capacity: usize, weight_capacity: f32) -> Self {
        Self {
            owner,
            items: Vec::new(),
            capacity,
            weight_capacity,
            items_key: 0,
            next_serial: 0,
            events: Signal::new(),
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn weight_capacity(&self) -> f32 {
        self.weight_capacity
    }

    pub fn items_key(&self) -> u32 {
        self.items_key
    }

    pub fn events_mut(&mut self) -> &mut Signal<InventoryEvent> {
        &mut self.events
    }

    pub fn current_weight(&self) -> f32 {
        self.items.iter().map(Item::stack_weight).sum()
    }

    pub fn get(&self, item: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == item)
    }

    pub(crate) fn get_mut(&mut self, item: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id() == item)
    }

    /// First stack of `kind`.
    pub fn find(&self, kind: ItemKind) -> Option<&Item> {
        self.items.iter().find(|i| i.kind() == kind)
    }

    pub fn find_all(&self, kind: ItemKind) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |i| i.kind() == kind)
    }

    /// Quantity of `kind` summed over all stacks.
    pub fn total_quantity(&self, kind: ItemKind) -> u32 {
        self.find_all(kind).map(Item::quantity).sum()
    }

    pub fn has_item(&self, kind: ItemKind, quantity: u32) -> bool {
        self.total_quantity(kind) >= quantity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.mark_dirty();
        self.events.emit(&InventoryEvent::Refreshed);
    }

    pub fn set_weight_capacity(&mut self, weight_capacity: f32) {
        self.weight_capacity = weight_capacity;
        self.mark_dirty();
        self.events.emit(&InventoryEvent::Refreshed);
    }

    /// Adds a copy of `item`, requesting its whole quantity.
    ///
    /// The store never adopts the caller's instance; a fresh item owned by this
    /// inventory is minted instead.
    pub fn try_add(&mut self, item: &Item) -> AddResult {
        let requested = item.quantity();
        debug_assert!(requested > 0, "adding an empty stack of {}", item.kind());
        if requested == 0 {
            return AddResult::nothing();
        }

        if item.is_stackable()
            && let Some(index) = self.items.iter().position(|i| i.kind() == item.kind())
        {
            return self.add_to_stack(index, item, requested);
        }

        if self.items.len() + 1 > self.capacity {
            return AddResult::none(requested, Rejection::full());
        }

        if !item.is_weightless()
            && self.current_weight() + item.stack_weight() > self.weight_capacity
        {
            return AddResult::none(requested, Rejection::too_heavy());
        }

        debug_assert!(
            item.is_stackable() || requested == 1,
            "non-stackable {} arrived with quantity {requested}",
            item.kind()
        );

        let mut owned = item.clone();
        owned.reassign(self.mint_id());
        owned.set_equipped(false);
        self.push(owned);

        AddResult::all(requested)
    }

    /// Adds `quantity` units of a catalog item. A quantity of zero adds nothing.
    pub fn try_add_definition(&mut self, definition: &ItemDefinition, quantity: u32) -> AddResult {
        if quantity == 0 {
            return AddResult::nothing();
        }
        let template = definition.instantiate(ItemId::new(self.owner, u32::MAX), quantity);
        let mut result = self.try_add(&template);
        // A single stack caps the template; report against the caller's request.
        if template.quantity() < quantity {
            result = result.truncated_to_request(quantity);
        }
        result
    }

    /// Removes up to `quantity` units of `item`, returning how many were removed.
    ///
    /// A stack that reaches zero is removed from the store (full refresh);
    /// otherwise only that item's quantity is marked for replication.
    pub fn consume(&mut self, item: ItemId, quantity: u32) -> u32 {
        debug_assert!(quantity > 0, "consuming zero of {item}");
        let Some(index) = self.items.iter().position(|i| i.id() == item) else {
            return 0;
        };

        let stack = &mut self.items[index];
        let removed = quantity.min(stack.quantity());
        let remaining = stack.quantity() - removed;
        stack.set_quantity(i64::from(remaining));

        if remaining == 0 {
            self.remove_at(index);
        } else {
            self.events.emit(&InventoryEvent::QuantityChanged {
                item,
                quantity: remaining,
            });
        }
        removed
    }

    /// Removes up to `quantity` units of `kind` across stacks, oldest first.
    pub fn consume_kind(&mut self, kind: ItemKind, quantity: u32) -> u32 {
        let mut removed = 0;
        while removed < quantity {
            let Some(stack) = self.find(kind).map(Item::id) else {
                break;
            };
            let taken = self.consume(stack, quantity - removed);
            if taken == 0 {
                break;
            }
            removed += taken;
        }
        removed
    }

    /// Removes the whole stack regardless of quantity.
    pub fn remove(&mut self, item: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id() == item)?;
        Some(self.remove_at(index))
    }

    pub(crate) fn set_equipped(&mut self, item: ItemId, equipped: bool) -> bool {
        self.get_mut(item)
            .is_some_and(|stack| stack.set_equipped(equipped))
    }

    /// Replaces the whole list with the authority's copy.
    pub(crate) fn apply_remote_items(
        &mut self,
        items_key: u32,
        capacity: usize,
        weight_capacity: f32,
        items: Vec<Item>,
    ) {
        self.items = items;
        self.items_key = items_key;
        self.capacity = capacity;
        self.weight_capacity = weight_capacity;
        self.events.emit(&InventoryEvent::Refreshed);
    }

    /// Overwrites one item's replicated fields. Returns false for unknown items.
    pub(crate) fn apply_remote_item(
        &mut self,
        item: ItemId,
        rep_key: u32,
        quantity: u32,
        equipped: bool,
    ) -> bool {
        let Some(stack) = self.get_mut(item) else {
            return false;
        };
        stack.apply_remote(rep_key, quantity, equipped);
        self.events
            .emit(&InventoryEvent::QuantityChanged { item, quantity });
        true
    }

    fn add_to_stack(&mut self, index: usize, incoming: &Item, requested: u32) -> AddResult {
        let free_weight = (self.weight_capacity - self.current_weight()).max(0.0);
        let stack = &mut self.items[index];

        if stack.quantity() >= stack.max_quantity() {
            return AddResult::none(requested, Rejection::StackFull);
        }

        let stack_room = stack.max_quantity() - stack.quantity();
        let weight_room = if stack.is_weightless() {
            u32::MAX
        } else {
            (free_weight / stack.weight()).floor() as u32
        };
        let actual = requested.min(stack_room).min(weight_room);

        if actual == 0 {
            return AddResult::none(requested, Rejection::too_heavy());
        }

        stack.set_quantity(i64::from(stack.quantity() + actual));
        let (item, kind) = (stack.id(), stack.kind());
        self.mark_dirty();
        self.events.emit(&InventoryEvent::ItemAdded {
            item,
            kind,
            quantity: actual,
        });
        debug!(
            target: "core::inventory",
            owner = %self.owner,
            kind = %incoming.kind(),
            requested,
            granted = actual,
            "stacked item"
        );

        if actual == requested {
            AddResult::all(requested)
        } else if weight_room < stack_room.min(requested) {
            AddResult::some(requested, actual, Rejection::too_heavy())
        } else {
            AddResult::some(requested, actual, Rejection::StackFull)
        }
    }

    fn push(&mut self, item: Item) {
        let event = InventoryEvent::ItemAdded {
            item: item.id(),
            kind: item.kind(),
            quantity: item.quantity(),
        };
        debug!(
            target: "core::inventory",
            owner = %self.owner,
            item = %item.id(),
            kind = %item.kind(),
            quantity = item.quantity(),
            "added item"
        );
        self.items.push(item);
        self.mark_dirty();
        self.events.emit(&event);
    }

    fn remove_at(&mut self, index: usize) -> Item {
        let item = self.items.remove(index);
        self.mark_dirty();
        self.events.emit(&InventoryEvent::ItemRemoved {
            item: item.id(),
            kind: item.kind(),
        });
        item
    }

    fn mint_id(&mut self) -> ItemId {
        let id = ItemId::new(self.owner, self.next_serial);
        self.next_serial = self.next_serial.wrapping_add(1);
        id
    }

    fn mark_dirty(&mut self) {
        self.items_key = self.items_key.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests;
