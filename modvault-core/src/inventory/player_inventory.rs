//! An actor's main inventory as seen by the restock engine.

use modvault_registry::ItemStack;

use super::Container;

/// The number of main inventory slots (excluding armor and offhand).
pub const INVENTORY_SIZE: usize = 36;
/// The number of hotbar slots.
pub const HOTBAR_SIZE: usize = 9;

/// The actor's main inventory.
///
/// Contains 36 slots, where slots 0-8 are the hotbar. Iterating slots in index
/// order therefore visits the hotbar first.
#[derive(Debug, Clone)]
pub struct PlayerInventory {
    items: [ItemStack; INVENTORY_SIZE],
    times_changed: u32,
}

impl Default for PlayerInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerInventory {
    /// Creates a new empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: std::array::from_fn(|_| ItemStack::empty()),
            times_changed: 0,
        }
    }

    /// Returns whether the given slot is a hotbar slot (0-8).
    #[must_use]
    pub const fn is_hotbar_slot(slot: usize) -> bool {
        slot < HOTBAR_SIZE
    }

    /// Returns the number of times the inventory has been modified.
    #[must_use]
    pub fn times_changed(&self) -> u32 {
        self.times_changed
    }

    /// Finds the first empty slot.
    #[must_use]
    pub fn get_free_slot(&self) -> Option<usize> {
        self.items.iter().position(ItemStack::is_empty)
    }

    /// Finds a slot containing an item that matches the given stack.
    #[must_use]
    pub fn find_slot_matching_item(&self, item: &ItemStack) -> Option<usize> {
        self.items.iter().position(|slot_item| {
            !slot_item.is_empty() && ItemStack::is_same_item_same_components(slot_item, item)
        })
    }
}

impl Container for PlayerInventory {
    fn size(&self) -> usize {
        INVENTORY_SIZE
    }

    fn get_item(&self, slot: usize) -> &ItemStack {
        &self.items[slot]
    }

    fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack {
        &mut self.items[slot]
    }

    fn set_item(&mut self, slot: usize, item: ItemStack) {
        self.items[slot] = item;
        self.set_changed();
    }

    fn set_changed(&mut self) {
        self.times_changed = self.times_changed.wrapping_add(1);
    }

    fn max_stack_size(&self) -> i32 {
        64
    }
}
