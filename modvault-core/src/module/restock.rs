//! Keeps the carrier's stacks topped up from the grid.

use modvault_utils::Identifier;
use simdnbt::owned::NbtCompound;

use crate::codec::nbt_fields::{identifiers_tag, nbt_bool, nbt_i32, nbt_identifiers};
use crate::inventory::{Container, PlayerInventory, is_protected};

/// Runtime state of the restock module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestockState {
    /// Whether the module runs.
    pub enabled: bool,
    /// Stacks below this count get topped up.
    pub threshold: i32,
    /// Items eligible for restocking. Empty means every item.
    pub items: Vec<Identifier>,
}

impl RestockState {
    /// A fresh, enabled state with the given threshold.
    #[must_use]
    pub fn new(threshold: i32) -> Self {
        Self {
            enabled: true,
            threshold,
            items: Vec::new(),
        }
    }

    pub(crate) fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("Enabled", i8::from(self.enabled));
        nbt.insert("Threshold", self.threshold);
        nbt.insert("Items", identifiers_tag(&self.items));
        nbt
    }

    pub(crate) fn from_nbt(nbt: &NbtCompound, default_threshold: i32) -> Self {
        Self {
            enabled: nbt_bool(nbt, "Enabled").unwrap_or(true),
            threshold: nbt_i32(nbt, "Threshold").unwrap_or(default_threshold),
            items: nbt_identifiers(nbt, "Items"),
        }
    }
}

/// Tops up low stacks in `inventory` from matching stacks in `grid`.
///
/// Slots are visited in index order, which is hotbar first. Returns true if
/// anything moved.
pub fn restock(state: &RestockState, grid: &mut dyn Container, inventory: &mut PlayerInventory) -> bool {
    if !state.enabled {
        return false;
    }
    let mut changed = false;
    for slot in 0..inventory.size() {
        let item = inventory.get_item(slot);
        if item.is_empty() || !item.is_stackable() || is_protected(item) {
            continue;
        }
        if !state.items.is_empty() && !item.key().is_some_and(|key| state.items.contains(key)) {
            continue;
        }
        if item.count() >= state.threshold {
            continue;
        }
        let wanted = inventory.max_stack_size_for(item) - item.count();
        if wanted <= 0 {
            continue;
        }

        let template = item.clone();
        let taken = grid.take_matching(&template, wanted);
        if taken.is_empty() {
            continue;
        }
        inventory.get_item_mut(slot).grow(taken.count());
        inventory.set_changed();
        changed = true;
    }
    changed
}
