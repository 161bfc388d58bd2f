//! Item storage: the shared container trait, actor inventories and the
//! modular container itself.

mod container;
mod container_type;
mod modular_container;
mod player_inventory;

use modvault_registry::{CONTAINER_ITEM, ItemStack, MODULE_ITEM};

pub use container::Container;
pub use container_type::{ContainerType, ContainerTypes};
pub use modular_container::{ModularContainer, Owner, SharingInfo};
pub use player_inventory::{HOTBAR_SIZE, INVENTORY_SIZE, PlayerInventory};

/// Component carrying a container's identity on its item.
pub const CONTAINER_COMPONENT: &str = "modvault:container";
/// Component carrying a module's id on its item.
pub const MODULE_COMPONENT: &str = "modvault:module";
/// Component carrying a module's base64 runtime state on its item.
pub const MODULE_STATE_COMPONENT: &str = "modvault:module_state";

/// Returns true for stacks that are containers or modules themselves.
///
/// Protected stacks are never pulled in by the scavenger and never restocked.
#[must_use]
pub fn is_protected(stack: &ItemStack) -> bool {
    stack.has_component(CONTAINER_COMPONENT)
        || stack.has_component(MODULE_COMPONENT)
        || stack.is(&CONTAINER_ITEM)
        || stack.is(&MODULE_ITEM)
}
