//! The host used when no game is attached.

use modvault_core::inventory::PlayerInventory;
use modvault_core::{ActorId, ContainerId, ContainerLocation, Host, ItemEntity, ScreenBinding};
use modvault_registry::ItemStack;
use modvault_utils::Vector3;

/// A host without actors or worlds.
///
/// Stored containers still get their cooking advanced; everything that needs
/// a location or an actor is skipped.
#[derive(Debug, Default)]
pub struct HeadlessHost;

impl Host for HeadlessHost {
    fn open_screen(&self, _actor: ActorId) -> Option<ScreenBinding> {
        None
    }

    fn force_close(&self, _actor: ActorId) {}

    fn notify(&self, actor: ActorId, message: &str) {
        log::info!("[{actor}] {message}");
    }

    fn actor_name(&self, _actor: ActorId) -> Option<String> {
        None
    }

    fn locate(&self, _container: ContainerId) -> Option<ContainerLocation> {
        None
    }

    fn nearby_items(&self, _: &str, _: Vector3<f64>, _: f64, _: usize) -> Vec<ItemEntity> {
        Vec::new()
    }

    fn update_item_entity(&self, _entity_id: i32, _remaining: ItemStack) {}

    fn with_inventory(
        &self,
        _actor: ActorId,
        _f: &mut dyn FnMut(&mut PlayerInventory) -> bool,
    ) -> bool {
        false
    }

    fn food_level(&self, _actor: ActorId) -> Option<i32> {
        None
    }

    fn feed(&self, _actor: ActorId, _food: &ItemStack) -> bool {
        false
    }

    fn refresh_carried_copies(&self, _container: ContainerId) {}
}
