//! An in-memory [`Host`].

use modvault_core::inventory::PlayerInventory;
use modvault_core::module::feeder::MAX_FOOD_LEVEL;
use modvault_core::{
    ActorId, ContainerId, ContainerLocation, CookingProgress, Host, HostError, ItemEntity,
    ScreenBinding,
};
use modvault_registry::ItemStack;
use modvault_utils::Vector3;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::actor::TestActor;
use crate::world::TestWorld;

/// Where the test host keeps a container.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// In an actor's inventory; follows the actor around.
    Carried(ActorId),
    /// Placed as a block.
    Placed {
        /// The world.
        world: String,
        /// Block position.
        pos: Vector3<f64>,
    },
}

/// A host that keeps actors, containers and item entities in memory.
///
/// Every capability the engine uses is backed by plain state tests can set
/// up and inspect.
#[derive(Default)]
pub struct TestHost {
    actors: Mutex<FxHashMap<ActorId, TestActor>>,
    placements: Mutex<FxHashMap<ContainerId, Placement>>,
    world: Mutex<TestWorld>,
    refreshes: Mutex<FxHashMap<ContainerId, u32>>,
    cooking_syncs: Mutex<Vec<(ActorId, ContainerId, CookingProgress)>>,
    force_closed: Mutex<Vec<ActorId>>,
}

impl TestHost {
    /// Brings a new actor online.
    pub fn add_actor(&self, name: &str, world: &str, pos: Vector3<f64>) -> ActorId {
        let id = ActorId::new_random();
        self.actors.lock().insert(id, TestActor::new(name, world, pos));
        id
    }

    /// Takes an actor offline.
    pub fn remove_actor(&self, actor: ActorId) -> Option<TestActor> {
        self.actors.lock().remove(&actor)
    }

    /// Runs `f` against an online actor.
    pub fn with_actor<R>(&self, actor: ActorId, f: impl FnOnce(&mut TestActor) -> R) -> Option<R> {
        self.actors.lock().get_mut(&actor).map(f)
    }

    /// Opens a container screen for `actor`.
    pub fn show_screen(&self, actor: ActorId, binding: ScreenBinding) {
        self.with_actor(actor, |state| state.screen = Some(binding));
    }

    /// Closes whatever screen `actor` has open.
    pub fn hide_screen(&self, actor: ActorId) {
        self.with_actor(actor, |state| state.screen = None);
    }

    /// Puts a container into `actor`'s inventory.
    pub fn carry(&self, container: ContainerId, actor: ActorId) {
        self.placements
            .lock()
            .insert(container, Placement::Carried(actor));
    }

    /// Places a container in a world.
    pub fn place(&self, container: ContainerId, world: &str, pos: Vector3<f64>) {
        self.placements.lock().insert(
            container,
            Placement::Placed {
                world: world.to_string(),
                pos,
            },
        );
    }

    /// Drops a loose item and returns its entity id.
    pub fn spawn_item(&self, world: &str, stack: ItemStack, pos: Vector3<f64>) -> i32 {
        self.world.lock().spawn(world, stack, pos)
    }

    /// The stack of a loose item, if it still exists.
    #[must_use]
    pub fn item_entity(&self, entity_id: i32) -> Option<ItemStack> {
        self.world
            .lock()
            .entity(entity_id)
            .map(|entity| entity.stack.clone())
    }

    /// Number of loose items left in all worlds.
    #[must_use]
    pub fn item_entity_count(&self) -> usize {
        self.world.lock().len()
    }

    /// How often carried copies of `container` were rebuilt.
    #[must_use]
    pub fn refresh_count(&self, container: ContainerId) -> u32 {
        self.refreshes.lock().get(&container).copied().unwrap_or(0)
    }

    /// Cooking progress pushed so far.
    #[must_use]
    pub fn cooking_syncs(&self) -> Vec<(ActorId, ContainerId, CookingProgress)> {
        self.cooking_syncs.lock().clone()
    }

    /// Actors whose screen the engine force-closed, in order.
    #[must_use]
    pub fn force_closed(&self) -> Vec<ActorId> {
        self.force_closed.lock().clone()
    }

    /// Messages `actor` received.
    #[must_use]
    pub fn messages(&self, actor: ActorId) -> Vec<String> {
        self.with_actor(actor, |state| state.messages.clone())
            .unwrap_or_default()
    }
}

impl Host for TestHost {
    fn open_screen(&self, actor: ActorId) -> Option<ScreenBinding> {
        self.with_actor(actor, |state| state.screen.clone()).flatten()
    }

    fn force_close(&self, actor: ActorId) {
        self.hide_screen(actor);
        self.force_closed.lock().push(actor);
    }

    fn notify(&self, actor: ActorId, message: &str) {
        self.with_actor(actor, |state| state.messages.push(message.to_string()));
    }

    fn actor_name(&self, actor: ActorId) -> Option<String> {
        self.with_actor(actor, |state| state.name.clone())
    }

    fn locate(&self, container: ContainerId) -> Option<ContainerLocation> {
        let placement = self.placements.lock().get(&container).cloned()?;
        match placement {
            Placement::Carried(actor) => self.with_actor(actor, |state| ContainerLocation::Carried {
                actor,
                world: state.world.clone(),
                pos: state.pos,
            }),
            Placement::Placed { world, pos } => Some(ContainerLocation::Placed { world, pos }),
        }
    }

    fn nearby_items(
        &self,
        world: &str,
        center: Vector3<f64>,
        radius: f64,
        limit: usize,
    ) -> Vec<ItemEntity> {
        self.world.lock().nearby(world, center, radius, limit)
    }

    fn update_item_entity(&self, entity_id: i32, remaining: ItemStack) {
        self.world.lock().update(entity_id, remaining);
    }

    fn with_inventory(
        &self,
        actor: ActorId,
        f: &mut dyn FnMut(&mut PlayerInventory) -> bool,
    ) -> bool {
        self.with_actor(actor, |state| f(&mut state.inventory))
            .unwrap_or(false)
    }

    fn food_level(&self, actor: ActorId) -> Option<i32> {
        self.with_actor(actor, |state| state.food_level)
    }

    fn feed(&self, actor: ActorId, food: &ItemStack) -> bool {
        let Some(properties) = food.food() else {
            return false;
        };
        self.with_actor(actor, |state| {
            state.food_level = (state.food_level + properties.nutrition).min(MAX_FOOD_LEVEL);
            state.eaten.push(food.clone());
            true
        })
        .unwrap_or(false)
    }

    fn refresh_carried_copies(&self, container: ContainerId) {
        *self.refreshes.lock().entry(container).or_default() += 1;
    }

    fn sync_cooking_progress(
        &self,
        actor: ActorId,
        container: ContainerId,
        progress: CookingProgress,
    ) -> Result<(), HostError> {
        if self.open_screen(actor).is_none_or(|binding| binding.container != container) {
            return Err(HostError::Unavailable(format!(
                "{actor} has no screen of {container} open"
            )));
        }
        self.cooking_syncs.lock().push((actor, container, progress));
        Ok(())
    }
}
