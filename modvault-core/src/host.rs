//! The capabilities the engine needs from the game it runs inside.
//!
//! Rendering, commands, world placement and entity bookkeeping all live on the
//! other side of this trait. The engine calls it synchronously from its own
//! tick, so implementations must not call back into the engine.

use modvault_registry::ItemStack;
use modvault_utils::Vector3;
use thiserror::Error;

use crate::ids::{ActorId, ContainerId, ScreenBinding};
use crate::inventory::PlayerInventory;

/// Where a container currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerLocation {
    /// Carried by an actor.
    Carried {
        /// The carrier.
        actor: ActorId,
        /// The carrier's world.
        world: String,
        /// The carrier's position.
        pos: Vector3<f64>,
    },
    /// Placed in a world.
    Placed {
        /// The world.
        world: String,
        /// Block position.
        pos: Vector3<f64>,
    },
}

impl ContainerLocation {
    /// The world the container is in.
    #[must_use]
    pub fn world(&self) -> &str {
        match self {
            Self::Carried { world, .. } | Self::Placed { world, .. } => world,
        }
    }

    /// The position scans are centred on.
    #[must_use]
    pub fn pos(&self) -> Vector3<f64> {
        match self {
            Self::Carried { pos, .. } | Self::Placed { pos, .. } => *pos,
        }
    }

    /// The carrying actor, if carried.
    #[must_use]
    pub fn carrier(&self) -> Option<ActorId> {
        match self {
            Self::Carried { actor, .. } => Some(*actor),
            Self::Placed { .. } => None,
        }
    }
}

/// A loose item lying in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntity {
    /// Host-side entity id.
    pub entity_id: i32,
    /// The items it carries.
    pub stack: ItemStack,
    /// Its position.
    pub pos: Vector3<f64>,
}

/// Furnace progress pushed to an open cooking screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookingProgress {
    /// Ticks of burn left.
    pub burn_remaining: i32,
    /// Burn ticks of the current fuel item.
    pub burn_total: i32,
    /// Progress towards the next craft.
    pub cook_progress: i32,
    /// Ticks per craft.
    pub cook_total: i32,
}

/// Failure of an optional host side channel.
#[derive(Debug, Error)]
pub enum HostError {
    /// The side channel is not available for this actor or screen.
    #[error("side channel unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator capabilities.
pub trait Host: Send + Sync {
    /// The screen `actor` currently has open, if it is tied to a container.
    ///
    /// This is the live-session probe used to detect stale locks.
    fn open_screen(&self, actor: ActorId) -> Option<ScreenBinding>;

    /// Closes whatever container screen `actor` has open.
    fn force_close(&self, actor: ActorId);

    /// Sends a feedback message to `actor`.
    fn notify(&self, actor: ActorId, message: &str);

    /// Display name of `actor`, if known.
    fn actor_name(&self, actor: ActorId) -> Option<String>;

    /// Where the container is, if it is loaded anywhere.
    fn locate(&self, container: ContainerId) -> Option<ContainerLocation>;

    /// Loose items within `radius` of `center`, at most `limit` of them.
    fn nearby_items(
        &self,
        world: &str,
        center: Vector3<f64>,
        radius: f64,
        limit: usize,
    ) -> Vec<ItemEntity>;

    /// Replaces an item entity's stack. An empty stack removes the entity.
    fn update_item_entity(&self, entity_id: i32, remaining: ItemStack);

    /// Runs `f` against `actor`'s inventory. Returns `f`'s result, or false if
    /// the actor is not online.
    fn with_inventory(
        &self,
        actor: ActorId,
        f: &mut dyn FnMut(&mut PlayerInventory) -> bool,
    ) -> bool;

    /// `actor`'s food level (0-20), if online.
    fn food_level(&self, actor: ActorId) -> Option<i32>;

    /// Feeds one unit of `food` to `actor`. Returns false if refused.
    fn feed(&self, actor: ActorId, food: &ItemStack) -> bool;

    /// Rebuilds any carried item copies linked to `container`.
    fn refresh_carried_copies(&self, container: ContainerId);

    /// Pushes furnace progress to an open cooking screen.
    ///
    /// Optional. Failures are logged by the engine and never affect state.
    fn sync_cooking_progress(
        &self,
        _actor: ActorId,
        _container: ContainerId,
        _progress: CookingProgress,
    ) -> Result<(), HostError> {
        Ok(())
    }
}
