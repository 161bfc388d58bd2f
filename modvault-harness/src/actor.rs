//! Test actors.

use modvault_core::ScreenBinding;
use modvault_core::inventory::PlayerInventory;
use modvault_registry::ItemStack;
use modvault_utils::Vector3;

/// An online actor as the test host sees it.
#[derive(Debug, Clone)]
pub struct TestActor {
    /// Display name.
    pub name: String,
    /// The world the actor is in.
    pub world: String,
    /// Position.
    pub pos: Vector3<f64>,
    /// Main inventory.
    pub inventory: PlayerInventory,
    /// Food level, 0-20.
    pub food_level: i32,
    /// The container screen the actor has open.
    pub screen: Option<ScreenBinding>,
    /// Everything the actor was fed, in order.
    pub eaten: Vec<ItemStack>,
    /// Feedback messages received.
    pub messages: Vec<String>,
}

impl TestActor {
    /// A well-fed actor with an empty inventory and no screen open.
    #[must_use]
    pub fn new(name: &str, world: &str, pos: Vector3<f64>) -> Self {
        Self {
            name: name.to_string(),
            world: world.to_string(),
            pos,
            inventory: PlayerInventory::new(),
            food_level: 20,
            screen: None,
            eaten: Vec::new(),
            messages: Vec::new(),
        }
    }
}
