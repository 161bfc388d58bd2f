//! Item definitions.

use std::sync::Arc;

use modvault_utils::Identifier;

/// Shared handle to an item definition.
pub type ItemRef = Arc<Item>;

/// Nutrition provided by an edible item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodProperties {
    /// Hunger points restored.
    pub nutrition: i32,
    /// Saturation modifier.
    pub saturation: f32,
}

/// Static properties of an item type.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// The item's key.
    pub key: Identifier,
    /// Maximum count a single stack may hold.
    pub max_stack_size: i32,
    /// Ticks of burn time when used as furnace fuel.
    pub burn_ticks: Option<i32>,
    /// Food properties when the item is edible.
    pub food: Option<FoodProperties>,
}

impl Item {
    /// Creates a plain item with a stack size of 64.
    #[must_use]
    pub fn new(key: Identifier) -> Self {
        Self {
            key,
            max_stack_size: 64,
            burn_ticks: None,
            food: None,
        }
    }

    /// Sets the maximum stack size.
    #[must_use]
    pub fn stacks_to(mut self, max_stack_size: i32) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    /// Marks the item as furnace fuel.
    #[must_use]
    pub fn fuel(mut self, burn_ticks: i32) -> Self {
        self.burn_ticks = Some(burn_ticks);
        self
    }

    /// Marks the item as edible.
    #[must_use]
    pub fn food(mut self, nutrition: i32, saturation: f32) -> Self {
        self.food = Some(FoodProperties {
            nutrition,
            saturation,
        });
        self
    }
}
