//! Furnace-style cooking recipes.

use modvault_utils::Identifier;
use rustc_hash::FxHashMap;

/// Default cook time of a furnace recipe in ticks.
pub const DEFAULT_COOKING_TIME: i32 = 200;

/// A single-input cooking recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct CookingRecipe {
    /// The consumed input item.
    pub input: Identifier,
    /// The produced item.
    pub result: Identifier,
    /// How many result items one craft yields.
    pub result_count: i32,
    /// Ticks of lit cook time required per craft.
    pub cooking_time: i32,
    /// Experience accrued per craft.
    pub experience: f32,
}

impl CookingRecipe {
    /// Creates a recipe yielding one item with the default cook time.
    #[must_use]
    pub fn new(input: Identifier, result: Identifier, experience: f32) -> Self {
        Self {
            input,
            result,
            result_count: 1,
            cooking_time: DEFAULT_COOKING_TIME,
            experience,
        }
    }

    /// Overrides the cook time.
    #[must_use]
    pub fn with_cooking_time(mut self, ticks: i32) -> Self {
        self.cooking_time = ticks;
        self
    }

    /// Overrides the yield per craft.
    #[must_use]
    pub fn with_result_count(mut self, count: i32) -> Self {
        self.result_count = count;
        self
    }
}

/// Recipes indexed by input item.
#[derive(Debug, Default)]
pub struct CookingRecipes {
    by_input: FxHashMap<Identifier, CookingRecipe>,
}

impl CookingRecipes {
    /// Creates an empty recipe book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a recipe, replacing any recipe for the same input.
    pub fn register(&mut self, recipe: CookingRecipe) {
        if let Some(previous) = self.by_input.insert(recipe.input.clone(), recipe) {
            log::debug!("Replaced cooking recipe for {}", previous.input);
        }
    }

    /// Finds the recipe for an input item.
    #[must_use]
    pub fn for_input(&self, input: &Identifier) -> Option<&CookingRecipe> {
        self.by_input.get(input)
    }

    /// Number of registered recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_input.len()
    }

    /// Returns true if no recipe is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_input.is_empty()
    }
}
