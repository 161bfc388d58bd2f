//! Item and recipe registries.
//!
//! The [`Registry`] is built once at startup and shared by reference; nothing in
//! this crate is global.

mod cooking_recipe;
mod item;
mod item_stack;

use std::sync::Arc;

use modvault_utils::Identifier;
use rustc_hash::FxHashMap;

pub use cooking_recipe::{CookingRecipe, CookingRecipes, DEFAULT_COOKING_TIME};
pub use item::{FoodProperties, Item, ItemRef};
pub use item_stack::{ItemComponents, ItemStack};

/// Key of the generic module item.
pub const MODULE_ITEM: Identifier = Identifier::new_static("modvault", "module");
/// Key of the generic container item.
pub const CONTAINER_ITEM: Identifier = Identifier::new_static("modvault", "container");

/// Item definitions indexed by key.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: FxHashMap<Identifier, ItemRef>,
}

impl ItemRegistry {
    /// Creates an empty item registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an item and returns its shared handle.
    pub fn register(&mut self, item: Item) -> ItemRef {
        let item = Arc::new(item);
        self.items.insert(item.key.clone(), item.clone());
        item
    }

    /// Looks up an item by key.
    #[must_use]
    pub fn by_key(&self, key: &Identifier) -> Option<&ItemRef> {
        self.items.get(key)
    }

    /// Looks up an item, synthesizing a plain definition for unknown keys.
    ///
    /// Persisted grids can outlive the item set they were written with; an
    /// unknown key must survive a load/save cycle rather than vanish.
    #[must_use]
    pub fn get_or_placeholder(&self, key: &Identifier) -> ItemRef {
        if let Some(item) = self.items.get(key) {
            return item.clone();
        }
        log::debug!("Unknown item {key}, using placeholder definition");
        Arc::new(Item::new(key.clone()))
    }

    /// Creates a stack of `count` of the item with `key`, if registered.
    #[must_use]
    pub fn stack(&self, key: &Identifier, count: i32) -> Option<ItemStack> {
        self.by_key(key)
            .map(|item| ItemStack::with_count(item.clone(), count))
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no item is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// All static game data the container engine consults.
#[derive(Debug, Default)]
pub struct Registry {
    /// Item definitions.
    pub items: ItemRegistry,
    /// Furnace recipes.
    pub cooking: CookingRecipes,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the vanilla items and recipes the modules use.
    #[must_use]
    pub fn new_vanilla() -> Self {
        let mut registry = Self::new();
        registry.register_vanilla_items();
        registry.register_vanilla_recipes();
        registry
    }

    fn register_vanilla_items(&mut self) {
        const PLAIN: &[&str] = &[
            "iron_ore",
            "raw_iron",
            "iron_ingot",
            "gold_ore",
            "raw_gold",
            "gold_ingot",
            "cobblestone",
            "stone",
            "sand",
            "glass",
            "dirt",
            "rotten_flesh",
            "wheat",
        ];
        for &path in PLAIN {
            self.items.register(Item::new(Identifier::vanilla_static(path)));
        }

        let items = &mut self.items;
        items.register(Item::new(Identifier::vanilla_static("coal")).fuel(1600));
        items.register(Item::new(Identifier::vanilla_static("charcoal")).fuel(1600));
        items.register(Item::new(Identifier::vanilla_static("oak_log")).fuel(300));
        items.register(Item::new(Identifier::vanilla_static("oak_planks")).fuel(300));
        items.register(Item::new(Identifier::vanilla_static("stick")).fuel(100));
        items.register(Item::new(Identifier::vanilla_static("blaze_rod")).fuel(2400));
        items.register(
            Item::new(Identifier::vanilla_static("lava_bucket"))
                .stacks_to(1)
                .fuel(20000),
        );

        items.register(Item::new(Identifier::vanilla_static("beef")).food(3, 0.3));
        items.register(Item::new(Identifier::vanilla_static("cooked_beef")).food(8, 0.8));
        items.register(Item::new(Identifier::vanilla_static("potato")).food(1, 0.3));
        items.register(Item::new(Identifier::vanilla_static("baked_potato")).food(5, 0.6));
        items.register(Item::new(Identifier::vanilla_static("bread")).food(5, 0.6));
        items.register(Item::new(Identifier::vanilla_static("apple")).food(4, 0.3));
        items.register(Item::new(Identifier::vanilla_static("golden_carrot")).food(6, 1.2));
        items.register(Item::new(Identifier::vanilla_static("cookie")).food(2, 0.1));

        items.register(Item::new(Identifier::vanilla_static("diamond_sword")).stacks_to(1));
        items.register(Item::new(MODULE_ITEM).stacks_to(1));
        items.register(Item::new(CONTAINER_ITEM).stacks_to(1));
    }

    fn register_vanilla_recipes(&mut self) {
        let recipes: [(&'static str, &'static str, f32); 9] = [
            ("iron_ore", "iron_ingot", 0.7),
            ("raw_iron", "iron_ingot", 0.7),
            ("gold_ore", "gold_ingot", 1.0),
            ("raw_gold", "gold_ingot", 1.0),
            ("cobblestone", "stone", 0.1),
            ("sand", "glass", 0.1),
            ("beef", "cooked_beef", 0.35),
            ("potato", "baked_potato", 0.35),
            ("oak_log", "charcoal", 0.15),
        ];
        for (input, result, experience) in recipes {
            self.cooking.register(CookingRecipe::new(
                Identifier::vanilla_static(input),
                Identifier::vanilla_static(result),
                experience,
            ));
        }
    }
}
