//! Item stacks: how many of what, with what extra attributes.

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

use modvault_utils::Identifier;

use crate::item::{FoodProperties, Item, ItemRef};

/// Stack size used when a stack has no item.
const FALLBACK_MAX_STACK: i32 = 64;

/// Extra attributes carried by a stack. Two stacks only merge when these match.
pub type ItemComponents = BTreeMap<String, String>;

/// A stack of items.
///
/// An empty stack stands in for an empty slot, so grids are plain
/// `Vec<ItemStack>` with no `Option` wrapping.
#[derive(Debug, Clone, Default)]
pub struct ItemStack {
    item: Option<ItemRef>,
    count: i32,
    components: ItemComponents,
}

impl ItemStack {
    /// The empty stack.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A stack of one.
    #[must_use]
    pub fn new(item: ItemRef) -> Self {
        Self::with_count(item, 1)
    }

    /// A stack of `count` items without components.
    #[must_use]
    pub fn with_count(item: ItemRef, count: i32) -> Self {
        Self {
            item: Some(item),
            count,
            components: ItemComponents::new(),
        }
    }

    /// A stack of `count` items with the given components.
    #[must_use]
    pub fn with_count_and_components(item: ItemRef, count: i32, components: ItemComponents) -> Self {
        Self {
            item: Some(item),
            count,
            components,
        }
    }

    /// Returns true for the empty stack or a stack whose count dropped to zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item.is_none() || self.count <= 0
    }

    /// The item definition, if any.
    #[must_use]
    pub fn item(&self) -> Option<&Item> {
        if self.is_empty() {
            None
        } else {
            self.item.as_deref()
        }
    }

    /// The shared item handle, if any.
    #[must_use]
    pub fn item_ref(&self) -> Option<&ItemRef> {
        if self.is_empty() { None } else { self.item.as_ref() }
    }

    /// The item's key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Identifier> {
        self.item().map(|item| &item.key)
    }

    /// Returns true if this stack holds the item with `key`.
    #[must_use]
    pub fn is(&self, key: &Identifier) -> bool {
        self.key() == Some(key)
    }

    /// The number of items in the stack; zero when empty.
    #[must_use]
    pub fn count(&self) -> i32 {
        if self.is_empty() { 0 } else { self.count }
    }

    /// Sets the count. A count of zero or less empties the stack.
    pub fn set_count(&mut self, count: i32) {
        self.count = count;
        if self.count <= 0 {
            *self = Self::empty();
        }
    }

    /// Increases the count.
    pub fn grow(&mut self, amount: i32) {
        self.set_count(self.count + amount);
    }

    /// Decreases the count, emptying the stack if it reaches zero.
    pub fn shrink(&mut self, amount: i32) {
        self.set_count(self.count - amount);
    }

    /// Splits off up to `amount` items into a new stack.
    pub fn split(&mut self, amount: i32) -> ItemStack {
        let taken = amount.min(self.count());
        if taken <= 0 {
            return Self::empty();
        }
        let result = self.copy_with_count(taken);
        self.shrink(taken);
        result
    }

    /// Clones this stack with a different count.
    #[must_use]
    pub fn copy_with_count(&self, count: i32) -> ItemStack {
        if self.is_empty() {
            return Self::empty();
        }
        let mut copy = self.clone();
        copy.set_count(count);
        copy
    }

    /// Takes the whole stack, leaving this one empty.
    pub fn copy_and_clear(&mut self) -> ItemStack {
        mem::take(self)
    }

    /// Maximum stack size of the item.
    #[must_use]
    pub fn max_stack_size(&self) -> i32 {
        self.item().map_or(FALLBACK_MAX_STACK, |item| item.max_stack_size)
    }

    /// Returns true if more than one of this item fits in a slot.
    #[must_use]
    pub fn is_stackable(&self) -> bool {
        self.max_stack_size() > 1
    }

    /// Burn time when used as fuel.
    #[must_use]
    pub fn burn_ticks(&self) -> Option<i32> {
        self.item().and_then(|item| item.burn_ticks)
    }

    /// Food properties when edible.
    #[must_use]
    pub fn food(&self) -> Option<FoodProperties> {
        self.item().and_then(|item| item.food)
    }

    /// All components.
    #[must_use]
    pub fn components(&self) -> &ItemComponents {
        &self.components
    }

    /// A single component value.
    #[must_use]
    pub fn component(&self, key: &str) -> Option<&str> {
        self.components.get(key).map(String::as_str)
    }

    /// Returns true if the component is present.
    #[must_use]
    pub fn has_component(&self, key: &str) -> bool {
        self.components.contains_key(key)
    }

    /// Sets a component value.
    pub fn set_component(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.components.insert(key.into(), value.into());
    }

    /// Removes a component, returning its value.
    pub fn remove_component(&mut self, key: &str) -> Option<String> {
        self.components.remove(key)
    }

    /// Returns true if both stacks hold the same item type.
    #[must_use]
    pub fn is_same_item(a: &ItemStack, b: &ItemStack) -> bool {
        match (a.key(), b.key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Returns true if both stacks could merge: same item and same components.
    #[must_use]
    pub fn is_same_item_same_components(a: &ItemStack, b: &ItemStack) -> bool {
        Self::is_same_item(a, b) && a.components == b.components
    }
}

impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }
        self.count == other.count && Self::is_same_item_same_components(self, other)
    }
}

impl From<Item> for ItemStack {
    fn from(item: Item) -> Self {
        Self::new(Arc::new(item))
    }
}
