//! Container trait for item storage.

use modvault_registry::ItemStack;

/// A trait for objects that store items in slots.
///
/// Both the container grid and an actor's inventory implement this, so the
/// merge and withdraw logic the sub-engines share lives here once.
pub trait Container: Send + Sync {
    /// Returns the number of slots in this container.
    fn size(&self) -> usize;

    /// Returns true if all slots are empty.
    fn is_empty(&self) -> bool {
        (0..self.size()).all(|slot| self.get_item(slot).is_empty())
    }

    /// Gets the item in the given slot.
    fn get_item(&self, slot: usize) -> &ItemStack;

    /// Gets a mutable reference to the item in the given slot.
    fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack;

    /// Sets the item in the given slot.
    fn set_item(&mut self, slot: usize, item: ItemStack);

    /// Called when the container contents change.
    fn set_changed(&mut self);

    /// Returns the maximum stack size this container allows.
    fn max_stack_size(&self) -> i32 {
        99
    }

    /// Returns the maximum stack size for a specific item in this container.
    fn max_stack_size_for(&self, item: &ItemStack) -> i32 {
        self.max_stack_size().min(item.max_stack_size())
    }

    /// Removes up to `count` items from the given slot and returns them.
    fn remove_item(&mut self, slot: usize, count: i32) -> ItemStack {
        let item = self.get_item_mut(slot);
        if item.is_empty() || count <= 0 {
            return ItemStack::empty();
        }
        let result = item.split(count);
        if !result.is_empty() {
            self.set_changed();
        }
        result
    }

    /// Moves as much of `stack` as fits into this container.
    ///
    /// Compatible stacks are topped up first, then empty slots are filled in
    /// order. Whatever does not fit stays in `stack`. Returns true if at least
    /// one item moved.
    fn add(&mut self, stack: &mut ItemStack) -> bool {
        if stack.is_empty() {
            return false;
        }
        let original_count = stack.count();
        let max_size = self.max_stack_size_for(stack);

        for slot in 0..self.size() {
            if stack.is_empty() {
                break;
            }
            let existing = self.get_item_mut(slot);
            if !existing.is_empty()
                && ItemStack::is_same_item_same_components(existing, stack)
                && existing.count() < max_size
            {
                let moved = stack.count().min(max_size - existing.count());
                existing.grow(moved);
                stack.shrink(moved);
            }
        }

        for slot in 0..self.size() {
            if stack.is_empty() {
                break;
            }
            if self.get_item(slot).is_empty() && self.can_place_item(slot, stack) {
                let moved = stack.count().min(max_size);
                self.set_item(slot, stack.copy_with_count(moved));
                stack.shrink(moved);
            }
        }

        let added = stack.count() < original_count;
        if added {
            self.set_changed();
        }
        added
    }

    /// Withdraws up to `count` items that could merge with `template`.
    fn take_matching(&mut self, template: &ItemStack, count: i32) -> ItemStack {
        let mut taken = ItemStack::empty();
        for slot in 0..self.size() {
            let remaining = count - taken.count();
            if remaining <= 0 {
                break;
            }
            let item = self.get_item(slot);
            if item.is_empty() || !ItemStack::is_same_item_same_components(item, template) {
                continue;
            }
            let part = self.remove_item(slot, remaining);
            if taken.is_empty() {
                taken = part;
            } else {
                taken.grow(part.count());
            }
        }
        taken
    }

    /// Total number of items that could merge with `template`.
    fn count_matching(&self, template: &ItemStack) -> i32 {
        (0..self.size())
            .map(|slot| self.get_item(slot))
            .filter(|item| ItemStack::is_same_item_same_components(item, template))
            .map(ItemStack::count)
            .sum()
    }

    /// Clears all items from this container.
    fn clear(&mut self) {
        for i in 0..self.size() {
            self.set_item(i, ItemStack::empty());
        }
    }

    /// Returns whether a given item can be placed in the given slot.
    fn can_place_item(&self, _slot: usize, _item: &ItemStack) -> bool {
        true
    }
}
