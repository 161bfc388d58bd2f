//! Allow/deny item filters used by the magnet.

use modvault_registry::ItemStack;
use modvault_utils::Identifier;
use simdnbt::owned::NbtCompound;

use crate::codec::nbt_fields::{identifiers_tag, nbt_bool, nbt_identifiers};

/// Whether the filter list admits or rejects its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Only listed items pass. An empty list lets everything through.
    #[default]
    Allow,
    /// Listed items are rejected.
    Deny,
}

/// An item filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemFilter {
    /// How `items` is applied.
    pub mode: FilterMode,
    /// Filtered item keys.
    pub items: Vec<Identifier>,
}

impl ItemFilter {
    /// A filter that admits exactly the given items.
    #[must_use]
    pub fn allow(items: Vec<Identifier>) -> Self {
        Self {
            mode: FilterMode::Allow,
            items,
        }
    }

    /// A filter that rejects the given items.
    #[must_use]
    pub fn deny(items: Vec<Identifier>) -> Self {
        Self {
            mode: FilterMode::Deny,
            items,
        }
    }

    /// Returns true if the stack passes the filter.
    #[must_use]
    pub fn accepts(&self, stack: &ItemStack) -> bool {
        let Some(key) = stack.key() else {
            return false;
        };
        let listed = self.items.contains(key);
        match self.mode {
            FilterMode::Allow => self.items.is_empty() || listed,
            FilterMode::Deny => !listed,
        }
    }

    pub(crate) fn write(&self, nbt: &mut NbtCompound) {
        nbt.insert("Whitelist", i8::from(self.mode == FilterMode::Allow));
        nbt.insert("Filter", identifiers_tag(&self.items));
    }

    pub(crate) fn read(nbt: &NbtCompound) -> Self {
        let mode = if nbt_bool(nbt, "Whitelist").unwrap_or(true) {
            FilterMode::Allow
        } else {
            FilterMode::Deny
        };
        Self {
            mode,
            items: nbt_identifiers(nbt, "Filter"),
        }
    }
}

#[cfg(test)]
mod tests {
    use modvault_registry::Registry;

    use super::*;

    #[test]
    fn test_allow_and_deny() {
        let registry = Registry::new_vanilla();
        let coal = registry
            .items
            .stack(&Identifier::vanilla_static("coal"), 1)
            .unwrap();
        let dirt = registry
            .items
            .stack(&Identifier::vanilla_static("dirt"), 1)
            .unwrap();

        let everything = ItemFilter::default();
        assert!(everything.accepts(&coal));
        assert!(!everything.accepts(&ItemStack::empty()));

        let only_coal = ItemFilter::allow(vec![Identifier::vanilla_static("coal")]);
        assert!(only_coal.accepts(&coal));
        assert!(!only_coal.accepts(&dirt));

        let no_dirt = ItemFilter::deny(vec![Identifier::vanilla_static("dirt")]);
        assert!(no_dirt.accepts(&coal));
        assert!(!no_dirt.accepts(&dirt));
    }

    #[test]
    fn test_filter_nbt() {
        let filter = ItemFilter::deny(vec![Identifier::vanilla_static("dirt")]);
        let mut nbt = NbtCompound::new();
        filter.write(&mut nbt);
        assert_eq!(ItemFilter::read(&nbt), filter);
        assert_eq!(ItemFilter::read(&NbtCompound::new()), ItemFilter::default());
    }
}
