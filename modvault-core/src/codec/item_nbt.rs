//! Item stack <-> NBT compound conversion.

use modvault_registry::{ItemComponents, ItemRegistry, ItemStack};
use modvault_utils::Identifier;
use simdnbt::owned::{NbtCompound, NbtTag};

use super::nbt_fields::{nbt_compound, nbt_i32, nbt_string, string_tag};

/// Serializes a stack. The empty stack becomes the empty compound.
#[must_use]
pub fn item_to_nbt(stack: &ItemStack) -> NbtCompound {
    let mut nbt = NbtCompound::new();
    let Some(key) = stack.key() else {
        return nbt;
    };
    nbt.insert("id", string_tag(&key.to_string()));
    nbt.insert("count", stack.count());
    if !stack.components().is_empty() {
        let mut components = NbtCompound::new();
        for (name, value) in stack.components() {
            components.insert(name.as_str(), string_tag(value));
        }
        nbt.insert("components", NbtTag::Compound(components));
    }
    nbt
}

/// Deserializes a stack.
///
/// Anything that does not describe a stack decodes to the empty stack. Unknown
/// item keys are kept through a placeholder definition so they survive a
/// load/save cycle.
#[must_use]
pub fn item_from_nbt(nbt: &NbtCompound, items: &ItemRegistry) -> ItemStack {
    let Some(id) = nbt_string(nbt, "id") else {
        return ItemStack::empty();
    };
    let Ok(key) = id.parse::<Identifier>() else {
        log::debug!("Dropping stack with malformed id {id:?}");
        return ItemStack::empty();
    };
    let count = nbt_i32(nbt, "count").unwrap_or(1);
    if count <= 0 {
        return ItemStack::empty();
    }

    let mut components = ItemComponents::new();
    if let Some(compound) = nbt_compound(nbt, "components") {
        for (name, value) in compound.iter() {
            if let NbtTag::String(value) = value {
                components.insert(name.to_str().to_string(), value.to_str().to_string());
            }
        }
    }

    ItemStack::with_count_and_components(items.get_or_placeholder(&key), count, components)
}
