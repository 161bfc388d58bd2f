//! Typed field access on NBT compounds.
//!
//! Persisted state blobs come from many historical writers, so every reader
//! accepts the widened numeric tags and treats a missing field as `None`.

use modvault_utils::Identifier;
use simdnbt::Mutf8String;
use simdnbt::owned::{NbtCompound, NbtList, NbtTag};

/// Reads an integer stored as Byte, Short, Int or Long.
#[must_use]
pub fn nbt_i32(nbt: &NbtCompound, key: &str) -> Option<i32> {
    match nbt.get(key)? {
        NbtTag::Byte(b) => Some(i32::from(*b)),
        NbtTag::Short(s) => Some(i32::from(*s)),
        NbtTag::Int(i) => Some(*i),
        NbtTag::Long(l) => i32::try_from(*l).ok(),
        _ => None,
    }
}

/// Reads a float stored as Float, Double or an integer tag.
#[must_use]
pub fn nbt_f32(nbt: &NbtCompound, key: &str) -> Option<f32> {
    match nbt.get(key)? {
        NbtTag::Float(f) => Some(*f),
        NbtTag::Double(d) => Some(*d as f32),
        NbtTag::Int(i) => Some(*i as f32),
        _ => None,
    }
}

/// Reads a boolean stored as Byte or Int.
#[must_use]
pub fn nbt_bool(nbt: &NbtCompound, key: &str) -> Option<bool> {
    match nbt.get(key)? {
        NbtTag::Byte(b) => Some(*b != 0),
        NbtTag::Int(i) => Some(*i != 0),
        _ => None,
    }
}

/// Reads a string field.
#[must_use]
pub fn nbt_string(nbt: &NbtCompound, key: &str) -> Option<String> {
    match nbt.get(key)? {
        NbtTag::String(s) => Some(s.to_str().to_string()),
        _ => None,
    }
}

/// Reads a nested compound.
#[must_use]
pub fn nbt_compound<'a>(nbt: &'a NbtCompound, key: &str) -> Option<&'a NbtCompound> {
    match nbt.get(key)? {
        NbtTag::Compound(compound) => Some(compound),
        _ => None,
    }
}

/// Reads a list of identifiers, skipping entries that fail to parse.
#[must_use]
pub fn nbt_identifiers(nbt: &NbtCompound, key: &str) -> Vec<Identifier> {
    match nbt.get(key) {
        Some(NbtTag::List(NbtList::String(values))) => values
            .iter()
            .filter_map(|value| value.to_str().parse().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Builds a string tag.
#[must_use]
pub fn string_tag(value: &str) -> NbtTag {
    NbtTag::String(Mutf8String::from(value))
}

/// Builds a list tag of identifiers.
#[must_use]
pub fn identifiers_tag(values: &[Identifier]) -> NbtTag {
    if values.is_empty() {
        return NbtTag::List(NbtList::Empty);
    }
    NbtTag::List(NbtList::String(
        values
            .iter()
            .map(|id| Mutf8String::from(id.to_string()))
            .collect(),
    ))
}
