//! Binary codec for item grids, single stacks and module state blobs.
//!
//! Every blob is a small envelope around an NBT document:
//!
//! ```text
//! magic (3 bytes) | version (1 byte) | payload
//! ```
//!
//! `MVG` marks grids and stacks, `MVS` marks module state. Version 1 payloads
//! are a raw NBT document, version 2 payloads are the same document compressed
//! with zstd. Decoding never fails: anything unreadable comes back empty,
//! because several module families share the same blob columns and a
//! misdetected format must not take a container down with it.

pub mod item_nbt;
pub mod nbt_fields;

use std::io::Cursor;
use std::slice;

use modvault_registry::{ItemRegistry, ItemStack};
use simdnbt::owned::{BaseNbt, Nbt, NbtCompound, NbtList, NbtTag};

use item_nbt::{item_from_nbt, item_to_nbt};
use nbt_fields::nbt_i32;

/// Envelope signature of grid and stack blobs.
pub const GRID_MAGIC: [u8; 3] = *b"MVG";
/// Envelope signature of module state blobs.
pub const STATE_MAGIC: [u8; 3] = *b"MVS";

/// Uncompressed NBT payload, still accepted on read.
pub const VERSION_RAW: u8 = 1;
/// zstd-compressed NBT payload, the current writer format.
pub const VERSION_ZSTD: u8 = 2;

/// Upper bound on a declared grid size. Larger values are clamped.
pub const MAX_GRID_SLOTS: usize = 4096;

const HEADER_LEN: usize = 4;

/// Encoder/decoder for persisted blobs.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    compression_level: i32,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Codec {
    /// Creates a codec writing zstd payloads at the given level.
    #[must_use]
    pub const fn new(compression_level: i32) -> Self {
        Self { compression_level }
    }

    /// Encodes a grid, keeping empty slots at their positions.
    #[must_use]
    pub fn encode_grid(&self, grid: &[ItemStack]) -> Vec<u8> {
        let mut root = NbtCompound::new();
        root.insert("Size", grid.len() as i32);
        let items = if grid.is_empty() {
            NbtList::Empty
        } else {
            NbtList::Compound(grid.iter().map(item_to_nbt).collect())
        };
        root.insert("Items", NbtTag::List(items));
        self.wrap(GRID_MAGIC, root)
    }

    /// Decodes a grid of exactly the declared size.
    ///
    /// Missing entries are padded with empty slots and surplus entries are
    /// dropped. An empty or foreign payload yields an empty grid.
    #[must_use]
    pub fn decode_grid(bytes: &[u8], items: &ItemRegistry) -> Vec<ItemStack> {
        let Some(root) = unwrap(GRID_MAGIC, bytes) else {
            return Vec::new();
        };
        let entries: &[NbtCompound] = match root.get("Items") {
            Some(NbtTag::List(NbtList::Compound(entries))) => entries.as_slice(),
            _ => &[],
        };
        let size = nbt_i32(&root, "Size")
            .map_or(entries.len(), |size| size.max(0) as usize)
            .min(MAX_GRID_SLOTS);

        let mut grid: Vec<ItemStack> = entries
            .iter()
            .take(size)
            .map(|entry| item_from_nbt(entry, items))
            .collect();
        grid.resize_with(size, ItemStack::empty);
        grid
    }

    /// Encodes a single stack.
    #[must_use]
    pub fn encode_item(&self, stack: &ItemStack) -> Vec<u8> {
        self.encode_grid(slice::from_ref(stack))
    }

    /// Decodes a single stack; unreadable input yields the empty stack.
    #[must_use]
    pub fn decode_item(bytes: &[u8], items: &ItemRegistry) -> ItemStack {
        Self::decode_grid(bytes, items)
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    /// Encodes a module state document.
    #[must_use]
    pub fn encode_state(&self, state: NbtCompound) -> Vec<u8> {
        self.wrap(STATE_MAGIC, state)
    }

    /// Decodes a module state document, or `None` if the blob is not one.
    #[must_use]
    pub fn decode_state(bytes: &[u8]) -> Option<NbtCompound> {
        unwrap(STATE_MAGIC, bytes)
    }

    fn wrap(&self, magic: [u8; 3], root: NbtCompound) -> Vec<u8> {
        let mut document = Vec::new();
        BaseNbt::new("", root).write(&mut document);

        let mut out = Vec::with_capacity(document.len() + HEADER_LEN);
        out.extend_from_slice(&magic);
        match zstd::encode_all(&document[..], self.compression_level) {
            Ok(compressed) => {
                out.push(VERSION_ZSTD);
                out.extend_from_slice(&compressed);
            }
            Err(err) => {
                log::warn!("zstd compression failed, storing raw payload: {err}");
                out.push(VERSION_RAW);
                out.extend_from_slice(&document);
            }
        }
        out
    }
}

fn unwrap(magic: [u8; 3], bytes: &[u8]) -> Option<NbtCompound> {
    if bytes.len() < HEADER_LEN || bytes[..3] != magic {
        return None;
    }
    let payload = &bytes[HEADER_LEN..];
    let document = match bytes[3] {
        VERSION_RAW => payload.to_vec(),
        VERSION_ZSTD => match zstd::decode_all(payload) {
            Ok(document) => document,
            Err(err) => {
                log::debug!("Discarding undecompressable blob: {err}");
                return None;
            }
        },
        other => {
            log::debug!("Discarding blob with unknown version {other}");
            return None;
        }
    };

    match simdnbt::owned::read(&mut Cursor::new(&document[..])) {
        Ok(Nbt::Some(base)) => Some(NbtCompound::clone(&base)),
        Ok(Nbt::None) => None,
        Err(err) => {
            log::debug!("Discarding malformed NBT blob: {err:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use modvault_registry::Registry;
    use modvault_utils::Identifier;

    use super::*;

    fn stack(registry: &Registry, path: &'static str, count: i32) -> ItemStack {
        registry
            .items
            .stack(&Identifier::vanilla_static(path), count)
            .unwrap()
    }

    #[test]
    fn test_grid_round_trip_keeps_gaps() {
        let registry = Registry::new_vanilla();
        let codec = Codec::default();
        for slots in [9, 27, 54, 108] {
            let mut grid = vec![ItemStack::empty(); slots];
            grid[0] = stack(&registry, "stone", 64);
            grid[slots / 2] = stack(&registry, "coal", 3);
            grid[slots - 1] = stack(&registry, "diamond_sword", 1);

            let decoded = Codec::decode_grid(&codec.encode_grid(&grid), &registry.items);
            assert_eq!(decoded, grid, "{slots} slots");
        }
    }

    #[test]
    fn test_all_empty_and_all_full_grids() {
        let registry = Registry::new_vanilla();
        let codec = Codec::default();

        let empty = vec![ItemStack::empty(); 27];
        assert_eq!(
            Codec::decode_grid(&codec.encode_grid(&empty), &registry.items),
            empty
        );

        let full = vec![stack(&registry, "dirt", 64); 27];
        assert_eq!(
            Codec::decode_grid(&codec.encode_grid(&full), &registry.items),
            full
        );
    }

    #[test]
    fn test_garbage_decodes_empty() {
        let registry = Registry::new_vanilla();
        assert!(Codec::decode_grid(&[], &registry.items).is_empty());
        assert!(Codec::decode_grid(b"nope", &registry.items).is_empty());
        assert!(Codec::decode_grid(b"MVG\x02garbage", &registry.items).is_empty());
        assert!(Codec::decode_grid(b"MVG\x09", &registry.items).is_empty());
        assert!(Codec::decode_item(b"", &registry.items).is_empty());
    }

    #[test]
    fn test_state_and_grid_signatures_do_not_mix() {
        let registry = Registry::new_vanilla();
        let codec = Codec::default();
        let mut state = NbtCompound::new();
        state.insert("BurnTime", 20);
        let state_blob = codec.encode_state(state);
        let grid_blob = codec.encode_grid(&[stack(&registry, "stone", 1)]);

        assert!(Codec::decode_grid(&state_blob, &registry.items).is_empty());
        assert!(Codec::decode_state(&grid_blob).is_none());
        let decoded = Codec::decode_state(&state_blob).unwrap();
        assert_eq!(nbt_i32(&decoded, "BurnTime"), Some(20));
    }

    #[test]
    fn test_legacy_raw_payload() {
        let registry = Registry::new_vanilla();
        let mut root = NbtCompound::new();
        root.insert("Size", 2);
        root.insert(
            "Items",
            NbtTag::List(NbtList::Compound(vec![item_to_nbt(&stack(
                &registry, "sand", 5,
            ))])),
        );
        let mut document = Vec::new();
        BaseNbt::new("", root).write(&mut document);
        let mut blob = GRID_MAGIC.to_vec();
        blob.push(VERSION_RAW);
        blob.extend_from_slice(&document);

        let grid = Codec::decode_grid(&blob, &registry.items);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], stack(&registry, "sand", 5));
        assert!(grid[1].is_empty());
    }

    #[test]
    fn test_declared_size_truncates_surplus_entries() {
        let registry = Registry::new_vanilla();
        let mut root = NbtCompound::new();
        root.insert("Size", 1);
        root.insert(
            "Items",
            NbtTag::List(NbtList::Compound(vec![
                item_to_nbt(&stack(&registry, "sand", 5)),
                item_to_nbt(&stack(&registry, "dirt", 7)),
            ])),
        );
        let blob = Codec::default().wrap(GRID_MAGIC, root);

        let grid = Codec::decode_grid(&blob, &registry.items);
        assert_eq!(grid, vec![stack(&registry, "sand", 5)]);
    }

    #[test]
    fn test_single_item_round_trip() {
        let registry = Registry::new_vanilla();
        let codec = Codec::new(19);
        let mut item = stack(&registry, "cooked_beef", 9);
        item.set_component("modvault:module", "feeder");
        assert_eq!(
            Codec::decode_item(&codec.encode_item(&item), &registry.items),
            item
        );
    }
}
