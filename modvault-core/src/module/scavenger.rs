//! Item magnet and auto-discard.
//!
//! Both modules share one scan of the loose items around the container. A
//! discard match wins over the magnet; everything else the magnet filter
//! admits is merged into the grid.

use modvault_registry::ItemStack;
use modvault_utils::Identifier;
use simdnbt::owned::NbtCompound;

use super::filter::ItemFilter;
use crate::codec::nbt_fields::{identifiers_tag, nbt_bool, nbt_identifiers};
use crate::host::{Host, ItemEntity};
use crate::inventory::{Container, is_protected};
use crate::storage::StorageError;

/// Runtime state of the magnet module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScavengerState {
    /// Whether the module runs.
    pub enabled: bool,
    /// Which items get pulled in.
    pub filter: ItemFilter,
}

impl Default for ScavengerState {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: ItemFilter::default(),
        }
    }
}

impl ScavengerState {
    pub(crate) fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("Enabled", i8::from(self.enabled));
        self.filter.write(&mut nbt);
        nbt
    }

    pub(crate) fn from_nbt(nbt: &NbtCompound) -> Self {
        Self {
            enabled: nbt_bool(nbt, "Enabled").unwrap_or(true),
            filter: ItemFilter::read(nbt),
        }
    }
}

/// Runtime state of the discard module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardState {
    /// Whether the module runs.
    pub enabled: bool,
    /// Items to void. An empty list voids nothing.
    pub items: Vec<Identifier>,
}

impl Default for DiscardState {
    fn default() -> Self {
        Self {
            enabled: true,
            items: Vec::new(),
        }
    }
}

impl DiscardState {
    /// Returns true if the stack should be voided.
    #[must_use]
    pub fn matches(&self, stack: &ItemStack) -> bool {
        stack.key().is_some_and(|key| self.items.contains(key))
    }

    pub(crate) fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("Enabled", i8::from(self.enabled));
        nbt.insert("Discard", identifiers_tag(&self.items));
        nbt
    }

    pub(crate) fn from_nbt(nbt: &NbtCompound) -> Self {
        Self {
            enabled: nbt_bool(nbt, "Enabled").unwrap_or(true),
            items: nbt_identifiers(nbt, "Discard"),
        }
    }
}

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScavengeReport {
    /// Item entities (partially) merged into the grid.
    pub inserted: usize,
    /// Item entities voided.
    pub voided: usize,
}

impl ScavengeReport {
    /// Returns true if the grid changed.
    #[must_use]
    pub fn grid_changed(&self) -> bool {
        self.inserted > 0
    }
}

/// Processes loose items around a container.
///
/// At most `limit` entities are looked at. Containers and modules lying
/// around are never touched. `audit` runs before an entity is voided; if it
/// fails the entity is left alone and the error is returned, so nothing is
/// ever destroyed without a recovery record.
pub fn scavenge(
    grid: &mut dyn Container,
    magnet: Option<&ScavengerState>,
    discard: Option<&DiscardState>,
    entities: &[ItemEntity],
    limit: usize,
    host: &dyn Host,
    audit: &mut dyn FnMut(&ItemEntity) -> Result<(), StorageError>,
) -> Result<ScavengeReport, StorageError> {
    let magnet = magnet.filter(|state| state.enabled);
    let discard = discard.filter(|state| state.enabled);
    let mut report = ScavengeReport::default();
    if magnet.is_none() && discard.is_none() {
        return Ok(report);
    }

    for entity in entities.iter().take(limit) {
        if entity.stack.is_empty() || is_protected(&entity.stack) {
            continue;
        }

        if discard.is_some_and(|state| state.matches(&entity.stack)) {
            audit(entity)?;
            host.update_item_entity(entity.entity_id, ItemStack::empty());
            report.voided += 1;
            continue;
        }

        if let Some(magnet) = magnet
            && magnet.filter.accepts(&entity.stack)
        {
            let mut remaining = entity.stack.clone();
            if grid.add(&mut remaining) {
                host.update_item_entity(entity.entity_id, remaining);
                report.inserted += 1;
            }
        }
    }
    Ok(report)
}
