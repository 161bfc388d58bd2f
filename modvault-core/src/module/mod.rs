//! Installable modules and their runtime state.
//!
//! The set of simulated module kinds is closed: each kind owns a state struct
//! and the simulation engine dispatches with a `match`. Modules of other
//! families are carried along as opaque bytes so nothing is lost when they
//! pass through this engine.

pub mod cooking;
pub mod feeder;
pub mod filter;
pub mod install;
pub mod restock;
pub mod scavenger;

use modvault_registry::ItemRegistry;

use crate::codec::Codec;
use crate::ids::ModuleId;

pub use cooking::CookingState;
pub use feeder::{FeedStrategy, FeederState};
pub use filter::{FilterMode, ItemFilter};
pub use install::InstallRejection;
pub use restock::RestockState;
pub use scavenger::{DiscardState, ScavengerState};

/// The module kinds this engine simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Furnace-style cooking.
    Cooking,
    /// Item magnet.
    Scavenger,
    /// Auto-discard.
    Discard,
    /// Inventory restock.
    Restock,
    /// Auto-feeding.
    Feeder,
}

impl ModuleKind {
    /// Every simulated kind.
    pub const ALL: [Self; 5] = [
        Self::Cooking,
        Self::Scavenger,
        Self::Discard,
        Self::Restock,
        Self::Feeder,
    ];

    /// The kind for a module id, if it is simulated.
    #[must_use]
    pub fn from_id(id: &ModuleId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| &kind.id() == id)
    }

    /// The module id of this kind.
    #[must_use]
    pub fn id(self) -> ModuleId {
        match self {
            Self::Cooking => ModuleId::COOKING,
            Self::Scavenger => ModuleId::SCAVENGER,
            Self::Discard => ModuleId::DISCARD,
            Self::Restock => ModuleId::RESTOCK,
            Self::Feeder => ModuleId::FEEDER,
        }
    }

    /// Returns true for kinds that write to the main grid.
    ///
    /// These are skipped while the grid editor is open. Cooking keeps its
    /// items in its own slots and is always safe to advance.
    #[must_use]
    pub fn is_content_mutating(self) -> bool {
        !matches!(self, Self::Cooking)
    }
}

/// Defaults for state fields that older blobs may lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDefaults {
    /// Restock threshold for fresh and legacy restock modules.
    pub restock_threshold: i32,
    /// Hunger threshold for fresh and legacy feeder modules.
    pub hunger_threshold: i32,
}

impl Default for ModuleDefaults {
    fn default() -> Self {
        Self {
            restock_threshold: 8,
            hunger_threshold: 14,
        }
    }
}

/// A module's runtime state.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleState {
    /// Cooking state.
    Cooking(CookingState),
    /// Magnet state.
    Scavenger(ScavengerState),
    /// Discard state.
    Discard(DiscardState),
    /// Restock state.
    Restock(RestockState),
    /// Feeder state.
    Feeder(FeederState),
    /// State of a module this engine does not simulate, kept verbatim.
    Opaque(Vec<u8>),
}

impl ModuleState {
    /// Fresh state for a newly installed module.
    #[must_use]
    pub fn fresh(kind: ModuleKind, defaults: &ModuleDefaults) -> Self {
        match kind {
            ModuleKind::Cooking => Self::Cooking(CookingState::new()),
            ModuleKind::Scavenger => Self::Scavenger(ScavengerState::default()),
            ModuleKind::Discard => Self::Discard(DiscardState::default()),
            ModuleKind::Restock => Self::Restock(RestockState::new(defaults.restock_threshold)),
            ModuleKind::Feeder => Self::Feeder(FeederState::new(defaults.hunger_threshold)),
        }
    }

    /// Decodes a persisted state blob for the module `id`.
    ///
    /// Unknown ids keep their bytes. A known id whose blob cannot be read gets
    /// fresh state; fields missing from older blobs take their defaults.
    #[must_use]
    pub fn decode(
        id: &ModuleId,
        bytes: &[u8],
        items: &ItemRegistry,
        defaults: &ModuleDefaults,
    ) -> Self {
        let Some(kind) = ModuleKind::from_id(id) else {
            return Self::Opaque(bytes.to_vec());
        };
        let Some(nbt) = Codec::decode_state(bytes) else {
            if !bytes.is_empty() {
                log::debug!("Unreadable {id} state blob, starting fresh");
            }
            return Self::fresh(kind, defaults);
        };
        match kind {
            ModuleKind::Cooking => Self::Cooking(CookingState::from_nbt(&nbt, items)),
            ModuleKind::Scavenger => Self::Scavenger(ScavengerState::from_nbt(&nbt)),
            ModuleKind::Discard => Self::Discard(DiscardState::from_nbt(&nbt)),
            ModuleKind::Restock => {
                Self::Restock(RestockState::from_nbt(&nbt, defaults.restock_threshold))
            }
            ModuleKind::Feeder => {
                Self::Feeder(FeederState::from_nbt(&nbt, defaults.hunger_threshold))
            }
        }
    }

    /// Encodes the state for persistence.
    #[must_use]
    pub fn encode(&self, codec: &Codec) -> Vec<u8> {
        let nbt = match self {
            Self::Cooking(state) => state.to_nbt(),
            Self::Scavenger(state) => state.to_nbt(),
            Self::Discard(state) => state.to_nbt(),
            Self::Restock(state) => state.to_nbt(),
            Self::Feeder(state) => state.to_nbt(),
            Self::Opaque(bytes) => return bytes.clone(),
        };
        codec.encode_state(nbt)
    }

    /// The simulated kind, if any.
    #[must_use]
    pub fn kind(&self) -> Option<ModuleKind> {
        match self {
            Self::Cooking(_) => Some(ModuleKind::Cooking),
            Self::Scavenger(_) => Some(ModuleKind::Scavenger),
            Self::Discard(_) => Some(ModuleKind::Discard),
            Self::Restock(_) => Some(ModuleKind::Restock),
            Self::Feeder(_) => Some(ModuleKind::Feeder),
            Self::Opaque(_) => None,
        }
    }

    /// Whether the module runs. Opaque modules never run here.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Cooking(state) => state.enabled,
            Self::Scavenger(state) => state.enabled,
            Self::Discard(state) => state.enabled,
            Self::Restock(state) => state.enabled,
            Self::Feeder(state) => state.enabled,
            Self::Opaque(_) => false,
        }
    }

    /// Switches the module on or off. Returns false for opaque modules.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let flag = match self {
            Self::Cooking(state) => &mut state.enabled,
            Self::Scavenger(state) => &mut state.enabled,
            Self::Discard(state) => &mut state.enabled,
            Self::Restock(state) => &mut state.enabled,
            Self::Feeder(state) => &mut state.enabled,
            Self::Opaque(_) => return false,
        };
        *flag = enabled;
        true
    }
}

/// A module occupying one socket of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledModule {
    /// Socket index on the control strip.
    pub socket: usize,
    /// Module id; also the module type key.
    pub id: ModuleId,
    /// Encoded module item, without runtime state.
    pub snapshot: Vec<u8>,
    /// Runtime state.
    pub state: ModuleState,
}
