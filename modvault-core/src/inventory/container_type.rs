//! Configured container types.

use serde::{Deserialize, Serialize};

/// A container type: how many grid slots and module sockets it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerType {
    /// Type tag persisted with each container.
    pub id: String,
    /// Tier used by the sharing tier check.
    pub tier: u8,
    /// Logical grid slots.
    pub slots: usize,
    /// Module sockets on the control strip.
    pub sockets: usize,
}

/// The set of configured types. Never empty.
#[derive(Debug, Clone)]
pub struct ContainerTypes {
    types: Vec<ContainerType>,
}

impl ContainerTypes {
    /// Wraps a list of types, or `None` if the list is empty.
    #[must_use]
    pub fn new(types: Vec<ContainerType>) -> Option<Self> {
        if types.is_empty() {
            None
        } else {
            Some(Self { types })
        }
    }

    /// The type used for unknown tags.
    #[must_use]
    pub fn fallback(&self) -> &ContainerType {
        &self.types[0]
    }

    /// Looks up a type by tag.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ContainerType> {
        self.types.iter().find(|ty| ty.id == id)
    }

    /// Looks up a type, falling back to the first configured type.
    #[must_use]
    pub fn resolve(&self, id: &str) -> &ContainerType {
        self.get(id).unwrap_or_else(|| {
            log::debug!("Unknown container type {id:?}, using {}", self.fallback().id);
            self.fallback()
        })
    }

    /// All configured types.
    pub fn iter(&self) -> impl Iterator<Item = &ContainerType> {
        self.types.iter()
    }
}
