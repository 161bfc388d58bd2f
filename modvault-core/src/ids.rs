//! Identity types shared by every layer.

use std::borrow::Cow;
use std::fmt::{self, Display};
use std::str::FromStr;

use uuid::Uuid;

/// Stable identity of a modular container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub Uuid);

impl ContainerId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ContainerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity of an actor (a player or another viewer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Key of a module type. A container holds at most one module per key.
///
/// Keys from module families this engine does not simulate are preserved
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Cow<'static, str>);

impl ModuleId {
    /// Furnace-style cooking.
    pub const COOKING: Self = Self(Cow::Borrowed("cooking"));
    /// Item magnet.
    pub const SCAVENGER: Self = Self(Cow::Borrowed("scavenger"));
    /// Automatic voiding of picked-up items.
    pub const DISCARD: Self = Self(Cow::Borrowed("discard"));
    /// Hotbar and inventory top-up.
    pub const RESTOCK: Self = Self(Cow::Borrowed("restock"));
    /// Automatic feeding of the carrier.
    pub const FEEDER: Self = Self(Cow::Borrowed("feeder"));

    /// Wraps an arbitrary module key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(Cow::Owned(key.into()))
    }

    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which screen of a container an actor has open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    /// The main item grid editor.
    Grid,
    /// A module's own screen.
    Module(ModuleId),
}

/// An actor's currently open screen, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScreenBinding {
    /// The container the screen is tied to.
    pub container: ContainerId,
    /// The kind of screen.
    pub screen: ScreenKind,
}

impl ScreenBinding {
    /// Binding for the grid editor of `container`.
    #[must_use]
    pub fn grid(container: ContainerId) -> Self {
        Self {
            container,
            screen: ScreenKind::Grid,
        }
    }

    /// Binding for a module screen of `container`.
    #[must_use]
    pub fn module(container: ContainerId, module: ModuleId) -> Self {
        Self {
            container,
            screen: ScreenKind::Module(module),
        }
    }
}
