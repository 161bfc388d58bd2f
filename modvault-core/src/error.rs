//! Errors of the collaborator-facing API.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ids::{ActorId, ContainerId, ModuleId};
use crate::module::InstallRejection;
use crate::sharing::SharingError;
use crate::storage::StorageError;

/// A failed [`ModularContext`](crate::ModularContext) operation.
#[derive(Debug, Error)]
pub enum ModularError {
    /// Storage failed; the operation was aborted.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A sharing operation was refused.
    #[error(transparent)]
    Sharing(#[from] SharingError),
    /// A module install was refused.
    #[error(transparent)]
    Install(#[from] InstallRejection),
    /// Another actor holds the live view.
    #[error("container is in use by {holder}")]
    Locked {
        /// The holder.
        holder: ActorId,
    },
    /// The actor does not hold the live view it tried to edit.
    #[error("{actor} is not viewing container {container}")]
    NotViewing {
        /// The actor.
        actor: ActorId,
        /// The container.
        container: ContainerId,
    },
    /// The container has no such module.
    #[error("no {0} module is installed")]
    NoSuchModule(ModuleId),
    /// The container type is not configured.
    #[error("unknown container type {0:?}")]
    UnknownContainerType(String),
}
