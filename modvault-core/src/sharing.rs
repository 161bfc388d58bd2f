//! Sharing one container's grid through another.
//!
//! A host opts in with a secret. A joiner that presents the secret links to
//! the host and from then on resolves to it for opens and edits, as long as
//! the host still shares, the secrets still match and the joiner's tier is
//! not below the host's. The link is checked on every resolve, so disabling
//! sharing or changing the secret cuts joiners off without touching them.
//!
//! Everything here writes sharing metadata only, never grids.

use thiserror::Error;

use crate::ids::ContainerId;
use crate::inventory::SharingInfo;
use crate::repository::ContainerRepository;
use crate::storage::StorageError;

/// Why a sharing operation was refused or failed.
#[derive(Debug, Error)]
pub enum SharingError {
    /// No such container.
    #[error("container {0} does not exist")]
    NotFound(ContainerId),
    /// Sharing needs a non-empty secret.
    #[error("the secret must not be empty")]
    EmptySecret,
    /// The container mirrors another one and cannot host.
    #[error("container {0} is linked to another container")]
    IsJoiner(ContainerId),
    /// A container cannot join itself.
    #[error("a container cannot join itself")]
    SelfLink,
    /// The container shares its own grid and cannot join.
    #[error("container {0} is shared and cannot join another container")]
    IsHost(ContainerId),
    /// The target is a joiner, not a host.
    #[error("container {0} is itself linked to another container")]
    HostIsJoiner(ContainerId),
    /// The target does not share.
    #[error("container {0} is not shared")]
    NotShared(ContainerId),
    /// The presented secret does not match.
    #[error("wrong secret")]
    WrongSecret,
    /// The joiner's tier is below the host's.
    #[error("tier {joiner} cannot join a tier {host} container")]
    TierTooLow {
        /// Joiner tier.
        joiner: u8,
        /// Host tier.
        host: u8,
    },
    /// The container is not linked to anything.
    #[error("container {0} is not linked")]
    NotLinked(ContainerId),
    /// Storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn sharing_of(repo: &ContainerRepository, id: ContainerId) -> Result<SharingInfo, SharingError> {
    repo.sharing(id)?.ok_or(SharingError::NotFound(id))
}

fn tier_of(repo: &ContainerRepository, id: ContainerId) -> Result<u8, SharingError> {
    repo.container_type(id)?
        .map(|container_type| container_type.tier)
        .ok_or(SharingError::NotFound(id))
}

/// Turns `host` into a sharing host protected by `secret`.
///
/// Calling it again changes the secret.
pub fn enable(
    repo: &ContainerRepository,
    host: ContainerId,
    secret: &str,
    now: i64,
) -> Result<SharingInfo, SharingError> {
    if secret.is_empty() {
        return Err(SharingError::EmptySecret);
    }
    let current = sharing_of(repo, host)?;
    if current.is_joiner() {
        return Err(SharingError::IsJoiner(host));
    }
    let sharing = SharingInfo {
        shared: true,
        host_link: None,
        secret: Some(secret.to_string()),
    };
    repo.update_sharing(host, &sharing, now)?;
    log::info!("Container {host} is now shared");
    Ok(sharing)
}

/// Stops sharing `host`. Linked joiners stop resolving to it.
pub fn disable(
    repo: &ContainerRepository,
    host: ContainerId,
    now: i64,
) -> Result<SharingInfo, SharingError> {
    let current = sharing_of(repo, host)?;
    if !current.is_host() {
        return Err(SharingError::NotShared(host));
    }
    let sharing = SharingInfo::default();
    repo.update_sharing(host, &sharing, now)?;
    log::info!("Container {host} is no longer shared");
    Ok(sharing)
}

/// Links `joiner` to `host` after checking the secret and tiers.
pub fn join(
    repo: &ContainerRepository,
    joiner: ContainerId,
    host: ContainerId,
    secret: &str,
    now: i64,
) -> Result<SharingInfo, SharingError> {
    if joiner == host {
        return Err(SharingError::SelfLink);
    }
    let joiner_sharing = sharing_of(repo, joiner)?;
    if joiner_sharing.is_host() {
        return Err(SharingError::IsHost(joiner));
    }
    let host_sharing = sharing_of(repo, host)?;
    if host_sharing.is_joiner() {
        return Err(SharingError::HostIsJoiner(host));
    }
    if !host_sharing.is_host() {
        return Err(SharingError::NotShared(host));
    }
    if host_sharing.secret.as_deref() != Some(secret) {
        return Err(SharingError::WrongSecret);
    }
    let (joiner_tier, host_tier) = (tier_of(repo, joiner)?, tier_of(repo, host)?);
    if joiner_tier < host_tier {
        return Err(SharingError::TierTooLow {
            joiner: joiner_tier,
            host: host_tier,
        });
    }

    let sharing = SharingInfo {
        shared: false,
        host_link: Some(host),
        secret: Some(secret.to_string()),
    };
    repo.update_sharing(joiner, &sharing, now)?;
    log::info!("Container {joiner} joined shared container {host}");
    Ok(sharing)
}

/// Unlinks `joiner` from its host.
pub fn leave(
    repo: &ContainerRepository,
    joiner: ContainerId,
    now: i64,
) -> Result<SharingInfo, SharingError> {
    let current = sharing_of(repo, joiner)?;
    let Some(host) = current.host_link else {
        return Err(SharingError::NotLinked(joiner));
    };
    let sharing = SharingInfo::default();
    repo.update_sharing(joiner, &sharing, now)?;
    log::info!("Container {joiner} left shared container {host}");
    Ok(sharing)
}

/// The container whose grid `id` stands for.
///
/// A joiner resolves to its host while the link is still valid; everything
/// else resolves to itself. Unknown ids resolve to themselves.
pub fn resolve(repo: &ContainerRepository, id: ContainerId) -> Result<ContainerId, StorageError> {
    let Some(sharing) = repo.sharing(id)? else {
        return Ok(id);
    };
    let Some(host) = sharing.host_link else {
        return Ok(id);
    };
    let Some(host_sharing) = repo.sharing(host)? else {
        return Ok(id);
    };
    if !host_sharing.is_host() || host_sharing.secret != sharing.secret {
        return Ok(id);
    }
    let tiers = (repo.container_type(id)?, repo.container_type(host)?);
    match tiers {
        (Some(joiner_type), Some(host_type)) if joiner_type.tier >= host_type.tier => Ok(host),
        _ => Ok(id),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use modvault_registry::Registry;

    use super::*;
    use crate::codec::Codec;
    use crate::inventory::{ContainerType, ContainerTypes};
    use crate::module::ModuleDefaults;
    use crate::storage::{ContainerStorage, RamOnlyStorage};

    fn repository() -> ContainerRepository {
        let types = ContainerTypes::new(vec![
            ContainerType {
                id: "copper".to_string(),
                tier: 0,
                slots: 27,
                sockets: 1,
            },
            ContainerType {
                id: "iron".to_string(),
                tier: 1,
                slots: 54,
                sockets: 3,
            },
        ])
        .unwrap();
        ContainerRepository::new(
            ContainerStorage::RamOnly(RamOnlyStorage::new()),
            Arc::new(Registry::new_vanilla()),
            types,
            Codec::default(),
            ModuleDefaults::default(),
        )
    }

    fn create(repo: &ContainerRepository, tag: &str) -> ContainerId {
        let id = ContainerId::new_random();
        repo.load_or_create(id, tag, 0).unwrap();
        id
    }

    #[test]
    fn test_join_and_resolve() {
        let repo = repository();
        let host = create(&repo, "iron");
        let joiner = create(&repo, "iron");

        assert!(matches!(
            join(&repo, joiner, host, "pw", 1),
            Err(SharingError::NotShared(_))
        ));
        enable(&repo, host, "pw", 1).unwrap();
        assert!(matches!(
            join(&repo, joiner, host, "nope", 2),
            Err(SharingError::WrongSecret)
        ));
        join(&repo, joiner, host, "pw", 2).unwrap();
        assert_eq!(resolve(&repo, joiner).unwrap(), host);
        assert_eq!(resolve(&repo, host).unwrap(), host);

        // A joiner cannot start hosting, and a host cannot join.
        assert!(matches!(
            enable(&repo, joiner, "x", 3),
            Err(SharingError::IsJoiner(_))
        ));
        let other = create(&repo, "iron");
        enable(&repo, other, "x", 3).unwrap();
        assert!(matches!(
            join(&repo, host, other, "x", 3),
            Err(SharingError::IsHost(_))
        ));
        assert!(matches!(
            join(&repo, other, joiner, "pw", 3),
            Err(SharingError::IsHost(_))
        ));
    }

    #[test]
    fn test_link_breaks_when_host_changes() {
        let repo = repository();
        let host = create(&repo, "iron");
        let joiner = create(&repo, "iron");
        enable(&repo, host, "pw", 1).unwrap();
        join(&repo, joiner, host, "pw", 2).unwrap();

        enable(&repo, host, "rotated", 3).unwrap();
        assert_eq!(resolve(&repo, joiner).unwrap(), joiner);

        enable(&repo, host, "pw", 4).unwrap();
        assert_eq!(resolve(&repo, joiner).unwrap(), host);
        disable(&repo, host, 5).unwrap();
        assert_eq!(resolve(&repo, joiner).unwrap(), joiner);

        leave(&repo, joiner, 6).unwrap();
        assert!(matches!(
            leave(&repo, joiner, 7),
            Err(SharingError::NotLinked(_))
        ));
    }

    #[test]
    fn test_join_checks() {
        let repo = repository();
        let host = create(&repo, "iron");
        let small = create(&repo, "copper");
        enable(&repo, host, "pw", 1).unwrap();

        assert!(matches!(
            join(&repo, host, host, "pw", 2),
            Err(SharingError::SelfLink)
        ));
        assert!(matches!(
            join(&repo, small, host, "pw", 2),
            Err(SharingError::TierTooLow { joiner: 0, host: 1 })
        ));
        assert!(matches!(
            enable(&repo, small, "", 2),
            Err(SharingError::EmptySecret)
        ));

        let joiner = create(&repo, "iron");
        join(&repo, joiner, host, "pw", 3).unwrap();
        let third = create(&repo, "iron");
        assert!(matches!(
            join(&repo, third, joiner, "pw", 4),
            Err(SharingError::HostIsJoiner(_))
        ));
    }
}
