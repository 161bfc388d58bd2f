//! Installing modules into sockets and taking them back out.

use base64::{Engine, prelude::BASE64_STANDARD};
use modvault_registry::{ItemRegistry, ItemStack, MODULE_ITEM};
use thiserror::Error;

use super::{InstalledModule, ModuleDefaults, ModuleKind, ModuleState};
use crate::codec::Codec;
use crate::ids::ModuleId;
use crate::inventory::{MODULE_COMPONENT, MODULE_STATE_COMPONENT, ModularContainer};

/// Why an install was refused. These are feedback for the actor, not faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallRejection {
    /// The item does not carry a module id.
    #[error("that item is not a module")]
    NotAModule,
    /// The container has no such socket.
    #[error("socket {0} does not exist on this container")]
    InvalidSocket(usize),
    /// Another module sits in the socket.
    #[error("socket {0} is already occupied")]
    SocketOccupied(usize),
    /// A module of the same type is already installed.
    #[error("a {0} module is already installed")]
    DuplicateModule(ModuleId),
}

/// Installs one module from `item` into `socket`, consuming one item.
///
/// State embedded in the item is imported as is, so a module moved between
/// containers keeps its progress and settings. Otherwise the state is fresh.
pub fn install(
    container: &mut ModularContainer,
    socket: usize,
    item: &mut ItemStack,
    codec: &Codec,
    items: &ItemRegistry,
    defaults: &ModuleDefaults,
) -> Result<ModuleId, InstallRejection> {
    let id = item
        .component(MODULE_COMPONENT)
        .filter(|key| !key.is_empty() && !item.is_empty())
        .map(ModuleId::new)
        .ok_or(InstallRejection::NotAModule)?;
    if socket >= container.sockets() {
        return Err(InstallRejection::InvalidSocket(socket));
    }
    if container.module_at(socket).is_some() {
        return Err(InstallRejection::SocketOccupied(socket));
    }
    if container.module(&id).is_some() {
        return Err(InstallRejection::DuplicateModule(id));
    }

    let mut module_item = item.copy_with_count(1);
    let embedded = module_item
        .remove_component(MODULE_STATE_COMPONENT)
        .and_then(|encoded| match BASE64_STANDARD.decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::debug!("Ignoring undecodable embedded {id} state: {err}");
                None
            }
        });
    let state = match (embedded, ModuleKind::from_id(&id)) {
        (Some(bytes), _) => ModuleState::decode(&id, &bytes, items, defaults),
        (None, Some(kind)) => ModuleState::fresh(kind, defaults),
        (None, None) => ModuleState::Opaque(Vec::new()),
    };

    container.insert_module(InstalledModule {
        socket,
        id: id.clone(),
        snapshot: codec.encode_item(&module_item),
        state,
    });
    item.shrink(1);
    Ok(id)
}

/// Removes the module in `socket` and rebuilds its item.
///
/// The item comes back from the snapshot with the last runtime state written
/// into it, so it can be installed elsewhere without loss.
pub fn remove(
    container: &mut ModularContainer,
    socket: usize,
    codec: &Codec,
    items: &ItemRegistry,
) -> Option<ItemStack> {
    let module = container.take_module_at(socket)?;
    let mut stack = Codec::decode_item(&module.snapshot, items);
    if stack.is_empty() {
        log::warn!(
            "Module {} in container {} had no readable snapshot, rebuilding a plain item",
            module.id,
            container.id()
        );
        stack = ItemStack::new(items.get_or_placeholder(&MODULE_ITEM));
    }
    stack.set_count(1);
    stack.set_component(MODULE_COMPONENT, module.id.as_str());

    let state = module.state.encode(codec);
    if state.is_empty() {
        stack.remove_component(MODULE_STATE_COMPONENT);
    } else {
        stack.set_component(MODULE_STATE_COMPONENT, BASE64_STANDARD.encode(state));
    }
    Some(stack)
}

#[cfg(test)]
mod tests {
    use modvault_registry::Registry;

    use super::*;
    use crate::ids::ContainerId;
    use crate::inventory::ContainerType;
    use crate::module::CookingState;

    fn container() -> ModularContainer {
        ModularContainer::new(
            ContainerId::new_random(),
            &ContainerType {
                id: "test".to_string(),
                tier: 1,
                slots: 27,
                sockets: 2,
            },
            0,
        )
    }

    fn module_item(registry: &Registry, id: &str) -> ItemStack {
        let mut item = registry.items.stack(&MODULE_ITEM, 1).unwrap();
        item.set_component(MODULE_COMPONENT, id);
        item
    }

    #[test]
    fn test_install_rejections() {
        let registry = Registry::new_vanilla();
        let codec = Codec::default();
        let defaults = ModuleDefaults::default();
        let mut container = container();

        let mut plain = registry.items.stack(&MODULE_ITEM, 1).unwrap();
        assert_eq!(
            install(&mut container, 0, &mut plain, &codec, &registry.items, &defaults),
            Err(InstallRejection::NotAModule)
        );

        let mut cooking = module_item(&registry, "cooking");
        assert_eq!(
            install(&mut container, 2, &mut cooking, &codec, &registry.items, &defaults),
            Err(InstallRejection::InvalidSocket(2))
        );
        assert_eq!(
            install(&mut container, 0, &mut cooking, &codec, &registry.items, &defaults),
            Ok(ModuleId::COOKING)
        );
        assert!(cooking.is_empty());

        let mut feeder = module_item(&registry, "feeder");
        assert_eq!(
            install(&mut container, 0, &mut feeder, &codec, &registry.items, &defaults),
            Err(InstallRejection::SocketOccupied(0))
        );

        let mut second = module_item(&registry, "cooking");
        assert_eq!(
            install(&mut container, 1, &mut second, &codec, &registry.items, &defaults),
            Err(InstallRejection::DuplicateModule(ModuleId::COOKING))
        );
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_state_travels_with_the_item() {
        let registry = Registry::new_vanilla();
        let codec = Codec::default();
        let defaults = ModuleDefaults::default();
        let mut source = container();
        let mut item = module_item(&registry, "cooking");
        install(&mut source, 1, &mut item, &codec, &registry.items, &defaults).unwrap();

        let mut progressed = CookingState::new();
        progressed.cook_progress = 120;
        progressed.stored_xp = 2.5;
        source.module_mut(&ModuleId::COOKING).unwrap().state =
            ModuleState::Cooking(progressed.clone());

        let mut removed = remove(&mut source, 1, &codec, &registry.items).unwrap();
        assert!(source.modules().is_empty());
        assert!(removed.has_component(MODULE_STATE_COMPONENT));
        assert_eq!(removed.component(MODULE_COMPONENT), Some("cooking"));

        let mut target = container();
        install(&mut target, 0, &mut removed, &codec, &registry.items, &defaults).unwrap();
        let module = target.module(&ModuleId::COOKING).unwrap();
        assert_eq!(module.state, ModuleState::Cooking(progressed));
        assert_eq!(module.socket, 0);
    }

    #[test]
    fn test_unknown_module_is_kept_opaque() {
        let registry = Registry::new_vanilla();
        let codec = Codec::default();
        let mut container = container();
        let mut item = module_item(&registry, "stonecutter");
        install(
            &mut container,
            0,
            &mut item,
            &codec,
            &registry.items,
            &ModuleDefaults::default(),
        )
        .unwrap();
        assert_eq!(
            container.module_at(0).unwrap().state,
            ModuleState::Opaque(Vec::new())
        );
        let removed = remove(&mut container, 0, &codec, &registry.items).unwrap();
        assert!(!removed.has_component(MODULE_STATE_COMPONENT));
    }
}
