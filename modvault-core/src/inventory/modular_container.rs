//! The in-memory form of a modular container.

use std::mem;

use modvault_registry::ItemStack;

use super::{Container, ContainerType};
use crate::ids::{ActorId, ContainerId, ModuleId};
use crate::module::InstalledModule;

/// Who owns a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Owner identity.
    pub id: ActorId,
    /// Display name at the time ownership was recorded.
    pub name: String,
}

/// Sharing metadata. A container is a host, a joiner, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharingInfo {
    /// True if this container shares its grid with joiners.
    pub shared: bool,
    /// The host this container mirrors, if it is a joiner.
    pub host_link: Option<ContainerId>,
    /// Secret set by the host, or presented by the joiner.
    pub secret: Option<String>,
}

impl SharingInfo {
    /// Returns true if this container is a sharing host.
    #[must_use]
    pub fn is_host(&self) -> bool {
        self.shared
    }

    /// Returns true if this container mirrors a host.
    #[must_use]
    pub fn is_joiner(&self) -> bool {
        self.host_link.is_some()
    }
}

/// A container's grid, modules and metadata.
///
/// The grid always has exactly the type's slot count. `changed` is raised by
/// every mutation and cleared once the container was persisted.
#[derive(Debug, Clone)]
pub struct ModularContainer {
    id: ContainerId,
    type_tag: String,
    tier: u8,
    sockets: usize,
    items: Vec<ItemStack>,
    overflow: Vec<ItemStack>,
    modules: Vec<InstalledModule>,
    /// Owner, if one was recorded.
    pub owner: Option<Owner>,
    /// Sharing metadata.
    pub sharing: SharingInfo,
    created_at: i64,
    updated_at: i64,
    changed: bool,
}

impl ModularContainer {
    /// Creates an empty container of the given type.
    #[must_use]
    pub fn new(id: ContainerId, container_type: &ContainerType, now: i64) -> Self {
        Self {
            id,
            type_tag: container_type.id.clone(),
            tier: container_type.tier,
            sockets: container_type.sockets,
            items: vec![ItemStack::empty(); container_type.slots],
            overflow: Vec::new(),
            modules: Vec::new(),
            owner: None,
            sharing: SharingInfo::default(),
            created_at: now,
            updated_at: now,
            changed: false,
        }
    }

    /// Rebuilds a container from persisted parts.
    ///
    /// `type_tag` is kept verbatim even when `container_type` is the fallback
    /// for an unknown tag. The grid is fitted to the type's slot count.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ContainerId,
        type_tag: String,
        container_type: &ContainerType,
        items: Vec<ItemStack>,
        modules: Vec<InstalledModule>,
        owner: Option<Owner>,
        sharing: SharingInfo,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        let mut container = Self {
            id,
            type_tag,
            tier: container_type.tier,
            sockets: container_type.sockets,
            items,
            overflow: Vec::new(),
            modules,
            owner,
            sharing,
            created_at,
            updated_at,
            changed: false,
        };
        container.overflow = container.fit_grid(container_type.slots);
        if !container.overflow.is_empty() {
            log::warn!(
                "Container {id} holds more items than its type allows, {} stacks kept aside",
                container.overflow.len()
            );
        }
        container.modules.sort_by_key(|module| module.socket);
        container.changed = false;
        container
    }

    /// The container's id.
    #[must_use]
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// The persisted type tag.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Tier of the container's type.
    #[must_use]
    pub fn tier(&self) -> u8 {
        self.tier
    }

    /// Number of module sockets.
    #[must_use]
    pub fn sockets(&self) -> usize {
        self.sockets
    }

    /// The grid.
    #[must_use]
    pub fn grid(&self) -> &[ItemStack] {
        &self.items
    }

    /// Stacks that were stored past the end of the grid and are still waiting
    /// to be handed out. They are written back on every save.
    #[must_use]
    pub fn overflow(&self) -> &[ItemStack] {
        &self.overflow
    }

    /// Hands out the kept-aside stacks.
    pub fn take_overflow(&mut self) -> Vec<ItemStack> {
        if self.overflow.is_empty() {
            return Vec::new();
        }
        self.set_changed();
        mem::take(&mut self.overflow)
    }

    /// Puts stacks back aside after a failed hand-out.
    pub(crate) fn restore_overflow(&mut self, stacks: Vec<ItemStack>) {
        self.overflow.extend(stacks);
    }

    /// Creation time in unix milliseconds.
    #[must_use]
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Last persist time in unix milliseconds.
    #[must_use]
    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Records a persist.
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }

    /// Installed modules ordered by socket.
    #[must_use]
    pub fn modules(&self) -> &[InstalledModule] {
        &self.modules
    }

    /// Mutable access to the installed modules.
    ///
    /// Callers that change module state must call [`Container::set_changed`]
    /// themselves.
    pub fn modules_mut(&mut self) -> &mut [InstalledModule] {
        &mut self.modules
    }

    /// The module with the given id.
    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<&InstalledModule> {
        self.modules.iter().find(|module| &module.id == id)
    }

    /// Mutable access to the module with the given id.
    pub fn module_mut(&mut self, id: &ModuleId) -> Option<&mut InstalledModule> {
        self.modules.iter_mut().find(|module| &module.id == id)
    }

    /// The module in the given socket.
    #[must_use]
    pub fn module_at(&self, socket: usize) -> Option<&InstalledModule> {
        self.modules.iter().find(|module| module.socket == socket)
    }

    /// Puts a module into its socket. Socket and id must both be free.
    pub(crate) fn insert_module(&mut self, module: InstalledModule) {
        debug_assert!(self.module_at(module.socket).is_none());
        debug_assert!(self.module(&module.id).is_none());
        let index = self
            .modules
            .partition_point(|existing| existing.socket < module.socket);
        self.modules.insert(index, module);
        self.set_changed();
    }

    /// Takes the module out of the given socket.
    pub(crate) fn take_module_at(&mut self, socket: usize) -> Option<InstalledModule> {
        let index = self.modules.iter().position(|module| module.socket == socket)?;
        self.set_changed();
        Some(self.modules.remove(index))
    }

    /// Changes the container's type.
    ///
    /// When the grid shrinks, stacks from the cut-off tail are merged into the
    /// remaining grid where possible; what still does not fit is returned.
    /// Modules in sockets the new type does not have are left for the caller
    /// to eject.
    pub fn retype(&mut self, container_type: &ContainerType) -> Vec<ItemStack> {
        self.type_tag.clone_from(&container_type.id);
        self.tier = container_type.tier;
        self.sockets = container_type.sockets;
        let overflow = self.fit_grid(container_type.slots);
        self.set_changed();
        overflow
    }

    /// Returns true if the container changed since it was last persisted.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Clears the changed flag after a persist.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    fn fit_grid(&mut self, slots: usize) -> Vec<ItemStack> {
        if self.items.len() <= slots {
            self.items.resize_with(slots, ItemStack::empty);
            return Vec::new();
        }
        let tail = self.items.split_off(slots);
        let mut overflow = Vec::new();
        for mut stack in tail.into_iter().filter(|stack| !stack.is_empty()) {
            self.add(&mut stack);
            if !stack.is_empty() {
                overflow.push(stack);
            }
        }
        overflow
    }
}

impl Container for ModularContainer {
    fn size(&self) -> usize {
        self.items.len()
    }

    fn get_item(&self, slot: usize) -> &ItemStack {
        &self.items[slot]
    }

    fn get_item_mut(&mut self, slot: usize) -> &mut ItemStack {
        &mut self.items[slot]
    }

    fn set_item(&mut self, slot: usize, item: ItemStack) {
        self.items[slot] = item;
        self.set_changed();
    }

    fn set_changed(&mut self) {
        self.changed = true;
    }

    fn max_stack_size(&self) -> i32 {
        64
    }
}
