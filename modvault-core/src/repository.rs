//! The single source of truth for containers.
//!
//! Turns storage rows into [`ModularContainer`]s and back. Every write goes
//! through here; the live views and the simulation engine never touch the
//! storage backend directly.

use std::sync::Arc;

use modvault_registry::{ItemStack, Registry};

use crate::codec::Codec;
use crate::ids::{ActorId, ContainerId, ModuleId};
use crate::inventory::{ContainerType, ContainerTypes, ModularContainer, Owner, SharingInfo};
use crate::module::{InstalledModule, ModuleDefaults, ModuleState};
use crate::storage::{
    ContainerRecord, ContainerRow, ContainerStorage, ContainerSummary, ModuleRow, StorageError,
    VoidedEntry, VoidedItemRecord,
};

/// Loads, creates and saves containers.
pub struct ContainerRepository {
    storage: ContainerStorage,
    registry: Arc<Registry>,
    types: ContainerTypes,
    codec: Codec,
    defaults: ModuleDefaults,
}

impl ContainerRepository {
    /// Creates a repository over `storage`.
    #[must_use]
    pub fn new(
        storage: ContainerStorage,
        registry: Arc<Registry>,
        types: ContainerTypes,
        codec: Codec,
        defaults: ModuleDefaults,
    ) -> Self {
        Self {
            storage,
            registry,
            types,
            codec,
            defaults,
        }
    }

    /// The item and recipe registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configured container types.
    #[must_use]
    pub fn types(&self) -> &ContainerTypes {
        &self.types
    }

    /// The codec used for every blob.
    #[must_use]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Defaults for module state.
    #[must_use]
    pub fn defaults(&self) -> &ModuleDefaults {
        &self.defaults
    }

    /// Loads a container, inserting a blank row on first reference.
    ///
    /// `type_hint` only matters for that first insert; afterwards the stored
    /// type wins.
    pub fn load_or_create(
        &self,
        id: ContainerId,
        type_hint: &str,
        now: i64,
    ) -> Result<ModularContainer, StorageError> {
        if let Some(record) = self.storage.load(id)? {
            return Ok(self.from_record(record));
        }
        let container_type = self.types.resolve(type_hint);
        let blank = ModularContainer::new(id, container_type, now);
        if self.storage.insert_if_absent(&self.row_of(&blank))? {
            log::debug!("Created container {id} of type {}", container_type.id);
        }
        match self.storage.load(id)? {
            Some(record) => Ok(self.from_record(record)),
            None => Err(StorageError::Corrupt(format!(
                "container {id} vanished right after insert"
            ))),
        }
    }

    /// Loads a container if it exists.
    pub fn load(&self, id: ContainerId) -> Result<Option<ModularContainer>, StorageError> {
        Ok(self.storage.load(id)?.map(|record| self.from_record(record)))
    }

    /// Writes the grid and the full module set, then clears the changed flag.
    ///
    /// Sharing metadata is not written here; see [`Self::update_sharing`].
    /// An owner already on record is kept.
    pub fn save(&self, container: &mut ModularContainer, now: i64) -> Result<(), StorageError> {
        container.touch(now);
        let record = ContainerRecord {
            row: self.row_of(container),
            modules: self.module_rows(container),
        };
        self.storage.save(&record)?;
        container.clear_changed();
        log::debug!(
            "Saved container {} ({} modules)",
            container.id(),
            record.modules.len()
        );
        Ok(())
    }

    /// Writes only the module set of a stored container.
    ///
    /// The grid row is left as stored and the changed flag stays raised, so a
    /// pending grid save still happens later.
    pub fn save_modules(&self, container: &ModularContainer, now: i64) -> Result<(), StorageError> {
        let id = container.id();
        if !self.storage.save_modules(id, &self.module_rows(container), now)? {
            return Err(StorageError::Corrupt(format!("container {id} has no row")));
        }
        log::debug!("Saved the modules of container {id}");
        Ok(())
    }

    /// Makes sure a row exists and records its owner if it has none yet.
    pub fn ensure_exists(
        &self,
        id: ContainerId,
        type_tag: &str,
        owner: &Owner,
        now: i64,
    ) -> Result<(), StorageError> {
        let mut blank = ModularContainer::new(id, self.types.resolve(type_tag), now);
        blank.owner = Some(owner.clone());
        if !self.storage.insert_if_absent(&self.row_of(&blank))? {
            self.storage.set_owner_if_absent(id, owner)?;
        }
        Ok(())
    }

    /// The stored type tag of a container.
    pub fn find_type(&self, id: ContainerId) -> Result<Option<String>, StorageError> {
        self.storage.find_type(id)
    }

    /// The configured type of a stored container, falling back for unknown
    /// tags.
    pub fn container_type(&self, id: ContainerId) -> Result<Option<&ContainerType>, StorageError> {
        Ok(self
            .storage
            .find_type(id)?
            .map(|tag| self.types.resolve(&tag)))
    }

    /// Containers owned by `owner`, most recently written first.
    pub fn list_by_owner(&self, owner: ActorId) -> Result<Vec<ContainerSummary>, StorageError> {
        self.storage.list_by_owner(owner)
    }

    /// Containers without an owner, most recently written first.
    pub fn list_unowned(&self) -> Result<Vec<ContainerSummary>, StorageError> {
        self.storage.list_unowned()
    }

    /// Containers with at least one installed module.
    pub fn containers_with_modules(&self) -> Result<Vec<ContainerId>, StorageError> {
        self.storage.containers_with_modules()
    }

    /// Containers currently linked to `host`.
    pub fn find_joiners(&self, host: ContainerId) -> Result<Vec<ContainerId>, StorageError> {
        self.storage.find_joiners(host)
    }

    /// Sharing metadata of a stored container.
    pub fn sharing(&self, id: ContainerId) -> Result<Option<SharingInfo>, StorageError> {
        Ok(self.storage.load(id)?.map(|record| record.row.sharing))
    }

    /// Writes only the sharing metadata. Returns false if the row is missing.
    pub fn update_sharing(
        &self,
        id: ContainerId,
        sharing: &SharingInfo,
        now: i64,
    ) -> Result<bool, StorageError> {
        self.storage.update_sharing(id, sharing, now)
    }

    /// Appends a voided-item audit record.
    pub fn record_voided(&self, entry: &VoidedEntry) -> Result<i64, StorageError> {
        let id = self.storage.record_voided(entry)?;
        log::info!(
            "Voided {}x {} from container {} (record {id})",
            entry.item_count,
            entry.item_key,
            entry.container_id
        );
        Ok(id)
    }

    /// Voided items, newest first.
    pub fn list_voided(
        &self,
        actor: Option<ActorId>,
        limit: usize,
    ) -> Result<Vec<VoidedItemRecord>, StorageError> {
        self.storage.list_voided(actor, limit)
    }

    /// One voided-item record.
    pub fn voided_item(&self, id: i64) -> Result<Option<VoidedItemRecord>, StorageError> {
        self.storage.voided_item(id)
    }

    /// Marks a voided item recovered and returns it.
    ///
    /// Each record can be recovered once; later calls return `None`.
    pub fn recover_voided(
        &self,
        id: i64,
        by: &Owner,
        now: i64,
    ) -> Result<Option<ItemStack>, StorageError> {
        if !self.storage.mark_recovered(id, by, now)? {
            return Ok(None);
        }
        let Some(record) = self.storage.voided_item(id)? else {
            return Ok(None);
        };
        log::info!("{} recovered voided item record {id}", by.name);
        Ok(Some(Codec::decode_item(
            &record.entry.item_data,
            &self.registry.items,
        )))
    }

    fn module_rows(&self, container: &ModularContainer) -> Vec<ModuleRow> {
        container
            .modules()
            .iter()
            .map(|module| ModuleRow {
                socket: module.socket,
                module_id: module.id.as_str().to_string(),
                snapshot: module.snapshot.clone(),
                state: module.state.encode(&self.codec),
            })
            .collect()
    }

    /// Stacks that did not fit are stored after the grid until handed out.
    fn row_of(&self, container: &ModularContainer) -> ContainerRow {
        let content = if container.overflow().is_empty() {
            self.codec.encode_grid(container.grid())
        } else {
            let mut slots = container.grid().to_vec();
            slots.extend_from_slice(container.overflow());
            self.codec.encode_grid(&slots)
        };
        ContainerRow {
            id: container.id(),
            type_tag: container.type_tag().to_string(),
            content,
            owner: container.owner.clone(),
            sharing: container.sharing.clone(),
            created_at: container.created_at(),
            updated_at: container.updated_at(),
        }
    }

    fn from_record(&self, record: ContainerRecord) -> ModularContainer {
        let ContainerRecord { row, modules } = record;
        let container_type = self.types.resolve(&row.type_tag);
        let items = Codec::decode_grid(&row.content, &self.registry.items);

        let mut installed: Vec<InstalledModule> = Vec::with_capacity(modules.len());
        for module in modules {
            let id = ModuleId::new(module.module_id);
            if module.socket >= container_type.sockets
                || installed
                    .iter()
                    .any(|other| other.socket == module.socket || other.id == id)
            {
                log::warn!(
                    "Container {} has an invalid module row for {id} in socket {}, skipping it",
                    row.id,
                    module.socket
                );
                continue;
            }
            let state = ModuleState::decode(&id, &module.state, &self.registry.items, &self.defaults);
            installed.push(InstalledModule {
                socket: module.socket,
                id,
                snapshot: module.snapshot,
                state,
            });
        }

        ModularContainer::from_parts(
            row.id,
            row.type_tag,
            container_type,
            items,
            installed,
            row.owner,
            row.sharing,
            row.created_at,
            row.updated_at,
        )
    }
}
