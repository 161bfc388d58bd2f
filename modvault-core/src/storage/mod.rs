//! Persistence backends for containers, installed modules and voided items.
//!
//! [`ContainerStorage`] picks between the durable SQLite backend and an
//! in-memory backend for tests and throwaway worlds. Rows are plain data: the
//! repository turns them into [`ModularContainer`](crate::inventory::ModularContainer)s.

mod ram_only;
mod sqlite;

use std::io;

use modvault_utils::Vector3;
use thiserror::Error;

use crate::ids::{ActorId, ContainerId};
use crate::inventory::{Owner, SharingInfo};

pub use ram_only::RamOnlyStorage;
pub use sqlite::SqliteStorage;

/// A failed storage operation. Fatal to the operation that triggered it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database reported an error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Opening the database location failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A stored value could not be interpreted.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// A persisted container row.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRow {
    /// Container id.
    pub id: ContainerId,
    /// Type tag.
    pub type_tag: String,
    /// Codec-encoded grid.
    pub content: Vec<u8>,
    /// Owner, if recorded.
    pub owner: Option<Owner>,
    /// Sharing metadata.
    pub sharing: SharingInfo,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
    /// Last write time, unix milliseconds.
    pub updated_at: i64,
}

/// A persisted module row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRow {
    /// Socket index.
    pub socket: usize,
    /// Module id.
    pub module_id: String,
    /// Encoded module item.
    pub snapshot: Vec<u8>,
    /// Encoded runtime state.
    pub state: Vec<u8>,
}

/// A container row with its module rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    /// The container row.
    pub row: ContainerRow,
    /// Module rows ordered by socket.
    pub modules: Vec<ModuleRow>,
}

/// Listing entry for owner queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Container id.
    pub id: ContainerId,
    /// Type tag.
    pub type_tag: String,
    /// Owner, if recorded.
    pub owner: Option<Owner>,
    /// Last write time.
    pub updated_at: i64,
}

/// An item destroyed by the discard module.
#[derive(Debug, Clone, PartialEq)]
pub struct VoidedEntry {
    /// When it was voided, unix milliseconds.
    pub voided_at: i64,
    /// The actor whose container voided it, if any.
    pub actor: Option<Owner>,
    /// The container that voided it.
    pub container_id: ContainerId,
    /// That container's type tag.
    pub container_type: String,
    /// The module that voided it.
    pub module_id: String,
    /// Item key.
    pub item_key: String,
    /// Item count.
    pub item_count: i32,
    /// Codec-encoded copy of the full stack.
    pub item_data: Vec<u8>,
    /// World the item lay in.
    pub world: Option<String>,
    /// Where it lay.
    pub pos: Option<Vector3<f64>>,
}

/// Who recovered a voided item, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    /// The recovering actor.
    pub by: Owner,
    /// Recovery time, unix milliseconds.
    pub at: i64,
}

/// A stored voided-item audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct VoidedItemRecord {
    /// Record id.
    pub id: i64,
    /// What was voided.
    pub entry: VoidedEntry,
    /// Recovery, once it happened.
    pub recovery: Option<Recovery>,
}

/// Storage backend.
pub enum ContainerStorage {
    /// Durable SQLite storage.
    Sqlite(SqliteStorage),
    /// In-memory storage for tests and ephemeral worlds.
    RamOnly(RamOnlyStorage),
}

impl ContainerStorage {
    /// Loads a container with its module rows.
    pub fn load(&self, id: ContainerId) -> Result<Option<ContainerRecord>, StorageError> {
        match self {
            Self::Sqlite(db) => db.load(id),
            Self::RamOnly(ram) => Ok(ram.load(id)),
        }
    }

    /// Inserts a row unless one with the same id exists.
    ///
    /// Returns true if the row was inserted.
    pub fn insert_if_absent(&self, row: &ContainerRow) -> Result<bool, StorageError> {
        match self {
            Self::Sqlite(db) => db.insert_if_absent(row),
            Self::RamOnly(ram) => Ok(ram.insert_if_absent(row)),
        }
    }

    /// Upserts the container row and replaces its module rows as one set.
    ///
    /// Sharing and owner columns of an existing row are left alone; they
    /// change only through [`Self::update_sharing`] and
    /// [`Self::set_owner_if_absent`].
    pub fn save(&self, record: &ContainerRecord) -> Result<(), StorageError> {
        match self {
            Self::Sqlite(db) => db.save(record),
            Self::RamOnly(ram) => {
                ram.save(record);
                Ok(())
            }
        }
    }

    /// Replaces the module rows of an existing container without touching
    /// its grid. Returns false if the row is missing.
    pub fn save_modules(
        &self,
        id: ContainerId,
        modules: &[ModuleRow],
        updated_at: i64,
    ) -> Result<bool, StorageError> {
        match self {
            Self::Sqlite(db) => db.save_modules(id, modules, updated_at),
            Self::RamOnly(ram) => Ok(ram.save_modules(id, modules, updated_at)),
        }
    }

    /// Writes only the sharing columns. Returns false if the row is missing.
    pub fn update_sharing(
        &self,
        id: ContainerId,
        sharing: &SharingInfo,
        updated_at: i64,
    ) -> Result<bool, StorageError> {
        match self {
            Self::Sqlite(db) => db.update_sharing(id, sharing, updated_at),
            Self::RamOnly(ram) => Ok(ram.update_sharing(id, sharing, updated_at)),
        }
    }

    /// Records an owner on a row that has none. Returns true if it did.
    pub fn set_owner_if_absent(&self, id: ContainerId, owner: &Owner) -> Result<bool, StorageError> {
        match self {
            Self::Sqlite(db) => db.set_owner_if_absent(id, owner),
            Self::RamOnly(ram) => Ok(ram.set_owner_if_absent(id, owner)),
        }
    }

    /// The stored type tag of a container.
    pub fn find_type(&self, id: ContainerId) -> Result<Option<String>, StorageError> {
        match self {
            Self::Sqlite(db) => db.find_type(id),
            Self::RamOnly(ram) => Ok(ram.find_type(id)),
        }
    }

    /// Containers owned by `owner`, most recently written first.
    pub fn list_by_owner(&self, owner: ActorId) -> Result<Vec<ContainerSummary>, StorageError> {
        match self {
            Self::Sqlite(db) => db.list_by_owner(owner),
            Self::RamOnly(ram) => Ok(ram.list_by_owner(owner)),
        }
    }

    /// Containers without an owner, most recently written first.
    pub fn list_unowned(&self) -> Result<Vec<ContainerSummary>, StorageError> {
        match self {
            Self::Sqlite(db) => db.list_unowned(),
            Self::RamOnly(ram) => Ok(ram.list_unowned()),
        }
    }

    /// Every container with at least one installed module.
    pub fn containers_with_modules(&self) -> Result<Vec<ContainerId>, StorageError> {
        match self {
            Self::Sqlite(db) => db.containers_with_modules(),
            Self::RamOnly(ram) => Ok(ram.containers_with_modules()),
        }
    }

    /// Containers whose host link points at `host`.
    pub fn find_joiners(&self, host: ContainerId) -> Result<Vec<ContainerId>, StorageError> {
        match self {
            Self::Sqlite(db) => db.find_joiners(host),
            Self::RamOnly(ram) => Ok(ram.find_joiners(host)),
        }
    }

    /// Appends a voided-item record and returns its id.
    pub fn record_voided(&self, entry: &VoidedEntry) -> Result<i64, StorageError> {
        match self {
            Self::Sqlite(db) => db.record_voided(entry),
            Self::RamOnly(ram) => Ok(ram.record_voided(entry)),
        }
    }

    /// Voided items, newest first, optionally only those of one actor.
    pub fn list_voided(
        &self,
        actor: Option<ActorId>,
        limit: usize,
    ) -> Result<Vec<VoidedItemRecord>, StorageError> {
        match self {
            Self::Sqlite(db) => db.list_voided(actor, limit),
            Self::RamOnly(ram) => Ok(ram.list_voided(actor, limit)),
        }
    }

    /// A single voided-item record.
    pub fn voided_item(&self, id: i64) -> Result<Option<VoidedItemRecord>, StorageError> {
        match self {
            Self::Sqlite(db) => db.voided_item(id),
            Self::RamOnly(ram) => Ok(ram.voided_item(id)),
        }
    }

    /// Marks a record recovered. Returns false if it was already recovered
    /// or does not exist.
    pub fn mark_recovered(&self, id: i64, by: &Owner, at: i64) -> Result<bool, StorageError> {
        match self {
            Self::Sqlite(db) => db.mark_recovered(id, by, at),
            Self::RamOnly(ram) => Ok(ram.mark_recovered(id, by, at)),
        }
    }
}

fn newest_first(summaries: &mut [ContainerSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
}
