//! SQLite storage backend.

use std::fs;
use std::path::Path;

use modvault_utils::Vector3;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use super::{
    ContainerRecord, ContainerRow, ContainerSummary, ModuleRow, Recovery, StorageError,
    VoidedEntry, VoidedItemRecord,
};
use crate::ids::{ActorId, ContainerId};
use crate::inventory::{Owner, SharingInfo};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS containers (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL,
    content BLOB NOT NULL,
    owner_id TEXT,
    owner_name TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS container_modules (
    container_id TEXT NOT NULL,
    socket INTEGER NOT NULL,
    module_id TEXT NOT NULL,
    snapshot BLOB NOT NULL,
    state BLOB NOT NULL,
    PRIMARY KEY (container_id, socket)
);
CREATE TABLE IF NOT EXISTS voided_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    voided_at INTEGER NOT NULL,
    actor_id TEXT,
    actor_name TEXT,
    container_id TEXT NOT NULL,
    container_type TEXT NOT NULL,
    module_id TEXT NOT NULL,
    item_key TEXT NOT NULL,
    item_count INTEGER NOT NULL,
    item_data BLOB NOT NULL,
    world TEXT,
    x REAL,
    y REAL,
    z REAL,
    recovered_by_id TEXT,
    recovered_by_name TEXT,
    recovered_at INTEGER
);
CREATE INDEX IF NOT EXISTS containers_owner ON containers (owner_id);
CREATE INDEX IF NOT EXISTS voided_items_actor ON voided_items (actor_id);
";

/// Columns added after the first release, applied in order when missing.
const ADDED_CONTAINER_COLUMNS: &[(&str, &str)] = &[
    ("shared", "INTEGER NOT NULL DEFAULT 0"),
    ("host_link", "TEXT"),
    ("shared_secret", "TEXT"),
];

const CONTAINER_COLUMNS: &str =
    "id, type, content, owner_id, owner_name, shared, host_link, shared_secret, created_at, updated_at";

const VOIDED_COLUMNS: &str = "id, voided_at, actor_id, actor_name, container_id, container_type, \
     module_id, item_key, item_count, item_data, world, x, y, z, recovered_by_id, \
     recovered_by_name, recovered_at";

/// Durable storage in a single SQLite database.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
        log::debug!("Container database journal mode: {mode}");
        log::info!("Opened container database at {}", path.display());
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        migrate(&conn)?;
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS containers_host_link ON containers (host_link);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(super) fn load(&self, id: ContainerId) -> Result<Option<ContainerRecord>, StorageError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                &format!("SELECT {CONTAINER_COLUMNS} FROM containers WHERE id = ?1"),
                params![id.to_string()],
                RawContainerRow::read,
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let row = raw.into_row()?;

        let mut stmt = conn.prepare(
            "SELECT socket, module_id, snapshot, state FROM container_modules
             WHERE container_id = ?1 ORDER BY socket",
        )?;
        let modules = stmt
            .query_map(params![id.to_string()], |r| {
                Ok(ModuleRow {
                    socket: r.get::<_, i64>(0)? as usize,
                    module_id: r.get(1)?,
                    snapshot: r.get(2)?,
                    state: r.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ContainerRecord { row, modules }))
    }

    pub(super) fn insert_if_absent(&self, row: &ContainerRow) -> Result<bool, StorageError> {
        let conn = self.conn.lock();
        let (owner_id, owner_name) = owner_columns(row.owner.as_ref());
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO containers
                (id, type, content, owner_id, owner_name, shared, host_link, shared_secret,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.id.to_string(),
                row.type_tag,
                row.content,
                owner_id,
                owner_name,
                row.sharing.shared,
                row.sharing.host_link.map(|id| id.to_string()),
                row.sharing.secret,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(inserted == 1)
    }

    pub(super) fn save(&self, record: &ContainerRecord) -> Result<(), StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let row = &record.row;
        let id = row.id.to_string();
        let (owner_id, owner_name) = owner_columns(row.owner.as_ref());

        tx.execute(
            "INSERT INTO containers
                (id, type, content, owner_id, owner_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                type = excluded.type,
                content = excluded.content,
                updated_at = excluded.updated_at",
            params![
                id,
                row.type_tag,
                row.content,
                owner_id,
                owner_name,
                row.created_at,
                row.updated_at,
            ],
        )?;
        replace_modules(&tx, &id, &record.modules)?;
        tx.commit()?;
        Ok(())
    }

    pub(super) fn save_modules(
        &self,
        id: ContainerId,
        modules: &[ModuleRow],
        updated_at: i64,
    ) -> Result<bool, StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = id.to_string();
        let touched = tx.execute(
            "UPDATE containers SET updated_at = ?2 WHERE id = ?1",
            params![id, updated_at],
        )?;
        if touched == 0 {
            return Ok(false);
        }
        replace_modules(&tx, &id, modules)?;
        tx.commit()?;
        Ok(true)
    }

    pub(super) fn update_sharing(
        &self,
        id: ContainerId,
        sharing: &SharingInfo,
        updated_at: i64,
    ) -> Result<bool, StorageError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE containers SET shared = ?2, host_link = ?3, shared_secret = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                sharing.shared,
                sharing.host_link.map(|link| link.to_string()),
                sharing.secret,
                updated_at,
            ],
        )?;
        Ok(changed == 1)
    }

    pub(super) fn set_owner_if_absent(&self, id: ContainerId, owner: &Owner) -> Result<bool, StorageError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE containers SET owner_id = ?2, owner_name = ?3 WHERE id = ?1 AND owner_id IS NULL",
            params![id.to_string(), owner.id.to_string(), owner.name],
        )?;
        Ok(changed == 1)
    }

    pub(super) fn find_type(&self, id: ContainerId) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock();
        Ok(conn
            .query_row(
                "SELECT type FROM containers WHERE id = ?1",
                params![id.to_string()],
                |r| r.get(0),
            )
            .optional()?)
    }

    pub(super) fn list_by_owner(&self, owner: ActorId) -> Result<Vec<ContainerSummary>, StorageError> {
        self.list_summaries(
            "SELECT id, type, owner_id, owner_name, updated_at FROM containers
             WHERE owner_id = ?1 ORDER BY updated_at DESC, id",
            Some(owner.to_string()),
        )
    }

    pub(super) fn list_unowned(&self) -> Result<Vec<ContainerSummary>, StorageError> {
        self.list_summaries(
            "SELECT id, type, owner_id, owner_name, updated_at FROM containers
             WHERE owner_id IS NULL ORDER BY updated_at DESC, id",
            None,
        )
    }

    fn list_summaries(
        &self,
        sql: &str,
        param: Option<String>,
    ) -> Result<Vec<ContainerSummary>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let map = |r: &Row<'_>| -> rusqlite::Result<SummaryColumns> {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
        };
        let raw = match param {
            Some(param) => stmt.query_map(params![param], map)?.collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?,
        };
        raw.into_iter()
            .map(|(id, type_tag, owner_id, owner_name, updated_at)| {
                Ok(ContainerSummary {
                    id: parse_container_id(&id)?,
                    type_tag,
                    owner: parse_owner(owner_id, owner_name)?,
                    updated_at,
                })
            })
            .collect()
    }

    pub(super) fn containers_with_modules(&self) -> Result<Vec<ContainerId>, StorageError> {
        self.list_ids(
            "SELECT DISTINCT container_id FROM container_modules ORDER BY container_id",
            None,
        )
    }

    pub(super) fn find_joiners(&self, host: ContainerId) -> Result<Vec<ContainerId>, StorageError> {
        self.list_ids(
            "SELECT id FROM containers WHERE host_link = ?1 ORDER BY id",
            Some(host.to_string()),
        )
    }

    fn list_ids(&self, sql: &str, param: Option<String>) -> Result<Vec<ContainerId>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let raw: Vec<String> = match param {
            Some(param) => stmt
                .query_map(params![param], |r| r.get(0))?
                .collect::<Result<_, _>>()?,
            None => stmt.query_map([], |r| r.get(0))?.collect::<Result<_, _>>()?,
        };
        raw.iter().map(|id| parse_container_id(id)).collect()
    }

    pub(super) fn record_voided(&self, entry: &VoidedEntry) -> Result<i64, StorageError> {
        let conn = self.conn.lock();
        let (actor_id, actor_name) = owner_columns(entry.actor.as_ref());
        conn.execute(
            "INSERT INTO voided_items
                (voided_at, actor_id, actor_name, container_id, container_type, module_id,
                 item_key, item_count, item_data, world, x, y, z)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                entry.voided_at,
                actor_id,
                actor_name,
                entry.container_id.to_string(),
                entry.container_type,
                entry.module_id,
                entry.item_key,
                entry.item_count,
                entry.item_data,
                entry.world,
                entry.pos.map(|pos| pos.x),
                entry.pos.map(|pos| pos.y),
                entry.pos.map(|pos| pos.z),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub(super) fn list_voided(
        &self,
        actor: Option<ActorId>,
        limit: usize,
    ) -> Result<Vec<VoidedItemRecord>, StorageError> {
        let conn = self.conn.lock();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match actor {
            Some(actor) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {VOIDED_COLUMNS} FROM voided_items WHERE actor_id = ?1
                     ORDER BY id DESC LIMIT ?2"
                ))?;
                stmt.query_map(params![actor.to_string(), limit], RawVoidedRow::read)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {VOIDED_COLUMNS} FROM voided_items ORDER BY id DESC LIMIT ?1"
                ))?;
                stmt.query_map(params![limit], RawVoidedRow::read)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        rows.into_iter().map(RawVoidedRow::into_record).collect()
    }

    pub(super) fn voided_item(&self, id: i64) -> Result<Option<VoidedItemRecord>, StorageError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {VOIDED_COLUMNS} FROM voided_items WHERE id = ?1"),
            params![id],
            RawVoidedRow::read,
        )
        .optional()?
        .map(RawVoidedRow::into_record)
        .transpose()
    }

    pub(super) fn mark_recovered(&self, id: i64, by: &Owner, at: i64) -> Result<bool, StorageError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE voided_items SET recovered_by_id = ?2, recovered_by_name = ?3, recovered_at = ?4
             WHERE id = ?1 AND recovered_at IS NULL",
            params![id, by.id.to_string(), by.name, at],
        )?;
        Ok(changed == 1)
    }
}

fn migrate(conn: &Connection) -> Result<(), StorageError> {
    let existing: Vec<String> = conn
        .prepare("PRAGMA table_info(containers)")?
        .query_map([], |r| r.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;
    for (column, definition) in ADDED_CONTAINER_COLUMNS {
        if !existing.iter().any(|name| name == column) {
            log::info!("Adding column containers.{column}");
            conn.execute_batch(&format!(
                "ALTER TABLE containers ADD COLUMN {column} {definition};"
            ))?;
        }
    }
    Ok(())
}

type SummaryColumns = (String, String, Option<String>, Option<String>, i64);

/// Container columns as stored. Ids are parsed afterwards so that a bad
/// value surfaces as [`StorageError::Corrupt`] rather than a SQLite error.
struct RawContainerRow {
    id: String,
    type_tag: String,
    content: Vec<u8>,
    owner_id: Option<String>,
    owner_name: Option<String>,
    shared: bool,
    host_link: Option<String>,
    secret: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RawContainerRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            type_tag: r.get(1)?,
            content: r.get(2)?,
            owner_id: r.get(3)?,
            owner_name: r.get(4)?,
            shared: r.get(5)?,
            host_link: r.get(6)?,
            secret: r.get(7)?,
            created_at: r.get(8)?,
            updated_at: r.get(9)?,
        })
    }

    fn into_row(self) -> Result<ContainerRow, StorageError> {
        let host_link = match self.host_link.as_deref() {
            Some(link) => Some(parse_container_id(link)?),
            None => None,
        };
        Ok(ContainerRow {
            id: parse_container_id(&self.id)?,
            type_tag: self.type_tag,
            content: self.content,
            owner: parse_owner(self.owner_id, self.owner_name)?,
            sharing: SharingInfo {
                shared: self.shared,
                host_link,
                secret: self.secret,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

struct RawVoidedRow {
    id: i64,
    voided_at: i64,
    actor_id: Option<String>,
    actor_name: Option<String>,
    container_id: String,
    container_type: String,
    module_id: String,
    item_key: String,
    item_count: i32,
    item_data: Vec<u8>,
    world: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    recovered_by_id: Option<String>,
    recovered_by_name: Option<String>,
    recovered_at: Option<i64>,
}

impl RawVoidedRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            voided_at: r.get(1)?,
            actor_id: r.get(2)?,
            actor_name: r.get(3)?,
            container_id: r.get(4)?,
            container_type: r.get(5)?,
            module_id: r.get(6)?,
            item_key: r.get(7)?,
            item_count: r.get(8)?,
            item_data: r.get(9)?,
            world: r.get(10)?,
            x: r.get(11)?,
            y: r.get(12)?,
            z: r.get(13)?,
            recovered_by_id: r.get(14)?,
            recovered_by_name: r.get(15)?,
            recovered_at: r.get(16)?,
        })
    }

    fn into_record(self) -> Result<VoidedItemRecord, StorageError> {
        let pos = match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Some(Vector3::new(x, y, z)),
            _ => None,
        };
        let recovery = match (
            parse_owner(self.recovered_by_id, self.recovered_by_name)?,
            self.recovered_at,
        ) {
            (Some(by), Some(at)) => Some(Recovery { by, at }),
            _ => None,
        };
        Ok(VoidedItemRecord {
            id: self.id,
            entry: VoidedEntry {
                voided_at: self.voided_at,
                actor: parse_owner(self.actor_id, self.actor_name)?,
                container_id: parse_container_id(&self.container_id)?,
                container_type: self.container_type,
                module_id: self.module_id,
                item_key: self.item_key,
                item_count: self.item_count,
                item_data: self.item_data,
                world: self.world,
                pos,
            },
            recovery,
        })
    }
}

fn replace_modules(tx: &Transaction<'_>, id: &str, modules: &[ModuleRow]) -> Result<(), StorageError> {
    tx.execute(
        "DELETE FROM container_modules WHERE container_id = ?1",
        params![id],
    )?;
    let mut insert = tx.prepare(
        "INSERT INTO container_modules (container_id, socket, module_id, snapshot, state)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for module in modules {
        insert.execute(params![
            id,
            module.socket as i64,
            module.module_id,
            module.snapshot,
            module.state,
        ])?;
    }
    Ok(())
}

fn owner_columns(owner: Option<&Owner>) -> (Option<String>, Option<String>) {
    match owner {
        Some(owner) => (Some(owner.id.to_string()), Some(owner.name.clone())),
        None => (None, None),
    }
}

fn parse_container_id(raw: &str) -> Result<ContainerId, StorageError> {
    raw.parse()
        .map_err(|err| StorageError::Corrupt(format!("container id {raw:?}: {err}")))
}

fn parse_owner(id: Option<String>, name: Option<String>) -> Result<Option<Owner>, StorageError> {
    let Some(id) = id else {
        return Ok(None);
    };
    let parsed = id
        .parse::<ActorId>()
        .map_err(|err| StorageError::Corrupt(format!("actor id {id:?}: {err}")))?;
    Ok(Some(Owner {
        id: parsed,
        name: name.unwrap_or_default(),
    }))
}
