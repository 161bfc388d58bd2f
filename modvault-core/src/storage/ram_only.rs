//! RAM-only container storage.
//!
//! Keeps rows in memory with the same semantics as the SQLite backend. Used by
//! the scenario harness and by worlds that never persist.

use std::mem;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{
    ContainerRecord, ContainerRow, ContainerSummary, ModuleRow, Recovery, VoidedEntry,
    VoidedItemRecord, newest_first,
};
use crate::ids::{ActorId, ContainerId};
use crate::inventory::{Owner, SharingInfo};

#[derive(Default)]
struct Tables {
    containers: FxHashMap<ContainerId, ContainerRecord>,
    voided: Vec<VoidedItemRecord>,
}

/// In-memory container storage.
#[derive(Default)]
pub struct RamOnlyStorage {
    tables: Mutex<Tables>,
}

impl RamOnlyStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn load(&self, id: ContainerId) -> Option<ContainerRecord> {
        self.tables.lock().containers.get(&id).cloned()
    }

    pub(super) fn insert_if_absent(&self, row: &ContainerRow) -> bool {
        let mut tables = self.tables.lock();
        if tables.containers.contains_key(&row.id) {
            return false;
        }
        tables.containers.insert(
            row.id,
            ContainerRecord {
                row: row.clone(),
                modules: Vec::new(),
            },
        );
        true
    }

    pub(super) fn save(&self, record: &ContainerRecord) {
        let mut tables = self.tables.lock();
        let mut incoming = record.clone();
        incoming.modules.sort_by_key(|module| module.socket);
        match tables.containers.get_mut(&record.row.id) {
            Some(stored) => {
                let sharing = mem::take(&mut stored.row.sharing);
                let owner = stored.row.owner.take();
                let created_at = stored.row.created_at;
                *stored = incoming;
                stored.row.sharing = sharing;
                stored.row.owner = owner;
                stored.row.created_at = created_at;
            }
            None => {
                incoming.row.sharing = SharingInfo::default();
                tables.containers.insert(record.row.id, incoming);
            }
        }
    }

    pub(super) fn save_modules(&self, id: ContainerId, modules: &[ModuleRow], updated_at: i64) -> bool {
        let mut tables = self.tables.lock();
        let Some(stored) = tables.containers.get_mut(&id) else {
            return false;
        };
        stored.modules = modules.to_vec();
        stored.modules.sort_by_key(|module| module.socket);
        stored.row.updated_at = updated_at;
        true
    }

    pub(super) fn update_sharing(
        &self,
        id: ContainerId,
        sharing: &SharingInfo,
        updated_at: i64,
    ) -> bool {
        let mut tables = self.tables.lock();
        let Some(stored) = tables.containers.get_mut(&id) else {
            return false;
        };
        stored.row.sharing = sharing.clone();
        stored.row.updated_at = updated_at;
        true
    }

    pub(super) fn set_owner_if_absent(&self, id: ContainerId, owner: &Owner) -> bool {
        let mut tables = self.tables.lock();
        match tables.containers.get_mut(&id) {
            Some(stored) if stored.row.owner.is_none() => {
                stored.row.owner = Some(owner.clone());
                true
            }
            _ => false,
        }
    }

    pub(super) fn find_type(&self, id: ContainerId) -> Option<String> {
        self.tables
            .lock()
            .containers
            .get(&id)
            .map(|stored| stored.row.type_tag.clone())
    }

    pub(super) fn list_by_owner(&self, owner: ActorId) -> Vec<ContainerSummary> {
        self.summaries(|row| row.owner.as_ref().is_some_and(|o| o.id == owner))
    }

    pub(super) fn list_unowned(&self) -> Vec<ContainerSummary> {
        self.summaries(|row| row.owner.is_none())
    }

    fn summaries(&self, filter: impl Fn(&ContainerRow) -> bool) -> Vec<ContainerSummary> {
        let tables = self.tables.lock();
        let mut summaries: Vec<_> = tables
            .containers
            .values()
            .map(|stored| &stored.row)
            .filter(|row| filter(row))
            .map(|row| ContainerSummary {
                id: row.id,
                type_tag: row.type_tag.clone(),
                owner: row.owner.clone(),
                updated_at: row.updated_at,
            })
            .collect();
        newest_first(&mut summaries);
        summaries
    }

    pub(super) fn containers_with_modules(&self) -> Vec<ContainerId> {
        let tables = self.tables.lock();
        let mut ids: Vec<_> = tables
            .containers
            .values()
            .filter(|stored| !stored.modules.is_empty())
            .map(|stored| stored.row.id)
            .collect();
        ids.sort();
        ids
    }

    pub(super) fn find_joiners(&self, host: ContainerId) -> Vec<ContainerId> {
        let tables = self.tables.lock();
        let mut ids: Vec<_> = tables
            .containers
            .values()
            .filter(|stored| stored.row.sharing.host_link == Some(host))
            .map(|stored| stored.row.id)
            .collect();
        ids.sort();
        ids
    }

    pub(super) fn record_voided(&self, entry: &VoidedEntry) -> i64 {
        let mut tables = self.tables.lock();
        let id = tables.voided.last().map_or(1, |last| last.id + 1);
        tables.voided.push(VoidedItemRecord {
            id,
            entry: entry.clone(),
            recovery: None,
        });
        id
    }

    pub(super) fn list_voided(&self, actor: Option<ActorId>, limit: usize) -> Vec<VoidedItemRecord> {
        let tables = self.tables.lock();
        tables
            .voided
            .iter()
            .rev()
            .filter(|record| {
                actor.is_none_or(|actor| {
                    record.entry.actor.as_ref().is_some_and(|owner| owner.id == actor)
                })
            })
            .take(limit)
            .cloned()
            .collect()
    }

    pub(super) fn voided_item(&self, id: i64) -> Option<VoidedItemRecord> {
        let tables = self.tables.lock();
        tables.voided.iter().find(|record| record.id == id).cloned()
    }

    pub(super) fn mark_recovered(&self, id: i64, by: &Owner, at: i64) -> bool {
        let mut tables = self.tables.lock();
        match tables.voided.iter_mut().find(|record| record.id == id) {
            Some(record) if record.recovery.is_none() => {
                record.recovery = Some(Recovery { by: by.clone(), at });
                true
            }
            _ => false,
        }
    }
}
