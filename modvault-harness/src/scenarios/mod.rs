//! End-to-end scenarios against the in-memory host.

mod carrier;
mod cooking;
mod locks;
mod persistence;
mod saves;
mod scavenger;
mod sharing;

use std::path::PathBuf;

use modvault_core::config::StorageConfig;
use modvault_core::inventory::{Container, ModularContainer};
use modvault_core::module::ModuleState;
use modvault_core::{ContainerId, ModularConfig, ModuleId};
use modvault_registry::ItemStack;
use modvault_utils::{Identifier, Vector3};

use crate::Harness;

const WORLD: &str = "overworld";

fn origin() -> Vector3<f64> {
    Vector3::new(0.0, 64.0, 0.0)
}

fn harness() -> Harness {
    Harness::new().unwrap()
}

fn db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("world/modvault.db")
}

fn sqlite_config(dir: &tempfile::TempDir) -> ModularConfig {
    ModularConfig {
        storage: StorageConfig::Sqlite { path: db_path(dir) },
        ..ModularConfig::default()
    }
}

fn stored(harness: &Harness, id: ContainerId) -> ModularContainer {
    harness.ctx().repository().load(id).unwrap().unwrap()
}

fn count_of(container: &dyn Container, path: &'static str) -> i32 {
    let key = Identifier::vanilla_static(path);
    (0..container.size())
        .map(|slot| container.get_item(slot))
        .filter(|stack| stack.is(&key))
        .map(ItemStack::count)
        .sum()
}

fn module_state(container: &ModularContainer, module: &ModuleId) -> ModuleState {
    container.module(module).unwrap().state.clone()
}
