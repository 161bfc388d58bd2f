//! A context wired to a [`TestHost`] with a manual tick clock.

use std::sync::Arc;

use modvault_core::config::StorageConfig;
use modvault_core::inventory::MODULE_COMPONENT;
use modvault_core::{
    ActorId, ContainerId, ModularConfig, ModularContext, ModularError, ModuleId, OpenedContainer,
    ScreenBinding, ScreenKind, TickReport,
};
use modvault_registry::{ItemStack, MODULE_ITEM, Registry};
use modvault_utils::Identifier;

use crate::host::TestHost;

/// An engine plus its host, advanced one tick at a time.
pub struct Harness {
    host: Arc<TestHost>,
    ctx: ModularContext,
    now: u64,
}

impl Harness {
    /// A harness over RAM-only storage with the default configuration.
    pub fn new() -> Result<Self, ModularError> {
        Self::with_config(ModularConfig {
            storage: StorageConfig::RamOnly,
            ..ModularConfig::default()
        })
    }

    /// A harness with a custom configuration. Tick 0 runs right away, which
    /// starts the simulation clock.
    pub fn with_config(config: ModularConfig) -> Result<Self, ModularError> {
        let host = Arc::new(TestHost::default());
        let ctx = ModularContext::from_config(config, Arc::new(Registry::new_vanilla()), host.clone())?;
        ctx.tick(0);
        Ok(Self { host, ctx, now: 0 })
    }

    /// The engine.
    #[must_use]
    pub fn ctx(&self) -> &ModularContext {
        &self.ctx
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &TestHost {
        &self.host
    }

    /// The current tick.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Runs `ticks` engine ticks and returns their reports.
    pub fn advance(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks)
            .map(|_| {
                self.now += 1;
                self.ctx.tick(self.now)
            })
            .collect()
    }

    /// A stack of a vanilla item; empty for unknown paths.
    #[must_use]
    pub fn item(&self, path: &'static str, count: i32) -> ItemStack {
        self.ctx
            .repository()
            .registry()
            .items
            .stack(&Identifier::vanilla_static(path), count)
            .unwrap_or_else(ItemStack::empty)
    }

    /// A module item for `module`.
    #[must_use]
    pub fn module_item(&self, module: &ModuleId) -> ItemStack {
        let mut item = self
            .ctx
            .repository()
            .registry()
            .items
            .stack(&MODULE_ITEM, 1)
            .unwrap_or_else(ItemStack::empty);
        item.set_component(MODULE_COMPONENT, module.as_str());
        item
    }

    /// Shows `actor` a screen of `id` and opens it in the engine.
    pub fn open(
        &self,
        actor: ActorId,
        id: ContainerId,
        type_hint: &str,
        screen: ScreenKind,
    ) -> Result<OpenedContainer, ModularError> {
        let resolved = self.ctx.resolve(id)?;
        self.host.show_screen(
            actor,
            ScreenBinding {
                container: resolved,
                screen: screen.clone(),
            },
        );
        self.ctx.open(actor, id, type_hint, screen, false)
    }

    /// Opens the grid editor of `id` for `actor`.
    pub fn open_grid(
        &self,
        actor: ActorId,
        id: ContainerId,
        type_hint: &str,
    ) -> Result<OpenedContainer, ModularError> {
        self.open(actor, id, type_hint, ScreenKind::Grid)
    }

    /// Closes `actor`'s screen of `id` on both sides.
    pub fn close(&self, actor: ActorId, id: ContainerId) -> Result<(), ModularError> {
        self.host.hide_screen(actor);
        self.ctx.close(actor, id)
    }

    /// Installs `module` into `socket` of a container `actor` holds.
    pub fn install(
        &self,
        actor: ActorId,
        id: ContainerId,
        socket: usize,
        module: &ModuleId,
    ) -> Result<ModuleId, ModularError> {
        let mut item = self.module_item(module);
        self.ctx.install_module(actor, id, socket, &mut item)
    }
}
