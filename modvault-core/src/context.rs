//! The engine's single entry point.
//!
//! A [`ModularContext`] is built once per process and owns every piece of
//! engine state: the repository, the lock table, pending saves, the refresh
//! throttle, the simulation clock and the live views. Collaborators call it
//! from their own event handlers and drive [`ModularContext::tick`] once per
//! game tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use modvault_registry::{ItemStack, Registry};
use modvault_utils::time::now_millis;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::codec::Codec;
use crate::config::{MAX_SOCKETS, ModularConfig, StorageConfig};
use crate::error::ModularError;
use crate::host::Host;
use crate::ids::{ActorId, ContainerId, ModuleId, ScreenKind};
use crate::inventory::{Container, ModularContainer, SharingInfo};
use crate::module::{ModuleState, cooking, install};
use crate::repository::ContainerRepository;
use crate::save::{RefreshThrottle, SaveManager};
use crate::session::{LockOutcome, SessionLocks};
use crate::sharing;
use crate::simulation::{SimulationEngine, SimulationReport, StepEnv, step_container};
use crate::storage::{ContainerStorage, RamOnlyStorage, SqliteStorage};

/// The in-memory view of a container that is open somewhere.
pub type LiveView = Arc<Mutex<ModularContainer>>;

/// A successful [`ModularContext::open`].
#[derive(Clone)]
pub struct OpenedContainer {
    /// The container actually opened. Differs from the requested id when a
    /// joiner resolved to its host; later calls must use this id.
    pub id: ContainerId,
    /// How the lock was obtained.
    pub outcome: LockOutcome,
    /// The live view.
    pub view: LiveView,
    /// Stacks stored beyond the end of the grid, now handed to the opener.
    /// Empty unless the container type shrank while the container was stored.
    pub overflow: Vec<ItemStack>,
}

/// What one [`ModularContext::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Locks released after their grace period.
    pub released: usize,
    /// Debounced saves written.
    pub saved: usize,
    /// The simulation cycle, if one ran.
    pub simulation: Option<SimulationReport>,
}

/// Engine state and the collaborator-facing API.
pub struct ModularContext {
    config: ModularConfig,
    repo: ContainerRepository,
    host: Arc<dyn Host>,
    locks: Mutex<SessionLocks>,
    saves: Mutex<SaveManager>,
    refresh: Mutex<RefreshThrottle>,
    simulation: Mutex<SimulationEngine>,
    live: scc::HashMap<ContainerId, LiveView>,
    current_tick: AtomicU64,
}

impl ModularContext {
    /// Builds a context over an already opened storage backend.
    pub fn new(
        config: ModularConfig,
        registry: Arc<Registry>,
        storage: ContainerStorage,
        host: Arc<dyn Host>,
    ) -> Result<Self, ModularError> {
        config.validate()?;
        let repo = ContainerRepository::new(
            storage,
            registry,
            config.container_types()?,
            Codec::new(config.compression_level),
            config.module_defaults(),
        );
        Ok(Self {
            locks: Mutex::new(SessionLocks::new(config.lock_grace_ticks)),
            saves: Mutex::new(SaveManager::new(
                config.save_delay_ticks,
                config.quiet_window_ticks,
            )),
            refresh: Mutex::new(RefreshThrottle::new(config.refresh_window_ticks)),
            simulation: Mutex::new(SimulationEngine::new(config.simulation_settings())),
            live: scc::HashMap::new(),
            current_tick: AtomicU64::new(0),
            config,
            repo,
            host,
        })
    }

    /// Builds a context, opening the storage backend the config names.
    pub fn from_config(
        config: ModularConfig,
        registry: Arc<Registry>,
        host: Arc<dyn Host>,
    ) -> Result<Self, ModularError> {
        let storage = match &config.storage {
            StorageConfig::Sqlite { path } => ContainerStorage::Sqlite(SqliteStorage::open(path)?),
            StorageConfig::RamOnly => {
                log::warn!("Using RAM-only container storage, nothing will be persisted");
                ContainerStorage::RamOnly(RamOnlyStorage::new())
            }
        };
        Self::new(config, registry, storage, host)
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &ModularConfig {
        &self.config
    }

    /// The repository, for listings, voided items and direct loads.
    #[must_use]
    pub fn repository(&self) -> &ContainerRepository {
        &self.repo
    }

    /// The collaborator.
    #[must_use]
    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// The tick last passed to [`Self::tick`].
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Relaxed)
    }

    /// The actor holding the live view of `id`.
    #[must_use]
    pub fn lock_holder(&self, id: ContainerId) -> Option<ActorId> {
        self.locks.lock().holder(id)
    }

    /// The live view of `id`, if it is open.
    #[must_use]
    pub fn live_view(&self, id: ContainerId) -> Option<LiveView> {
        self.live.read_sync(&id, |_, view| view.clone())
    }

    /// The container whose grid `id` stands for.
    pub fn resolve(&self, id: ContainerId) -> Result<ContainerId, ModularError> {
        Ok(sharing::resolve(&self.repo, id)?)
    }

    /// Opens a screen of `id` for `actor`, taking the viewer lock.
    ///
    /// Joiners resolve to their host. The row is created on first reference
    /// with `type_hint`.
    pub fn open(
        &self,
        actor: ActorId,
        id: ContainerId,
        type_hint: &str,
        screen: ScreenKind,
        forced: bool,
    ) -> Result<OpenedContainer, ModularError> {
        let id = self.resolve(id)?;
        let tick = self.current_tick();
        let outcome = self
            .locks
            .lock()
            .try_lock(actor, id, screen, forced, tick, self.host.as_ref());
        if let LockOutcome::Denied { holder } = outcome {
            return Err(ModularError::Locked { holder });
        }
        if let LockOutcome::StoleStale { previous } | LockOutcome::ForcedTakeover { previous } =
            outcome
        {
            self.flush_actor_save(previous, id);
        }

        let view = match self.live_view(id) {
            Some(view) => view,
            None => {
                let loaded = match self.repo.load_or_create(id, type_hint, now_millis()) {
                    Ok(loaded) => loaded,
                    Err(err) => {
                        if outcome != LockOutcome::Reentered {
                            self.locks.lock().release(actor, id);
                        }
                        return Err(err.into());
                    }
                };
                let view = Arc::new(Mutex::new(loaded));
                match self.live.insert_sync(id, view.clone()) {
                    Ok(()) => view,
                    Err(_) => self.live_view(id).unwrap_or(view),
                }
            }
        };
        let overflow = self.hand_out_overflow(id, &view);
        Ok(OpenedContainer {
            id,
            outcome,
            view,
            overflow,
        })
    }

    /// Takes the kept-aside stacks off the view and writes it, so the stacks
    /// exist in exactly one place.
    fn hand_out_overflow(&self, id: ContainerId, view: &LiveView) -> Vec<ItemStack> {
        let mut container = view.lock();
        let overflow = container.take_overflow();
        if overflow.is_empty() {
            return overflow;
        }
        if let Err(err) = self.repo.save(&mut container, now_millis()) {
            log::warn!("Could not hand out the overflow of container {id}: {err}");
            container.restore_overflow(overflow);
            return Vec::new();
        }
        log::info!("Handed out {} stacks that no longer fit container {id}", overflow.len());
        overflow
    }

    fn holding_view(&self, actor: ActorId, id: ContainerId) -> Result<LiveView, ModularError> {
        let not_viewing = ModularError::NotViewing {
            actor,
            container: id,
        };
        if self.lock_holder(id) != Some(actor) {
            return Err(not_viewing);
        }
        self.live_view(id).ok_or(not_viewing)
    }

    /// Runs `f` against the live view `actor` holds and records the
    /// interaction.
    pub fn edit<R>(
        &self,
        actor: ActorId,
        id: ContainerId,
        f: impl FnOnce(&mut ModularContainer) -> R,
    ) -> Result<R, ModularError> {
        let view = self.holding_view(actor, id)?;
        let result = f(&mut *view.lock());
        self.mark_interaction(actor, id);
        Ok(result)
    }

    /// Records an interaction and pushes the debounced save back.
    pub fn mark_interaction(&self, actor: ActorId, id: ContainerId) {
        self.saves
            .lock()
            .mark_interaction(actor, id, self.current_tick());
    }

    /// Cancels the pending save and writes the live view now.
    ///
    /// Without `force` nothing is written unless the view changed. Returns
    /// true if a write happened.
    pub fn flush_save_now(
        &self,
        actor: ActorId,
        id: ContainerId,
        force: bool,
    ) -> Result<bool, ModularError> {
        self.saves.lock().cancel(actor, id);
        self.persist_live(id, force)
    }

    fn persist_live(&self, id: ContainerId, force: bool) -> Result<bool, ModularError> {
        let Some(view) = self.live_view(id) else {
            return Ok(false);
        };
        {
            let mut container = view.lock();
            if !force && !container.has_changed() {
                return Ok(false);
            }
            self.repo.save(&mut container, now_millis())?;
        }
        self.refresh_linked(id);
        Ok(true)
    }

    fn flush_actor_save(&self, actor: ActorId, id: ContainerId) {
        if self.saves.lock().cancel(actor, id)
            && let Err(err) = self.persist_live(id, false)
        {
            log::warn!("Failed to flush container {id} for {actor}: {err}");
        }
    }

    /// Handles a closed screen: flushes at once and releases the lock after
    /// the grace period.
    pub fn close(&self, actor: ActorId, id: ContainerId) -> Result<(), ModularError> {
        let holds = self.lock_holder(id) == Some(actor);
        if holds {
            self.flush_save_now(actor, id, false)?;
        }
        self.locks
            .lock()
            .release_on_close(actor, id, self.current_tick());
        Ok(())
    }

    /// Handles a disconnect: flushes and drops everything `actor` held.
    pub fn disconnect(&self, actor: ActorId) {
        let pending = self.saves.lock().cancel_actor(actor);
        let released = self.locks.lock().release_all(actor);
        for id in pending.iter().chain(&released) {
            if let Err(err) = self.persist_live(*id, false) {
                log::warn!("Failed to save container {id} after {actor} disconnected: {err}");
            }
        }
        for id in released {
            self.evict(id);
        }
    }

    fn evict(&self, id: ContainerId) {
        if self.lock_holder(id).is_some() {
            return;
        }
        if let Err(err) = self.persist_live(id, false) {
            log::warn!("Failed to save container {id} before unloading it: {err}");
            return;
        }
        self.live.remove_sync(&id);
    }

    /// Installs a module from `item` into `socket`, consuming one item.
    pub fn install_module(
        &self,
        actor: ActorId,
        id: ContainerId,
        socket: usize,
        item: &mut ItemStack,
    ) -> Result<ModuleId, ModularError> {
        let installed = self.edit(actor, id, |container| {
            install::install(
                container,
                socket,
                item,
                self.repo.codec(),
                &self.repo.registry().items,
                self.repo.defaults(),
            )
        })??;
        log::debug!("{actor} installed {installed} into socket {socket} of {id}");
        Ok(installed)
    }

    /// Removes the module in `socket`, returning its item with state.
    pub fn remove_module(
        &self,
        actor: ActorId,
        id: ContainerId,
        socket: usize,
    ) -> Result<Option<ItemStack>, ModularError> {
        self.edit(actor, id, |container| {
            install::remove(
                container,
                socket,
                self.repo.codec(),
                &self.repo.registry().items,
            )
        })
    }

    /// Switches a module on or off. Returns false for modules this engine
    /// does not simulate.
    pub fn set_module_enabled(
        &self,
        actor: ActorId,
        id: ContainerId,
        module: &ModuleId,
        enabled: bool,
    ) -> Result<bool, ModularError> {
        self.edit(actor, id, |container| {
            let Some(installed) = container.module_mut(module) else {
                return Err(ModularError::NoSuchModule(module.clone()));
            };
            let switched = installed.state.set_enabled(enabled);
            if switched {
                container.set_changed();
            }
            Ok(switched)
        })?
    }

    /// Runs `f` against a module's runtime state, for settings screens.
    pub fn configure_module<R>(
        &self,
        actor: ActorId,
        id: ContainerId,
        module: &ModuleId,
        f: impl FnOnce(&mut ModuleState) -> R,
    ) -> Result<R, ModularError> {
        self.edit(actor, id, |container| {
            let Some(installed) = container.module_mut(module) else {
                return Err(ModularError::NoSuchModule(module.clone()));
            };
            let result = f(&mut installed.state);
            container.set_changed();
            Ok(result)
        })?
    }

    /// Withdraws cooked items and the matching share of stored experience.
    pub fn take_cooking_output(
        &self,
        actor: ActorId,
        id: ContainerId,
        count: i32,
    ) -> Result<(ItemStack, f32), ModularError> {
        self.edit(actor, id, |container| {
            let Some(ModuleState::Cooking(state)) = container
                .module_mut(&ModuleId::COOKING)
                .map(|module| &mut module.state)
            else {
                return Err(ModularError::NoSuchModule(ModuleId::COOKING));
            };
            let taken = cooking::take_output(state, count);
            if !taken.0.is_empty() {
                container.set_changed();
            }
            Ok(taken)
        })?
    }

    /// Changes the container's type.
    ///
    /// Returns what no longer fits: grid overflow and the items of modules in
    /// sockets the new type lacks.
    pub fn retype_container(
        &self,
        actor: ActorId,
        id: ContainerId,
        new_type: &str,
    ) -> Result<Vec<ItemStack>, ModularError> {
        let Some(container_type) = self.repo.types().get(new_type) else {
            return Err(ModularError::UnknownContainerType(new_type.to_string()));
        };
        self.edit(actor, id, |container| {
            let mut overflow = container.retype(container_type);
            let cut_sockets: SmallVec<[usize; MAX_SOCKETS]> = container
                .modules()
                .iter()
                .map(|module| module.socket)
                .filter(|&socket| socket >= container_type.sockets)
                .collect();
            for socket in cut_sockets {
                overflow.extend(install::remove(
                    container,
                    socket,
                    self.repo.codec(),
                    &self.repo.registry().items,
                ));
            }
            overflow
        })
    }

    fn apply_sharing(&self, id: ContainerId, sharing: SharingInfo) {
        if let Some(view) = self.live_view(id) {
            view.lock().sharing = sharing;
        }
    }

    /// Starts sharing `host`. The live view is written first so joiners never
    /// see a stale grid.
    pub fn enable_sharing(
        &self,
        actor: ActorId,
        host: ContainerId,
        secret: &str,
    ) -> Result<(), ModularError> {
        self.flush_save_now(actor, host, true)?;
        let sharing = sharing::enable(&self.repo, host, secret, now_millis())?;
        self.apply_sharing(host, sharing);
        Ok(())
    }

    /// Stops sharing `host`.
    pub fn disable_sharing(&self, host: ContainerId) -> Result<(), ModularError> {
        let sharing = sharing::disable(&self.repo, host, now_millis())?;
        self.apply_sharing(host, sharing);
        Ok(())
    }

    /// Links `joiner` to `host`.
    pub fn join(
        &self,
        joiner: ContainerId,
        host: ContainerId,
        secret: &str,
    ) -> Result<(), ModularError> {
        let sharing = sharing::join(&self.repo, joiner, host, secret, now_millis())?;
        self.apply_sharing(joiner, sharing);
        Ok(())
    }

    /// Unlinks `joiner` from its host.
    pub fn leave(&self, joiner: ContainerId) -> Result<(), ModularError> {
        let sharing = sharing::leave(&self.repo, joiner, now_millis())?;
        self.apply_sharing(joiner, sharing);
        Ok(())
    }

    /// Rebuilds carried copies of `id` and of its joiners, at most once per
    /// refresh window.
    pub fn refresh_linked(&self, id: ContainerId) {
        if self.refresh.lock().request(id, self.current_tick()) {
            self.refresh_now(id);
        }
    }

    fn refresh_now(&self, id: ContainerId) {
        self.host.refresh_carried_copies(id);
        match self.repo.find_joiners(id) {
            Ok(joiners) => {
                for joiner in joiners {
                    self.host.refresh_carried_copies(joiner);
                }
            }
            Err(err) => log::warn!("Could not list joiners of {id}: {err}"),
        }
    }

    /// Advances the engine to `now`: due lock releases, due saves, deferred
    /// refreshes, then the simulation cycle if one is due.
    pub fn tick(&self, now: u64) -> TickReport {
        self.current_tick.store(now, Ordering::Relaxed);
        let mut report = TickReport::default();

        let released = self.locks.lock().process_releases(now, self.host.as_ref());
        report.released = released.len();
        for id in released {
            self.evict(id);
        }

        let due = self.saves.lock().poll_due(now);
        for (actor, id) in due {
            match self.persist_live(id, false) {
                Ok(true) => report.saved += 1,
                Ok(false) => {}
                Err(err) => log::warn!("Debounced save of {id} for {actor} failed: {err}"),
            }
        }

        let deferred = self.refresh.lock().poll_deferred(now);
        for id in deferred {
            self.refresh_now(id);
        }

        let delta = self.simulation.lock().due(now);
        if let Some(delta) = delta {
            report.simulation = Some(self.run_simulation(delta));
        }
        report
    }

    /// Runs one simulation cycle over every live view and every stored
    /// container with modules.
    pub fn run_simulation(&self, delta: u32) -> SimulationReport {
        let mut ids = Vec::new();
        self.live.iter_sync(|id, _| {
            ids.push(*id);
            true
        });
        match self.repo.containers_with_modules() {
            Ok(stored) => ids.extend(stored),
            Err(err) => log::warn!("Could not list containers with modules: {err}"),
        }
        ids.sort();
        ids.dedup();

        let settings = *self.simulation.lock().settings();
        let mut report = SimulationReport::default();
        for id in ids {
            let (grid_locked, cooking_viewer) = {
                let locks = self.locks.lock();
                let viewer = locks
                    .entry(id)
                    .filter(|entry| entry.screen == ScreenKind::Module(ModuleId::COOKING))
                    .map(|entry| entry.viewer);
                (locks.grid_editor_open(id), viewer)
            };
            // The grid of a live view belongs to the save manager while an
            // edit is pending or the editor is open.
            let grid_deferred = grid_locked || self.saves.lock().has_pending(id);
            let env = StepEnv {
                repo: &self.repo,
                host: self.host.as_ref(),
                settings: &settings,
                grid_locked,
                cooking_viewer,
                now_millis: now_millis(),
            };
            match self.simulate_one(id, delta, &env, grid_deferred) {
                Ok((voided, persisted)) => {
                    report.simulated += 1;
                    report.voided += voided;
                    if persisted {
                        report.persisted += 1;
                        self.refresh_linked(id);
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    log::warn!("Simulation of container {id} failed: {err}");
                }
            }
        }
        log::debug!(
            "Simulated {} containers over {delta} ticks, {} persisted, {} failed",
            report.simulated,
            report.persisted,
            report.failed
        );
        report
    }

    fn simulate_one(
        &self,
        id: ContainerId,
        delta: u32,
        env: &StepEnv<'_>,
        grid_deferred: bool,
    ) -> Result<(usize, bool), ModularError> {
        let step = |container: &mut ModularContainer,
                    modules_only: bool|
         -> Result<(usize, bool), ModularError> {
            let stepped = step_container(container, delta, env);
            let (voided, changed) = match &stepped {
                Ok(outcome) => (outcome.voided, outcome.changed),
                Err(_) => (0, container.has_changed()),
            };
            if changed {
                if modules_only {
                    self.repo.save_modules(container, env.now_millis)?;
                } else {
                    self.repo.save(container, env.now_millis)?;
                }
            }
            stepped?;
            Ok((voided, changed))
        };

        if let Some(view) = self.live_view(id) {
            return step(&mut *view.lock(), grid_deferred);
        }
        match self.repo.load(id)? {
            Some(mut container) => step(&mut container, false),
            None => Ok((0, false)),
        }
    }

    /// Writes every live view and drops all pending work. Returns the number
    /// of containers written.
    pub fn shutdown(&self) -> usize {
        let mut ids = Vec::new();
        self.live.iter_sync(|id, _| {
            ids.push(*id);
            true
        });
        let mut written = 0;
        for id in ids {
            match self.persist_live(id, false) {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(err) => log::error!("Failed to save container {id} on shutdown: {err}"),
            }
        }
        log::info!("Saved {written} open containers");
        written
    }
}
