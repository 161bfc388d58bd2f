//! The periodic simulation of installed modules.
//!
//! One cycle runs every `period` ticks and advances each module by the ticks
//! elapsed since the previous cycle. The cycle is driven by
//! [`ModularContext::tick`](crate::ModularContext::tick), which picks the
//! containers and persists the ones that changed; this module holds the
//! cadence and the per-container step.

use modvault_registry::ItemStack;

use crate::host::{ContainerLocation, CookingProgress, Host, ItemEntity};
use crate::ids::{ActorId, ContainerId, ModuleId};
use crate::inventory::{Container, ModularContainer, Owner};
use crate::module::scavenger::{self, ScavengeReport};
use crate::module::{ModuleKind, ModuleState, cooking, feeder, restock};
use crate::repository::ContainerRepository;
use crate::storage::{StorageError, VoidedEntry};

/// Tunables of the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Ticks between cycles.
    pub period: u64,
    /// Scan radius of the scavenger.
    pub scavenge_radius: f64,
    /// Item entities looked at per container and cycle.
    pub max_entities: usize,
}

/// Decides when a cycle is due and how many ticks it covers.
#[derive(Debug)]
pub struct SimulationEngine {
    settings: SimulationSettings,
    last_cycle: Option<u64>,
}

impl SimulationEngine {
    /// Creates an engine that has not run yet.
    #[must_use]
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            last_cycle: None,
        }
    }

    /// The settings.
    #[must_use]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Returns the elapsed delta if a cycle is due at `now`.
    ///
    /// The first call only starts the clock.
    pub fn due(&mut self, now: u64) -> Option<u32> {
        let Some(last) = self.last_cycle else {
            self.last_cycle = Some(now);
            return None;
        };
        let elapsed = now.saturating_sub(last);
        if elapsed < self.settings.period.max(1) {
            return None;
        }
        self.last_cycle = Some(now);
        Some(u32::try_from(elapsed).unwrap_or(u32::MAX))
    }
}

/// Totals of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationReport {
    /// Containers stepped.
    pub simulated: usize,
    /// Containers persisted because something changed.
    pub persisted: usize,
    /// Containers whose step or save failed.
    pub failed: usize,
    /// Item entities voided by discard modules.
    pub voided: usize,
}

/// What stepping one container did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// True if the container must be persisted.
    pub changed: bool,
    /// Item entities voided.
    pub voided: usize,
}

/// Everything a container step reads besides the container.
pub struct StepEnv<'a> {
    /// Repository, for the registry and voided-item audit.
    pub repo: &'a ContainerRepository,
    /// The collaborator.
    pub host: &'a dyn Host,
    /// Simulation tunables.
    pub settings: &'a SimulationSettings,
    /// True while the grid editor of the container is open.
    pub grid_locked: bool,
    /// The actor viewing the cooking screen, if any.
    pub cooking_viewer: Option<ActorId>,
    /// Wall clock, unix milliseconds.
    pub now_millis: i64,
}

/// Advances every enabled module of `container` by `delta` ticks.
///
/// Cooking always runs. The grid-mutating modules are skipped while the grid
/// editor is open. An error means a voided item could not be audited; the
/// container may be partly stepped and should still be persisted.
pub fn step_container(
    container: &mut ModularContainer,
    delta: u32,
    env: &StepEnv<'_>,
) -> Result<StepOutcome, StorageError> {
    let mut outcome = StepOutcome::default();
    if step_cooking(container, delta, env) {
        outcome.changed = true;
    }
    if env.grid_locked {
        return Ok(outcome);
    }

    let location = env.host.locate(container.id());
    let scavenged = step_scavenger(container, location.as_ref(), env);
    if let Some(carrier) = location.as_ref().and_then(ContainerLocation::carrier) {
        if step_restock(container, carrier, env.host) {
            outcome.changed = true;
        }
        if step_feeder(container, carrier, env.host) {
            outcome.changed = true;
        }
    }
    let scavenged = scavenged?;
    outcome.voided = scavenged.voided;
    if scavenged.grid_changed() {
        outcome.changed = true;
    }
    if outcome.changed {
        container.set_changed();
    }
    Ok(outcome)
}

fn enabled_state(container: &ModularContainer, kind: ModuleKind) -> Option<ModuleState> {
    container
        .module(&kind.id())
        .map(|module| &module.state)
        .filter(|state| state.kind() == Some(kind) && state.is_enabled())
        .cloned()
}

fn step_cooking(container: &mut ModularContainer, delta: u32, env: &StepEnv<'_>) -> bool {
    let id = container.id();
    let Some(module) = container.module_mut(&ModuleId::COOKING) else {
        return false;
    };
    let ModuleState::Cooking(state) = &mut module.state else {
        return false;
    };
    let changed = cooking::advance(state, delta, env.repo.registry());
    if let Some(viewer) = env.cooking_viewer {
        let progress = CookingProgress {
            burn_remaining: state.burn_remaining,
            burn_total: state.burn_total,
            cook_progress: state.cook_progress,
            cook_total: state.cook_total,
        };
        if let Err(err) = env.host.sync_cooking_progress(viewer, id, progress) {
            log::debug!("Could not sync cooking progress of {id} to {viewer}: {err}");
        }
    }
    if changed {
        container.set_changed();
    }
    changed
}

fn step_scavenger(
    container: &mut ModularContainer,
    location: Option<&ContainerLocation>,
    env: &StepEnv<'_>,
) -> Result<ScavengeReport, StorageError> {
    let magnet = match enabled_state(container, ModuleKind::Scavenger) {
        Some(ModuleState::Scavenger(state)) => Some(state),
        _ => None,
    };
    let discard = match enabled_state(container, ModuleKind::Discard) {
        Some(ModuleState::Discard(state)) => Some(state),
        _ => None,
    };
    if magnet.is_none() && discard.is_none() {
        return Ok(ScavengeReport::default());
    }
    let Some(location) = location else {
        return Ok(ScavengeReport::default());
    };

    let settings = env.settings;
    let entities = env.host.nearby_items(
        location.world(),
        location.pos(),
        settings.scavenge_radius,
        settings.max_entities,
    );
    if entities.is_empty() {
        return Ok(ScavengeReport::default());
    }

    let actor = location.carrier().map(|id| Owner {
        id,
        name: env.host.actor_name(id).unwrap_or_default(),
    });
    let container_id = container.id();
    let container_type = container.type_tag().to_string();
    let mut audit = |entity: &ItemEntity| -> Result<(), StorageError> {
        env.repo
            .record_voided(&voided_entry(
                entity,
                actor.clone(),
                location,
                container_id,
                &container_type,
                env,
            ))
            .map(|_| ())
    };
    scavenger::scavenge(
        container,
        magnet.as_ref(),
        discard.as_ref(),
        &entities,
        settings.max_entities,
        env.host,
        &mut audit,
    )
}

fn voided_entry(
    entity: &ItemEntity,
    actor: Option<Owner>,
    location: &ContainerLocation,
    container_id: ContainerId,
    container_type: &str,
    env: &StepEnv<'_>,
) -> VoidedEntry {
    let stack: &ItemStack = &entity.stack;
    VoidedEntry {
        voided_at: env.now_millis,
        actor,
        container_id,
        container_type: container_type.to_string(),
        module_id: ModuleId::DISCARD.to_string(),
        item_key: stack.key().map(ToString::to_string).unwrap_or_default(),
        item_count: stack.count(),
        item_data: env.repo.codec().encode_item(stack),
        world: Some(location.world().to_string()),
        pos: Some(entity.pos),
    }
}

fn step_restock(container: &mut ModularContainer, carrier: ActorId, host: &dyn Host) -> bool {
    let Some(ModuleState::Restock(state)) = enabled_state(container, ModuleKind::Restock) else {
        return false;
    };
    host.with_inventory(carrier, &mut |inventory| {
        restock::restock(&state, container, inventory)
    })
}

fn step_feeder(container: &mut ModularContainer, carrier: ActorId, host: &dyn Host) -> bool {
    let Some(ModuleState::Feeder(state)) = enabled_state(container, ModuleKind::Feeder) else {
        return false;
    };
    feeder::feed(&state, container, carrier, host)
}
