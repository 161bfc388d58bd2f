//! # Modvault
//!
//! Runs the container engine on its own tick clock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use modvault_core::{Host, ModularConfig, ModularContext, ModularError};
use modvault_registry::Registry;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio::{select, spawn};
use tokio_util::sync::CancellationToken;

/// The headless host.
pub mod host;

/// Game ticks per second.
pub const TICKS_PER_SECOND: u64 = 20;

/// The engine daemon.
pub struct ModvaultServer {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    /// The engine.
    pub context: Arc<ModularContext>,
}

impl ModvaultServer {
    /// Loads the configuration at `config_path` and opens storage.
    pub fn new(config_path: &Path, host: Arc<dyn Host>) -> Result<Self, ModularError> {
        log::info!("Starting Modvault");
        let config = ModularConfig::load_or_create(config_path)?;
        let context = ModularContext::from_config(config, Arc::new(Registry::new_vanilla()), host)?;
        Ok(Self {
            cancel_token: CancellationToken::new(),
            context: Arc::new(context),
        })
    }

    /// Starts the tick loop. The returned task ends after the final flush.
    #[must_use]
    pub fn start(&self) -> JoinHandle<()> {
        let context = self.context.clone();
        let cancel_token = self.cancel_token.clone();
        log::info!("Ticking at {TICKS_PER_SECOND} ticks per second");

        spawn(async move {
            let mut interval = time::interval(Duration::from_millis(1000 / TICKS_PER_SECOND));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick = 0u64;
            loop {
                select! {
                    () = cancel_token.cancelled() => {
                        break;
                    }
                    _ = interval.tick() => {
                        let report = context.tick(tick);
                        if let Some(cycle) = report.simulation
                            && cycle.failed > 0
                        {
                            log::warn!("{} containers failed to simulate at tick {tick}", cycle.failed);
                        }
                        tick += 1;
                    }
                }
            }
            let written = context.shutdown();
            log::info!("Stopped after {tick} ticks, {written} containers flushed");
        })
    }

    /// Stops the tick loop.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
