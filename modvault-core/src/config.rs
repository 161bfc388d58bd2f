//! Engine configuration, read from a json5 file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::inventory::{ContainerType, ContainerTypes};
use crate::module::ModuleDefaults;
use crate::simulation::SimulationSettings;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/modvault_config.json5");

/// Most sockets a container type may have.
pub const MAX_SOCKETS: usize = 9;

/// Why a configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid json5 for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where containers are stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// A SQLite database file.
    Sqlite {
        /// Database path.
        path: PathBuf,
    },
    /// Memory only; nothing survives a restart.
    RamOnly,
}

/// Scavenger tunables.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScavengerConfig {
    /// Scan radius in blocks.
    pub radius: f64,
    /// Item entities looked at per container and cycle.
    pub max_entities_per_cycle: usize,
}

/// Restock tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RestockConfig {
    /// Threshold for fresh restock modules.
    pub default_threshold: i32,
}

/// Feeder tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FeederConfig {
    /// Hunger threshold for fresh feeder modules.
    pub default_hunger_threshold: i32,
}

/// The whole configuration. All durations are in game ticks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModularConfig {
    /// Storage backend.
    pub storage: StorageConfig,
    /// zstd level for written blobs, 1..=22.
    pub compression_level: i32,
    /// Ticks between simulation cycles.
    pub simulation_period_ticks: u64,
    /// Delay of a debounced save after the last interaction.
    pub save_delay_ticks: u64,
    /// Trailing window in which an interaction holds a due save back.
    pub quiet_window_ticks: u64,
    /// Delay of a lock release after a screen closed.
    pub lock_grace_ticks: u64,
    /// Minimum ticks between carried-copy refreshes of one container.
    pub refresh_window_ticks: u64,
    /// Scavenger tunables.
    pub scavenger: ScavengerConfig,
    /// Restock tunables.
    pub restock: RestockConfig,
    /// Feeder tunables.
    pub feeder: FeederConfig,
    /// Container types; the first one is the fallback for unknown tags.
    pub container_types: Vec<ContainerType>,
}

impl ModularConfig {
    /// Reads the configuration at `path`, writing the default file first if
    /// there is none.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let text = if path.exists() {
            fs::read_to_string(path)?
        } else {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default config to {}", path.display());
            DEFAULT_CONFIG.to_string()
        };
        Self::parse(&text)
    }

    /// Parses and validates a json5 document.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json5::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges and cross-field rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));
        if !(1..=22).contains(&self.compression_level) {
            return invalid("compression_level must be in range 1..=22".to_string());
        }
        for (name, value) in [
            ("simulation_period_ticks", self.simulation_period_ticks),
            ("save_delay_ticks", self.save_delay_ticks),
            ("quiet_window_ticks", self.quiet_window_ticks),
            ("lock_grace_ticks", self.lock_grace_ticks),
            ("refresh_window_ticks", self.refresh_window_ticks),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be greater than 0"));
            }
        }
        if self.quiet_window_ticks >= self.save_delay_ticks {
            return invalid("quiet_window_ticks must be shorter than save_delay_ticks".to_string());
        }
        if self.scavenger.radius.is_nan() || self.scavenger.radius <= 0.0 {
            return invalid("scavenger.radius must be positive".to_string());
        }
        if self.container_types.is_empty() {
            return invalid("at least one container type is required".to_string());
        }

        let mut seen = FxHashSet::default();
        for container_type in &self.container_types {
            let id = &container_type.id;
            if id.is_empty() {
                return invalid("container type ids must not be empty".to_string());
            }
            if !seen.insert(id.as_str()) {
                return invalid(format!("container type {id:?} is defined twice"));
            }
            if container_type.slots == 0 || container_type.slots % 9 != 0 {
                return invalid(format!(
                    "container type {id:?} must have a non-zero multiple of 9 slots"
                ));
            }
            if container_type.sockets > MAX_SOCKETS {
                return invalid(format!(
                    "container type {id:?} has more than {MAX_SOCKETS} sockets"
                ));
            }
        }
        Ok(())
    }

    /// The configured container types.
    pub fn container_types(&self) -> Result<ContainerTypes, ConfigError> {
        ContainerTypes::new(self.container_types.clone())
            .ok_or_else(|| ConfigError::Invalid("no container types configured".to_string()))
    }

    /// Defaults for fresh module state.
    #[must_use]
    pub fn module_defaults(&self) -> ModuleDefaults {
        ModuleDefaults {
            restock_threshold: self.restock.default_threshold,
            hunger_threshold: self.feeder.default_hunger_threshold,
        }
    }

    /// Simulation tunables.
    #[must_use]
    pub fn simulation_settings(&self) -> SimulationSettings {
        SimulationSettings {
            period: self.simulation_period_ticks,
            scavenge_radius: self.scavenger.radius,
            max_entities: self.scavenger.max_entities_per_cycle,
        }
    }
}

impl Default for ModularConfig {
    fn default() -> Self {
        let container_type = |id: &str, tier, slots, sockets| ContainerType {
            id: id.to_string(),
            tier,
            slots,
            sockets,
        };
        Self {
            storage: StorageConfig::Sqlite {
                path: PathBuf::from("world/modvault.db"),
            },
            compression_level: 3,
            simulation_period_ticks: 10,
            save_delay_ticks: 40,
            quiet_window_ticks: 10,
            lock_grace_ticks: 2,
            refresh_window_ticks: 20,
            scavenger: ScavengerConfig {
                radius: 6.0,
                max_entities_per_cycle: 32,
            },
            restock: RestockConfig {
                default_threshold: 8,
            },
            feeder: FeederConfig {
                default_hunger_threshold: 14,
            },
            container_types: vec![
                container_type("leather", 0, 27, 1),
                container_type("iron", 1, 54, 3),
                container_type("gold", 2, 81, 4),
                container_type("diamond", 3, 108, 5),
                container_type("netherite", 4, 162, 7),
            ],
        }
    }
}
