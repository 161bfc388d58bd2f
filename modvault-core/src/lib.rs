//! # Modvault Core
//!
//! State engine for modular storage containers: persistence, viewer locks,
//! debounced saves, module simulation and shared storage.
//!
//! Everything hangs off a [`ModularContext`]; the surrounding game talks back
//! through the [`Host`] trait.

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod ids;
pub mod inventory;
pub mod module;
pub mod repository;
pub mod save;
pub mod session;
pub mod sharing;
pub mod simulation;
pub mod storage;
pub mod ticks;

pub use config::ModularConfig;
pub use context::{LiveView, ModularContext, OpenedContainer, TickReport};
pub use error::ModularError;
pub use host::{ContainerLocation, CookingProgress, Host, HostError, ItemEntity};
pub use ids::{ActorId, ContainerId, ModuleId, ScreenBinding, ScreenKind};
pub use session::LockOutcome;
pub use simulation::SimulationReport;
