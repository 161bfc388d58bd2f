//! Test harness for the modvault engine.
//!
//! [`TestHost`] implements every collaborator capability over plain in-memory
//! state: actors with positions, inventories and hunger, open screens, placed
//! and carried containers, and loose item entities. [`Harness`] wires it to a
//! [`ModularContext`](modvault_core::ModularContext) and drives ticks by hand,
//! so scenarios run deterministically and without a game.
//!
//! # Example
//!
//! ```ignore
//! let mut harness = Harness::new()?;
//! let actor = harness.host().add_actor("Alex", "overworld", Vector3::default());
//! let id = ContainerId::new_random();
//! harness.open_grid(actor, id, "iron")?;
//! harness.advance(40);
//! ```

mod actor;
mod harness;
mod host;
mod world;

#[cfg(test)]
mod scenarios;

pub use actor::TestActor;
pub use harness::Harness;
pub use host::{Placement, TestHost};
pub use world::TestWorld;
