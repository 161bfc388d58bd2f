//! Shared value types used across the modvault crates.

mod identifier;
pub mod math;
pub mod time;

pub use identifier::Identifier;
pub use math::Vector3;
