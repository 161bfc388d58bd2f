//! Tick-based scheduling shared by the lock and save managers.

mod deferred;

pub use deferred::DeferredTicks;
