//! Viewer locks.
//!
//! At most one actor holds the live view of a container. Locks are memory
//! only and heal themselves: a holder that no longer has a screen tied to the
//! container is stale and loses the lock to the next opener. Closing a screen
//! does not drop the lock at once; the release waits a short grace period so
//! that hopping from one screen of a container to another does not flap.

use rustc_hash::FxHashMap;

use crate::host::Host;
use crate::ids::{ActorId, ContainerId, ScreenKind};
use crate::ticks::DeferredTicks;

/// A held lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    /// The actor holding the live view.
    pub viewer: ActorId,
    /// The screen the lock was taken for.
    pub screen: ScreenKind,
    /// Tick the lock was taken or last re-entered.
    pub acquired_at: u64,
}

/// Result of [`SessionLocks::try_lock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The container was free.
    Acquired,
    /// The actor already held the lock.
    Reentered,
    /// The previous holder was no longer viewing the container.
    StoleStale {
        /// The stale holder.
        previous: ActorId,
    },
    /// A live holder was kicked out.
    ForcedTakeover {
        /// The kicked holder.
        previous: ActorId,
    },
    /// A live holder keeps the lock.
    Denied {
        /// The current holder.
        holder: ActorId,
    },
}

impl LockOutcome {
    /// Returns true if the caller now holds the lock.
    #[must_use]
    pub fn is_acquired(self) -> bool {
        !matches!(self, Self::Denied { .. })
    }
}

/// The lock table.
#[derive(Debug)]
pub struct SessionLocks {
    locks: FxHashMap<ContainerId, LockEntry>,
    releases: DeferredTicks<(ActorId, ContainerId)>,
    grace_ticks: u64,
}

impl SessionLocks {
    /// Creates an empty table. `grace_ticks` delays releases and protects
    /// freshly taken locks from being judged stale.
    #[must_use]
    pub fn new(grace_ticks: u64) -> Self {
        Self {
            locks: FxHashMap::default(),
            releases: DeferredTicks::new(),
            grace_ticks,
        }
    }

    /// Tries to take the lock on `id` for `actor`.
    ///
    /// With `forced`, a live holder has its screen closed and is notified.
    pub fn try_lock(
        &mut self,
        actor: ActorId,
        id: ContainerId,
        screen: ScreenKind,
        forced: bool,
        now: u64,
        host: &dyn Host,
    ) -> LockOutcome {
        let outcome = match self.locks.get(&id) {
            None => LockOutcome::Acquired,
            Some(entry) if entry.viewer == actor => LockOutcome::Reentered,
            Some(entry) if self.is_stale(entry, id, now, host) => {
                log::debug!(
                    "Stale lock on container {id} held by {} taken over by {actor}",
                    entry.viewer
                );
                LockOutcome::StoleStale {
                    previous: entry.viewer,
                }
            }
            Some(entry) if forced => {
                let previous = entry.viewer;
                log::info!("Lock on container {id} forcibly taken from {previous} by {actor}");
                host.force_close(previous);
                host.notify(previous, "Another player took over the container you were viewing.");
                LockOutcome::ForcedTakeover { previous }
            }
            Some(entry) => {
                return LockOutcome::Denied {
                    holder: entry.viewer,
                };
            }
        };

        if let LockOutcome::StoleStale { previous } | LockOutcome::ForcedTakeover { previous } =
            outcome
        {
            self.releases.cancel(&(previous, id));
        }
        self.releases.cancel(&(actor, id));
        self.locks.insert(
            id,
            LockEntry {
                viewer: actor,
                screen,
                acquired_at: now,
            },
        );
        outcome
    }

    fn is_stale(&self, entry: &LockEntry, id: ContainerId, now: u64, host: &dyn Host) -> bool {
        if now < entry.acquired_at + self.grace_ticks {
            return false;
        }
        host.open_screen(entry.viewer)
            .is_none_or(|binding| binding.container != id)
    }

    /// Schedules the release of `actor`'s lock on `id` after the grace period.
    pub fn release_on_close(&mut self, actor: ActorId, id: ContainerId, now: u64) {
        if self.holder(id) == Some(actor) {
            self.releases.schedule((actor, id), now, self.grace_ticks);
        }
    }

    /// Runs due releases. A release is dropped if the actor reopened a screen
    /// of the container in the meantime.
    ///
    /// Returns the containers that became free.
    pub fn process_releases(&mut self, now: u64, host: &dyn Host) -> Vec<ContainerId> {
        let mut released = Vec::new();
        for (actor, id) in self.releases.poll_due(now) {
            if self.holder(id) != Some(actor) {
                continue;
            }
            let still_viewing = host
                .open_screen(actor)
                .is_some_and(|binding| binding.container == id);
            if still_viewing {
                continue;
            }
            self.locks.remove(&id);
            released.push(id);
        }
        released
    }

    /// Drops `actor`'s lock on `id` at once. Returns false if `actor` did not
    /// hold it.
    pub fn release(&mut self, actor: ActorId, id: ContainerId) -> bool {
        if self.holder(id) != Some(actor) {
            return false;
        }
        self.releases.cancel(&(actor, id));
        self.locks.remove(&id);
        true
    }

    /// Drops every lock `actor` holds. Returns the freed containers.
    pub fn release_all(&mut self, actor: ActorId) -> Vec<ContainerId> {
        self.releases.cancel_where(|(viewer, _)| *viewer == actor);
        let held: Vec<_> = self
            .locks
            .iter()
            .filter(|(_, entry)| entry.viewer == actor)
            .map(|(id, _)| *id)
            .collect();
        for id in &held {
            self.locks.remove(id);
        }
        held
    }

    /// The actor holding `id`.
    #[must_use]
    pub fn holder(&self, id: ContainerId) -> Option<ActorId> {
        self.locks.get(&id).map(|entry| entry.viewer)
    }

    /// The lock on `id`.
    #[must_use]
    pub fn entry(&self, id: ContainerId) -> Option<&LockEntry> {
        self.locks.get(&id)
    }

    /// Returns true if the grid editor of `id` is open.
    #[must_use]
    pub fn grid_editor_open(&self, id: ContainerId) -> bool {
        self.locks
            .get(&id)
            .is_some_and(|entry| entry.screen == ScreenKind::Grid)
    }

    /// Every locked container.
    pub fn locked(&self) -> impl Iterator<Item = (ContainerId, &LockEntry)> {
        self.locks.iter().map(|(id, entry)| (*id, entry))
    }
}
