//! Debounced saves of live views.

use rustc_hash::FxHashMap;

use crate::ids::{ActorId, ContainerId};
use crate::ticks::DeferredTicks;

/// A pending save is keyed by the editing actor and the container.
pub type SaveKey = (ActorId, ContainerId);

/// Coalesces bursts of edits into one delayed write.
///
/// Every interaction pushes the pending save back by `save_delay` ticks. A
/// save that comes due less than `quiet_window` ticks after the latest
/// interaction is held back until the window has passed, so that a grid is
/// never captured while an item is still on the actor's cursor.
#[derive(Debug)]
pub struct SaveManager {
    pending: DeferredTicks<SaveKey>,
    last_interaction: FxHashMap<SaveKey, u64>,
    save_delay: u64,
    quiet_window: u64,
}

impl SaveManager {
    /// Creates a manager with the given delays, in ticks.
    #[must_use]
    pub fn new(save_delay: u64, quiet_window: u64) -> Self {
        Self {
            pending: DeferredTicks::new(),
            last_interaction: FxHashMap::default(),
            save_delay,
            quiet_window,
        }
    }

    /// Records an interaction at `now` and (re)schedules the save.
    pub fn mark_interaction(&mut self, actor: ActorId, id: ContainerId, now: u64) {
        self.last_interaction.insert((actor, id), now);
        self.schedule_save(actor, id, now);
    }

    /// Replaces any pending save for the key with one `save_delay` from now.
    pub fn schedule_save(&mut self, actor: ActorId, id: ContainerId, now: u64) {
        self.pending.schedule((actor, id), now, self.save_delay);
    }

    /// Returns true if a save is pending for the key.
    #[must_use]
    pub fn is_pending(&self, actor: ActorId, id: ContainerId) -> bool {
        self.pending.is_scheduled(&(actor, id))
    }

    /// Returns true if any actor has a save pending for `id`.
    #[must_use]
    pub fn has_pending(&self, id: ContainerId) -> bool {
        self.pending.any_scheduled(|(_, pending)| *pending == id)
    }

    /// Cancels the pending save for the key. Returns true if one was pending.
    pub fn cancel(&mut self, actor: ActorId, id: ContainerId) -> bool {
        self.last_interaction.remove(&(actor, id));
        self.pending.cancel(&(actor, id))
    }

    /// Cancels every pending save for `actor`, returning the containers they
    /// were for.
    pub fn cancel_actor(&mut self, actor: ActorId) -> Vec<ContainerId> {
        let mut ids: Vec<_> = self
            .last_interaction
            .keys()
            .filter(|(viewer, _)| *viewer == actor)
            .map(|(_, id)| *id)
            .collect();
        self.last_interaction.retain(|(viewer, _), _| *viewer != actor);
        self.pending.cancel_where(|(viewer, id)| {
            if *viewer == actor && !ids.contains(id) {
                ids.push(*id);
            }
            *viewer == actor
        });
        ids
    }

    /// Saves that are due at `now`, after the quiet-window check.
    pub fn poll_due(&mut self, now: u64) -> Vec<SaveKey> {
        let mut due = Vec::new();
        for key in self.pending.poll_due(now) {
            let last = self.last_interaction.get(&key).copied();
            if let Some(last) = last
                && now < last + self.quiet_window
            {
                log::trace!(
                    "Holding back save of container {} for {}, interaction {} ticks ago",
                    key.1,
                    key.0,
                    now - last
                );
                self.pending.schedule(key, last, self.quiet_window);
                continue;
            }
            self.last_interaction.remove(&key);
            due.push(key);
        }
        due
    }
}
