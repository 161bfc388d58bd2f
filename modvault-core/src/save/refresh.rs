//! Throttling of carried-copy refreshes.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ids::ContainerId;

/// Lets at most one refresh per container through per window.
///
/// A request inside the window is remembered and released by
/// [`Self::poll_deferred`] once the window has passed, so the last state
/// always reaches the carried copies.
#[derive(Debug)]
pub struct RefreshThrottle {
    window: u64,
    last_refresh: FxHashMap<ContainerId, u64>,
    deferred: FxHashSet<ContainerId>,
}

impl RefreshThrottle {
    /// Creates a throttle with a window of `window` ticks.
    #[must_use]
    pub fn new(window: u64) -> Self {
        Self {
            window,
            last_refresh: FxHashMap::default(),
            deferred: FxHashSet::default(),
        }
    }

    /// Returns true if `id` may be refreshed now. Otherwise the request is
    /// deferred.
    pub fn request(&mut self, id: ContainerId, now: u64) -> bool {
        match self.last_refresh.get(&id) {
            Some(&last) if now < last + self.window => {
                self.deferred.insert(id);
                false
            }
            _ => {
                self.last_refresh.insert(id, now);
                self.deferred.remove(&id);
                true
            }
        }
    }

    /// Deferred refreshes whose window has passed.
    pub fn poll_deferred(&mut self, now: u64) -> Vec<ContainerId> {
        let ready: Vec<_> = self
            .deferred
            .iter()
            .copied()
            .filter(|id| {
                self.last_refresh
                    .get(id)
                    .is_none_or(|&last| now >= last + self.window)
            })
            .collect();
        for id in &ready {
            self.deferred.remove(id);
            self.last_refresh.insert(*id, now);
        }
        self.last_refresh
            .retain(|id, &mut last| now < last + self.window || self.deferred.contains(id));
        ready
    }
}
