//! Cancelable delayed tasks keyed by owner.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// A pending entry in the queue.
///
/// Entries are never removed from the heap on cancel. A popped entry whose
/// sequence number no longer matches the live one for its key is dropped.
#[derive(Debug)]
struct Pending<K> {
    key: K,
    trigger_tick: u64,
    sub_tick_order: u64,
}

impl<K> PartialEq for Pending<K> {
    fn eq(&self, other: &Self) -> bool {
        self.trigger_tick == other.trigger_tick && self.sub_tick_order == other.sub_tick_order
    }
}

impl<K> Eq for Pending<K> {}

impl<K> PartialOrd for Pending<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Pending<K> {
    // Reversed so the max-heap pops the earliest tick first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .trigger_tick
            .cmp(&self.trigger_tick)
            .then(other.sub_tick_order.cmp(&self.sub_tick_order))
    }
}

/// At most one pending task per key, fired once its tick is reached.
///
/// Scheduling a key that already has a task replaces it.
#[derive(Debug)]
pub struct DeferredTicks<K: Clone + Eq + Hash> {
    queue: BinaryHeap<Pending<K>>,
    live: FxHashMap<K, (u64, u64)>,
    sub_tick_counter: u64,
}

impl<K: Clone + Eq + Hash> Default for DeferredTicks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> DeferredTicks<K> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            live: FxHashMap::default(),
            sub_tick_counter: 0,
        }
    }

    /// Schedules `key` to fire at `current_tick + delay`, replacing any
    /// pending task for it.
    pub fn schedule(&mut self, key: K, current_tick: u64, delay: u64) {
        let trigger_tick = current_tick + delay;
        let sub_tick_order = self.sub_tick_counter;
        self.sub_tick_counter += 1;
        self.live.insert(key.clone(), (trigger_tick, sub_tick_order));
        self.queue.push(Pending {
            key,
            trigger_tick,
            sub_tick_order,
        });
    }

    /// Cancels the pending task for `key`. Returns true if there was one.
    pub fn cancel(&mut self, key: &K) -> bool {
        let cancelled = self.live.remove(key).is_some();
        if self.live.is_empty() {
            self.queue.clear();
        }
        cancelled
    }

    /// Cancels every pending task whose key matches.
    pub fn cancel_where(&mut self, mut matches: impl FnMut(&K) -> bool) {
        self.live.retain(|key, _| !matches(key));
        if self.live.is_empty() {
            self.queue.clear();
        }
    }

    /// Returns true if `key` has a pending task.
    #[must_use]
    pub fn is_scheduled(&self, key: &K) -> bool {
        self.live.contains_key(key)
    }

    /// Returns true if any pending task's key matches.
    pub fn any_scheduled(&self, matches: impl FnMut(&K) -> bool) -> bool {
        self.live.keys().any(matches)
    }

    /// The tick the task for `key` fires at.
    #[must_use]
    pub fn due_tick(&self, key: &K) -> Option<u64> {
        self.live.get(key).map(|&(tick, _)| tick)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Removes and returns every task due at or before `current_tick`, in
    /// firing order.
    pub fn poll_due(&mut self, current_tick: u64) -> Vec<K> {
        let mut due = Vec::new();
        while let Some(next) = self.queue.peek() {
            if next.trigger_tick > current_tick {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            let is_live = self
                .live
                .get(&entry.key)
                .is_some_and(|&(_, order)| order == entry.sub_tick_order);
            if is_live {
                self.live.remove(&entry.key);
                due.push(entry.key);
            }
        }
        due
    }
}
