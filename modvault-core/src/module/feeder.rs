//! Feeds the carrier from the grid when they get hungry.

use modvault_utils::Identifier;
use simdnbt::owned::NbtCompound;

use crate::codec::nbt_fields::{identifiers_tag, nbt_bool, nbt_i32, nbt_identifiers};
use crate::host::Host;
use crate::ids::ActorId;
use crate::inventory::{Container, is_protected};

/// A full food bar.
pub const MAX_FOOD_LEVEL: i32 = 20;

/// How the feeder picks what to eat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStrategy {
    /// First listed food that is present in the grid, or the first food in
    /// the grid when nothing is listed.
    Ordered,
    /// The food whose nutrition is closest to the missing hunger, ties broken
    /// by higher saturation.
    #[default]
    BestMatch,
}

/// Runtime state of the feeder module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeederState {
    /// Whether the module runs.
    pub enabled: bool,
    /// Food levels below this trigger feeding.
    pub hunger_threshold: i32,
    /// Allowed foods, in preference order. Empty means any food.
    pub foods: Vec<Identifier>,
    /// Selection strategy.
    pub strategy: FeedStrategy,
}

impl FeederState {
    /// A fresh, enabled state with the given threshold.
    #[must_use]
    pub fn new(hunger_threshold: i32) -> Self {
        Self {
            enabled: true,
            hunger_threshold,
            foods: Vec::new(),
            strategy: FeedStrategy::default(),
        }
    }

    pub(crate) fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("Enabled", i8::from(self.enabled));
        nbt.insert("Threshold", self.hunger_threshold);
        nbt.insert("Foods", identifiers_tag(&self.foods));
        nbt.insert("Ordered", i8::from(self.strategy == FeedStrategy::Ordered));
        nbt
    }

    pub(crate) fn from_nbt(nbt: &NbtCompound, default_threshold: i32) -> Self {
        let strategy = if nbt_bool(nbt, "Ordered").unwrap_or(false) {
            FeedStrategy::Ordered
        } else {
            FeedStrategy::BestMatch
        };
        Self {
            enabled: nbt_bool(nbt, "Enabled").unwrap_or(true),
            hunger_threshold: nbt_i32(nbt, "Threshold").unwrap_or(default_threshold),
            foods: nbt_identifiers(nbt, "Foods"),
            strategy,
        }
    }

    fn allows(&self, key: &Identifier) -> bool {
        self.foods.is_empty() || self.foods.contains(key)
    }
}

/// Picks the grid slot to eat from, given the current food level.
#[must_use]
pub fn pick_food(state: &FeederState, grid: &dyn Container, food_level: i32) -> Option<usize> {
    let edible = |slot: usize| {
        let stack = grid.get_item(slot);
        let food = stack.food()?;
        let key = stack.key()?;
        (!is_protected(stack) && state.allows(key)).then_some((key, food))
    };

    match state.strategy {
        // Without a list every food is allowed and the grid order decides.
        FeedStrategy::Ordered if state.foods.is_empty() => {
            (0..grid.size()).find(|&slot| edible(slot).is_some())
        }
        FeedStrategy::Ordered => state.foods.iter().find_map(|wanted| {
            (0..grid.size()).find(|&slot| edible(slot).is_some_and(|(key, _)| key == wanted))
        }),
        FeedStrategy::BestMatch => {
            let missing = MAX_FOOD_LEVEL - food_level;
            let mut best: Option<(usize, i32, f32)> = None;
            for slot in 0..grid.size() {
                let Some((_, food)) = edible(slot) else {
                    continue;
                };
                let distance = (food.nutrition - missing).abs();
                let better = best.is_none_or(|(_, best_distance, best_saturation)| {
                    distance < best_distance
                        || (distance == best_distance && food.saturation > best_saturation)
                });
                if better {
                    best = Some((slot, distance, food.saturation));
                }
            }
            best.map(|(slot, _, _)| slot)
        }
    }
}

/// Feeds `actor` one item from the grid if they are below the threshold.
///
/// Returns true if an item was eaten.
pub fn feed(state: &FeederState, grid: &mut dyn Container, actor: ActorId, host: &dyn Host) -> bool {
    if !state.enabled {
        return false;
    }
    let Some(food_level) = host.food_level(actor) else {
        return false;
    };
    if food_level >= state.hunger_threshold {
        return false;
    }
    let Some(slot) = pick_food(state, grid, food_level) else {
        return false;
    };
    let one = grid.get_item(slot).copy_with_count(1);
    if !host.feed(actor, &one) {
        return false;
    }
    grid.remove_item(slot, 1);
    true
}
