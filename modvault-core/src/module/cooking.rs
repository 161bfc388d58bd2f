//! Furnace-style cooking module.
//!
//! Input, fuel and output live in the module's own state, not in the grid, so
//! the engine may advance it while the grid editor is open elsewhere.

use modvault_registry::{CookingRecipe, ItemRegistry, ItemStack, Registry};
use simdnbt::owned::{NbtCompound, NbtTag};

use crate::codec::item_nbt::{item_from_nbt, item_to_nbt};
use crate::codec::nbt_fields::{nbt_bool, nbt_compound, nbt_f32, nbt_i32};

/// Runtime state of a cooking module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CookingState {
    /// Whether the module runs.
    pub enabled: bool,
    /// Item being cooked.
    pub input: ItemStack,
    /// Fuel waiting to be burnt.
    pub fuel: ItemStack,
    /// Cooked results.
    pub output: ItemStack,
    /// Ticks of burn left on the current fuel item.
    pub burn_remaining: i32,
    /// Burn ticks the current fuel item started with.
    pub burn_total: i32,
    /// Lit ticks accumulated towards the next craft.
    pub cook_progress: i32,
    /// Lit ticks the current recipe needs per craft.
    pub cook_total: i32,
    /// Experience earned by crafts and not yet paid out.
    pub stored_xp: f32,
}

impl CookingState {
    /// A fresh, enabled, empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Returns true while fuel is burning.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.burn_remaining > 0
    }

    pub(crate) fn to_nbt(&self) -> NbtCompound {
        let mut nbt = NbtCompound::new();
        nbt.insert("Enabled", i8::from(self.enabled));
        nbt.insert("Input", NbtTag::Compound(item_to_nbt(&self.input)));
        nbt.insert("Fuel", NbtTag::Compound(item_to_nbt(&self.fuel)));
        nbt.insert("Output", NbtTag::Compound(item_to_nbt(&self.output)));
        nbt.insert("BurnTime", self.burn_remaining);
        nbt.insert("BurnTotal", self.burn_total);
        nbt.insert("CookTime", self.cook_progress);
        nbt.insert("CookTotal", self.cook_total);
        nbt.insert("StoredXp", NbtTag::Float(self.stored_xp));
        nbt
    }

    pub(crate) fn from_nbt(nbt: &NbtCompound, items: &ItemRegistry) -> Self {
        let stack = |key: &str| {
            nbt_compound(nbt, key).map_or_else(ItemStack::empty, |c| item_from_nbt(c, items))
        };
        let burn_remaining = nbt_i32(nbt, "BurnTime").unwrap_or(0).max(0);
        Self {
            enabled: nbt_bool(nbt, "Enabled").unwrap_or(true),
            input: stack("Input"),
            fuel: stack("Fuel"),
            output: stack("Output"),
            burn_remaining,
            // Blobs written before the total was tracked only know the remainder.
            burn_total: nbt_i32(nbt, "BurnTotal").unwrap_or(burn_remaining),
            cook_progress: nbt_i32(nbt, "CookTime").unwrap_or(0).max(0),
            cook_total: nbt_i32(nbt, "CookTotal").unwrap_or(0),
            stored_xp: nbt_f32(nbt, "StoredXp").unwrap_or(0.0),
        }
    }
}

/// Advances the state by `delta` ticks. Returns true if anything changed.
///
/// Fuel is only lit when a recipe for the input exists and its result fits
/// the output slot. Without a recipe the furnace cools down: burn time keeps
/// running out and progress decays at twice the tick rate. A delta spanning
/// several craft thresholds fires several crafts.
pub fn advance(state: &mut CookingState, delta: u32, registry: &Registry) -> bool {
    if !state.enabled || delta == 0 {
        return false;
    }
    let before = state.clone();
    let mut remaining = i32::try_from(delta).unwrap_or(i32::MAX);

    while remaining > 0 {
        let recipe = state
            .input
            .key()
            .and_then(|key| registry.cooking.for_input(key))
            .filter(|recipe| output_accepts(&state.output, recipe, &registry.items));

        if state.burn_remaining <= 0 {
            let fuel_ticks = state.fuel.burn_ticks().filter(|ticks| *ticks > 0);
            match (recipe, fuel_ticks) {
                (Some(_), Some(ticks)) => {
                    state.fuel.shrink(1);
                    state.burn_remaining = ticks;
                    state.burn_total = ticks;
                }
                _ => {
                    state.burn_remaining = 0;
                    state.cook_progress = cool_down(state.cook_progress, remaining);
                    break;
                }
            }
        }

        let step = remaining.min(state.burn_remaining);
        match recipe {
            Some(recipe) => cook(state, recipe, step, &registry.items),
            None => state.cook_progress = cool_down(state.cook_progress, step),
        }
        state.burn_remaining -= step;
        remaining -= step;
    }

    *state != before
}

/// Withdraws up to `count` cooked items.
///
/// Stored experience is paid out in proportion to the share of the output
/// stack actually taken.
pub fn take_output(state: &mut CookingState, count: i32) -> (ItemStack, f32) {
    let available = state.output.count();
    if available <= 0 || count <= 0 {
        return (ItemStack::empty(), 0.0);
    }
    let taken = state.output.split(count);
    let experience = if taken.count() >= available {
        state.stored_xp
    } else {
        state.stored_xp * taken.count() as f32 / available as f32
    };
    state.stored_xp = (state.stored_xp - experience).max(0.0);
    (taken, experience)
}

fn cook(state: &mut CookingState, recipe: &CookingRecipe, step: i32, items: &ItemRegistry) {
    let required = recipe.cooking_time.max(1);
    if state.cook_total != required {
        state.cook_total = required;
        state.cook_progress = 0;
    }
    state.cook_progress += step;

    while state.cook_progress >= state.cook_total {
        state.cook_progress -= state.cook_total;
        craft(state, recipe, items);
        if state.input.is_empty() || !output_accepts(&state.output, recipe, items) {
            state.cook_progress = 0;
            break;
        }
    }
}

fn craft(state: &mut CookingState, recipe: &CookingRecipe, items: &ItemRegistry) {
    if state.output.is_empty() {
        state.output = ItemStack::with_count(
            items.get_or_placeholder(&recipe.result),
            recipe.result_count,
        );
    } else {
        state.output.grow(recipe.result_count);
    }
    state.input.shrink(1);
    state.stored_xp += recipe.experience;
}

fn output_accepts(output: &ItemStack, recipe: &CookingRecipe, items: &ItemRegistry) -> bool {
    if output.is_empty() {
        return true;
    }
    if !output.is(&recipe.result) || !output.components().is_empty() {
        return false;
    }
    let max = items
        .by_key(&recipe.result)
        .map_or(output.max_stack_size(), |item| item.max_stack_size);
    output.count() + recipe.result_count <= max
}

fn cool_down(progress: i32, ticks: i32) -> i32 {
    progress.saturating_sub(ticks.saturating_mul(2)).max(0)
}
