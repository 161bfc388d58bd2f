use modvault_core::module::CookingState;
use modvault_core::{ModuleId, ScreenKind};

use super::*;

fn cooking_container(harness: &Harness, input: &'static str, count: i32, fuel: i32) -> ContainerId {
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();
    harness.install(alex, id, 0, &ModuleId::COOKING).unwrap();

    let (input, fuel) = (harness.item(input, count), harness.item("coal", fuel));
    harness
        .ctx()
        .configure_module(alex, id, &ModuleId::COOKING, |state| {
            if let ModuleState::Cooking(state) = state {
                state.input = input;
                state.fuel = fuel;
            }
        })
        .unwrap();
    harness.close(alex, id).unwrap();
    id
}

fn cooking_state(harness: &Harness, id: ContainerId) -> CookingState {
    match module_state(&stored(harness, id), &ModuleId::COOKING) {
        ModuleState::Cooking(state) => state,
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn test_one_coal_smelts_eight_items_unattended() {
    let mut harness = harness();
    let id = cooking_container(&harness, "iron_ore", 64, 1);

    harness.advance(1600);
    let state = cooking_state(&harness, id);
    assert_eq!(state.output.count(), 8);
    assert!(state.output.is(&Identifier::vanilla_static("iron_ingot")));
    assert_eq!(state.input.count(), 56);
    assert!(state.fuel.is_empty());
    assert_eq!(state.burn_remaining, 0);
    assert!((state.stored_xp - 5.6).abs() < 1e-3);

    // Out of fuel: nothing moves any more.
    harness.advance(400);
    assert_eq!(cooking_state(&harness, id).input.count(), 56);
}

#[test]
fn test_partial_take_pays_proportional_experience() {
    let mut harness = harness();
    let id = cooking_container(&harness, "iron_ore", 64, 1);
    harness.advance(1600);

    let sam = harness.host().add_actor("Sam", WORLD, origin());
    harness
        .open(sam, id, "iron", ScreenKind::Module(ModuleId::COOKING))
        .unwrap();
    let (taken, experience) = harness.ctx().take_cooking_output(sam, id, 2).unwrap();
    assert_eq!(taken.count(), 2);
    assert!((experience - 1.4).abs() < 1e-3);

    let (rest, experience) = harness.ctx().take_cooking_output(sam, id, 64).unwrap();
    assert_eq!(rest.count(), 6);
    assert!((experience - 4.2).abs() < 1e-3);
}

#[test]
fn test_open_cooking_screen_receives_progress() {
    let mut harness = harness();
    let id = cooking_container(&harness, "raw_iron", 4, 1);
    harness.advance(2);

    let sam = harness.host().add_actor("Sam", WORLD, origin());
    harness
        .open(sam, id, "iron", ScreenKind::Module(ModuleId::COOKING))
        .unwrap();
    harness.advance(10);

    let syncs = harness.host().cooking_syncs();
    assert!(!syncs.is_empty());
    let (actor, container, progress) = syncs[syncs.len() - 1];
    assert_eq!((actor, container), (sam, id));
    assert_eq!(progress.burn_total, 1600);
    assert!(progress.burn_remaining < 1600);
}

#[test]
fn test_disabled_module_stays_idle() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();
    harness.install(alex, id, 1, &ModuleId::COOKING).unwrap();
    let (input, fuel) = (harness.item("sand", 8), harness.item("coal", 1));
    harness
        .ctx()
        .configure_module(alex, id, &ModuleId::COOKING, |state| {
            if let ModuleState::Cooking(state) = state {
                state.input = input;
                state.fuel = fuel;
            }
        })
        .unwrap();
    assert!(
        harness
            .ctx()
            .set_module_enabled(alex, id, &ModuleId::COOKING, false)
            .unwrap()
    );
    harness.close(alex, id).unwrap();

    harness.advance(400);
    let state = cooking_state(&harness, id);
    assert_eq!(state.input.count(), 8);
    assert!(state.output.is_empty());
}
