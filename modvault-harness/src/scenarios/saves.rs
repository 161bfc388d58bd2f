use modvault_core::ModuleId;

use super::*;

#[test]
fn test_burst_of_edits_is_written_once() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();

    for count in 1..=10 {
        let stack = harness.item("cobblestone", count);
        harness
            .ctx()
            .edit(alex, id, |container| container.set_item(0, stack))
            .unwrap();
        harness.advance(3);
    }
    assert_eq!(count_of(&stored(&harness, id), "cobblestone"), 0);

    let saved: usize = harness.advance(60).iter().map(|report| report.saved).sum();
    assert_eq!(saved, 1);
    assert_eq!(count_of(&stored(&harness, id), "cobblestone"), 10);
}

#[test]
fn test_interaction_pushes_the_save_back() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();

    let stack = harness.item("sand", 5);
    harness
        .ctx()
        .edit(alex, id, |container| container.set_item(4, stack))
        .unwrap();
    harness.advance(35);
    // Cursor activity only, no content change.
    harness.ctx().mark_interaction(alex, id);
    harness.advance(10);
    assert_eq!(count_of(&stored(&harness, id), "sand"), 0);

    harness.advance(30);
    assert_eq!(count_of(&stored(&harness, id), "sand"), 5);
}

#[test]
fn test_disconnect_flushes_pending_edits() {
    let harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();

    let stack = harness.item("glass", 9);
    harness
        .ctx()
        .edit(alex, id, |container| container.set_item(2, stack))
        .unwrap();
    harness.host().remove_actor(alex);
    harness.ctx().disconnect(alex);

    assert_eq!(count_of(&stored(&harness, id), "glass"), 9);
    assert_eq!(harness.ctx().lock_holder(id), None);
}

#[test]
fn test_shutdown_writes_open_containers() {
    let harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();

    let stack = harness.item("dirt", 3);
    harness
        .ctx()
        .edit(alex, id, |container| container.set_item(0, stack))
        .unwrap();
    assert_eq!(harness.ctx().shutdown(), 1);
    assert_eq!(count_of(&stored(&harness, id), "dirt"), 3);
}

#[test]
fn test_cooking_leaves_pending_grid_edits_to_the_debounce() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.open_grid(alex, id, "iron").unwrap();
    harness.install(alex, id, 0, &ModuleId::COOKING).unwrap();
    let (ore, coal) = (harness.item("iron_ore", 64), harness.item("coal", 4));
    harness
        .ctx()
        .configure_module(alex, id, &ModuleId::COOKING, |state| {
            if let ModuleState::Cooking(state) = state {
                state.input = ore;
                state.fuel = coal;
            }
        })
        .unwrap();
    harness.ctx().flush_save_now(alex, id, true).unwrap();

    let stack = harness.item("stone", 5);
    harness
        .ctx()
        .edit(alex, id, |container| container.set_item(0, stack))
        .unwrap();

    let reports = harness.advance(10);
    let cycle = reports[9].simulation.unwrap();
    assert_eq!(cycle.persisted, 1);
    let container = stored(&harness, id);
    let ModuleState::Cooking(state) = module_state(&container, &ModuleId::COOKING) else {
        panic!("cooking state expected");
    };
    assert!(state.is_lit());
    assert_eq!(count_of(&container, "stone"), 0);

    let mut saved: usize = reports.iter().map(|report| report.saved).sum();
    saved += harness.advance(40).iter().map(|report| report.saved).sum::<usize>();
    assert_eq!(saved, 1);
    assert_eq!(count_of(&stored(&harness, id), "stone"), 5);
}
