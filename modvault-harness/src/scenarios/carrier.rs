use modvault_core::module::FeedStrategy;
use modvault_core::{ActorId, ModuleId};

use super::*;

fn carried_container(
    harness: &Harness,
    module: &ModuleId,
    grid: &[(&'static str, i32)],
) -> (ContainerId, ActorId) {
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.host().carry(id, alex);
    harness.open_grid(alex, id, "iron").unwrap();
    harness.install(alex, id, 0, module).unwrap();
    let stacks: Vec<_> = grid
        .iter()
        .map(|&(path, count)| harness.item(path, count))
        .collect();
    harness
        .ctx()
        .edit(alex, id, |container| {
            for (slot, stack) in stacks.into_iter().enumerate() {
                container.set_item(slot, stack);
            }
        })
        .unwrap();
    (id, alex)
}

fn inventory_count(harness: &Harness, actor: ActorId, slot: usize) -> i32 {
    harness
        .host()
        .with_actor(actor, |state| state.inventory.get_item(slot).count())
        .unwrap()
}

#[test]
fn test_restock_tops_up_low_stacks() {
    let mut harness = harness();
    let (id, alex) = carried_container(&harness, &ModuleId::RESTOCK, &[("cobblestone", 64)]);
    harness.close(alex, id).unwrap();
    let low = harness.item("cobblestone", 2);
    let full = harness.item("dirt", 3);
    harness.host().with_actor(alex, |state| {
        state.inventory.set_item(0, low);
        state.inventory.set_item(12, full);
    });

    harness.advance(10);
    assert_eq!(inventory_count(&harness, alex, 0), 64);
    assert_eq!(inventory_count(&harness, alex, 12), 3);
    assert_eq!(count_of(&stored(&harness, id), "cobblestone"), 2);
}

#[test]
fn test_grid_modules_pause_while_editor_is_open() {
    let mut harness = harness();
    let (id, alex) = carried_container(&harness, &ModuleId::RESTOCK, &[("cobblestone", 64)]);
    let low = harness.item("cobblestone", 2);
    harness
        .host()
        .with_actor(alex, |state| state.inventory.set_item(0, low));

    harness.advance(20);
    assert_eq!(inventory_count(&harness, alex, 0), 2);

    harness.close(alex, id).unwrap();
    harness.advance(10);
    assert_eq!(inventory_count(&harness, alex, 0), 64);
}

#[test]
fn test_feeder_picks_the_closest_match() {
    let mut harness = harness();
    let (id, alex) = carried_container(
        &harness,
        &ModuleId::FEEDER,
        &[("cookie", 5), ("bread", 3), ("rotten_flesh", 1)],
    );
    harness.close(alex, id).unwrap();
    harness.host().with_actor(alex, |state| state.food_level = 10);

    harness.advance(10);
    let (food_level, eaten) = harness
        .host()
        .with_actor(alex, |state| (state.food_level, state.eaten.clone()))
        .unwrap();
    assert_eq!(food_level, 15);
    assert_eq!(eaten.len(), 1);
    assert!(eaten[0].is(&Identifier::vanilla_static("bread")));

    // Above the threshold now.
    harness.advance(20);
    let container = stored(&harness, id);
    assert_eq!(count_of(&container, "bread"), 2);
    assert_eq!(count_of(&container, "cookie"), 5);
}

#[test]
fn test_feeder_follows_configured_order() {
    let mut harness = harness();
    let (id, alex) = carried_container(&harness, &ModuleId::FEEDER, &[("bread", 3), ("apple", 2)]);
    harness
        .ctx()
        .configure_module(alex, id, &ModuleId::FEEDER, |state| {
            if let ModuleState::Feeder(state) = state {
                state.strategy = FeedStrategy::Ordered;
                state.foods = vec![
                    Identifier::vanilla_static("apple"),
                    Identifier::vanilla_static("bread"),
                ];
            }
        })
        .unwrap();
    harness.close(alex, id).unwrap();
    harness.host().with_actor(alex, |state| state.food_level = 4);

    harness.advance(10);
    let eaten = harness
        .host()
        .with_actor(alex, |state| state.eaten.clone())
        .unwrap();
    assert!(eaten[0].is(&Identifier::vanilla_static("apple")));
    assert_eq!(count_of(&stored(&harness, id), "apple"), 1);
}

#[test]
fn test_offline_carrier_is_skipped() {
    let mut harness = harness();
    let (id, alex) = carried_container(&harness, &ModuleId::FEEDER, &[("bread", 3)]);
    harness.close(alex, id).unwrap();
    harness.host().remove_actor(alex);

    harness.advance(20);
    assert_eq!(count_of(&stored(&harness, id), "bread"), 3);
}
