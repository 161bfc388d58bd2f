use modvault_core::inventory::{MODULE_COMPONENT, Owner};
use modvault_core::module::RestockState;
use modvault_core::ModuleId;

use super::*;

#[test]
fn test_containers_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let id = ContainerId::new_random();

    let expected = {
        let harness = Harness::with_config(sqlite_config(&dir)).unwrap();
        let alex = harness.host().add_actor("Alex", WORLD, origin());
        harness.open_grid(alex, id, "diamond").unwrap();
        harness.install(alex, id, 2, &ModuleId::RESTOCK).unwrap();
        harness.install(alex, id, 4, &ModuleId::new("stonecutter")).unwrap();
        harness
            .ctx()
            .configure_module(alex, id, &ModuleId::RESTOCK, |state| {
                *state = ModuleState::Restock(RestockState {
                    enabled: false,
                    threshold: 16,
                    items: vec![Identifier::vanilla_static("cobblestone")],
                });
            })
            .unwrap();
        let (iron, flesh) = (harness.item("iron_ingot", 33), harness.item("rotten_flesh", 1));
        harness
            .ctx()
            .edit(alex, id, |container| {
                container.set_item(0, iron);
                container.set_item(107, flesh);
            })
            .unwrap();
        assert_eq!(harness.ctx().shutdown(), 1);
        stored(&harness, id)
    };

    let harness = Harness::with_config(sqlite_config(&dir)).unwrap();
    let restored = stored(&harness, id);
    assert_eq!(restored.type_tag(), "diamond");
    assert_eq!(restored.grid(), expected.grid());
    assert_eq!(restored.modules(), expected.modules());
    assert_eq!(
        module_state(&restored, &ModuleId::RESTOCK),
        ModuleState::Restock(RestockState {
            enabled: false,
            threshold: 16,
            items: vec![Identifier::vanilla_static("cobblestone")],
        })
    );
    assert_eq!(restored.module_at(4).unwrap().id, ModuleId::new("stonecutter"));
}

#[test]
fn test_first_reference_creates_exactly_once() {
    let harness = harness();
    let repo = harness.ctx().repository();
    let id = ContainerId::new_random();

    let first = repo.load_or_create(id, "iron", 1_000).unwrap();
    let second = repo.load_or_create(id, "netherite", 2_000).unwrap();
    assert_eq!(first.created_at(), 1_000);
    assert_eq!(second.created_at(), 1_000);
    assert_eq!(second.type_tag(), "iron");
    assert_eq!(second.size(), 54);
}

#[test]
fn test_owner_is_recorded_once() {
    let harness = harness();
    let repo = harness.ctx().repository();
    let id = ContainerId::new_random();
    let alex = Owner {
        id: harness.host().add_actor("Alex", WORLD, origin()),
        name: "Alex".to_string(),
    };
    let sam = Owner {
        id: harness.host().add_actor("Sam", WORLD, origin()),
        name: "Sam".to_string(),
    };

    repo.ensure_exists(id, "gold", &alex, 0).unwrap();
    repo.ensure_exists(id, "gold", &sam, 0).unwrap();
    assert_eq!(stored(&harness, id).owner, Some(alex.clone()));
    assert_eq!(repo.list_by_owner(alex.id).unwrap().len(), 1);
    assert!(repo.list_by_owner(sam.id).unwrap().is_empty());
}

#[test]
fn test_removed_module_carries_its_state() {
    let harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let (from, to) = (ContainerId::new_random(), ContainerId::new_random());

    harness.open_grid(alex, from, "iron").unwrap();
    harness.install(alex, from, 0, &ModuleId::RESTOCK).unwrap();
    harness
        .ctx()
        .configure_module(alex, from, &ModuleId::RESTOCK, |state| {
            if let ModuleState::Restock(state) = state {
                state.threshold = 32;
            }
        })
        .unwrap();
    let mut item = harness.ctx().remove_module(alex, from, 0).unwrap().unwrap();
    harness.close(alex, from).unwrap();
    assert!(stored(&harness, from).modules().is_empty());

    harness.open_grid(alex, to, "iron").unwrap();
    harness.ctx().install_module(alex, to, 1, &mut item).unwrap();
    harness.close(alex, to).unwrap();
    assert_eq!(
        module_state(&stored(&harness, to), &ModuleId::RESTOCK),
        ModuleState::Restock(RestockState {
            enabled: true,
            threshold: 32,
            items: Vec::new(),
        })
    );
}

#[test]
fn test_retype_ejects_modules_in_missing_sockets() {
    let harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();

    harness.open_grid(alex, id, "iron").unwrap();
    harness.install(alex, id, 0, &ModuleId::COOKING).unwrap();
    harness.install(alex, id, 2, &ModuleId::FEEDER).unwrap();
    let ejected = harness.ctx().retype_container(alex, id, "leather").unwrap();
    harness.close(alex, id).unwrap();

    assert_eq!(ejected.len(), 1);
    assert_eq!(
        ejected[0].component(MODULE_COMPONENT),
        Some("feeder")
    );
    let container = stored(&harness, id);
    assert_eq!(container.type_tag(), "leather");
    assert_eq!(container.size(), 27);
    assert_eq!(container.modules().len(), 1);
}

#[test]
fn test_grid_saves_keep_a_recorded_owner() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::with_config(sqlite_config(&dir)).unwrap();
    let id = ContainerId::new_random();
    let alex = Owner {
        id: harness.host().add_actor("Alex", WORLD, origin()),
        name: "Alex".to_string(),
    };

    harness.open_grid(alex.id, id, "iron").unwrap();
    harness
        .ctx()
        .repository()
        .ensure_exists(id, "iron", &alex, 0)
        .unwrap();
    let stack = harness.item("cobblestone", 7);
    harness
        .ctx()
        .edit(alex.id, id, |container| container.set_item(3, stack))
        .unwrap();
    harness.advance(60);

    let container = stored(&harness, id);
    assert_eq!(count_of(&container, "cobblestone"), 7);
    assert_eq!(container.owner, Some(alex.clone()));
    let owned = harness.ctx().repository().list_by_owner(alex.id).unwrap();
    assert_eq!(owned.len(), 1);
    assert!(harness.ctx().repository().list_unowned().unwrap().is_empty());
}

#[test]
fn test_stacks_past_a_shrunk_type_are_handed_out_once() {
    let dir = tempfile::tempdir().unwrap();
    let id = ContainerId::new_random();
    {
        let harness = Harness::with_config(sqlite_config(&dir)).unwrap();
        let alex = harness.host().add_actor("Alex", WORLD, origin());
        harness.open_grid(alex, id, "diamond").unwrap();
        let (dirt, iron) = (harness.item("dirt", 64), harness.item("iron_ingot", 12));
        harness
            .ctx()
            .edit(alex, id, |container| {
                for slot in 0..54 {
                    container.set_item(slot, dirt.clone());
                }
                container.set_item(107, iron);
            })
            .unwrap();
        assert_eq!(harness.ctx().shutdown(), 1);
    }

    let mut config = sqlite_config(&dir);
    for container_type in &mut config.container_types {
        if container_type.id == "diamond" {
            container_type.slots = 54;
        }
    }
    let mut harness = Harness::with_config(config).unwrap();
    let before = stored(&harness, id);
    assert_eq!(before.size(), 54);
    assert_eq!(before.overflow().len(), 1);

    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let opened = harness.open_grid(alex, id, "diamond").unwrap();
    assert_eq!(opened.overflow.len(), 1);
    assert!(opened.overflow[0].is(&Identifier::vanilla_static("iron_ingot")));
    assert_eq!(opened.overflow[0].count(), 12);

    let after = stored(&harness, id);
    assert!(after.overflow().is_empty());
    assert_eq!(count_of(&after, "dirt"), 54 * 64);
    assert_eq!(count_of(&after, "iron_ingot"), 0);

    harness.close(alex, id).unwrap();
    harness.advance(5);
    let reopened = harness.open_grid(alex, id, "diamond").unwrap();
    assert!(reopened.overflow.is_empty());
}
