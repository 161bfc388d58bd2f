use modvault_core::inventory::{CONTAINER_COMPONENT, Owner};
use modvault_core::module::ItemFilter;
use modvault_core::{ActorId, ModuleId};
use modvault_registry::CONTAINER_ITEM;

use super::*;

fn placed_container(
    harness: &Harness,
    type_tag: &str,
    modules: &[ModuleId],
) -> (ContainerId, ActorId) {
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.host().place(id, WORLD, origin());
    harness.open_grid(alex, id, type_tag).unwrap();
    for (socket, module) in modules.iter().enumerate() {
        harness.install(alex, id, socket, module).unwrap();
    }
    (id, alex)
}

fn at(x: f64) -> Vector3<f64> {
    Vector3::new(x, 64.0, 0.0)
}

#[test]
fn test_magnet_collects_nearby_items_only() {
    let mut harness = harness();
    let (id, alex) = placed_container(&harness, "iron", &[ModuleId::SCAVENGER]);
    harness.close(alex, id).unwrap();

    let host = harness.host();
    let near = host.spawn_item(WORLD, harness.item("cobblestone", 10), at(1.0));
    let far = host.spawn_item(WORLD, harness.item("stone", 5), at(30.0));
    let elsewhere = host.spawn_item("nether", harness.item("stone", 5), at(0.0));

    harness.advance(10);
    let host = harness.host();
    assert!(host.item_entity(near).is_none());
    assert!(host.item_entity(far).is_some());
    assert!(host.item_entity(elsewhere).is_some());
    let container = stored(&harness, id);
    assert_eq!(count_of(&container, "cobblestone"), 10);
    assert_eq!(count_of(&container, "stone"), 0);
}

#[test]
fn test_magnet_never_picks_up_containers_or_modules() {
    let mut harness = harness();
    let (id, alex) = placed_container(&harness, "iron", &[ModuleId::SCAVENGER]);
    harness.close(alex, id).unwrap();

    let mut carried = harness
        .ctx()
        .repository()
        .registry()
        .items
        .stack(&CONTAINER_ITEM, 1)
        .unwrap();
    carried.set_component(CONTAINER_COMPONENT, ContainerId::new_random().to_string());
    let module = harness.module_item(&ModuleId::FEEDER);

    let host = harness.host();
    let container_entity = host.spawn_item(WORLD, carried, at(1.0));
    let module_entity = host.spawn_item(WORLD, module, at(2.0));

    harness.advance(10);
    assert!(harness.host().item_entity(container_entity).is_some());
    assert!(harness.host().item_entity(module_entity).is_some());
    assert!(stored(&harness, id).is_empty());
}

#[test]
fn test_filter_rejects_denied_items() {
    let mut harness = harness();
    let (id, alex) = placed_container(&harness, "iron", &[ModuleId::SCAVENGER]);
    harness
        .ctx()
        .configure_module(alex, id, &ModuleId::SCAVENGER, |state| {
            if let ModuleState::Scavenger(state) = state {
                state.filter = ItemFilter::deny(vec![Identifier::vanilla_static("dirt")]);
            }
        })
        .unwrap();
    harness.close(alex, id).unwrap();

    let dirt = harness.host().spawn_item(WORLD, harness.item("dirt", 4), at(1.0));
    let sand = harness.host().spawn_item(WORLD, harness.item("sand", 4), at(1.0));
    harness.advance(10);

    assert!(harness.host().item_entity(dirt).is_some());
    assert!(harness.host().item_entity(sand).is_none());
}

#[test]
fn test_partial_insert_conserves_items() {
    let mut harness = harness();
    let (id, alex) = placed_container(&harness, "leather", &[ModuleId::SCAVENGER]);
    let (dirt, cobble) = (harness.item("dirt", 64), harness.item("cobblestone", 60));
    harness
        .ctx()
        .edit(alex, id, |container| {
            for slot in 0..26 {
                container.set_item(slot, dirt.clone());
            }
            container.set_item(26, cobble);
        })
        .unwrap();
    harness.close(alex, id).unwrap();

    let entity = harness
        .host()
        .spawn_item(WORLD, harness.item("cobblestone", 10), at(1.0));
    harness.advance(10);

    assert_eq!(harness.host().item_entity(entity).unwrap().count(), 6);
    let container = stored(&harness, id);
    assert_eq!(count_of(&container, "cobblestone"), 64);
    assert_eq!(count_of(&container, "dirt"), 26 * 64);
}

#[test]
fn test_discarded_items_are_audited_and_recoverable() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();
    harness.host().carry(id, alex);
    harness.open_grid(alex, id, "iron").unwrap();
    harness.install(alex, id, 0, &ModuleId::SCAVENGER).unwrap();
    harness.install(alex, id, 1, &ModuleId::DISCARD).unwrap();
    harness
        .ctx()
        .configure_module(alex, id, &ModuleId::DISCARD, |state| {
            if let ModuleState::Discard(state) = state {
                state.items = vec![Identifier::vanilla_static("rotten_flesh")];
            }
        })
        .unwrap();
    harness.close(alex, id).unwrap();

    let flesh = harness
        .host()
        .spawn_item(WORLD, harness.item("rotten_flesh", 3), at(2.0));
    let reports = harness.advance(10);
    let voided: usize = reports
        .iter()
        .filter_map(|report| report.simulation)
        .map(|cycle| cycle.voided)
        .sum();
    assert_eq!(voided, 1);
    assert!(harness.host().item_entity(flesh).is_none());
    assert_eq!(count_of(&stored(&harness, id), "rotten_flesh"), 0);

    let repo = harness.ctx().repository();
    let records = repo.list_voided(Some(alex), 10).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.entry.container_id, id);
    assert_eq!(record.entry.item_count, 3);
    assert_eq!(record.entry.actor.as_ref().map(|owner| owner.name.as_str()), Some("Alex"));

    let by = Owner {
        id: alex,
        name: "Alex".to_string(),
    };
    let recovered = repo.recover_voided(record.id, &by, 0).unwrap().unwrap();
    assert!(recovered.is(&Identifier::vanilla_static("rotten_flesh")));
    assert_eq!(recovered.count(), 3);
    assert!(repo.recover_voided(record.id, &by, 0).unwrap().is_none());
}

#[test]
fn test_failed_audit_spares_the_item_and_other_containers() {
    let dir = tempfile::tempdir().unwrap();
    let mut harness = Harness::with_config(sqlite_config(&dir)).unwrap();
    let (voiding, alex) =
        placed_container(&harness, "iron", &[ModuleId::SCAVENGER, ModuleId::DISCARD]);
    harness
        .ctx()
        .configure_module(alex, voiding, &ModuleId::DISCARD, |state| {
            if let ModuleState::Discard(state) = state {
                state.items = vec![Identifier::vanilla_static("rotten_flesh")];
            }
        })
        .unwrap();
    harness.close(alex, voiding).unwrap();
    let (bystander, sam) = placed_container(&harness, "iron", &[ModuleId::SCAVENGER]);
    harness.host().place(bystander, WORLD, at(100.0));
    harness.close(sam, bystander).unwrap();

    let conn = rusqlite::Connection::open(db_path(&dir)).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER audit_offline BEFORE INSERT ON voided_items
         BEGIN SELECT RAISE(ABORT, 'audit offline'); END;",
    )
    .unwrap();

    let host = harness.host();
    let cobble = host.spawn_item(WORLD, harness.item("cobblestone", 8), at(1.0));
    let flesh = host.spawn_item(WORLD, harness.item("rotten_flesh", 3), at(2.0));
    let sand = host.spawn_item(WORLD, harness.item("sand", 5), at(101.0));

    let reports = harness.advance(10);
    let cycle = reports[9].simulation.unwrap();
    assert_eq!(cycle.failed, 1);
    assert_eq!(cycle.simulated, 1);
    assert_eq!(cycle.voided, 0);

    let host = harness.host();
    assert_eq!(host.item_entity(flesh).unwrap().count(), 3);
    assert!(host.item_entity(cobble).is_none());
    assert!(host.item_entity(sand).is_none());
    assert_eq!(count_of(&stored(&harness, voiding), "cobblestone"), 8);
    assert_eq!(count_of(&stored(&harness, voiding), "rotten_flesh"), 0);
    assert_eq!(count_of(&stored(&harness, bystander), "sand"), 5);
    assert!(harness.ctx().repository().list_voided(None, 10).unwrap().is_empty());

    conn.execute_batch("DROP TRIGGER audit_offline;").unwrap();
    harness.advance(10);
    assert!(harness.host().item_entity(flesh).is_none());
    assert_eq!(harness.ctx().repository().list_voided(None, 10).unwrap().len(), 1);
}
