use modvault_core::sharing::SharingError;
use modvault_core::{ActorId, LockOutcome, ModularError};

use super::*;

struct Shared {
    harness: Harness,
    alex: ActorId,
    host_id: ContainerId,
}

fn shared_host() -> Shared {
    let harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let host_id = ContainerId::new_random();
    harness.open_grid(alex, host_id, "gold").unwrap();
    harness
        .ctx()
        .enable_sharing(alex, host_id, "hunter2")
        .unwrap();
    Shared {
        harness,
        alex,
        host_id,
    }
}

fn create(harness: &Harness, type_tag: &str) -> ContainerId {
    let id = ContainerId::new_random();
    harness
        .ctx()
        .repository()
        .load_or_create(id, type_tag, 0)
        .unwrap();
    id
}

#[test]
fn test_join_checks_secret_and_tier() {
    let Shared {
        harness, host_id, ..
    } = shared_host();
    let ctx = harness.ctx();
    let (iron, diamond) = (create(&harness, "iron"), create(&harness, "diamond"));

    assert!(matches!(
        ctx.join(diamond, host_id, "hunter3"),
        Err(ModularError::Sharing(SharingError::WrongSecret))
    ));
    assert!(matches!(
        ctx.join(iron, host_id, "hunter2"),
        Err(ModularError::Sharing(SharingError::TierTooLow { joiner: 1, host: 2 }))
    ));
    assert!(matches!(
        ctx.join(host_id, host_id, "hunter2"),
        Err(ModularError::Sharing(SharingError::SelfLink))
    ));

    ctx.join(diamond, host_id, "hunter2").unwrap();
    assert_eq!(ctx.resolve(diamond).unwrap(), host_id);
    assert!(matches!(
        ctx.join(host_id, diamond, "hunter2"),
        Err(ModularError::Sharing(SharingError::IsHost(_)))
    ));
}

#[test]
fn test_joiner_opens_the_host_grid() {
    let Shared {
        mut harness,
        alex,
        host_id,
    } = shared_host();
    let joiner = create(&harness, "netherite");
    harness.ctx().join(joiner, host_id, "hunter2").unwrap();
    let sam = harness.host().add_actor("Sam", WORLD, origin());

    // Alex still has the host open.
    assert!(matches!(
        harness.open_grid(sam, joiner, "netherite"),
        Err(ModularError::Locked { holder }) if holder == alex
    ));
    harness.host().hide_screen(sam);
    harness.close(alex, host_id).unwrap();
    harness.advance(2);

    let opened = harness.open_grid(sam, joiner, "netherite").unwrap();
    assert_eq!(opened.id, host_id);
    assert_eq!(opened.outcome, LockOutcome::Acquired);
    let stack = harness.item("bread", 4);
    harness
        .ctx()
        .edit(sam, host_id, |container| container.set_item(0, stack))
        .unwrap();
    harness.close(sam, host_id).unwrap();

    assert_eq!(count_of(&stored(&harness, host_id), "bread"), 4);
    assert_eq!(count_of(&stored(&harness, joiner), "bread"), 0);
}

#[test]
fn test_links_break_when_sharing_stops() {
    let Shared {
        harness, host_id, ..
    } = shared_host();
    let ctx = harness.ctx();
    let (first, second) = (create(&harness, "gold"), create(&harness, "gold"));
    ctx.join(first, host_id, "hunter2").unwrap();
    ctx.join(second, host_id, "hunter2").unwrap();

    ctx.leave(first).unwrap();
    assert_eq!(ctx.resolve(first).unwrap(), first);
    assert!(matches!(
        ctx.leave(first),
        Err(ModularError::Sharing(SharingError::NotLinked(_)))
    ));

    ctx.disable_sharing(host_id).unwrap();
    assert_eq!(ctx.resolve(second).unwrap(), second);
}

#[test]
fn test_joiner_cannot_become_a_host() {
    let Shared {
        harness,
        alex,
        host_id,
    } = shared_host();
    let joiner = create(&harness, "gold");
    harness.ctx().join(joiner, host_id, "hunter2").unwrap();

    assert!(matches!(
        harness.ctx().enable_sharing(alex, joiner, "mine"),
        Err(ModularError::Sharing(SharingError::IsJoiner(_)))
    ));
}

#[test]
fn test_host_writes_refresh_joiner_copies() {
    let Shared {
        mut harness,
        alex,
        host_id,
    } = shared_host();
    let joiner = create(&harness, "gold");
    harness.ctx().join(joiner, host_id, "hunter2").unwrap();
    assert_eq!(harness.host().refresh_count(joiner), 0);

    let stack = harness.item("apple", 2);
    harness
        .ctx()
        .edit(alex, host_id, |container| container.set_item(5, stack))
        .unwrap();
    harness.ctx().flush_save_now(alex, host_id, false).unwrap();
    // The enable flush refreshed this tick already; this one is deferred.
    assert_eq!(harness.host().refresh_count(joiner), 0);

    harness.advance(20);
    assert_eq!(harness.host().refresh_count(joiner), 1);
    assert!(harness.host().refresh_count(host_id) >= 2);
}
