use modvault_core::{LockOutcome, ModularError, ScreenBinding, ScreenKind};

use super::*;

#[test]
fn test_second_viewer_is_denied() {
    let harness = harness();
    let host = harness.host();
    let (alex, sam) = (host.add_actor("Alex", WORLD, origin()), host.add_actor("Sam", WORLD, origin()));
    let id = ContainerId::new_random();

    assert_eq!(harness.open_grid(alex, id, "iron").unwrap().outcome, LockOutcome::Acquired);
    let denied = harness.open_grid(sam, id, "iron");
    assert!(matches!(denied, Err(ModularError::Locked { holder }) if holder == alex));
    assert!(matches!(
        harness.ctx().edit(sam, id, |_| ()),
        Err(ModularError::NotViewing { .. })
    ));
}

#[test]
fn test_stale_lock_is_taken_over_after_grace() {
    let mut harness = harness();
    let (alex, sam) = {
        let host = harness.host();
        (host.add_actor("Alex", WORLD, origin()), host.add_actor("Sam", WORLD, origin()))
    };
    let id = ContainerId::new_random();

    harness.open_grid(alex, id, "iron").unwrap();
    // The client vanished without a close event.
    harness.host().hide_screen(alex);
    assert!(harness.open_grid(sam, id, "iron").is_err());

    harness.advance(2);
    let opened = harness.open_grid(sam, id, "iron").unwrap();
    assert_eq!(opened.outcome, LockOutcome::StoleStale { previous: alex });
    assert_eq!(harness.ctx().lock_holder(id), Some(sam));
}

#[test]
fn test_forced_open_kicks_the_holder() {
    let harness = harness();
    let host = harness.host();
    let (alex, sam) = (host.add_actor("Alex", WORLD, origin()), host.add_actor("Sam", WORLD, origin()));
    let id = ContainerId::new_random();

    harness.open_grid(alex, id, "iron").unwrap();
    host.show_screen(sam, ScreenBinding::grid(id));
    let opened = harness
        .ctx()
        .open(sam, id, "iron", ScreenKind::Grid, true)
        .unwrap();

    assert_eq!(opened.outcome, LockOutcome::ForcedTakeover { previous: alex });
    assert_eq!(host.force_closed(), vec![alex]);
    assert_eq!(host.messages(alex).len(), 1);
    assert!(host.with_actor(alex, |actor| actor.screen.is_none()).unwrap());
}

#[test]
fn test_reopen_within_grace_keeps_the_lock() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();

    harness.open_grid(alex, id, "iron").unwrap();
    harness.close(alex, id).unwrap();
    harness.advance(1);
    assert_eq!(harness.open_grid(alex, id, "iron").unwrap().outcome, LockOutcome::Reentered);

    harness.advance(10);
    assert_eq!(harness.ctx().lock_holder(id), Some(alex));
    assert!(harness.ctx().live_view(id).is_some());
}

#[test]
fn test_release_waits_for_the_screen_to_close() {
    let mut harness = harness();
    let alex = harness.host().add_actor("Alex", WORLD, origin());
    let id = ContainerId::new_random();

    harness.open_grid(alex, id, "iron").unwrap();
    // Engine saw a close but the client switched to another screen of the same container.
    harness.ctx().close(alex, id).unwrap();
    harness
        .host()
        .show_screen(alex, ScreenBinding::module(id, ModuleId::COOKING));
    harness.advance(5);
    assert_eq!(harness.ctx().lock_holder(id), Some(alex));
}
