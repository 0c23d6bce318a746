// Integration tests for the guard's subscription lifecycle
//
// These drive the guard the way a page would: build it against a window,
// fire unload notifications and gate actions behind the confirm dialog.

mod common;

use common::{Switch, TestHost};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;
use unload_guard::platform::memory::TargetCall;
use unload_guard::{Conditions, EventModel, Guard, GuardError, RegisterPolicy, Verdict};

#[test]
fn test_full_editing_session() {
    let host = TestHost::answering(true);
    let dirty = Switch::default();
    let guard = Guard::new(
        "You have unsaved changes.",
        dirty.condition(None),
        host.bindings(),
    )
    .unwrap();

    // Clean page: leaving is silent
    assert_eq!(host.window.dispatch_unload().unwrap().warning(), None);

    // Typing makes the page dirty
    dirty.set(true);
    assert_eq!(
        host.window.dispatch_unload().unwrap().warning(),
        Some("You have unsaved changes.")
    );

    // Saving through the gate: confirmed, guard steps aside
    let saved = Rc::new(Cell::new(false));
    let flag = Rc::clone(&saved);
    let ran = guard
        .confirmed_if_necessary(move || flag.set(true), false)
        .unwrap();
    assert_eq!(ran, Some(()));
    assert!(saved.get());
    assert!(!guard.is_registered());
    assert_eq!(host.window.listener_count(), 0);
    assert_eq!(host.dialog.prompts(), vec!["You have unsaved changes."]);

    // Still dirty, but nobody is listening anymore
    assert_eq!(host.window.dispatch_unload().unwrap().warning(), None);
}

#[test]
fn test_first_blocking_condition_wins() {
    let host = TestHost::answering(false);
    let draft = Switch::default();
    let upload = Switch::default();
    let guard = Guard::new(
        "Default",
        vec![
            draft.condition(Some("Draft not saved")),
            upload.condition(Some("Upload running")),
        ],
        host.bindings(),
    )
    .unwrap();

    upload.set(true);
    assert_eq!(guard.check().unwrap(), Verdict::with_message("Upload running"));

    draft.set(true);
    assert_eq!(guard.check().unwrap(), Verdict::with_message("Draft not saved"));

    guard.unregister();
}

#[test]
fn test_declined_action_keeps_guard() {
    let host = TestHost::answering(false);
    let dirty = Switch::default();
    dirty.set(true);
    let guard = Guard::new("Leave?", dirty.condition(None), host.bindings()).unwrap();

    let ran = guard.confirmed_if_necessary(|| 1, false).unwrap();
    assert_eq!(ran, None);
    assert!(guard.is_registered());
    assert_eq!(host.window.listener_count(), 1);

    guard.unregister();
}

#[test]
fn test_register_unregister_cycles() {
    let host = TestHost::answering(true);
    let guard = Guard::builder("Leave?")
        .auto_register(false)
        .build(host.bindings())
        .unwrap();
    assert_eq!(host.window.listener_count(), 0);

    for _ in 0..3 {
        guard.register().unwrap();
        assert_eq!(host.window.listener_count(), 1);
        guard.unregister();
        guard.unregister();
        assert_eq!(host.window.listener_count(), 0);
    }

    let subscribes = host
        .window
        .calls()
        .iter()
        .filter(|call| matches!(call, TargetCall::Subscribe { .. }))
        .count();
    assert_eq!(subscribes, 3);
}

#[test]
fn test_reject_policy_reports_double_register() {
    let host = TestHost::answering(true);
    let guard = Guard::builder("Leave?")
        .register_policy(RegisterPolicy::Reject)
        .build(host.bindings())
        .unwrap();

    let err = guard.register().unwrap_err();
    assert!(matches!(err, GuardError::AlreadyRegistered));
    assert!(err.to_string().starts_with("before-unload:"));
    assert_eq!(host.window.listener_count(), 1);

    guard.unregister();
}

#[test]
fn test_legacy_window_uses_legacy_event() {
    let host = TestHost::legacy(true);
    let dirty = Switch::default();
    dirty.set(true);
    let guard = Guard::new("Leave?", dirty.condition(None), host.bindings()).unwrap();

    let outcome = host.window.dispatch_unload().unwrap();
    assert_eq!(outcome.event.event_type, EventModel::Legacy.event_name());
    assert_eq!(outcome.warning(), Some("Leave?"));

    guard.unregister();
}

#[test]
fn test_conditions_added_after_build_are_checked() {
    let host = TestHost::answering(true);
    let guard = Guard::new("Leave?", Conditions::None, host.bindings()).unwrap();
    assert_eq!(guard.check().unwrap(), Verdict::Clear);

    let late = Switch::default();
    late.set(true);
    let id = guard.push_condition(late.condition(Some("Late")));
    assert_eq!(host.window.dispatch_unload().unwrap().warning(), Some("Late"));

    assert!(guard.remove_condition(id));
    assert_eq!(host.window.dispatch_unload().unwrap().warning(), None);

    guard.unregister();
}
