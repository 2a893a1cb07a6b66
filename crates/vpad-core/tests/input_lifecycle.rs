//! Integration tests: raw events from every family → trackers sharing one
//! listener registry.

use pretty_assertions::assert_eq;
use vpad_core::{
    Contact, InputKind, InputTracker, InputTransition, ListenerChange, ListenerFamily,
    ListenerRegistry, Phase, RawInputEvent, ZOMBIE_TIMEOUT_MS,
};

fn kinds(transitions: &[InputTransition]) -> Vec<&'static str> {
    transitions
        .iter()
        .map(|t| match t {
            InputTransition::Start(_) => "start",
            InputTransition::Move(_) => "move",
            InputTransition::End(_) => "end",
        })
        .collect()
}

#[test]
fn mixed_families_share_one_registry() {
    let registry = ListenerRegistry::shared();
    let mut stick = InputTracker::with_listeners(registry.clone());
    let mut button = InputTracker::with_listeners(registry.clone());

    stick.handle(&RawInputEvent::touch(Phase::Start, [Contact::new(11, 5.0, 5.0)]), 0.0);
    button.handle(&RawInputEvent::pointer(Phase::Start, 2, 0.0, 0.0), 0.0);
    button.handle(&RawInputEvent::mouse(Phase::Start, 0.0, 0.0), 0.0);

    assert_eq!(
        registry.borrow_mut().take_changes(),
        vec![
            ListenerChange {
                family: ListenerFamily::Pointer,
                attached: true
            },
            ListenerChange {
                family: ListenerFamily::Mouse,
                attached: true
            },
        ]
    );

    button.handle(&RawInputEvent::pointer(Phase::End, 2, 0.0, 0.0), 10.0);
    assert!(registry.borrow_mut().take_changes().is_empty(), "mouse still down");

    button.handle(&RawInputEvent::mouse(Phase::End, 0.0, 0.0), 20.0);
    assert_eq!(registry.borrow_mut().take_changes().len(), 2);
    assert_eq!(stick.get(11).map(|p| p.kind), Some(InputKind::Touch));
}

#[test]
fn full_touch_lifecycle_in_order() {
    let mut tracker = InputTracker::new();
    let mut seen = Vec::new();

    seen.extend(tracker.handle(
        &RawInputEvent::touch(Phase::Start, [Contact::new(1, 0.0, 0.0)]),
        0.0,
    ));
    seen.extend(tracker.handle(
        &RawInputEvent::touch(Phase::Move, [Contact::new(1, 4.0, 3.0)]),
        16.0,
    ));
    // A contact that never started on this control
    seen.extend(tracker.handle(
        &RawInputEvent::touch(Phase::Move, [Contact::new(8, 1.0, 1.0)]),
        20.0,
    ));
    seen.extend(tracker.handle(
        &RawInputEvent::touch(Phase::Cancel, [Contact::new(1, 4.0, 3.0)]),
        32.0,
    ));

    assert_eq!(kinds(&seen), vec!["start", "move", "end"]);
    let end = seen[2].point();
    assert_eq!((end.start_x, end.current_x, end.current_y), (0.0, 4.0, 3.0));
    assert!(tracker.is_empty());
}

#[test]
fn zombie_release_matches_natural_release() {
    let mut tracker = InputTracker::new();
    tracker.handle(&RawInputEvent::pointer(Phase::Start, 3, 7.0, 7.0), 0.0);
    let out = tracker.check_zombies(ZOMBIE_TIMEOUT_MS + 1.0, ZOMBIE_TIMEOUT_MS);

    assert_eq!(kinds(&out), vec!["end"]);
    assert_eq!(out[0].identifier(), 3);
    assert!(!tracker.listeners().borrow().is_attached(ListenerFamily::Pointer));
}
