//! Multi-contact input tracking.
//!
//! `InputTracker` owns the set of contacts active on one control and turns
//! raw events into an ordered stream of `InputTransition`s:
//!
//! - **Start** for every contact in a down/start change-set,
//! - **Move** only for contacts already tracked (late or foreign moves are dropped),
//! - **End** only for contacts listed in the end change-set. A multi-touch
//!   end never drops contacts that are still down.
//!
//! Forced releases (`release`, `release_all`, `check_zombies`) produce the
//! same `End` transition as a natural release, so consumers need a single
//! release path. Unknown identifiers are always a silent no-op.

use crate::input::{InputId, InputKind, InputPoint, Phase, RawInputEvent};
use crate::listeners::{ListenerFamily, ListenerRegistry, SharedListeners};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Idle time after which a contact with no activity is considered stuck.
pub const ZOMBIE_TIMEOUT_MS: f64 = 1000.0;

/// A normalized lifecycle step of one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputTransition {
    Start(InputPoint),
    Move(InputPoint),
    End(InputPoint),
}

impl InputTransition {
    pub fn point(&self) -> &InputPoint {
        match self {
            Self::Start(p) | Self::Move(p) | Self::End(p) => p,
        }
    }

    pub fn identifier(&self) -> InputId {
        self.point().identifier
    }
}

pub type Transitions = SmallVec<[InputTransition; 2]>;

#[derive(Debug, Clone, Copy)]
struct Tracked {
    point: InputPoint,
    last_activity: f64,
}

/// Tracks every active contact of one control.
#[derive(Debug)]
pub struct InputTracker {
    /// Keyed by identifier; ordered so bulk releases are deterministic.
    inputs: BTreeMap<InputId, Tracked>,
    listeners: SharedListeners,
    holds_pointer: bool,
    holds_mouse: bool,
}

impl Default for InputTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InputTracker {
    /// A tracker with its own private listener registry.
    pub fn new() -> Self {
        Self::with_listeners(ListenerRegistry::shared())
    }

    /// A tracker that shares document listeners with other trackers.
    pub fn with_listeners(listeners: SharedListeners) -> Self {
        Self {
            inputs: BTreeMap::new(),
            listeners,
            holds_pointer: false,
            holds_mouse: false,
        }
    }

    pub fn listeners(&self) -> &SharedListeners {
        &self.listeners
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, identifier: InputId) -> Option<&InputPoint> {
        self.inputs.get(&identifier).map(|t| &t.point)
    }

    pub fn contains(&self, identifier: InputId) -> bool {
        self.inputs.contains_key(&identifier)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Active contacts in ascending identifier order.
    pub fn inputs(&self) -> impl Iterator<Item = &InputPoint> {
        self.inputs.values().map(|t| &t.point)
    }

    // ─── Event handling ──────────────────────────────────────────────────

    /// Route a raw event by phase. `Cancel` is handled as `End`.
    pub fn handle(&mut self, event: &RawInputEvent, now: f64) -> Transitions {
        match event.phase() {
            Phase::Start => self.handle_start(event, now),
            Phase::Move => self.handle_move(event, now),
            Phase::End | Phase::Cancel => self.handle_end(event, now),
        }
    }

    pub fn handle_start(&mut self, event: &RawInputEvent, now: f64) -> Transitions {
        let kind = event.kind();
        let mut out = Transitions::new();

        for contact in event.contacts() {
            let point = InputPoint {
                identifier: contact.identifier,
                start_x: contact.x,
                start_y: contact.y,
                current_x: contact.x,
                current_y: contact.y,
                start_time: now,
                kind,
            };
            if self.inputs.contains_key(&contact.identifier) {
                log::debug!("input {} restarted before its end", contact.identifier);
            }
            self.inputs.insert(
                contact.identifier,
                Tracked {
                    point,
                    last_activity: now,
                },
            );
            out.push(InputTransition::Start(point));
        }

        if !out.is_empty() {
            self.hold_listeners(kind);
        }
        out
    }

    pub fn handle_move(&mut self, event: &RawInputEvent, now: f64) -> Transitions {
        let mut out = Transitions::new();
        for contact in event.contacts() {
            if let Some(tracked) = self.inputs.get_mut(&contact.identifier) {
                tracked.point.current_x = contact.x;
                tracked.point.current_y = contact.y;
                tracked.last_activity = now;
                out.push(InputTransition::Move(tracked.point));
            }
        }
        out
    }

    pub fn handle_end(&mut self, event: &RawInputEvent, _now: f64) -> Transitions {
        let mut out = Transitions::new();
        for contact in event.contacts() {
            if let Some(mut tracked) = self.inputs.remove(&contact.identifier) {
                tracked.point.current_x = contact.x;
                tracked.point.current_y = contact.y;
                out.push(InputTransition::End(tracked.point));
            }
        }
        self.release_listeners_if_idle();
        out
    }

    // ─── Forced release ──────────────────────────────────────────────────

    /// End one contact without a platform event.
    pub fn release(&mut self, identifier: InputId) -> Transitions {
        let mut out = Transitions::new();
        if let Some(tracked) = self.inputs.remove(&identifier) {
            log::debug!("force release input {identifier}");
            out.push(InputTransition::End(tracked.point));
        }
        self.release_listeners_if_idle();
        out
    }

    /// End every contact, in ascending identifier order.
    pub fn release_all(&mut self) -> Transitions {
        let out: Transitions = std::mem::take(&mut self.inputs)
            .into_values()
            .map(|t| InputTransition::End(t.point))
            .collect();
        if !out.is_empty() {
            log::debug!("release all: {} input(s)", out.len());
        }
        self.release_listeners_if_idle();
        out
    }

    /// Release every contact idle for longer than `idle_timeout` ms.
    ///
    /// Some browsers drop end events during fast interaction; without this a
    /// single-contact control would stay engaged forever.
    pub fn check_zombies(&mut self, now: f64, idle_timeout: f64) -> Transitions {
        let stale: SmallVec<[InputId; 4]> = self
            .inputs
            .iter()
            .filter(|(_, t)| now - t.last_activity > idle_timeout)
            .map(|(id, _)| *id)
            .collect();

        let mut out = Transitions::new();
        for id in stale {
            log::debug!("zombie input {id} idle past {idle_timeout}ms");
            out.extend(self.release(id));
        }
        out
    }

    /// Forget every contact without emitting transitions.
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.release_listeners_if_idle();
    }

    // ─── Document listeners ──────────────────────────────────────────────

    fn hold_listeners(&mut self, kind: InputKind) {
        let (held, family) = match kind {
            InputKind::Pointer => (&mut self.holds_pointer, ListenerFamily::Pointer),
            InputKind::Mouse => (&mut self.holds_mouse, ListenerFamily::Mouse),
            InputKind::Touch => return,
        };
        if *held {
            return;
        }
        match self.listeners.try_borrow_mut() {
            Ok(mut registry) => {
                *held = true;
                registry.acquire(family);
            }
            Err(_) => log::warn!("listener registry busy, {family:?} not acquired"),
        }
    }

    /// Give the held families back once nothing is tracked. A busy registry
    /// leaves the flags set so the next idle call retries.
    fn release_listeners_if_idle(&mut self) {
        if !self.inputs.is_empty() || !(self.holds_pointer || self.holds_mouse) {
            return;
        }
        let Ok(mut registry) = self.listeners.try_borrow_mut() else {
            log::warn!("listener registry busy, release deferred");
            return;
        };
        if std::mem::take(&mut self.holds_pointer) {
            registry.release(ListenerFamily::Pointer);
        }
        if std::mem::take(&mut self.holds_mouse) {
            registry.release(ListenerFamily::Mouse);
        }
    }
}

impl Drop for InputTracker {
    fn drop(&mut self) {
        self.inputs.clear();
        self.release_listeners_if_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Contact, MOUSE_ID};

    fn touch(phase: Phase, contacts: &[(InputId, f64, f64)]) -> RawInputEvent {
        RawInputEvent::touch(
            phase,
            contacts.iter().map(|&(id, x, y)| Contact::new(id, x, y)),
        )
    }

    #[test]
    fn pointer_down_is_tracked() {
        let mut tracker = InputTracker::new();
        let out = tracker.handle(&RawInputEvent::pointer(Phase::Start, 1, 100.0, 200.0), 5.0);

        assert_eq!(out.len(), 1);
        let input = tracker.get(1).expect("pointer 1 tracked");
        assert_eq!((input.start_x, input.start_y), (100.0, 200.0));
        assert_eq!((input.current_x, input.current_y), (100.0, 200.0));
        assert_eq!(input.kind, InputKind::Pointer);
        assert_eq!(input.start_time, 5.0);
    }

    #[test]
    fn mouse_down_uses_identifier_zero() {
        let mut tracker = InputTracker::new();
        tracker.handle(&RawInputEvent::mouse(Phase::Start, 150.0, 250.0), 0.0);
        let input = tracker.get(MOUSE_ID).expect("mouse tracked");
        assert_eq!(input.kind, InputKind::Mouse);
        assert_eq!(input.start_x, 150.0);
    }

    #[test]
    fn multiple_touches_are_tracked() {
        let mut tracker = InputTracker::new();
        let out = tracker.handle(
            &touch(Phase::Start, &[(1, 100.0, 100.0), (2, 200.0, 200.0)]),
            0.0,
        );
        assert_eq!(out.len(), 2);
        assert!(tracker.contains(1) && tracker.contains(2));
        assert!(tracker.inputs().all(|i| i.kind == InputKind::Touch));
    }

    #[test]
    fn unknown_identifiers_are_ignored() {
        let mut tracker = InputTracker::new();
        assert!(tracker.get(999).is_none());
        assert!(
            tracker
                .handle(&RawInputEvent::pointer(Phase::Move, 999, 1.0, 1.0), 0.0)
                .is_empty()
        );
        assert!(
            tracker
                .handle(&RawInputEvent::pointer(Phase::End, 999, 1.0, 1.0), 0.0)
                .is_empty()
        );
        assert!(tracker.release(999).is_empty());
    }

    #[test]
    fn move_updates_current_in_place() {
        let mut tracker = InputTracker::new();
        tracker.handle(&touch(Phase::Start, &[(1, 100.0, 100.0)]), 0.0);
        let out = tracker.handle(&touch(Phase::Move, &[(1, 150.0, 150.0)]), 16.0);

        assert_eq!(out.len(), 1);
        match out[0] {
            InputTransition::Move(p) => {
                assert_eq!((p.current_x, p.current_y), (150.0, 150.0));
                assert_eq!((p.start_x, p.start_y), (100.0, 100.0));
            }
            other => panic!("expected Move, got {other:?}"),
        }
    }

    #[test]
    fn end_removes_only_listed_contacts() {
        let mut tracker = InputTracker::new();
        tracker.handle(
            &touch(Phase::Start, &[(1, 0.0, 0.0), (2, 10.0, 10.0), (3, 20.0, 20.0)]),
            0.0,
        );
        let out = tracker.handle(&touch(Phase::End, &[(2, 12.0, 12.0)]), 10.0);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identifier(), 2);
        assert_eq!(out[0].point().current_x, 12.0);
        assert!(tracker.contains(1));
        assert!(!tracker.contains(2));
        assert!(tracker.contains(3));
    }

    #[test]
    fn cancel_behaves_as_end() {
        let mut tracker = InputTracker::new();
        tracker.handle(&RawInputEvent::pointer(Phase::Start, 4, 0.0, 0.0), 0.0);
        let out = tracker.handle(&RawInputEvent::pointer(Phase::Cancel, 4, 1.0, 1.0), 1.0);
        assert!(matches!(out[0], InputTransition::End(_)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn release_all_ends_each_input_once() {
        let mut tracker = InputTracker::new();
        tracker.handle(
            &touch(Phase::Start, &[(5, 0.0, 0.0), (1, 0.0, 0.0), (3, 0.0, 0.0)]),
            0.0,
        );
        let out = tracker.release_all();
        let ids: Vec<InputId> = out.iter().map(|t| t.identifier()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert!(out.iter().all(|t| matches!(t, InputTransition::End(_))));
        assert!(tracker.is_empty());
        assert!(tracker.release_all().is_empty());
    }

    #[test]
    fn zombie_check_releases_idle_inputs_only() {
        let mut tracker = InputTracker::new();
        tracker.handle(&touch(Phase::Start, &[(1, 0.0, 0.0), (2, 0.0, 0.0)]), 0.0);
        tracker.handle(&touch(Phase::Move, &[(2, 5.0, 5.0)]), 900.0);

        let out = tracker.check_zombies(1500.0, ZOMBIE_TIMEOUT_MS);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].identifier(), 1);
        assert!(tracker.contains(2));

        assert!(tracker.check_zombies(1800.0, ZOMBIE_TIMEOUT_MS).is_empty());
        assert_eq!(tracker.check_zombies(1901.0, ZOMBIE_TIMEOUT_MS).len(), 1);
    }

    #[test]
    fn document_listeners_follow_active_set() {
        let registry = ListenerRegistry::shared();
        let mut tracker = InputTracker::with_listeners(registry.clone());

        tracker.handle(&RawInputEvent::pointer(Phase::Start, 1, 0.0, 0.0), 0.0);
        tracker.handle(&RawInputEvent::pointer(Phase::Start, 2, 0.0, 0.0), 0.0);
        assert_eq!(registry.borrow().count(ListenerFamily::Pointer), 1);

        tracker.handle(&RawInputEvent::pointer(Phase::End, 1, 0.0, 0.0), 0.0);
        assert!(registry.borrow().is_attached(ListenerFamily::Pointer));

        tracker.handle(&RawInputEvent::pointer(Phase::End, 2, 0.0, 0.0), 0.0);
        assert!(!registry.borrow().is_attached(ListenerFamily::Pointer));
    }

    #[test]
    fn touch_needs_no_document_listeners() {
        let registry = ListenerRegistry::shared();
        let mut tracker = InputTracker::with_listeners(registry.clone());
        tracker.handle(&touch(Phase::Start, &[(1, 0.0, 0.0)]), 0.0);
        assert!(registry.borrow_mut().take_changes().is_empty());
    }

    #[test]
    fn busy_registry_defers_release_without_leaking() {
        let registry = ListenerRegistry::shared();
        let mut tracker = InputTracker::with_listeners(registry.clone());
        tracker.handle(&RawInputEvent::pointer(Phase::Start, 1, 0.0, 0.0), 0.0);

        {
            let _reader = registry.borrow();
            tracker.handle(&RawInputEvent::pointer(Phase::End, 1, 0.0, 0.0), 5.0);
        }
        assert!(tracker.is_empty());
        assert_eq!(registry.borrow().count(ListenerFamily::Pointer), 1);

        tracker.clear();
        assert_eq!(registry.borrow().count(ListenerFamily::Pointer), 0);
        assert!(!registry.borrow().is_attached(ListenerFamily::Pointer));
    }

    #[test]
    fn dropping_tracker_releases_listeners() {
        let registry = ListenerRegistry::shared();
        {
            let mut tracker = InputTracker::with_listeners(registry.clone());
            tracker.handle(&RawInputEvent::mouse(Phase::Start, 0.0, 0.0), 0.0);
            assert!(registry.borrow().is_attached(ListenerFamily::Mouse));
        }
        assert!(!registry.borrow().is_attached(ListenerFamily::Mouse));
    }
}
