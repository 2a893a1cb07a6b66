//! A deck owns a set of controls and everything they share.
//!
//! One document listener registry, one frame queue and one visibility
//! registry per deck. Hosts route element events with `handle_input`,
//! document events with `handle_document`, call `frame` once per rendering
//! frame, and `set_hidden` when the page visibility changes.

use crate::button::ActionButton;
use crate::charge::ChargeButton;
use crate::control::{Control, ControlKind};
use crate::dataset::Dataset;
use crate::events::ControlEvent;
use crate::joystick::Joystick;
use crate::options::{ButtonOptions, ChargeOptions, JoystickOptions};
use kurbo::{Affine, Rect};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use vpad_core::{
    FrameQueue, ListenerChange, ListenerRegistry, LocalFrame, RawInputEvent, SharedListeners,
};

/// Handle of one control inside a deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ControlId(u32);

impl ControlId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// An event tagged with the control that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emitted {
    pub control: ControlId,
    #[serde(flatten)]
    pub event: ControlEvent,
}

/// Controls that must be force-released when the page is hidden.
#[derive(Debug, Default)]
pub struct VisibilityRegistry {
    members: BTreeSet<ControlId>,
    hidden: bool,
}

impl VisibilityRegistry {
    pub fn register(&mut self, id: ControlId) {
        self.members.insert(id);
    }

    pub fn deregister(&mut self, id: ControlId) {
        self.members.remove(&id);
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Record a visibility change. Returns the members to release when the
    /// page just became hidden.
    fn set_hidden(&mut self, hidden: bool) -> Vec<ControlId> {
        let became_hidden = hidden && !self.hidden;
        self.hidden = hidden;
        if became_hidden {
            self.members.iter().copied().collect()
        } else {
            Vec::new()
        }
    }
}

struct Slot {
    control: Box<dyn Control>,
    frame: LocalFrame,
}

pub struct Deck {
    next_id: u32,
    controls: BTreeMap<ControlId, Slot>,
    listeners: SharedListeners,
    frames: FrameQueue<ControlId>,
    visibility: VisibilityRegistry,
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl Deck {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            controls: BTreeMap::new(),
            listeners: ListenerRegistry::shared(),
            frames: FrameQueue::new(),
            visibility: VisibilityRegistry::default(),
        }
    }

    pub fn listeners(&self) -> &SharedListeners {
        &self.listeners
    }

    pub fn visibility(&self) -> &VisibilityRegistry {
        &self.visibility
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    pub fn add_joystick(&mut self, options: JoystickOptions) -> ControlId {
        let control = Joystick::with_listeners(options, self.listeners.clone());
        self.add(Box::new(control))
    }

    pub fn add_action_button(&mut self, options: ButtonOptions) -> ControlId {
        let control = ActionButton::with_listeners(options, self.listeners.clone());
        self.add(Box::new(control))
    }

    pub fn add_charge_button(&mut self, options: ChargeOptions) -> ControlId {
        let control = ChargeButton::with_listeners(options, self.listeners.clone());
        self.add(Box::new(control))
    }

    /// Adopt a control. Its tracker should share `listeners()`.
    pub fn add(&mut self, control: Box<dyn Control>) -> ControlId {
        self.next_id += 1;
        let id = ControlId(self.next_id);
        log::debug!("add {:?} as {id:?}", control.kind());
        self.controls.insert(
            id,
            Slot {
                control,
                frame: LocalFrame::default(),
            },
        );
        self.visibility.register(id);
        id
    }

    /// Tear a control down: no events, frames cancelled, listeners released.
    pub fn remove(&mut self, id: ControlId) -> bool {
        let Some(mut slot) = self.controls.remove(&id) else {
            return false;
        };
        slot.control.teardown(&mut self.frames.scoped(id));
        self.frames.cancel_owner(id);
        self.visibility.deregister(id);
        log::debug!("removed {id:?}");
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = ControlId> + '_ {
        self.controls.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn kind(&self, id: ControlId) -> Option<ControlKind> {
        self.controls.get(&id).map(|s| s.control.kind())
    }

    pub fn control(&self, id: ControlId) -> Option<&dyn Control> {
        self.controls.get(&id).map(|s| s.control.as_ref())
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    pub fn set_bounds(&mut self, id: ControlId, rect: Rect) {
        if let Some(slot) = self.controls.get_mut(&id) {
            slot.frame.rect = rect;
            slot.control.set_frame(slot.frame);
        }
    }

    pub fn set_transform(&mut self, id: ControlId, transform: Affine) {
        if let Some(slot) = self.controls.get_mut(&id) {
            slot.frame.transform = transform;
            slot.control.set_frame(slot.frame);
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Element-level event for one control.
    pub fn handle_input(
        &mut self,
        id: ControlId,
        event: &RawInputEvent,
        now: f64,
    ) -> Vec<Emitted> {
        let Some(slot) = self.controls.get_mut(&id) else {
            log::trace!("input for unknown control {id:?}");
            return Vec::new();
        };
        let events = slot
            .control
            .handle_input(event, now, &mut self.frames.scoped(id));
        tag(id, events).collect()
    }

    /// Document-level event; every control sees it and ignores contacts it
    /// does not track.
    pub fn handle_document(&mut self, event: &RawInputEvent, now: f64) -> Vec<Emitted> {
        let mut out = Vec::new();
        for (&id, slot) in &mut self.controls {
            let events = slot
                .control
                .handle_input(event, now, &mut self.frames.scoped(id));
            out.extend(tag(id, events));
        }
        out
    }

    // ─── Frames ──────────────────────────────────────────────────────────

    /// Run due frame tasks.
    pub fn frame(&mut self, now: f64) -> Vec<Emitted> {
        let mut out = Vec::new();
        for (handle, id) in self.frames.take_due() {
            if let Some(slot) = self.controls.get_mut(&id) {
                let events = slot
                    .control
                    .on_frame(handle, now, &mut self.frames.scoped(id));
                out.extend(tag(id, events));
            }
        }
        out
    }

    /// Release contacts idle past each control's timeout. Controls already
    /// do this on a blocked start; hosts may call it to sweep eagerly.
    pub fn check_zombies(&mut self, now: f64) -> Vec<Emitted> {
        let mut out = Vec::new();
        for (&id, slot) in &mut self.controls {
            let events = slot
                .control
                .check_zombies(now, &mut self.frames.scoped(id));
            out.extend(tag(id, events));
        }
        out
    }

    /// A frame task is pending; the host should request a frame.
    pub fn needs_frame(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Any control tracks at least one contact.
    pub fn is_active(&self) -> bool {
        self.controls.values().any(|s| s.control.is_active())
    }

    // ─── Visibility ──────────────────────────────────────────────────────

    /// Page visibility changed. Hiding force-releases every registered
    /// control.
    pub fn set_hidden(&mut self, hidden: bool, now: f64) -> Vec<Emitted> {
        let mut out = Vec::new();
        for id in self.visibility.set_hidden(hidden) {
            if let Some(slot) = self.controls.get_mut(&id) {
                let events = slot
                    .control
                    .release_all(now, &mut self.frames.scoped(id));
                out.extend(tag(id, events));
            }
        }
        if !out.is_empty() {
            log::debug!("page hidden: released {} event(s)", out.len());
        }
        out
    }

    /// Force-release every control now.
    pub fn release_all(&mut self, now: f64) -> Vec<Emitted> {
        let mut out = Vec::new();
        for (&id, slot) in &mut self.controls {
            let events = slot
                .control
                .release_all(now, &mut self.frames.scoped(id));
            out.extend(tag(id, events));
        }
        out
    }

    // ─── Polling ─────────────────────────────────────────────────────────

    pub fn dataset(&self, id: ControlId) -> Option<&Dataset> {
        self.controls.get(&id).map(|s| s.control.dataset())
    }

    /// Document listener attach/detach changes since the last call.
    pub fn take_listener_changes(&self) -> Vec<ListenerChange> {
        self.listeners.borrow_mut().take_changes()
    }
}

fn tag(control: ControlId, events: Vec<ControlEvent>) -> impl Iterator<Item = Emitted> {
    events
        .into_iter()
        .map(move |event| Emitted { control, event })
}
