//! The `Control` trait: common surface of every gesture resolver.
//!
//! Each control owns one `InputTracker`. Raw events go in, the tracker turns
//! them into transitions, and the control resolves those into
//! `ControlEvent`s. Frame-driven work goes through the `FrameScheduler` the
//! caller passes in, so controls never hold timers of their own.

use crate::dataset::Dataset;
use crate::events::ControlEvent;
use serde::Serialize;
use vpad_core::{
    FrameHandle, FrameScheduler, InputTracker, InputTransition, LocalFrame, Phase, RawInputEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlKind {
    Joystick,
    ActionButton,
    ChargeButton,
}

pub trait Control {
    fn kind(&self) -> ControlKind;

    fn tracker(&self) -> &InputTracker;

    fn tracker_mut(&mut self) -> &mut InputTracker;

    /// Idle time (ms) after which a contact is released as a zombie.
    fn idle_timeout(&self) -> f64;

    fn dataset(&self) -> &Dataset;

    /// Resolve tracker transitions into events, in order.
    fn apply(
        &mut self,
        transitions: &[InputTransition],
        now: f64,
        frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent>;

    /// Drop every contact silently and cancel outstanding frames.
    fn teardown(&mut self, frames: &mut dyn FrameScheduler);

    /// A frame this control requested is due.
    fn on_frame(
        &mut self,
        _handle: FrameHandle,
        _now: f64,
        _frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        Vec::new()
    }

    /// Latest on-screen placement. Only controls that map positions care.
    fn set_frame(&mut self, _frame: LocalFrame) {}

    /// Feed a raw element- or document-level event.
    ///
    /// A start on a control that still tracks contacts first sweeps the
    /// stale ones: a contact whose end was lost would otherwise block the
    /// new gesture. Contacts held still are never swept on their own.
    fn handle_input(
        &mut self,
        event: &RawInputEvent,
        now: f64,
        frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        let mut out = if event.phase() == Phase::Start && !self.tracker().is_empty() {
            self.check_zombies(now, frames)
        } else {
            Vec::new()
        };
        let transitions = self.tracker_mut().handle(event, now);
        out.extend(self.apply(&transitions, now, frames));
        out
    }

    /// Force-end every tracked contact (tab hidden, explicit reset).
    fn release_all(&mut self, now: f64, frames: &mut dyn FrameScheduler) -> Vec<ControlEvent> {
        let transitions = self.tracker_mut().release_all();
        self.apply(&transitions, now, frames)
    }

    /// Force-end contacts idle past `idle_timeout`. Runs on a blocked start
    /// or when the host asks for it explicitly.
    fn check_zombies(&mut self, now: f64, frames: &mut dyn FrameScheduler) -> Vec<ControlEvent> {
        let timeout = self.idle_timeout();
        let transitions = self.tracker_mut().check_zombies(now, timeout);
        self.apply(&transitions, now, frames)
    }

    /// At least one contact is tracked.
    fn is_active(&self) -> bool {
        !self.tracker().is_empty()
    }
}
