//! Hold-to-charge button (`Idle → Charging → Idle`).
//!
//! While held, a frame task ramps the charge from 0 to 100 % over
//! `charge_time`. Release reports whether `min_charge` was reached.

use crate::control::{Control, ControlKind};
use crate::dataset::Dataset;
use crate::events::{ChargeRelease, ChargeStart, ChargeUpdate, ControlEvent, VisualUpdate};
use crate::options::ChargeOptions;
use vpad_core::{
    FrameHandle, FrameScheduler, FrameTask, InputId, InputTracker, InputTransition,
    SharedListeners,
};

/// Ring hue for a charge level: green → yellow up to 65 %, yellow → red up
/// to 90 %, red beyond.
pub fn charge_hue(percent: f64) -> f64 {
    if percent < 65.0 {
        120.0 - (percent / 65.0) * 60.0
    } else if percent < 90.0 {
        60.0 - ((percent - 65.0) / 25.0) * 60.0
    } else {
        0.0
    }
}

/// CSS colour of the charge ring.
pub fn charge_color(percent: f64) -> String {
    format!("hsl({}, 80%, 50%)", charge_hue(percent))
}

#[derive(Debug)]
pub struct ChargeButton {
    options: ChargeOptions,
    tracker: InputTracker,
    /// Charging contact and press time.
    press: Option<(InputId, f64)>,
    percent: f64,
    fully_charged: bool,
    task: FrameTask,
    dataset: Dataset,
}

impl ChargeButton {
    pub fn new(options: ChargeOptions) -> Self {
        Self::with_tracker(options, InputTracker::new())
    }

    pub fn with_listeners(options: ChargeOptions, listeners: SharedListeners) -> Self {
        Self::with_tracker(options, InputTracker::with_listeners(listeners))
    }

    fn with_tracker(options: ChargeOptions, tracker: InputTracker) -> Self {
        let mut button = Self {
            options,
            tracker,
            press: None,
            percent: 0.0,
            fully_charged: false,
            task: FrameTask::new(),
            dataset: Dataset::new(),
        };
        button.write_dataset();
        button
    }

    pub fn options(&self) -> &ChargeOptions {
        &self.options
    }

    pub fn is_charging(&self) -> bool {
        self.press.is_some()
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    fn elapsed_percent(&self, started_at: f64, now: f64) -> f64 {
        ((now - started_at) / self.options.charge_time * 100.0).clamp(0.0, 100.0)
    }

    fn write_dataset(&mut self) {
        self.dataset.set("percent", self.percent);
        self.dataset.set("charging", self.press.is_some());
    }

    fn start(
        &mut self,
        identifier: InputId,
        now: f64,
        frames: &mut dyn FrameScheduler,
        out: &mut Vec<ControlEvent>,
    ) {
        log::debug!("charge started by {identifier}");
        self.press = Some((identifier, now));
        self.percent = 0.0;
        self.fully_charged = false;
        out.push(ControlEvent::Visual(VisualUpdate::Pressed { pressed: true }));
        out.push(ControlEvent::ChargeStart(ChargeStart { timestamp: now }));
        self.ramp(now, frames, out);
    }

    /// One ramp step: advance the percent, report it, keep the task alive.
    fn ramp(&mut self, now: f64, frames: &mut dyn FrameScheduler, out: &mut Vec<ControlEvent>) {
        let Some((_, started_at)) = self.press else {
            return;
        };
        self.percent = self.percent.max(self.elapsed_percent(started_at, now));
        let color = charge_color(self.percent);
        let full = self.percent >= 100.0;

        out.push(ControlEvent::Visual(VisualUpdate::ChargeRing {
            percent: self.percent,
            color: color.clone(),
        }));
        out.push(ControlEvent::ChargeUpdate(ChargeUpdate {
            percent: self.percent,
            color,
            fully_charged: full,
            timestamp: now,
        }));
        if full && !self.fully_charged {
            log::debug!("fully charged");
            self.fully_charged = true;
            out.push(ControlEvent::Visual(VisualUpdate::FullyCharged { charged: true }));
        }
        self.write_dataset();
        self.task.ensure(frames);
    }

    fn release(
        &mut self,
        started_at: f64,
        now: f64,
        frames: &mut dyn FrameScheduler,
        out: &mut Vec<ControlEvent>,
    ) {
        self.task.cancel(frames);
        let percent = self.percent.max(self.elapsed_percent(started_at, now));
        let activated = percent >= self.options.min_charge;
        log::debug!("charge released at {percent:.1}% (activated: {activated})");

        out.push(ControlEvent::Visual(VisualUpdate::Pressed { pressed: false }));
        if self.fully_charged {
            out.push(ControlEvent::Visual(VisualUpdate::FullyCharged { charged: false }));
        }
        out.push(ControlEvent::ChargeRelease(ChargeRelease {
            percent,
            activated,
            duration: now - started_at,
            timestamp: now,
        }));
        out.push(ControlEvent::Visual(VisualUpdate::ChargeRing {
            percent: 0.0,
            color: charge_color(0.0),
        }));

        self.press = None;
        self.percent = 0.0;
        self.fully_charged = false;
        self.write_dataset();
    }
}

impl Control for ChargeButton {
    fn kind(&self) -> ControlKind {
        ControlKind::ChargeButton
    }

    fn tracker(&self) -> &InputTracker {
        &self.tracker
    }

    fn tracker_mut(&mut self) -> &mut InputTracker {
        &mut self.tracker
    }

    fn idle_timeout(&self) -> f64 {
        self.options.idle_timeout
    }

    fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn apply(
        &mut self,
        transitions: &[InputTransition],
        now: f64,
        frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        let mut out = Vec::new();
        for transition in transitions {
            match (transition, self.press) {
                (InputTransition::Start(p), None) => {
                    self.start(p.identifier, now, frames, &mut out)
                }
                (InputTransition::End(p), Some((id, started_at))) if p.identifier == id => {
                    self.release(started_at, now, frames, &mut out)
                }
                _ => {}
            }
        }
        out
    }

    fn on_frame(
        &mut self,
        handle: FrameHandle,
        now: f64,
        frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        let mut out = Vec::new();
        if self.task.accept(handle) {
            self.ramp(now, frames, &mut out);
        }
        out
    }

    fn teardown(&mut self, frames: &mut dyn FrameScheduler) {
        self.task.cancel(frames);
        self.press = None;
        self.percent = 0.0;
        self.fully_charged = false;
        self.tracker.clear();
        self.write_dataset();
    }
}
