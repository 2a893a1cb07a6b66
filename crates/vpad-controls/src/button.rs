//! Momentary action button (`Released → Pressed → Released`).

use crate::control::{Control, ControlKind};
use crate::dataset::Dataset;
use crate::events::{ButtonPress, ButtonRelease, ControlEvent, VisualUpdate};
use crate::options::ButtonOptions;
use vpad_core::{FrameScheduler, InputId, InputTracker, InputTransition, SharedListeners};

#[derive(Debug)]
pub struct ActionButton {
    options: ButtonOptions,
    tracker: InputTracker,
    /// Pressing contact and press time.
    press: Option<(InputId, f64)>,
    dataset: Dataset,
}

impl ActionButton {
    pub fn new(options: ButtonOptions) -> Self {
        Self::with_tracker(options, InputTracker::new())
    }

    pub fn with_listeners(options: ButtonOptions, listeners: SharedListeners) -> Self {
        Self::with_tracker(options, InputTracker::with_listeners(listeners))
    }

    fn with_tracker(options: ButtonOptions, tracker: InputTracker) -> Self {
        let mut dataset = Dataset::new();
        dataset.set("pressed", false);
        Self {
            options,
            tracker,
            press: None,
            dataset,
        }
    }

    pub fn options(&self) -> &ButtonOptions {
        &self.options
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }
}

impl Control for ActionButton {
    fn kind(&self) -> ControlKind {
        ControlKind::ActionButton
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
        _frames: &mut dyn FrameScheduler,
    ) -> Vec<ControlEvent> {
        let mut out = Vec::new();
        for transition in transitions {
            match (transition, self.press) {
                (InputTransition::Start(p), None) => {
                    log::debug!("button pressed by {}", p.identifier);
                    self.press = Some((p.identifier, now));
                    self.dataset.set("pressed", true);
                    out.push(ControlEvent::Visual(VisualUpdate::Pressed { pressed: true }));
                    out.push(ControlEvent::ButtonPress(ButtonPress { timestamp: now }));
                }
                (InputTransition::End(p), Some((id, pressed_at))) if p.identifier == id => {
                    log::debug!("button released by {id}");
                    self.press = None;
                    self.dataset.set("pressed", false);
                    out.push(ControlEvent::Visual(VisualUpdate::Pressed { pressed: false }));
                    out.push(ControlEvent::ButtonRelease(ButtonRelease {
                        timestamp: now,
                        duration: now - pressed_at,
                    }));
                }
                _ => {}
            }
        }
        out
    }

    fn teardown(&mut self, _frames: &mut dyn FrameScheduler) {
        self.press = None;
        self.dataset.set("pressed", false);
        self.tracker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vpad_core::{Contact, FrameQueue, Phase, RawInputEvent};

    fn names(events: &[ControlEvent]) -> Vec<&'static str> {
        events.iter().filter(|e| !e.is_visual()).map(|e| e.name()).collect()
    }

    #[test]
    fn press_and_release_report_duration() {
        let mut button = ActionButton::new(ButtonOptions::default());
        let mut q = FrameQueue::<()>::new();

        let out = button.handle_input(&RawInputEvent::mouse(Phase::Start, 5.0, 5.0), 100.0, &mut q);
        assert_eq!(names(&out), vec!["button-press"]);
        assert_eq!(button.dataset().get("pressed"), Some("true"));

        let out = button.handle_input(&RawInputEvent::mouse(Phase::End, 5.0, 5.0), 350.0, &mut q);
        assert_eq!(
            out.last(),
            Some(&ControlEvent::ButtonRelease(ButtonRelease {
                timestamp: 350.0,
                duration: 250.0
            }))
        );
        assert!(!button.is_pressed());
    }

    #[test]
    fn ending_an_ignored_contact_does_not_release() {
        let mut button = ActionButton::new(ButtonOptions::default());
        let mut q = FrameQueue::<()>::new();
        button.handle_input(
            &RawInputEvent::touch(
                Phase::Start,
                [Contact::new(1, 0.0, 0.0), Contact::new(2, 1.0, 1.0)],
            ),
            0.0,
            &mut q,
        );
        let out = button.handle_input(
            &RawInputEvent::touch(Phase::End, [Contact::new(2, 1.0, 1.0)]),
            10.0,
            &mut q,
        );
        assert!(out.is_empty());
        assert!(button.is_pressed());
    }

    #[test]
    fn release_all_releases_the_press() {
        let mut button = ActionButton::new(ButtonOptions::default());
        let mut q = FrameQueue::<()>::new();
        button.handle_input(&RawInputEvent::pointer(Phase::Start, 3, 0.0, 0.0), 0.0, &mut q);
        let out = button.release_all(40.0, &mut q);
        assert_eq!(names(&out), vec!["button-release"]);
        assert!(!button.is_active());
    }
}
