//! Drive a `Deck` from a parsed trace on a manual clock.

use crate::trace::{Action, ControlDecl, DeclKind, Step, Trace};
use kurbo::Rect;
use vpad_controls::{ButtonOptions, ChargeOptions, ControlId, Deck, Emitted, JoystickOptions};
use vpad_core::{RawInputEvent, parse_css_transform};

/// One emitted event plus the replay time it was produced at.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Timed {
    pub at: f64,
    #[serde(flatten)]
    pub emitted: Emitted,
}

pub struct Replayer {
    deck: Deck,
    ids: Vec<ControlId>,
    frame_interval: Option<f64>,
    last_frame: f64,
}

impl Replayer {
    /// Create the deck and every declared control.
    pub fn new(trace: &Trace) -> Result<Self, String> {
        let mut deck = Deck::new();
        let mut ids = Vec::with_capacity(trace.controls.len());
        for (i, decl) in trace.controls.iter().enumerate() {
            let id = add_control(&mut deck, decl);
            if let Some([x, y, w, h]) = decl.bounds {
                deck.set_bounds(id, Rect::new(x, y, x + w, y + h));
            }
            if let Some(css) = &decl.transform {
                let transform = parse_css_transform(css)
                    .ok_or_else(|| format!("control {i}: unparsable transform {css:?}"))?;
                deck.set_transform(id, transform);
            }
            ids.push(id);
        }
        Ok(Self {
            deck,
            ids,
            frame_interval: trace.frame_interval,
            last_frame: 0.0,
        })
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Control handle for a declaration index.
    pub fn id(&self, index: usize) -> Option<ControlId> {
        self.ids.get(index).copied()
    }

    /// Apply one step, after any automatic frames due before it.
    pub fn step(&mut self, step: &Step) -> Vec<Timed> {
        let mut out = self.catch_up(step.at);
        let now = step.at;
        let emitted = match &step.action {
            Action::Pointer {
                control,
                phase,
                id,
                x,
                y,
            } => self.input(*control, &RawInputEvent::pointer(*phase, *id, *x, *y), now),
            Action::Touch {
                control,
                phase,
                touches,
            } => self.input(
                *control,
                &RawInputEvent::touch(*phase, touches.iter().copied()),
                now,
            ),
            Action::Mouse {
                control,
                phase,
                x,
                y,
            } => self.input(*control, &RawInputEvent::mouse(*phase, *x, *y), now),
            Action::Frame => {
                self.last_frame = now;
                self.deck.frame(now)
            }
            Action::Hidden { hidden } => self.deck.set_hidden(*hidden, now),
            Action::ReleaseAll => self.deck.release_all(now),
        };
        out.extend(emitted.into_iter().map(|emitted| Timed { at: now, emitted }));
        out
    }

    /// Replay every step in order.
    pub fn run(&mut self, steps: &[Step]) -> Vec<Timed> {
        steps.iter().flat_map(|step| self.step(step)).collect()
    }

    fn input(&mut self, control: Option<usize>, event: &RawInputEvent, now: f64) -> Vec<Emitted> {
        match control {
            Some(index) => match self.id(index) {
                Some(id) => self.deck.handle_input(id, event, now),
                None => {
                    log::debug!("step targets unknown control {index}");
                    Vec::new()
                }
            },
            None => self.deck.handle_document(event, now),
        }
    }

    /// Automatic frames strictly before `until`.
    fn catch_up(&mut self, until: f64) -> Vec<Timed> {
        let Some(interval) = self.frame_interval else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut tick = self.last_frame + interval;
        while tick < until {
            if self.deck.needs_frame() {
                log::trace!("auto frame at {tick}");
                out.extend(
                    self.deck
                        .frame(tick)
                        .into_iter()
                        .map(|emitted| Timed { at: tick, emitted }),
                );
            }
            self.last_frame = tick;
            tick += interval;
        }
        out
    }
}

fn add_control(deck: &mut Deck, decl: &ControlDecl) -> ControlId {
    let attr = |name: &str| decl.attrs.get(name).cloned();
    match decl.kind {
        DeclKind::Joystick => deck.add_joystick(JoystickOptions::from_attributes(attr)),
        DeclKind::ActionButton => deck.add_action_button(ButtonOptions::from_attributes(attr)),
        DeclKind::ChargeButton => deck.add_charge_button(ChargeOptions::from_attributes(attr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parse_trace;
    use pretty_assertions::assert_eq;

    fn names(timed: &[Timed]) -> Vec<&'static str> {
        timed
            .iter()
            .filter(|t| !t.emitted.event.is_visual())
            .map(|t| t.emitted.event.name())
            .collect()
    }

    #[test]
    fn button_press_and_release() {
        let trace = parse_trace(
            r#"{ "controls": [{ "kind": "action-button" }], "steps": [
                { "at": 0,   "do": "pointer", "control": 0, "phase": "start", "id": 1, "x": 5, "y": 5 },
                { "at": 120, "do": "pointer", "phase": "end", "id": 1, "x": 5, "y": 5 }
            ] }"#,
        )
        .expect("valid trace");
        let mut replayer = Replayer::new(&trace).expect("controls build");
        let out = replayer.run(&trace.steps);

        assert_eq!(names(&out), vec!["button-press", "button-release"]);
        assert_eq!(out.last().map(|t| t.at), Some(120.0));
    }

    #[test]
    fn automatic_frames_fill_the_gaps() {
        let trace = parse_trace(
            r#"{ "frameInterval": 10, "controls": [{ "kind": "charge-button", "attrs": { "charge-time": "100" } }],
                 "steps": [
                    { "at": 0,  "do": "mouse", "control": 0, "phase": "start", "x": 0, "y": 0 },
                    { "at": 35, "do": "mouse", "phase": "end", "x": 0, "y": 0 }
                 ] }"#,
        )
        .expect("valid trace");
        let mut replayer = Replayer::new(&trace).expect("controls build");
        let out = replayer.run(&trace.steps);

        let updates: Vec<f64> = out
            .iter()
            .filter(|t| t.emitted.event.name() == "charge-update")
            .map(|t| t.at)
            .collect();
        // Immediate ramp on start, then one per automatic frame
        assert_eq!(updates, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(names(&out).last(), Some(&"charge-release"));
        assert!(!replayer.deck().needs_frame());
    }

    #[test]
    fn bad_transform_is_an_error() {
        let trace = parse_trace(
            r#"{ "controls": [{ "kind": "joystick", "transform": "skew(nope)" }] }"#,
        )
        .expect("valid trace");
        assert!(Replayer::new(&trace).is_err());
    }
}
