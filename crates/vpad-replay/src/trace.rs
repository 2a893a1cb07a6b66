//! Trace format.
//!
//! ```json
//! {
//!   "frameInterval": 16,
//!   "controls": [
//!     { "kind": "joystick", "attrs": { "mode": "static" }, "bounds": [0, 0, 100, 100] }
//!   ],
//!   "steps": [
//!     { "at": 0,  "do": "pointer", "control": 0, "phase": "start", "id": 1, "x": 50, "y": 50 },
//!     { "at": 40, "do": "pointer", "phase": "move", "id": 1, "x": 90, "y": 50 },
//!     { "at": 50, "do": "frame" }
//!   ]
//! }
//! ```
//!
//! A step without `control` is a document-level event.

use serde::Deserialize;
use std::collections::BTreeMap;
use vpad_core::{Contact, InputId, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclKind {
    Joystick,
    ActionButton,
    ChargeButton,
}

/// One control to create before the first step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControlDecl {
    pub kind: DeclKind,
    /// Attribute strings, same names as on the element.
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// `[x, y, width, height]` in viewport pixels.
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
    /// Computed CSS transform, e.g. `matrix(1, 0, 0, 1, 10, 0)`.
    #[serde(default)]
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "do", rename_all = "kebab-case")]
pub enum Action {
    Pointer {
        #[serde(default)]
        control: Option<usize>,
        phase: Phase,
        id: InputId,
        x: f64,
        y: f64,
    },
    Touch {
        #[serde(default)]
        control: Option<usize>,
        phase: Phase,
        touches: Vec<Contact>,
    },
    Mouse {
        #[serde(default)]
        control: Option<usize>,
        phase: Phase,
        x: f64,
        y: f64,
    },
    Frame,
    Hidden {
        hidden: bool,
    },
    ReleaseAll,
}

impl Action {
    fn control(&self) -> Option<usize> {
        match self {
            Action::Pointer { control, .. }
            | Action::Touch { control, .. }
            | Action::Mouse { control, .. } => *control,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// Milliseconds on the replay clock.
    pub at: f64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Run `frame` automatically at this interval while the deck needs it.
    #[serde(default)]
    pub frame_interval: Option<f64>,
    pub controls: Vec<ControlDecl>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Parse and validate a trace.
pub fn parse_trace(text: &str) -> Result<Trace, String> {
    let trace: Trace = serde_json::from_str(text).map_err(|e| format!("invalid trace: {e}"))?;

    if let Some(interval) = trace.frame_interval
        && !(interval.is_finite() && interval > 0.0)
    {
        return Err(format!("frameInterval must be positive, got {interval}"));
    }

    let mut clock = f64::NEG_INFINITY;
    for (i, step) in trace.steps.iter().enumerate() {
        if !step.at.is_finite() {
            return Err(format!("step {i}: time is not a number"));
        }
        if step.at < clock {
            return Err(format!("step {i}: time goes back from {clock} to {}", step.at));
        }
        clock = step.at;

        if let Some(control) = step.action.control()
            && control >= trace.controls.len()
        {
            return Err(format!(
                "step {i}: control {control} out of range ({} declared)",
                trace.controls.len()
            ));
        }
    }
    Ok(trace)
}
