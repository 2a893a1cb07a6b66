//! Input abstraction layer.
//!
//! Normalizes the three browser event families (Pointer, Touch, Mouse)
//! into a single `RawInputEvent` enum, so the tracker is written once
//! against one shape.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// Identifier of one physical contact, unique among active contacts.
pub type InputId = i32;

/// Mouse has a single contact by platform contract.
pub const MOUSE_ID: InputId = 0;

/// Which event family produced a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Touch,
    Mouse,
    Pointer,
}

/// Lifecycle phase carried by a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    Move,
    End,
    /// Platform cancelled the contact (treated as `End`).
    Cancel,
}

/// One changed contact inside a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub identifier: InputId,
    pub x: f64,
    pub y: f64,
}

impl Contact {
    pub fn new(identifier: InputId, x: f64, y: f64) -> Self {
        Self { identifier, x, y }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Change-set of a single raw event. Most events carry one or two contacts.
pub type Contacts = SmallVec<[Contact; 4]>;

/// A platform event from any pointing device family.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    /// `pointerdown` / `pointermove` / `pointerup` / `pointercancel`.
    Pointer {
        phase: Phase,
        pointer_id: InputId,
        x: f64,
        y: f64,
    },

    /// `touchstart` / `touchmove` / `touchend` / `touchcancel`.
    /// Only `changedTouches` belong here, never the full `touches` list.
    Touch { phase: Phase, changed: Contacts },

    /// `mousedown` / `mousemove` / `mouseup`.
    Mouse { phase: Phase, x: f64, y: f64 },
}

impl RawInputEvent {
    pub fn pointer(phase: Phase, pointer_id: InputId, x: f64, y: f64) -> Self {
        Self::Pointer {
            phase,
            pointer_id,
            x,
            y,
        }
    }

    pub fn touch(phase: Phase, changed: impl IntoIterator<Item = Contact>) -> Self {
        Self::Touch {
            phase,
            changed: changed.into_iter().collect(),
        }
    }

    pub fn mouse(phase: Phase, x: f64, y: f64) -> Self {
        Self::Mouse { phase, x, y }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Pointer { phase, .. } | Self::Touch { phase, .. } | Self::Mouse { phase, .. } => {
                *phase
            }
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Pointer { .. } => InputKind::Pointer,
            Self::Touch { .. } => InputKind::Touch,
            Self::Mouse { .. } => InputKind::Mouse,
        }
    }

    /// The contacts this event changes, with identifiers already assigned
    /// (mouse always maps to [`MOUSE_ID`]).
    pub fn contacts(&self) -> Contacts {
        match self {
            Self::Pointer {
                pointer_id, x, y, ..
            } => smallvec![Contact::new(*pointer_id, *x, *y)],
            Self::Touch { changed, .. } => changed.clone(),
            Self::Mouse { x, y, .. } => smallvec![Contact::new(MOUSE_ID, *x, *y)],
        }
    }
}

/// One tracked contact, from acquisition to release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPoint {
    pub identifier: InputId,
    pub start_x: f64,
    pub start_y: f64,
    pub current_x: f64,
    pub current_y: f64,
    /// Timestamp (ms) of acquisition.
    pub start_time: f64,
    pub kind: InputKind,
}

impl InputPoint {
    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn current(&self) -> Point {
        Point::new(self.current_x, self.current_y)
    }
}
