//! Typed outputs of the gesture resolvers.
//!
//! Controls never call back into the host. Every handler returns a list of
//! `ControlEvent`s in emission order; the host turns the semantic ones into
//! DOM `CustomEvent`s and applies the `Visual` ones to the element.

use kurbo::{Point, Vec2};
use serde::Serialize;
use vpad_core::{Angle, Cardinals, CompassDirection, InputId};

// ─── Joystick ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoystickStart {
    pub identifier: InputId,
    /// Viewport position of the engaging contact.
    pub position: Point,
    pub timestamp: f64,
}

/// One resolved stick sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoystickMove {
    pub identifier: InputId,
    /// Post-deadzone displacement over the radius, in `[-1, 1]²`.
    pub position: Vec2,
    /// Post-deadzone displacement in pixels.
    pub raw_position: Vec2,
    /// Clamped displacement over the radius, in `[0, 1]`.
    pub force: f64,
    /// Clamped displacement length in pixels.
    pub distance: f64,
    pub angle: Angle,
    pub compass: CompassDirection,
    /// Unit vector of the displacement, or zero.
    pub vector: Vec2,
    pub capture: Cardinals,
    pub release: Cardinals,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoystickEnd {
    pub identifier: InputId,
    /// Letters that were held when the stick let go.
    pub release: Cardinals,
    pub timestamp: f64,
}

// ─── Buttons ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonPress {
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonRelease {
    pub timestamp: f64,
    /// Milliseconds between press and release.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeStart {
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeUpdate {
    pub percent: f64,
    /// CSS `hsl(...)` colour of the charge ring.
    pub color: String,
    pub fully_charged: bool,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRelease {
    pub percent: f64,
    /// `percent >= min_charge`.
    pub activated: bool,
    pub duration: f64,
    pub timestamp: f64,
}

// ─── Visual updates ──────────────────────────────────────────────────────

/// Presentation changes the host applies to the control element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualUpdate {
    /// Joystick engaged state (the `active` class).
    Engaged { active: bool },
    /// Nub offset from the stick center, in pixels.
    Nub { offset: Vec2 },
    /// The stick base moved to a new anchor. `fixed` is set in dynamic mode,
    /// where the base is placed in viewport coordinates; otherwise the host
    /// uses `local`.
    Anchor {
        viewport: Point,
        local: Point,
        fixed: bool,
    },
    /// Button pressed state.
    Pressed { pressed: bool },
    FullyCharged { charged: bool },
    ChargeRing { percent: f64, color: String },
}

// ─── Envelope ────────────────────────────────────────────────────────────

/// Everything a control can emit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum ControlEvent {
    JoystickStart(JoystickStart),
    JoystickMove(JoystickMove),
    JoystickEnd(JoystickEnd),
    ButtonPress(ButtonPress),
    ButtonRelease(ButtonRelease),
    ChargeStart(ChargeStart),
    ChargeUpdate(ChargeUpdate),
    ChargeRelease(ChargeRelease),
    Visual(VisualUpdate),
}

impl ControlEvent {
    /// DOM event name (`joystick-move`, ...). Visual updates are not
    /// dispatched and report `visual`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoystickStart(_) => "joystick-start",
            Self::JoystickMove(_) => "joystick-move",
            Self::JoystickEnd(_) => "joystick-end",
            Self::ButtonPress(_) => "button-press",
            Self::ButtonRelease(_) => "button-release",
            Self::ChargeStart(_) => "charge-start",
            Self::ChargeUpdate(_) => "charge-update",
            Self::ChargeRelease(_) => "charge-release",
            Self::Visual(_) => "visual",
        }
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, Self::Visual(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn envelope_serializes_with_dom_name() {
        let event = ControlEvent::ButtonRelease(ButtonRelease {
            timestamp: 250.0,
            duration: 250.0,
        });
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["type"], event.name());
        assert_eq!(json["detail"]["duration"], 250.0);
    }

    #[test]
    fn move_payload_uses_camel_case_and_letters() {
        let event = ControlEvent::JoystickMove(JoystickMove {
            identifier: 1,
            position: Vec2::new(1.0, 0.0),
            raw_position: Vec2::new(50.0, 0.0),
            force: 1.0,
            distance: 50.0,
            angle: Angle::default(),
            compass: CompassDirection::E,
            vector: Vec2::new(1.0, 0.0),
            capture: Cardinals::E,
            release: Cardinals::EMPTY,
            timestamp: 16.0,
        });
        let json = serde_json::to_value(&event).expect("serializable");
        let detail = &json["detail"];
        assert_eq!(detail["rawPosition"]["x"], 50.0);
        assert_eq!(detail["compass"], "e");
        assert_eq!(detail["capture"], "e");
        assert_eq!(detail["release"], "");
    }

    #[test]
    fn visual_updates_are_tagged() {
        let event = ControlEvent::Visual(VisualUpdate::FullyCharged { charged: true });
        assert!(event.is_visual());
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["detail"]["kind"], "fullyCharged");
    }
}
