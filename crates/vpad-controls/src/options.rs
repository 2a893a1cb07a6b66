//! Typed control options built from string attributes.
//!
//! Every option has a default; a malformed attribute falls back to it (see
//! `vpad_core::config`). Attribute lookups are passed in as a closure so the
//! same code serves DOM elements and replay traces.

use std::str::FromStr;
use vpad_core::ZOMBIE_TIMEOUT_MS;
use vpad_core::config::{clamped_or, keyword_or_default, non_negative_or, positive_or};

/// How the joystick picks its center on engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoystickMode {
    /// Fixed at the control's geometric center.
    Static,
    /// Anchored at the first touch, caught again when close enough.
    Semi,
    /// Re-anchored at every touch.
    #[default]
    Dynamic,
}

impl FromStr for JoystickMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Self::Static),
            "semi" => Ok(Self::Semi),
            "dynamic" => Ok(Self::Dynamic),
            _ => Err(format!("unknown joystick mode: {s}")),
        }
    }
}

/// Boundary the nub is clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoystickShape {
    #[default]
    Circle,
    Square,
}

impl FromStr for JoystickShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "circle" => Ok(Self::Circle),
            "square" => Ok(Self::Square),
            _ => Err(format!("unknown joystick shape: {s}")),
        }
    }
}

// ─── Joystick ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct JoystickOptions {
    pub mode: JoystickMode,
    pub shape: JoystickShape,
    /// Diameter in pixels; the travel radius is half of it.
    pub size: f64,
    /// Normalized deadzone in `0.0 ..= 1.0`.
    pub threshold: f64,
    pub lock_x: bool,
    pub lock_y: bool,
    /// Semi mode: how close a new touch must land to reuse the anchor.
    pub catch_distance: f64,
    /// Snap the nub back to center on release.
    pub rest_on_release: bool,
    pub idle_timeout: f64,
}

impl Default for JoystickOptions {
    fn default() -> Self {
        Self {
            mode: JoystickMode::default(),
            shape: JoystickShape::default(),
            size: 100.0,
            threshold: 0.1,
            lock_x: false,
            lock_y: false,
            catch_distance: 50.0,
            rest_on_release: true,
            idle_timeout: ZOMBIE_TIMEOUT_MS,
        }
    }
}

impl JoystickOptions {
    pub fn from_attributes(attr: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            mode: keyword_or_default(attr("mode").as_deref()),
            shape: keyword_or_default(attr("shape").as_deref()),
            size: positive_or(attr("size").as_deref(), d.size),
            threshold: clamped_or(attr("threshold").as_deref(), d.threshold, 0.0, 1.0),
            lock_x: attr("lock-x").is_some(),
            lock_y: attr("lock-y").is_some(),
            catch_distance: non_negative_or(attr("catch-distance").as_deref(), d.catch_distance),
            rest_on_release: attr("no-rest").is_none(),
            idle_timeout: positive_or(attr("idle-timeout").as_deref(), d.idle_timeout),
        }
    }

    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }
}

// ─── Buttons ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonOptions {
    pub size: f64,
    pub idle_timeout: f64,
}

impl Default for ButtonOptions {
    fn default() -> Self {
        Self {
            size: 64.0,
            idle_timeout: ZOMBIE_TIMEOUT_MS,
        }
    }
}

impl ButtonOptions {
    pub fn from_attributes(attr: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            size: positive_or(attr("size").as_deref(), d.size),
            idle_timeout: positive_or(attr("idle-timeout").as_deref(), d.idle_timeout),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeOptions {
    pub size: f64,
    /// Milliseconds from press to 100 %.
    pub charge_time: f64,
    /// Percent required for a release to count as activated.
    pub min_charge: f64,
    pub idle_timeout: f64,
}

impl Default for ChargeOptions {
    fn default() -> Self {
        Self {
            size: 64.0,
            charge_time: 800.0,
            min_charge: 0.0,
            idle_timeout: ZOMBIE_TIMEOUT_MS,
        }
    }
}

impl ChargeOptions {
    pub fn from_attributes(attr: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            size: positive_or(attr("size").as_deref(), d.size),
            charge_time: positive_or(attr("charge-time").as_deref(), d.charge_time),
            min_charge: clamped_or(attr("min-charge").as_deref(), d.min_charge, 0.0, 100.0),
            idle_timeout: positive_or(attr("idle-timeout").as_deref(), d.idle_timeout),
        }
    }
}
