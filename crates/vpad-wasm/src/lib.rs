//! WASM bridge for vpad. Exposes the virtual controls to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Two entry points:
//!
//! - [`VirtualControls`]: binds controls to DOM elements. The bridge installs
//!   its own element, document and `visibilitychange` listeners, runs a
//!   `requestAnimationFrame` loop while frame work is pending, and reports
//!   through `CustomEvent`s plus `data-*` attributes on the element.
//! - [`ControlDeck`]: no DOM access. JS feeds events and frames itself and
//!   every call returns the emitted events as a JSON array.

mod bound;
mod convert;
mod dom;
mod logger;

pub use bound::VirtualControls;

use std::collections::BTreeMap;
use vpad_controls::{ButtonOptions, ChargeOptions, ControlId, Deck, Emitted, JoystickOptions};
use vpad_core::{Contact, Phase, RawInputEvent, parse_css_transform};
use wasm_bindgen::prelude::*;

/// Set the console log level (`"trace"` … `"off"`) for every instance.
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::init(logger::parse_level(level));
}

/// A deck driven entirely from JavaScript.
#[wasm_bindgen]
pub struct ControlDeck {
    deck: Deck,
}

impl Default for ControlDeck {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ControlDeck {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        logger::console_error_panic_hook_setup();
        logger::init(log::LevelFilter::Warn);
        Self { deck: Deck::new() }
    }

    /// Add a joystick. `attrs` is a JSON object of attribute strings, e.g.
    /// `{"mode":"static","size":"120"}`.
    pub fn add_joystick(&mut self, attrs: &str) -> Result<u32, JsValue> {
        let attrs = parse_attrs(attrs).map_err(|e| JsValue::from_str(&e))?;
        let options = JoystickOptions::from_attributes(|k| attrs.get(k).cloned());
        Ok(self.deck.add_joystick(options).raw())
    }

    pub fn add_action_button(&mut self, attrs: &str) -> Result<u32, JsValue> {
        let attrs = parse_attrs(attrs).map_err(|e| JsValue::from_str(&e))?;
        let options = ButtonOptions::from_attributes(|k| attrs.get(k).cloned());
        Ok(self.deck.add_action_button(options).raw())
    }

    pub fn add_charge_button(&mut self, attrs: &str) -> Result<u32, JsValue> {
        let attrs = parse_attrs(attrs).map_err(|e| JsValue::from_str(&e))?;
        let options = ChargeOptions::from_attributes(|k| attrs.get(k).cloned());
        Ok(self.deck.add_charge_button(options).raw())
    }

    pub fn remove(&mut self, control: u32) -> bool {
        find_id(&self.deck, control).is_some_and(|id| self.deck.remove(id))
    }

    /// Pointer event on one control (`phase`: start/move/end/cancel).
    /// Returns the emitted events as JSON.
    pub fn handle_pointer(
        &mut self,
        control: u32,
        phase: &str,
        pointer_id: i32,
        x: f64,
        y: f64,
        now: f64,
    ) -> String {
        let (Some(phase), Some(id)) = (parse_phase(phase), find_id(&self.deck, control)) else {
            return "[]".to_string();
        };
        let raw = RawInputEvent::pointer(phase, pointer_id, x, y);
        to_json(&self.deck.handle_input(id, &raw, now))
    }

    /// Touch event on one control. `touches` is a JSON array of
    /// `{"identifier":1,"x":0,"y":0}` (the changed touches only).
    pub fn handle_touch(
        &mut self,
        control: u32,
        phase: &str,
        touches: &str,
        now: f64,
    ) -> Result<String, JsValue> {
        let contacts: Vec<Contact> = serde_json::from_str(touches)
            .map_err(|e| JsValue::from_str(&format!("invalid touches: {e}")))?;
        let (Some(phase), Some(id)) = (parse_phase(phase), find_id(&self.deck, control)) else {
            return Ok("[]".to_string());
        };
        let raw = RawInputEvent::touch(phase, contacts);
        Ok(to_json(&self.deck.handle_input(id, &raw, now)))
    }

    /// Document-level pointer event, seen by every control.
    pub fn handle_document_pointer(
        &mut self,
        phase: &str,
        pointer_id: i32,
        x: f64,
        y: f64,
        now: f64,
    ) -> String {
        let Some(phase) = parse_phase(phase) else {
            return "[]".to_string();
        };
        let raw = RawInputEvent::pointer(phase, pointer_id, x, y);
        to_json(&self.deck.handle_document(&raw, now))
    }

    /// Run due frame work.
    pub fn frame(&mut self, now: f64) -> String {
        to_json(&self.deck.frame(now))
    }

    /// Release contacts whose end never arrived. Controls also do this
    /// themselves when a new contact is blocked by a stale one.
    pub fn check_zombies(&mut self, now: f64) -> String {
        to_json(&self.deck.check_zombies(now))
    }

    pub fn set_hidden(&mut self, hidden: bool, now: f64) -> String {
        to_json(&self.deck.set_hidden(hidden, now))
    }

    pub fn set_bounds(&mut self, control: u32, x: f64, y: f64, width: f64, height: f64) {
        if let Some(id) = find_id(&self.deck, control) {
            self.deck
                .set_bounds(id, kurbo::Rect::new(x, y, x + width, y + height));
        }
    }

    /// Set the computed CSS transform. Returns `false` if it does not parse.
    pub fn set_transform(&mut self, control: u32, css: &str) -> bool {
        match (parse_css_transform(css), find_id(&self.deck, control)) {
            (Some(transform), Some(id)) => {
                self.deck.set_transform(id, transform);
                true
            }
            _ => false,
        }
    }

    /// Latest polling values as a JSON object.
    pub fn get_dataset_json(&self, control: u32) -> String {
        find_id(&self.deck, control)
            .and_then(|id| self.deck.dataset(id))
            .and_then(|ds| serde_json::to_string(ds).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    /// Document listener changes since the last call, as JSON:
    /// `[{"events":["pointermove",...],"attached":true}]`.
    pub fn take_listener_changes_json(&mut self) -> String {
        let changes: Vec<serde_json::Value> = self
            .deck
            .take_listener_changes()
            .into_iter()
            .map(|c| {
                serde_json::json!({
                    "events": c.family.event_names(),
                    "attached": c.attached,
                })
            })
            .collect();
        serde_json::Value::Array(changes).to_string()
    }

    pub fn needs_frame(&self) -> bool {
        self.deck.needs_frame()
    }

    pub fn is_active(&self) -> bool {
        self.deck.is_active()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

pub(crate) fn find_id(deck: &Deck, raw: u32) -> Option<ControlId> {
    deck.ids().find(|id| id.raw() == raw)
}

fn parse_phase(name: &str) -> Option<Phase> {
    match name {
        "start" => Some(Phase::Start),
        "move" => Some(Phase::Move),
        "end" => Some(Phase::End),
        "cancel" => Some(Phase::Cancel),
        _ => None,
    }
}

fn parse_attrs(json: &str) -> Result<BTreeMap<String, String>, String> {
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(json).map_err(|e| format!("invalid attributes: {e}"))
}

fn to_json(emitted: &[Emitted]) -> String {
    serde_json::to_string(emitted).unwrap_or_else(|e| {
        log::error!("serialize events: {e}");
        "[]".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn attrs_accept_empty_and_objects() {
        assert!(parse_attrs("").expect("empty is ok").is_empty());
        let attrs = parse_attrs(r#"{"mode":"static","no-rest":""}"#).expect("valid");
        assert_eq!(attrs.get("mode").map(String::as_str), Some("static"));
        assert!(parse_attrs("[1, 2]").is_err());
    }

    #[test]
    fn phase_names() {
        assert_eq!(parse_phase("start"), Some(Phase::Start));
        assert_eq!(parse_phase("cancel"), Some(Phase::Cancel));
        assert_eq!(parse_phase("hover"), None);
    }

    #[test]
    fn manual_deck_reports_json() {
        let mut deck = ControlDeck::new();
        let id = deck.add_action_button("{}").expect("valid attrs");
        let json = deck.handle_pointer(id, "start", 1, 0.0, 0.0, 3.0);
        assert!(json.contains(r#""type":"button-press""#), "{json}");
        assert_eq!(deck.get_dataset_json(id), r#"{"pressed":"true"}"#);

        let changes = deck.take_listener_changes_json();
        assert!(changes.contains("pointermove"), "{changes}");
        assert_eq!(deck.handle_pointer(99, "start", 1, 0.0, 0.0, 4.0), "[]");
    }

    #[test]
    fn touch_json_is_parsed() {
        let mut deck = ControlDeck::new();
        let id = deck.add_charge_button(r#"{"charge-time":"100"}"#).expect("valid attrs");
        let json = deck
            .handle_touch(id, "start", r#"[{"identifier":4,"x":1,"y":2}]"#, 0.0)
            .expect("valid touches");
        assert!(json.contains("charge-start"), "{json}");
        assert!(deck.needs_frame());
    }
}
