//! Element side effects: state classes, CSS variables, `data-*` attributes
//! and `CustomEvent` dispatch.
//!
//! Stylesheet contract: `--anchor-x` / `--anchor-y` center the stick base.
//! While the element has `fixed-anchor` (dynamic mode) they are viewport
//! pixels for a `position: fixed` base; otherwise they are element-local.

use kurbo::Rect;
use vpad_controls::{ControlEvent, Dataset, VisualUpdate};
use vpad_core::{LocalFrame, parse_css_transform};
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit, HtmlElement};

/// One DOM change derived from a visual update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Class(&'static str, bool),
    Style(&'static str, String),
}

/// Map a visual update onto classes and CSS custom properties.
pub fn effects(update: &VisualUpdate) -> Vec<Effect> {
    match update {
        VisualUpdate::Engaged { active } => vec![Effect::Class("active", *active)],
        VisualUpdate::Pressed { pressed } => vec![Effect::Class("pressed", *pressed)],
        VisualUpdate::FullyCharged { charged } => vec![Effect::Class("charged", *charged)],
        VisualUpdate::Nub { offset } => vec![
            Effect::Style("--nub-x", format!("{}px", offset.x)),
            Effect::Style("--nub-y", format!("{}px", offset.y)),
        ],
        // Dynamic bases are `position: fixed`; the others sit inside the element
        VisualUpdate::Anchor {
            viewport,
            local,
            fixed,
        } => {
            let at = if *fixed { viewport } else { local };
            vec![
                Effect::Class("fixed-anchor", *fixed),
                Effect::Style("--anchor-x", format!("{}px", at.x)),
                Effect::Style("--anchor-y", format!("{}px", at.y)),
            ]
        }
        VisualUpdate::ChargeRing { percent, color } => vec![
            Effect::Style("--charge-percent", percent.to_string()),
            Effect::Style("--charge-color", color.clone()),
        ],
    }
}

pub fn apply_visual(element: &HtmlElement, update: &VisualUpdate) -> Result<(), JsValue> {
    for effect in effects(update) {
        match effect {
            Effect::Class(name, on) => {
                element.class_list().toggle_with_force(name, on)?;
            }
            Effect::Style(prop, value) => element.style().set_property(prop, &value)?,
        }
    }
    Ok(())
}

pub fn write_dataset(element: &HtmlElement, dataset: &Dataset) -> Result<(), JsValue> {
    let map = element.dataset();
    for (key, value) in dataset.iter() {
        map.set(key, value)?;
    }
    Ok(())
}

/// The `detail` payload of a control event as a JSON string.
pub fn detail_json(event: &ControlEvent) -> Result<String, String> {
    let value =
        serde_json::to_value(event).map_err(|e| format!("serialize {}: {e}", event.name()))?;
    Ok(value
        .get("detail")
        .map(ToString::to_string)
        .unwrap_or_else(|| "null".to_string()))
}

/// Dispatch a semantic event as a bubbling, composed `CustomEvent`.
pub fn dispatch(element: &HtmlElement, event: &ControlEvent) -> Result<(), JsValue> {
    let detail = detail_json(event).map_err(|e| JsValue::from_str(&e))?;
    let init = CustomEventInit::new();
    init.set_bubbles(true);
    init.set_composed(true);
    init.set_detail(&js_sys::JSON::parse(&detail)?);
    let custom = CustomEvent::new_with_event_init_dict(event.name(), &init)?;
    element.dispatch_event(&custom)?;
    Ok(())
}

/// Current bounding box and computed transform of `element`.
pub fn read_frame(element: &HtmlElement) -> LocalFrame {
    let r = element.get_bounding_client_rect();
    let rect = Rect::new(r.x(), r.y(), r.x() + r.width(), r.y() + r.height());
    let transform = web_sys::window()
        .and_then(|w| w.get_computed_style(element).ok().flatten())
        .and_then(|style| style.get_property_value("transform").ok())
        .and_then(|css| parse_css_transform(&css));
    match transform {
        Some(t) => LocalFrame::new(rect).with_transform(t),
        None => LocalFrame::new(rect),
    }
}
