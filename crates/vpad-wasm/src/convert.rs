//! DOM events → `RawInputEvent`.

use vpad_core::{Contact, Phase, RawInputEvent};
use wasm_bindgen::JsCast;
use web_sys::{Event, MouseEvent, PointerEvent, TouchEvent};

/// Lifecycle phase encoded in a DOM event type.
pub fn phase_of(event_type: &str) -> Option<Phase> {
    match event_type {
        "pointerdown" | "touchstart" | "mousedown" => Some(Phase::Start),
        "pointermove" | "touchmove" | "mousemove" => Some(Phase::Move),
        "pointerup" | "touchend" | "mouseup" => Some(Phase::End),
        "pointercancel" | "touchcancel" => Some(Phase::Cancel),
        _ => None,
    }
}

/// Element-level events to listen for. Pointer events cover touch, mouse
/// and pen; without them, touch plus mouse is the fallback. Listening to
/// both would start every contact twice.
pub fn element_events(supports_pointer: bool) -> &'static [&'static str] {
    if supports_pointer {
        &["pointerdown"]
    } else {
        &["touchstart", "touchmove", "touchend", "touchcancel", "mousedown"]
    }
}

/// Whether the browser exposes `PointerEvent`.
pub fn supports_pointer_events() -> bool {
    web_sys::window()
        .is_some_and(|w| js_sys::Reflect::has(&w, &"PointerEvent".into()).unwrap_or(false))
}

/// Normalize a pointer, touch or mouse event. Anything else is `None`.
///
/// Pointer events are checked first: a `PointerEvent` is also a
/// `MouseEvent`.
pub fn raw_event(event: &Event) -> Option<RawInputEvent> {
    let phase = phase_of(&event.type_())?;

    if let Some(ev) = event.dyn_ref::<PointerEvent>() {
        return Some(RawInputEvent::pointer(
            phase,
            ev.pointer_id(),
            f64::from(ev.client_x()),
            f64::from(ev.client_y()),
        ));
    }
    if let Some(ev) = event.dyn_ref::<TouchEvent>() {
        let list = ev.changed_touches();
        let contacts = (0..list.length()).filter_map(|i| list.get(i)).map(|t| {
            Contact::new(
                t.identifier(),
                f64::from(t.client_x()),
                f64::from(t.client_y()),
            )
        });
        return Some(RawInputEvent::touch(phase, contacts));
    }
    if let Some(ev) = event.dyn_ref::<MouseEvent>() {
        return Some(RawInputEvent::mouse(
            phase,
            f64::from(ev.client_x()),
            f64::from(ev.client_y()),
        ));
    }
    None
}
