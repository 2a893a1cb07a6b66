//! DOM-bound controls: the bridge owns every listener and the frame loop.

use crate::{convert, dom, find_id, logger};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use vpad_controls::{
    ButtonOptions, ChargeOptions, ControlEvent, ControlId, Deck, Emitted, JoystickOptions,
};
use vpad_core::{ListenerFamily, Phase};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlElement};

type Handler = Closure<dyn FnMut(Event)>;

/// Element listeners of one attached control.
struct Binding {
    element: HtmlElement,
    handlers: Vec<(&'static str, Handler)>,
}

/// Everything behind the JS handle. Closures hold `Weak` references back
/// here, so dropping the handle tears the whole graph down.
#[derive(Default)]
struct Host {
    deck: Deck,
    bindings: BTreeMap<ControlId, Binding>,
    document_handlers: BTreeMap<ListenerFamily, Vec<(&'static str, Handler)>>,
    visibility_handler: Option<Handler>,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
    frame_request: Option<i32>,
}

/// Semantic events waiting to be dispatched once the host borrow ends.
type Outbox = Vec<(HtmlElement, ControlEvent)>;

impl Host {
    /// Apply visual updates and datasets; hand back what must be dispatched.
    fn deliver(&mut self, emitted: Vec<Emitted>) -> Outbox {
        let mut outbox = Outbox::new();
        let mut touched = Vec::new();
        for Emitted { control, event } in emitted {
            let Some(binding) = self.bindings.get(&control) else {
                continue;
            };
            if !touched.contains(&control) {
                touched.push(control);
            }
            match event {
                ControlEvent::Visual(update) => {
                    if let Err(e) = dom::apply_visual(&binding.element, &update) {
                        log::warn!("visual update failed: {e:?}");
                    }
                }
                other => outbox.push((binding.element.clone(), other)),
            }
        }
        for id in touched {
            if let (Some(binding), Some(ds)) = (self.bindings.get(&id), self.deck.dataset(id))
                && let Err(e) = dom::write_dataset(&binding.element, ds)
            {
                log::warn!("dataset write failed: {e:?}");
            }
        }
        outbox
    }

    /// Attach or detach document listeners after reference-count changes.
    fn sync_document_listeners(&mut self, weak: &Weak<RefCell<Host>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        for change in self.deck.take_listener_changes() {
            if change.attached {
                let handlers: Vec<(&'static str, Handler)> = change
                    .family
                    .event_names()
                    .iter()
                    .map(|&name| (name, document_handler(weak.clone())))
                    .collect();
                for (name, handler) in &handlers {
                    let _ = document
                        .add_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
                }
                self.document_handlers.insert(change.family, handlers);
            } else if let Some(handlers) = self.document_handlers.remove(&change.family) {
                for (name, handler) in &handlers {
                    let callback = handler.as_ref().unchecked_ref();
                    let _ = document.remove_event_listener_with_callback(name, callback);
                }
            }
        }
    }

    /// Keep one animation frame requested while the deck needs frames.
    fn schedule_frame(&mut self) {
        if self.frame_request.is_some() || !self.deck.needs_frame() {
            return;
        }
        let (Some(window), Some(callback)) = (web_sys::window(), self.frame_callback.as_ref())
        else {
            return;
        };
        match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            Ok(handle) => self.frame_request = Some(handle),
            Err(e) => log::warn!("requestAnimationFrame failed: {e:?}"),
        }
    }

    fn cancel_frame(&mut self) {
        if let (Some(handle), Some(window)) = (self.frame_request.take(), web_sys::window()) {
            let _ = window.cancel_animation_frame(handle);
        }
    }

    fn unbind(&mut self, id: ControlId) {
        if let Some(binding) = self.bindings.remove(&id) {
            for (name, handler) in &binding.handlers {
                let _ = binding
                    .element
                    .remove_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
            }
        }
    }

    /// Housekeeping after every deck operation.
    fn settle(&mut self, weak: &Weak<RefCell<Host>>, emitted: Vec<Emitted>) -> Outbox {
        self.sync_document_listeners(weak);
        self.schedule_frame();
        self.deliver(emitted)
    }
}

fn dispatch_all(outbox: Outbox) {
    for (element, event) in outbox {
        if let Err(e) = dom::dispatch(&element, &event) {
            log::warn!("dispatch {} failed: {e:?}", event.name());
        }
    }
}

/// Run `f` against the host unless it is gone or already borrowed (a JS
/// listener re-entering the bridge), then dispatch outside the borrow.
fn with_host(weak: &Weak<RefCell<Host>>, f: impl FnOnce(&mut Host) -> Vec<Emitted>) {
    let Some(rc) = weak.upgrade() else {
        return;
    };
    let outbox = match rc.try_borrow_mut() {
        Ok(mut host) => {
            let emitted = f(&mut host);
            host.settle(weak, emitted)
        }
        Err(_) => {
            log::debug!("re-entrant event ignored");
            return;
        }
    };
    dispatch_all(outbox);
}

fn element_handler(weak: Weak<RefCell<Host>>, id: ControlId) -> Handler {
    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(raw) = convert::raw_event(&event) else {
            return;
        };
        event.prevent_default();
        let now = event.time_stamp();
        with_host(&weak, |host| {
            // Layout may have changed since the last gesture
            if raw.phase() == Phase::Start
                && let Some(binding) = host.bindings.get(&id)
            {
                let frame = dom::read_frame(&binding.element);
                host.deck.set_bounds(id, frame.rect);
                host.deck.set_transform(id, frame.transform);
            }
            host.deck.handle_input(id, &raw, now)
        });
    })
}

fn document_handler(weak: Weak<RefCell<Host>>) -> Handler {
    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(raw) = convert::raw_event(&event) else {
            return;
        };
        let now = event.time_stamp();
        with_host(&weak, |host| host.deck.handle_document(&raw, now));
    })
}

/// The main WASM-facing controller.
#[wasm_bindgen]
pub struct VirtualControls {
    host: Rc<RefCell<Host>>,
}

impl Default for VirtualControls {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl VirtualControls {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        logger::console_error_panic_hook_setup();
        logger::init(log::LevelFilter::Warn);

        let host = Rc::new(RefCell::new(Host::default()));
        let weak = Rc::downgrade(&host);

        let frame_weak = weak.clone();
        let frame_callback = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
            with_host(&frame_weak, |host| {
                host.frame_request = None;
                host.deck.frame(now)
            });
        });

        let visibility_weak = weak.clone();
        let visibility_handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let hidden = web_sys::window()
                .and_then(|w| w.document())
                .is_some_and(|d| d.hidden());
            let now = event.time_stamp();
            with_host(&visibility_weak, |host| host.deck.set_hidden(hidden, now));
        });
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                visibility_handler.as_ref().unchecked_ref(),
            );
        }

        {
            let mut h = host.borrow_mut();
            h.frame_callback = Some(frame_callback);
            h.visibility_handler = Some(visibility_handler);
        }
        Self { host }
    }

    // ─── Bound controls ──────────────────────────────────────────────────

    /// Bind a joystick to `element`, configured from its attributes.
    pub fn attach_joystick(&self, element: HtmlElement) -> u32 {
        let options = JoystickOptions::from_attributes(|name| element.get_attribute(name));
        let id = self.host.borrow_mut().deck.add_joystick(options);
        self.bind(id, element)
    }

    pub fn attach_action_button(&self, element: HtmlElement) -> u32 {
        let options = ButtonOptions::from_attributes(|name| element.get_attribute(name));
        let id = self.host.borrow_mut().deck.add_action_button(options);
        self.bind(id, element)
    }

    pub fn attach_charge_button(&self, element: HtmlElement) -> u32 {
        let options = ChargeOptions::from_attributes(|name| element.get_attribute(name));
        let id = self.host.borrow_mut().deck.add_charge_button(options);
        self.bind(id, element)
    }

    /// Tear a control down, bound or not.
    pub fn remove(&self, control: u32) -> bool {
        let weak = Rc::downgrade(&self.host);
        let mut host = self.host.borrow_mut();
        let Some(id) = find_id(&host.deck, control) else {
            return false;
        };
        host.unbind(id);
        let removed = host.deck.remove(id);
        host.sync_document_listeners(&weak);
        if !host.deck.needs_frame() {
            host.cancel_frame();
        }
        removed
    }

    /// Latest polling values of an attached control as a JSON object.
    pub fn get_dataset_json(&self, control: u32) -> String {
        let host = self.host.borrow();
        find_id(&host.deck, control)
            .and_then(|id| host.deck.dataset(id))
            .and_then(|ds| serde_json::to_string(ds).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    pub fn is_active(&self) -> bool {
        self.host.borrow().deck.is_active()
    }
}

impl VirtualControls {
    fn bind(&self, id: ControlId, element: HtmlElement) -> u32 {
        let weak = Rc::downgrade(&self.host);
        let handlers: Vec<(&'static str, Handler)> =
            convert::element_events(convert::supports_pointer_events())
                .iter()
                .map(|&name| (name, element_handler(weak.clone(), id)))
                .collect();
        for (name, handler) in &handlers {
            if let Err(e) =
                element.add_event_listener_with_callback(name, handler.as_ref().unchecked_ref())
            {
                log::warn!("listen {name} failed: {e:?}");
            }
        }

        let mut host = self.host.borrow_mut();
        let frame = dom::read_frame(&element);
        host.deck.set_bounds(id, frame.rect);
        host.deck.set_transform(id, frame.transform);
        if let Some(ds) = host.deck.dataset(id) {
            let _ = dom::write_dataset(&element, ds);
        }
        host.bindings.insert(id, Binding { element, handlers });
        log::debug!("bound control {id:?}");
        id.raw()
    }
}

impl Drop for VirtualControls {
    fn drop(&mut self) {
        let Ok(mut host) = self.host.try_borrow_mut() else {
            return;
        };
        host.cancel_frame();
        let ids: Vec<ControlId> = host.bindings.keys().copied().collect();
        for id in ids {
            host.unbind(id);
        }
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            for (name, handler) in host.document_handlers.values().flatten() {
                let _ = document
                    .remove_event_listener_with_callback(name, handler.as_ref().unchecked_ref());
            }
            if let Some(handler) = host.visibility_handler.as_ref() {
                let _ = document.remove_event_listener_with_callback(
                    "visibilitychange",
                    handler.as_ref().unchecked_ref(),
                );
            }
        }
    }
}

