//! Reference-counted document-level listeners.
//!
//! Pointer and mouse contacts keep reporting moves and ends to the document
//! after they leave a control, so each active contact needs a document
//! listener for its family. Many controls share one registry; the host only
//! installs a real listener on the first acquire and removes it on the last
//! release.

use std::cell::RefCell;
use std::rc::Rc;

/// Event family that needs document-level move/end listeners.
/// Touch events stay bound to their target and need none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListenerFamily {
    Pointer,
    Mouse,
}

impl ListenerFamily {
    /// DOM event names the host attaches for this family.
    pub fn event_names(self) -> &'static [&'static str] {
        match self {
            Self::Pointer => &["pointermove", "pointerup", "pointercancel"],
            Self::Mouse => &["mousemove", "mouseup"],
        }
    }
}

/// A listener family crossed the 0↔1 boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerChange {
    pub family: ListenerFamily,
    pub attached: bool,
}

/// Counts holders per family and queues attach/detach transitions.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    pointer: usize,
    mouse: usize,
    pending: Vec<ListenerChange>,
}

/// The registry is shared by every tracker of one host (single-threaded).
pub type SharedListeners = Rc<RefCell<ListenerRegistry>>;

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedListeners {
        Rc::new(RefCell::new(Self::new()))
    }

    fn slot(&mut self, family: ListenerFamily) -> &mut usize {
        match family {
            ListenerFamily::Pointer => &mut self.pointer,
            ListenerFamily::Mouse => &mut self.mouse,
        }
    }

    pub fn acquire(&mut self, family: ListenerFamily) {
        let count = self.slot(family);
        *count += 1;
        if *count == 1 {
            log::debug!("attach document listeners: {family:?}");
            self.pending.push(ListenerChange {
                family,
                attached: true,
            });
        }
    }

    /// Release one hold. Releasing an unheld family is a no-op.
    pub fn release(&mut self, family: ListenerFamily) {
        let count = self.slot(family);
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            log::debug!("detach document listeners: {family:?}");
            self.pending.push(ListenerChange {
                family,
                attached: false,
            });
        }
    }

    pub fn count(&self, family: ListenerFamily) -> usize {
        match family {
            ListenerFamily::Pointer => self.pointer,
            ListenerFamily::Mouse => self.mouse,
        }
    }

    pub fn is_attached(&self, family: ListenerFamily) -> bool {
        self.count(family) > 0
    }

    /// Drain queued transitions in the order they happened.
    pub fn take_changes(&mut self) -> Vec<ListenerChange> {
        std::mem::take(&mut self.pending)
    }
}
