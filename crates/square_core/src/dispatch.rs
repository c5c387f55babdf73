//! Event dispatch
//!
//! Components subscribe handlers per [`EventKind`]. Handlers for a kind run
//! in registration order; a handler may call
//! [`EventContext::prevent_default`] to suppress the host's default action
//! (link navigation, form submission).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use square_platform::{EventKind, PageEvent};

use crate::clock::Millis;

new_key_type! {
    /// Handle to a registered event handler
    pub struct HandlerId;
}

/// Per-dispatch context handed to each handler
#[derive(Debug)]
pub struct EventContext {
    now: Millis,
    default_prevented: Cell<bool>,
}

impl EventContext {
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            default_prevented: Cell::new(false),
        }
    }

    /// Time the event was dispatched
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Suppress the host's default action for this event
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Result of dispatching one event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Number of handlers that ran
    pub handled: usize,
    /// Whether any handler prevented the default action
    pub default_prevented: bool,
}

/// Event handler callback
pub type Handler = Rc<dyn Fn(&PageEvent, &EventContext)>;

#[derive(Default)]
struct DispatcherInner {
    handlers: SlotMap<HandlerId, (EventKind, Handler)>,
    by_kind: FxHashMap<EventKind, SmallVec<[HandlerId; 4]>>,
}

/// Shared event dispatcher (cheap to clone)
#[derive(Clone, Default)]
pub struct EventDispatcher {
    inner: Rc<RefCell<DispatcherInner>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event kind
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&PageEvent, &EventContext) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.handlers.insert((kind, Rc::new(handler)));
        inner.by_kind.entry(kind).or_default().push(id);
        id
    }

    /// Remove a handler
    pub fn off(&self, id: HandlerId) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let removed = inner.handlers.remove(id);
            if let Some((kind, _)) = &removed {
                if let Some(list) = inner.by_kind.get_mut(kind) {
                    list.retain(|h| *h != id);
                }
            }
            removed
        };
        removed.is_some()
    }

    /// Number of handlers registered for a kind
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .by_kind
            .get(&kind)
            .map_or(0, |list| list.len())
    }

    /// Total registered handlers
    pub fn len(&self) -> usize {
        self.inner.borrow().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every handler
    pub fn clear(&self) {
        let drained = {
            let mut inner = self.inner.borrow_mut();
            inner.by_kind.clear();
            let ids: Vec<HandlerId> = inner.handlers.keys().collect();
            ids.into_iter()
                .filter_map(|id| inner.handlers.remove(id))
                .collect::<Vec<_>>()
        };
        drop(drained);
    }

    /// Deliver an event to every handler of its kind
    ///
    /// Handlers registered during dispatch do not see the current event;
    /// handlers removed during dispatch are skipped.
    pub fn dispatch(&self, event: &PageEvent, ctx: &EventContext) -> DispatchOutcome {
        let snapshot: SmallVec<[(HandlerId, Handler); 4]> = {
            let inner = self.inner.borrow();
            match inner.by_kind.get(&event.kind()) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| inner.handlers.get(*id).map(|(_, h)| (*id, h.clone())))
                    .collect(),
                None => SmallVec::new(),
            }
        };

        let mut handled = 0;
        for (id, handler) in snapshot {
            if !self.inner.borrow().handlers.contains_key(id) {
                continue;
            }
            handler(event, ctx);
            handled += 1;
        }

        DispatchOutcome {
            handled,
            default_prevented: ctx.is_default_prevented(),
        }
    }
}
