//! Notification (toast) manager
//!
//! Each notification is an element appended to the page that auto-dismisses
//! after a fixed time. Lifecycle:
//!
//! ```text
//! Visible --(timeout | dismiss)--> Exiting --(exit complete)--> Removed
//! ```
//!
//! Concurrent notifications are independent; each owns its timer pair.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use square_core::{Millis, TimerId};
use square_platform::ElementId;

use crate::config::ToastConfig;
use crate::context::ComponentContext;

const NOTIFICATION_CSS: &str = "\
.notification { position: fixed; top: 100px; right: 20px; z-index: 10000; max-width: 400px; \
padding: 1rem 1.5rem; border-radius: 8px; color: #fff; box-shadow: 0 10px 30px rgba(0, 0, 0, 0.2); \
transform: translateX(120%); transition: transform 0.3s ease, opacity 0.3s ease; }
.notification.show { transform: translateX(0); }
.notification.hide { transform: translateX(120%); opacity: 0; }
.notification-success { background: #10b981; }
.notification-error { background: #ef4444; }
.notification-info { background: #3b82f6; }
";

/// Notification severity (styling only)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    #[default]
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Severity::Success),
            "error" => Ok(Severity::Error),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Handle to a shown notification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

/// Notification lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotificationState {
    /// On screen, waiting for its timeout
    #[default]
    Visible,
    /// Exit transition is playing
    Exiting,
    /// Element detached
    Removed,
}

/// Events driving [`NotificationState`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Timeout elapsed or dismissed early
    Dismiss,
    /// Exit transition finished
    ExitComplete,
}

impl NotificationState {
    /// Next state, or `None` if the event is ignored in this state
    pub fn on_event(&self, event: NotificationEvent) -> Option<Self> {
        use NotificationEvent::*;
        use NotificationState::*;

        match (self, event) {
            (Visible, Dismiss) => Some(Exiting),
            (Exiting, ExitComplete) => Some(Removed),
            _ => None,
        }
    }

    pub fn is_on_screen(&self) -> bool {
        !matches!(self, NotificationState::Removed)
    }
}

/// A notification's bookkeeping
#[derive(Clone, Debug)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub created_at: Millis,
    pub element: ElementId,
    pub state: NotificationState,
    pending: Option<TimerId>,
}

/// Shows and retires notifications
pub struct ToastManager {
    ctx: ComponentContext,
    config: ToastConfig,
    notifications: RefCell<IndexMap<NotificationId, Notification>>,
    next_id: Cell<u64>,
    style_injected: Cell<bool>,
}

impl ToastManager {
    pub fn attach(ctx: &ComponentContext, config: &ToastConfig) -> Rc<Self> {
        Rc::new(Self {
            ctx: ctx.clone(),
            config: config.clone(),
            notifications: RefCell::new(IndexMap::new()),
            next_id: Cell::new(1),
            style_injected: Cell::new(false),
        })
    }

    /// Show a notification; it dismisses itself after the configured time
    pub fn show(self: &Rc<Self>, message: &str, severity: Severity) -> NotificationId {
        let page = &self.ctx.page;
        if !self.style_injected.replace(true) {
            page.inject_style(&self.config.style_id, NOTIFICATION_CSS);
        }

        let severity_class = format!("notification-{}", severity);
        let element = page.append_element("div", &["notification", severity_class.as_str()]);
        page.set_text(element, message);
        let role = if severity == Severity::Error { "alert" } else { "status" };
        page.set_attribute(element, "role", role);
        page.add_class(element, "show");

        let id = NotificationId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let weak = Rc::downgrade(self);
        let timer = self.ctx.timers.after(self.config.dismiss_after_ms, move || {
            if let Some(manager) = weak.upgrade() {
                manager.begin_exit(id);
            }
        });

        self.notifications.borrow_mut().insert(
            id,
            Notification {
                id,
                message: message.to_string(),
                severity,
                created_at: self.ctx.now(),
                element,
                state: NotificationState::Visible,
                pending: Some(timer),
            },
        );
        tracing::debug!("notification {:?} ({}): {}", id, severity, message);
        id
    }

    /// Start the exit transition now
    ///
    /// Returns `false` if the notification is already exiting or gone.
    pub fn dismiss(self: &Rc<Self>, id: NotificationId) -> bool {
        self.begin_exit(id)
    }

    fn begin_exit(self: &Rc<Self>, id: NotificationId) -> bool {
        let (element, previous) = {
            let mut notifications = self.notifications.borrow_mut();
            let Some(n) = notifications.get_mut(&id) else {
                return false;
            };
            let Some(next) = n.state.on_event(NotificationEvent::Dismiss) else {
                return false;
            };
            n.state = next;
            (n.element, n.pending.take())
        };

        let page = &self.ctx.page;
        page.remove_class(element, "show");
        page.add_class(element, "hide");

        let weak = Rc::downgrade(self);
        let timer = self.ctx.timers.replace(previous, |timers| {
            timers.after(self.config.exit_duration_ms, move || {
                if let Some(manager) = weak.upgrade() {
                    manager.finish(id);
                }
            })
        });
        if let Some(n) = self.notifications.borrow_mut().get_mut(&id) {
            n.pending = Some(timer);
        }
        true
    }

    fn finish(&self, id: NotificationId) {
        let element = {
            let mut notifications = self.notifications.borrow_mut();
            let Some(n) = notifications.get_mut(&id) else {
                return;
            };
            let Some(next) = n.state.on_event(NotificationEvent::ExitComplete) else {
                return;
            };
            n.state = next;
            n.pending = None;
            let element = n.element;
            notifications.shift_remove(&id);
            element
        };
        self.ctx.page.remove_element(element);
    }

    /// Current state (`Removed` once the notification is gone)
    pub fn state(&self, id: NotificationId) -> NotificationState {
        self.notifications
            .borrow()
            .get(&id)
            .map_or(NotificationState::Removed, |n| n.state)
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.notifications.borrow().get(&id).cloned()
    }

    /// Notifications still on screen, oldest first
    pub fn active(&self) -> Vec<NotificationId> {
        self.notifications.borrow().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.notifications.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
