//! Page signals delivered by the host to the interaction layer

use crate::page::ElementId;

/// Page events
///
/// The host translates its native signals (DOM events, observer callbacks,
/// media-query changes) into these and hands them to the interaction runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum PageEvent {
    /// Document lifecycle
    Lifecycle(LifecycleEvent),
    /// Scroll position, viewport size and intersection changes
    Viewport(ViewportEvent),
    /// Pointer, click and form input
    Input(InputEvent),
    /// User preference changes (media queries)
    Preference(PreferenceEvent),
}

/// Document lifecycle events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// DOM is ready (DOMContentLoaded)
    Ready,
    /// All resources finished loading (window load)
    Load,
    /// Page visibility changed (tab switch, minimize)
    VisibilityChanged {
        /// Whether the page is now hidden
        hidden: bool,
    },
}

/// Viewport events
#[derive(Clone, Debug, PartialEq)]
pub enum ViewportEvent {
    /// The document scrolled
    Scrolled {
        /// Vertical scroll offset in CSS pixels
        scroll_y: f32,
    },
    /// The viewport was resized
    Resized {
        /// New width in CSS pixels
        width: f32,
        /// New height in CSS pixels
        height: f32,
    },
    /// An observed element crossed its intersection threshold
    Intersection(IntersectionEntry),
}

/// A single intersection observation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    /// The observed element
    pub element: ElementId,
    /// Fraction of the element inside the (margin-adjusted) viewport
    pub ratio: f32,
    /// Whether the ratio is at or above the observation threshold
    pub is_intersecting: bool,
}

/// Input events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// Pointer entered an element
    PointerEnter {
        element: ElementId,
    },
    /// Pointer left an element
    PointerLeave {
        element: ElementId,
    },
    /// An element was activated (click, tap, keyboard activation)
    Click {
        element: ElementId,
    },
    /// A form was submitted
    Submit {
        form: ElementId,
    },
}

/// User preference events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferenceEvent {
    /// `prefers-reduced-motion` changed
    ReducedMotion(bool),
}

/// Discriminant used to subscribe to a family of events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Ready,
    Load,
    Visibility,
    Scroll,
    Resize,
    Intersection,
    PointerEnter,
    PointerLeave,
    Click,
    Submit,
    ReducedMotion,
}

impl PageEvent {
    /// The subscription family this event belongs to
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::Lifecycle(LifecycleEvent::Ready) => EventKind::Ready,
            PageEvent::Lifecycle(LifecycleEvent::Load) => EventKind::Load,
            PageEvent::Lifecycle(LifecycleEvent::VisibilityChanged { .. }) => EventKind::Visibility,
            PageEvent::Viewport(ViewportEvent::Scrolled { .. }) => EventKind::Scroll,
            PageEvent::Viewport(ViewportEvent::Resized { .. }) => EventKind::Resize,
            PageEvent::Viewport(ViewportEvent::Intersection(_)) => EventKind::Intersection,
            PageEvent::Input(InputEvent::PointerEnter { .. }) => EventKind::PointerEnter,
            PageEvent::Input(InputEvent::PointerLeave { .. }) => EventKind::PointerLeave,
            PageEvent::Input(InputEvent::Click { .. }) => EventKind::Click,
            PageEvent::Input(InputEvent::Submit { .. }) => EventKind::Submit,
            PageEvent::Preference(PreferenceEvent::ReducedMotion(_)) => EventKind::ReducedMotion,
        }
    }

    /// Shorthand for a scroll event
    pub fn scrolled(scroll_y: f32) -> Self {
        PageEvent::Viewport(ViewportEvent::Scrolled { scroll_y })
    }

    /// Shorthand for a click event
    pub fn click(element: ElementId) -> Self {
        PageEvent::Input(InputEvent::Click { element })
    }

    /// Shorthand for a form submission
    pub fn submit(form: ElementId) -> Self {
        PageEvent::Input(InputEvent::Submit { form })
    }

    /// Shorthand for pointer enter
    pub fn pointer_enter(element: ElementId) -> Self {
        PageEvent::Input(InputEvent::PointerEnter { element })
    }

    /// Shorthand for pointer leave
    pub fn pointer_leave(element: ElementId) -> Self {
        PageEvent::Input(InputEvent::PointerLeave { element })
    }
}
