//! Page abstraction - the DOM/CSS surface the interaction layer works against
//!
//! The interaction layer never owns markup. It reads attributes, toggles
//! classes, writes text and inline styles, and asks the host for scroll and
//! viewport geometry. Hosts (a browser binding, the headless [`MemoryPage`])
//! implement [`Page`] with interior mutability so components can share one
//! `Rc<dyn Page>`.
//!
//! [`MemoryPage`]: crate::memory::MemoryPage

/// Handle to an element in the host document
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Reconstruct a handle from a raw ID
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Element bounds in document coordinates (CSS pixels)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Vertical band helper (full-width element)
    pub fn band(y: f32, height: f32) -> Self {
        Self::new(0.0, y, 0.0, height)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Viewport size in CSS pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Options for viewport intersection observation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionOptions {
    /// Minimum visible fraction (0.0 - 1.0) for an element to count as intersecting
    pub threshold: f32,
    /// Top root margin in pixels (negative shrinks the trigger region)
    pub margin_top: f32,
    /// Bottom root margin in pixels (negative shrinks the trigger region)
    pub margin_bottom: f32,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
        }
    }
}

impl IntersectionOptions {
    /// Visible fraction of `rect` for a viewport at `scroll_y` of `viewport_height`
    pub fn ratio(&self, rect: Rect, scroll_y: f32, viewport_height: f32) -> f32 {
        let top = scroll_y - self.margin_top;
        let bottom = scroll_y + viewport_height + self.margin_bottom;
        if rect.height <= 0.0 {
            return if rect.y >= top && rect.y <= bottom { 1.0 } else { 0.0 };
        }
        let overlap = (bottom.min(rect.bottom()) - top.max(rect.y)).max(0.0);
        (overlap / rect.height).clamp(0.0, 1.0)
    }

    /// Whether a ratio counts as intersecting under this threshold
    pub fn is_intersecting(&self, ratio: f32) -> bool {
        ratio > 0.0 && ratio >= self.threshold
    }
}

/// The host document
///
/// All methods take `&self`; implementations use interior mutability.
/// Operations on stale element handles are silently ignored, matching how a
/// detached DOM node absorbs mutations.
pub trait Page {
    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// All elements matching a CSS selector, in document order
    ///
    /// Invalid selectors match nothing.
    fn query_all(&self, selector: &str) -> Vec<ElementId>;

    /// First element matching a CSS selector
    fn query(&self, selector: &str) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }

    /// Whether the element matches a selector
    fn matches(&self, element: ElementId, selector: &str) -> bool;

    /// Nearest inclusive ancestor matching a selector
    fn closest(&self, element: ElementId, selector: &str) -> Option<ElementId>;

    // ---------------------------------------------------------------------
    // Classes, attributes, text, style
    // ---------------------------------------------------------------------

    fn add_class(&self, element: ElementId, class: &str);

    fn remove_class(&self, element: ElementId, class: &str);

    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Add or remove a class depending on `enabled`
    fn set_class(&self, element: ElementId, class: &str, enabled: bool) {
        if enabled {
            self.add_class(element, class);
        } else {
            self.remove_class(element, class);
        }
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    fn remove_attribute(&self, element: ElementId, name: &str);

    /// Text content
    fn text(&self, element: ElementId) -> String;

    /// Replace text content
    fn set_text(&self, element: ElementId, text: &str);

    /// Set an inline style property
    fn set_style(&self, element: ElementId, property: &str, value: &str);

    /// Read an inline style property
    fn style(&self, element: ElementId, property: &str) -> Option<String>;

    /// Element bounds in document coordinates, if laid out
    fn rect(&self, element: ElementId) -> Option<Rect>;

    // ---------------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------------

    /// Create an element with the given classes and append it to the body
    fn append_element(&self, tag: &str, classes: &[&str]) -> ElementId;

    /// Detach an element (and its subtree) from the document
    fn remove_element(&self, element: ElementId);

    /// Whether the element is attached to the document
    fn contains(&self, element: ElementId) -> bool;

    /// Inject a `<style>` block with the given id
    ///
    /// Returns `false` if a block with that id already exists.
    fn inject_style(&self, id: &str, css: &str) -> bool;

    /// Clear all field values of a form
    fn reset_form(&self, form: ElementId);

    // ---------------------------------------------------------------------
    // Window
    // ---------------------------------------------------------------------

    /// Vertical scroll offset
    fn scroll_y(&self) -> f32;

    /// Viewport size
    fn viewport(&self) -> Size;

    /// Current location path (e.g. `/about`)
    fn path(&self) -> String;

    /// Current location origin (e.g. `https://example.com`)
    fn origin(&self) -> String;

    /// Navigate to a new location
    fn navigate(&self, href: &str);

    /// Suspend or restore page scrolling (body overflow)
    fn set_scroll_locked(&self, locked: bool);

    fn is_scroll_locked(&self) -> bool;

    /// Whether the document is currently hidden
    fn is_hidden(&self) -> bool;

    /// Current `prefers-reduced-motion` state
    fn prefers_reduced_motion(&self) -> bool;

    // ---------------------------------------------------------------------
    // Viewport intersection
    // ---------------------------------------------------------------------

    /// Whether the host can observe viewport intersection
    fn supports_intersection(&self) -> bool {
        true
    }

    /// Start observing an element
    ///
    /// The host delivers [`IntersectionEntry`](crate::IntersectionEntry)
    /// events whenever the element crosses the threshold, including an
    /// initial entry.
    fn observe_intersection(&self, element: ElementId, options: IntersectionOptions);

    /// Stop observing an element
    fn unobserve_intersection(&self, element: ElementId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_ratio() {
        let opts = IntersectionOptions {
            threshold: 0.1,
            margin_top: 0.0,
            margin_bottom: -50.0,
        };

        // Element below the fold
        let rect = Rect::band(1000.0, 200.0);
        assert_eq!(opts.ratio(rect, 0.0, 800.0), 0.0);

        // Scrolled so that 100px sits inside the shrunk viewport
        let ratio = opts.ratio(rect, 350.0, 800.0);
        assert!((ratio - 0.5).abs() < 1e-4);
        assert!(opts.is_intersecting(ratio));

        // 10px visible = 5%, below threshold
        let ratio = opts.ratio(rect, 260.0, 800.0);
        assert!(!opts.is_intersecting(ratio));
    }

    #[test]
    fn test_zero_height_rect() {
        let opts = IntersectionOptions::default();
        assert_eq!(opts.ratio(Rect::band(100.0, 0.0), 0.0, 800.0), 1.0);
        assert_eq!(opts.ratio(Rect::band(900.0, 0.0), 0.0, 800.0), 0.0);
    }
}
