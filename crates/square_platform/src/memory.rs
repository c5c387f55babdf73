//! Headless in-memory page
//!
//! A small DOM stand-in used for tests and the CLI demo. It implements
//! [`Page`] faithfully enough for the interaction layer: selector queries,
//! classes, attributes, inline styles, element geometry, scroll locking and
//! viewport intersection computed from element rects.
//!
//! # Example
//!
//! ```
//! use square_platform::{MemoryPage, Page, Rect};
//!
//! let page = MemoryPage::new("/");
//! let nav = page.build("nav").class("navbar").finish();
//! let link = page
//!     .build_in(nav, "a")
//!     .class("nav-link")
//!     .attr("href", "/")
//!     .text("Home")
//!     .rect(Rect::band(0.0, 40.0))
//!     .finish();
//!
//! assert_eq!(page.query(".navbar a"), Some(link));
//! ```

use std::cell::RefCell;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::event::{IntersectionEntry, LifecycleEvent, PageEvent, PreferenceEvent, ViewportEvent};
use crate::page::{ElementId, IntersectionOptions, Page, Rect, Size};
use crate::selector::{ElementView, SelectorList};

/// A node in the in-memory document
#[derive(Clone, Debug, Default)]
pub struct Node {
    pub tag: String,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub classes: SmallVec<[String; 4]>,
    pub attributes: IndexMap<String, String>,
    pub text: String,
    pub style: IndexMap<String, String>,
    pub rect: Option<Rect>,
}

#[derive(Clone, Copy, Debug)]
struct Observation {
    options: IntersectionOptions,
    intersecting: Option<bool>,
}

struct MemoryDom {
    nodes: IndexMap<ElementId, Node>,
    next_id: u64,
    body: ElementId,
    scroll_y: f32,
    viewport: Size,
    path: String,
    origin: String,
    scroll_locked: bool,
    reduced_motion: bool,
    hidden: bool,
    intersection_supported: bool,
    style_blocks: IndexMap<String, String>,
    observed: IndexMap<ElementId, Observation>,
    navigations: Vec<String>,
    pending: Vec<PageEvent>,
}

impl MemoryDom {
    fn alloc(&mut self, tag: &str, parent: Option<ElementId>) -> ElementId {
        let id = ElementId::from_raw(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag: tag.to_ascii_lowercase(),
                parent,
                ..Default::default()
            },
        );
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(id);
            }
        }
        id
    }

    /// Whether the element is reachable from the body
    fn is_attached(&self, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Attached elements in document (pre-order) order
    fn document_order(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.body];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Recompute intersections, returning entries whose state changed
    fn intersection_changes(&mut self) -> Vec<PageEvent> {
        let scroll_y = self.scroll_y;
        let viewport_height = self.viewport.height;
        let mut events = Vec::new();
        for (element, observation) in self.observed.iter_mut() {
            let Some(rect) = self.nodes.get(element).and_then(|n| n.rect) else {
                continue;
            };
            let ratio = observation.options.ratio(rect, scroll_y, viewport_height);
            let intersecting = observation.options.is_intersecting(ratio);
            if observation.intersecting != Some(intersecting) {
                observation.intersecting = Some(intersecting);
                events.push(PageEvent::Viewport(ViewportEvent::Intersection(
                    IntersectionEntry {
                        element: *element,
                        ratio,
                        is_intersecting: intersecting,
                    },
                )));
            }
        }
        events
    }
}

impl ElementView for MemoryDom {
    fn tag_name(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(&element).map(|n| n.tag.as_str())
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes
            .get(&element)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(&element)
            .and_then(|n| n.attributes.get(name))
            .map(String::as_str)
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|n| n.parent)
    }
}

/// Headless page implementing [`Page`]
pub struct MemoryPage {
    dom: RefCell<MemoryDom>,
}

impl MemoryPage {
    /// Create an empty document at `path` with a 1280x800 viewport
    pub fn new(path: impl Into<String>) -> Self {
        let mut dom = MemoryDom {
            nodes: IndexMap::new(),
            next_id: 1,
            body: ElementId::from_raw(0),
            scroll_y: 0.0,
            viewport: Size::new(1280.0, 800.0),
            path: path.into(),
            origin: "http://localhost:5000".to_string(),
            scroll_locked: false,
            reduced_motion: false,
            hidden: false,
            intersection_supported: true,
            style_blocks: IndexMap::new(),
            observed: IndexMap::new(),
            navigations: Vec::new(),
            pending: Vec::new(),
        };
        let body = dom.alloc("body", None);
        dom.body = body;
        Self {
            dom: RefCell::new(dom),
        }
    }

    /// Set the viewport size
    pub fn with_viewport(self, width: f32, height: f32) -> Self {
        self.dom.borrow_mut().viewport = Size::new(width, height);
        self
    }

    /// Set the initial reduced-motion preference
    pub fn with_reduced_motion(self, reduced: bool) -> Self {
        self.dom.borrow_mut().reduced_motion = reduced;
        self
    }

    /// Disable the intersection capability
    pub fn without_intersection(self) -> Self {
        self.dom.borrow_mut().intersection_supported = false;
        self
    }

    /// Set the location origin
    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        self.dom.borrow_mut().origin = origin.into();
        self
    }

    /// The body element
    pub fn body(&self) -> ElementId {
        self.dom.borrow().body
    }

    /// Start building an element appended to the body
    pub fn build(&self, tag: &str) -> ElementBuilder<'_> {
        let body = self.body();
        self.build_in(body, tag)
    }

    /// Start building an element appended to `parent`
    pub fn build_in(&self, parent: ElementId, tag: &str) -> ElementBuilder<'_> {
        let id = self.dom.borrow_mut().alloc(tag, Some(parent));
        ElementBuilder { page: self, id }
    }

    /// Snapshot of a node
    pub fn node(&self, element: ElementId) -> Option<Node> {
        self.dom.borrow().nodes.get(&element).cloned()
    }

    /// Ids of injected style blocks
    pub fn style_blocks(&self) -> Vec<String> {
        self.dom.borrow().style_blocks.keys().cloned().collect()
    }

    /// Every location passed to [`Page::navigate`]
    pub fn navigations(&self) -> Vec<String> {
        self.dom.borrow().navigations.clone()
    }

    /// Whether an element is currently observed for intersection
    pub fn is_observed(&self, element: ElementId) -> bool {
        self.dom.borrow().observed.contains_key(&element)
    }

    /// Drain events queued by the page itself (initial intersection entries)
    pub fn drain_events(&self) -> Vec<PageEvent> {
        std::mem::take(&mut self.dom.borrow_mut().pending)
    }

    /// Scroll to `scroll_y`, returning the scroll event followed by any
    /// intersection changes it caused
    pub fn scroll_to(&self, scroll_y: f32) -> Vec<PageEvent> {
        let mut dom = self.dom.borrow_mut();
        if dom.scroll_locked {
            return Vec::new();
        }
        dom.scroll_y = scroll_y.max(0.0);
        let mut events = vec![PageEvent::scrolled(dom.scroll_y)];
        events.extend(dom.intersection_changes());
        events
    }

    /// Resize the viewport
    pub fn resize(&self, width: f32, height: f32) -> Vec<PageEvent> {
        let mut dom = self.dom.borrow_mut();
        dom.viewport = Size::new(width, height);
        let mut events = vec![PageEvent::Viewport(ViewportEvent::Resized { width, height })];
        events.extend(dom.intersection_changes());
        events
    }

    /// Change document visibility
    pub fn set_hidden(&self, hidden: bool) -> PageEvent {
        self.dom.borrow_mut().hidden = hidden;
        PageEvent::Lifecycle(LifecycleEvent::VisibilityChanged { hidden })
    }

    /// Change the reduced-motion preference
    pub fn set_reduced_motion(&self, reduced: bool) -> PageEvent {
        self.dom.borrow_mut().reduced_motion = reduced;
        PageEvent::Preference(PreferenceEvent::ReducedMotion(reduced))
    }

    /// Set a form control's value
    pub fn set_value(&self, element: ElementId, value: &str) {
        self.set_attribute(element, "value", value);
    }

    fn with_node<R>(&self, element: ElementId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        self.dom.borrow_mut().nodes.get_mut(&element).map(f)
    }

    fn parse(selector: &str) -> Option<SelectorList> {
        match SelectorList::parse(selector) {
            Ok(list) => Some(list),
            Err(err) => {
                tracing::warn!("{}", err);
                None
            }
        }
    }
}

impl Page for MemoryPage {
    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let Some(list) = Self::parse(selector) else {
            return Vec::new();
        };
        let dom = self.dom.borrow();
        dom.document_order()
            .into_iter()
            .filter(|id| list.matches(&*dom, *id))
            .collect()
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        let dom = self.dom.borrow();
        dom.nodes.contains_key(&element)
            && Self::parse(selector).is_some_and(|list| list.matches(&*dom, element))
    }

    fn closest(&self, element: ElementId, selector: &str) -> Option<ElementId> {
        let list = Self::parse(selector)?;
        let dom = self.dom.borrow();
        let mut current = Some(element).filter(|id| dom.nodes.contains_key(id));
        while let Some(id) = current {
            if list.matches(&*dom, id) {
                return Some(id);
            }
            current = dom.parent(id);
        }
        None
    }

    fn add_class(&self, element: ElementId, class: &str) {
        self.with_node(element, |node| {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        });
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        self.with_node(element, |node| node.classes.retain(|c| c != class));
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        ElementView::has_class(&*self.dom.borrow(), element, class)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        ElementView::attribute(&*self.dom.borrow(), element, name).map(str::to_string)
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        self.with_node(element, |node| {
            node.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn remove_attribute(&self, element: ElementId, name: &str) {
        self.with_node(element, |node| {
            node.attributes.shift_remove(name);
        });
    }

    fn text(&self, element: ElementId) -> String {
        self.dom
            .borrow()
            .nodes
            .get(&element)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    fn set_text(&self, element: ElementId, text: &str) {
        self.with_node(element, |node| node.text = text.to_string());
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        self.with_node(element, |node| {
            node.style.insert(property.to_string(), value.to_string());
        });
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.dom
            .borrow()
            .nodes
            .get(&element)
            .and_then(|n| n.style.get(property).cloned())
    }

    fn rect(&self, element: ElementId) -> Option<Rect> {
        self.dom.borrow().nodes.get(&element).and_then(|n| n.rect)
    }

    fn append_element(&self, tag: &str, classes: &[&str]) -> ElementId {
        let mut dom = self.dom.borrow_mut();
        let body = dom.body;
        let id = dom.alloc(tag, Some(body));
        if let Some(node) = dom.nodes.get_mut(&id) {
            node.classes = classes.iter().map(|c| c.to_string()).collect();
        }
        id
    }

    fn remove_element(&self, element: ElementId) {
        let mut dom = self.dom.borrow_mut();
        if element == dom.body {
            return;
        }
        let Some(parent) = dom.nodes.get(&element).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = dom.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != element);
        }
        for id in dom.descendants(element) {
            dom.nodes.shift_remove(&id);
            dom.observed.shift_remove(&id);
        }
    }

    fn contains(&self, element: ElementId) -> bool {
        let dom = self.dom.borrow();
        dom.nodes.contains_key(&element) && dom.is_attached(element)
    }

    fn inject_style(&self, id: &str, css: &str) -> bool {
        let mut dom = self.dom.borrow_mut();
        if dom.style_blocks.contains_key(id) {
            return false;
        }
        dom.style_blocks.insert(id.to_string(), css.to_string());
        true
    }

    fn reset_form(&self, form: ElementId) {
        let mut dom = self.dom.borrow_mut();
        let fields: Vec<ElementId> = dom
            .descendants(form)
            .into_iter()
            .filter(|id| {
                dom.nodes
                    .get(id)
                    .is_some_and(|n| matches!(n.tag.as_str(), "input" | "textarea" | "select"))
            })
            .collect();
        for id in fields {
            if let Some(node) = dom.nodes.get_mut(&id) {
                if node.attributes.get("type").map(String::as_str) == Some("submit") {
                    continue;
                }
                node.attributes.insert("value".to_string(), String::new());
                if node.tag == "textarea" {
                    node.text.clear();
                }
            }
        }
    }

    fn scroll_y(&self) -> f32 {
        self.dom.borrow().scroll_y
    }

    fn viewport(&self) -> Size {
        self.dom.borrow().viewport
    }

    fn path(&self) -> String {
        self.dom.borrow().path.clone()
    }

    fn origin(&self) -> String {
        self.dom.borrow().origin.clone()
    }

    fn navigate(&self, href: &str) {
        tracing::debug!("MemoryPage: navigate to {}", href);
        self.dom.borrow_mut().navigations.push(href.to_string());
    }

    fn set_scroll_locked(&self, locked: bool) {
        self.dom.borrow_mut().scroll_locked = locked;
    }

    fn is_scroll_locked(&self) -> bool {
        self.dom.borrow().scroll_locked
    }

    fn is_hidden(&self) -> bool {
        self.dom.borrow().hidden
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.dom.borrow().reduced_motion
    }

    fn supports_intersection(&self) -> bool {
        self.dom.borrow().intersection_supported
    }

    fn observe_intersection(&self, element: ElementId, options: IntersectionOptions) {
        let mut dom = self.dom.borrow_mut();
        if !dom.intersection_supported || !dom.nodes.contains_key(&element) {
            return;
        }
        dom.observed.insert(
            element,
            Observation {
                options,
                intersecting: None,
            },
        );
        // Observers report the initial state asynchronously
        let events = dom.intersection_changes();
        dom.pending.extend(events);
    }

    fn unobserve_intersection(&self, element: ElementId) {
        self.dom.borrow_mut().observed.shift_remove(&element);
    }
}

/// Builder for elements in a [`MemoryPage`]
pub struct ElementBuilder<'a> {
    page: &'a MemoryPage,
    id: ElementId,
}

impl ElementBuilder<'_> {
    pub fn class(self, class: &str) -> Self {
        self.page.add_class(self.id, class);
        self
    }

    pub fn id_attr(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn attr(self, name: &str, value: &str) -> Self {
        self.page.set_attribute(self.id, name, value);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.page.set_text(self.id, text);
        self
    }

    pub fn rect(self, rect: Rect) -> Self {
        self.page.with_node(self.id, |node| node.rect = Some(rect));
        self
    }

    pub fn finish(self) -> ElementId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MemoryPage, ElementId, ElementId, ElementId) {
        let page = MemoryPage::new("/about");
        let nav = page.build("nav").class("navbar").id_attr("navbar").finish();
        let menu = page.build_in(nav, "ul").class("nav-menu").finish();
        let item = page.build_in(menu, "li").finish();
        let link = page
            .build_in(item, "a")
            .class("nav-link")
            .attr("href", "/about")
            .finish();
        (page, nav, menu, link)
    }

    #[test]
    fn test_query_and_combinators() {
        let (page, nav, menu, link) = sample();
        assert_eq!(page.query("#navbar"), Some(nav));
        assert_eq!(page.query(".navbar .nav-link"), Some(link));
        assert_eq!(page.query("nav > ul"), Some(menu));
        assert_eq!(page.query("nav > a"), None);
        assert_eq!(page.query_all("a[href], .nav-menu").len(), 2);
        assert!(page.query_all("[[").is_empty());
    }

    #[test]
    fn test_closest() {
        let (page, _nav, menu, link) = sample();
        assert_eq!(page.closest(link, ".nav-menu"), Some(menu));
        assert_eq!(page.closest(link, "a"), Some(link));
        assert_eq!(page.closest(link, ".missing"), None);
    }

    #[test]
    fn test_remove_element_detaches_subtree() {
        let (page, nav, _menu, link) = sample();
        page.remove_element(nav);
        assert!(!page.contains(nav));
        assert!(!page.contains(link));
        assert!(page.query(".nav-link").is_none());
        // Mutating a detached handle is a no-op
        page.add_class(link, "active");
        assert!(!page.has_class(link, "active"));
    }

    #[test]
    fn test_intersection_events_on_scroll() {
        let page = MemoryPage::new("/").with_viewport(1280.0, 800.0);
        let el = page.build("section").rect(Rect::band(1200.0, 400.0)).finish();
        page.observe_intersection(
            el,
            IntersectionOptions {
                threshold: 0.1,
                margin_top: 0.0,
                margin_bottom: -50.0,
            },
        );

        // Initial entry: not intersecting
        let initial = page.drain_events();
        assert_eq!(initial.len(), 1);

        let events = page.scroll_to(600.0);
        assert_eq!(events.len(), 2);
        match &events[1] {
            PageEvent::Viewport(ViewportEvent::Intersection(entry)) => {
                assert_eq!(entry.element, el);
                assert!(entry.is_intersecting);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Scrolling within the intersecting band produces only the scroll event
        assert_eq!(page.scroll_to(650.0).len(), 1);
    }

    #[test]
    fn test_scroll_lock_blocks_scrolling() {
        let page = MemoryPage::new("/");
        page.set_scroll_locked(true);
        assert!(page.scroll_to(300.0).is_empty());
        assert_eq!(page.scroll_y(), 0.0);
    }

    #[test]
    fn test_reset_form() {
        let page = MemoryPage::new("/");
        let form = page.build("form").finish();
        let input = page.build_in(form, "input").attr("value", "Ada").finish();
        let submit = page
            .build_in(form, "button")
            .attr("type", "submit")
            .text("Send")
            .finish();
        page.reset_form(form);
        assert_eq!(page.attribute(input, "value").as_deref(), Some(""));
        assert_eq!(page.text(submit), "Send");
    }

    #[test]
    fn test_inject_style_once() {
        let page = MemoryPage::new("/");
        assert!(page.inject_style("toast", ".toast{}"));
        assert!(!page.inject_style("toast", ".toast{}"));
        assert_eq!(page.style_blocks(), vec!["toast".to_string()]);
    }
}
