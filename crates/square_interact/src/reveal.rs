//! Scroll-reveal engine
//!
//! CSS-driven, one-shot reveal: each target is observed for viewport
//! intersection, and the first time it crosses the threshold it gets the
//! `revealed` class plus a `transition-delay` from its stagger index. The
//! element is then unobserved and never reverts.
//!
//! Hosts without an intersection capability get every target revealed at
//! attach time.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use square_platform::{ElementId, EventKind, IntersectionOptions, PageEvent, ViewportEvent};

use crate::config::RevealConfig;
use crate::context::ComponentContext;

/// Class set on revealed elements
pub const REVEALED_CLASS: &str = "revealed";

/// A registered reveal target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTarget {
    /// Index from `data-stagger` (0 when absent or invalid)
    pub stagger: u32,
    pub revealed: bool,
}

/// One-shot reveal of observed elements
pub struct RevealEngine {
    ctx: ComponentContext,
    config: RevealConfig,
    targets: RefCell<IndexMap<ElementId, RevealTarget>>,
}

impl RevealEngine {
    pub fn attach(ctx: &ComponentContext, config: &RevealConfig) -> Rc<Self> {
        let page = &ctx.page;
        let targets: IndexMap<ElementId, RevealTarget> = page
            .query_all(&config.selector)
            .into_iter()
            .map(|el| {
                let stagger = page
                    .attribute(el, "data-stagger")
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .unwrap_or(0);
                (
                    el,
                    RevealTarget {
                        stagger,
                        revealed: false,
                    },
                )
            })
            .collect();

        let engine = Rc::new(Self {
            ctx: ctx.clone(),
            config: config.clone(),
            targets: RefCell::new(targets),
        });

        if !page.supports_intersection() {
            tracing::debug!("intersection unavailable, revealing all targets");
            for el in engine.target_ids() {
                engine.reveal(el);
            }
            return engine;
        }

        let options = IntersectionOptions {
            threshold: config.threshold,
            margin_top: 0.0,
            margin_bottom: config.margin_bottom,
        };
        for el in engine.target_ids() {
            page.observe_intersection(el, options);
        }

        let weak = Rc::downgrade(&engine);
        ctx.events.on(EventKind::Intersection, move |event, _| {
            if let (Some(engine), PageEvent::Viewport(ViewportEvent::Intersection(entry))) =
                (weak.upgrade(), event)
            {
                if entry.is_intersecting {
                    engine.reveal(entry.element);
                }
            }
        });

        tracing::debug!("reveal engine observing {} target(s)", engine.len());
        engine
    }

    /// Reveal a target now
    ///
    /// Returns `false` for unknown or already revealed elements.
    pub fn reveal(&self, element: ElementId) -> bool {
        let stagger = {
            let mut targets = self.targets.borrow_mut();
            match targets.get_mut(&element) {
                Some(target) if !target.revealed => {
                    target.revealed = true;
                    target.stagger
                }
                _ => return false,
            }
        };

        let page = &self.ctx.page;
        page.add_class(element, REVEALED_CLASS);
        page.set_style(
            element,
            "transition-delay",
            &transition_delay(stagger, self.config.stagger_step_ms),
        );
        page.unobserve_intersection(element);
        true
    }

    pub fn is_revealed(&self, element: ElementId) -> bool {
        self.targets
            .borrow()
            .get(&element)
            .is_some_and(|t| t.revealed)
    }

    pub fn target(&self, element: ElementId) -> Option<RevealTarget> {
        self.targets.borrow().get(&element).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Targets still waiting for their first intersection
    pub fn pending(&self) -> usize {
        self.targets.borrow().values().filter(|t| !t.revealed).count()
    }

    fn target_ids(&self) -> Vec<ElementId> {
        self.targets.borrow().keys().copied().collect()
    }
}

/// CSS `transition-delay` for a stagger index, e.g. `0.3s`
fn transition_delay(stagger: u32, step_ms: u64) -> String {
    let seconds = (stagger as u64 * step_ms) as f64 / 1000.0;
    format!("{}s", seconds)
}
