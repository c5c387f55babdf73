//! Scroll-triggered section entrances
//!
//! Each configured group animates from its offset state to identity when the
//! top of its first element crosses a line at 80% of the viewport height,
//! and plays in reverse when the page scrolls back above that line. The line
//! is checked again whenever the viewport is resized.

use std::cell::Cell;
use std::rc::Rc;

use square_animation::{Position, SchedulerHandle, TimelineId, Tween};
use square_platform::{ElementId, EventKind, PageEvent, ViewportEvent};

use crate::config::SectionConfig;
use crate::context::ComponentContext;

/// Fraction of the viewport height where sections trigger
pub const TRIGGER_LINE: f32 = 0.8;

/// One scroll-triggered group
pub struct SectionTrigger {
    ctx: ComponentContext,
    name: String,
    trigger: ElementId,
    elements: Vec<ElementId>,
    timeline: TimelineId,
    handle: SchedulerHandle,
    entered: Cell<bool>,
}

impl SectionTrigger {
    /// Register the group's timeline and scroll handler
    ///
    /// Returns `None` when no element of the group is on the page.
    pub fn attach(
        ctx: &ComponentContext,
        handle: &SchedulerHandle,
        config: &SectionConfig,
        skip: &dyn Fn(ElementId) -> bool,
    ) -> Option<Rc<Self>> {
        let elements: Vec<ElementId> = ctx
            .page
            .query_all(&config.selector)
            .into_iter()
            .filter(|el| !skip(*el))
            .collect();
        let trigger = *elements.first()?;

        let from = config.from.to_targets();
        let mut tl = handle.timeline();
        tl.stagger(config.stagger_ms)
            .each(elements.iter().copied(), |el| Tween::from(el, from))
            .at(Position::At(0.0));
        let timeline = handle.register_timeline(tl)?;

        let section = Rc::new(Self {
            ctx: ctx.clone(),
            name: config.name.clone(),
            trigger,
            elements,
            timeline,
            handle: handle.clone(),
            entered: Cell::new(false),
        });
        section.update(ctx.page.scroll_y());

        let weak = Rc::downgrade(&section);
        ctx.events.on(EventKind::Scroll, move |event, _| {
            if let (Some(section), PageEvent::Viewport(ViewportEvent::Scrolled { scroll_y })) =
                (weak.upgrade(), event)
            {
                section.update(*scroll_y);
            }
        });

        // Resizing moves the trigger line
        let weak = Rc::downgrade(&section);
        ctx.events.on(EventKind::Resize, move |_, _| {
            if let Some(section) = weak.upgrade() {
                section.update(section.ctx.page.scroll_y());
            }
        });

        tracing::debug!(
            "section '{}': {} element(s)",
            section.name,
            section.elements.len()
        );
        Some(section)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeline(&self) -> TimelineId {
        self.timeline
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// Whether the trigger is currently past the line
    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }

    fn update(&self, scroll_y: f32) {
        let page = &self.ctx.page;
        let Some(rect) = page.rect(self.trigger) else {
            return;
        };
        let line = page.viewport().height * TRIGGER_LINE;
        let entered = rect.y - scroll_y <= line;
        if entered == self.entered.replace(entered) {
            return;
        }
        if entered {
            tracing::debug!("section '{}' entered", self.name);
            self.handle.play(self.timeline);
        } else {
            tracing::debug!("section '{}' left back", self.name);
            self.handle.reverse(self.timeline);
        }
    }
}
