//! Counter animator
//!
//! Counts statistic elements up from zero to the literal value in their
//! `data-target` attribute once the page has loaded. The display format is
//! inferred from the element's initial text.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use square_core::{ControlFlow, TimerId};
use square_platform::{ElementId, EventKind};

use crate::config::CounterConfig;
use crate::context::ComponentContext;

/// How a counter value is rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterFormat {
    /// `70%`
    Percentage,
    /// `$500M`
    CurrencyMillions,
    /// `42`
    PlainInteger,
}

impl CounterFormat {
    /// Infer the format from an element's current text
    pub fn infer(text: &str) -> Self {
        if text.contains('%') {
            CounterFormat::Percentage
        } else if text.contains('$') && text.contains('M') {
            CounterFormat::CurrencyMillions
        } else {
            CounterFormat::PlainInteger
        }
    }

    /// Render a value (integer or literal) in this format
    pub fn render(&self, value: impl fmt::Display) -> String {
        match self {
            CounterFormat::Percentage => format!("{}%", value),
            CounterFormat::CurrencyMillions => format!("${}M", value),
            CounterFormat::PlainInteger => value.to_string(),
        }
    }
}

/// A parsed counter element
#[derive(Clone, Debug, PartialEq)]
pub struct CounterTarget {
    pub element: ElementId,
    pub target: f64,
    /// `data-target` exactly as written; shown on the final step
    pub literal: String,
    pub format: CounterFormat,
}

impl CounterTarget {
    /// Parse an element's `data-target`
    ///
    /// Returns `None` for missing, non-numeric or negative targets.
    pub fn parse(element: ElementId, literal: &str, text: &str) -> Option<Self> {
        let literal = literal.trim();
        let target = literal.parse::<f64>().ok()?;
        if !target.is_finite() || target < 0.0 {
            return None;
        }
        Some(Self {
            element,
            target,
            literal: literal.to_string(),
            format: CounterFormat::infer(text),
        })
    }

    /// Displayed value for `step` of `steps`
    pub fn value_at(&self, step: u32, steps: u32) -> String {
        if step >= steps {
            return self.format.render(&self.literal);
        }
        let value = (self.target * step as f64 / steps as f64).floor() as u64;
        self.format.render(value)
    }
}

/// Steps every counter on its own repeating timer
pub struct CounterAnimator {
    ctx: ComponentContext,
    config: CounterConfig,
    targets: Vec<CounterTarget>,
    running: RefCell<FxHashMap<ElementId, TimerId>>,
}

impl CounterAnimator {
    pub fn attach(ctx: &ComponentContext, config: &CounterConfig) -> Rc<Self> {
        let page = &ctx.page;
        let targets: Vec<CounterTarget> = page
            .query_all(&config.selector)
            .into_iter()
            .filter_map(|el| {
                let literal = page.attribute(el, "data-target").unwrap_or_default();
                let parsed = CounterTarget::parse(el, &literal, &page.text(el));
                if parsed.is_none() {
                    tracing::debug!("skipping counter {:?} with target {:?}", el, literal);
                }
                parsed
            })
            .collect();

        let animator = Rc::new(Self {
            ctx: ctx.clone(),
            config: config.clone(),
            targets,
            running: RefCell::new(FxHashMap::default()),
        });

        let weak = Rc::downgrade(&animator);
        let timers = ctx.timers.clone();
        let delay = config.start_delay_ms;
        ctx.events.on(EventKind::Load, move |_, _| {
            let weak = weak.clone();
            timers.after(delay, move || {
                if let Some(animator) = weak.upgrade() {
                    animator.start_all();
                }
            });
        });

        tracing::debug!("counter animator tracking {} counter(s)", animator.targets.len());
        animator
    }

    pub fn targets(&self) -> &[CounterTarget] {
        &self.targets
    }

    /// Start (or restart) every counter
    pub fn start_all(&self) {
        for target in &self.targets {
            self.start(target);
        }
    }

    /// Start one counter, replacing its running task
    pub fn start(&self, target: &CounterTarget) {
        let page = self.ctx.page.clone();
        let steps = self.config.steps.max(1);
        let counter = target.clone();
        page.set_text(counter.element, &counter.format.render(0));

        let mut step = 0;
        let previous = self.running.borrow_mut().remove(&target.element);
        let id = self.ctx.timers.replace(previous, |timers| {
            timers.every(self.config.interval_ms, move || {
                step += 1;
                page.set_text(counter.element, &counter.value_at(step, steps));
                if step >= steps {
                    ControlFlow::Stop
                } else {
                    ControlFlow::Continue
                }
            })
        });
        self.running.borrow_mut().insert(target.element, id);
    }

    /// Whether an element's counter is still stepping
    pub fn is_running(&self, element: ElementId) -> bool {
        self.running
            .borrow()
            .get(&element)
            .is_some_and(|id| self.ctx.timers.is_pending(*id))
    }
}
