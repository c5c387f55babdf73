//! Contact form submission
//!
//! Submitting a contact form is intercepted: the submit control shows a busy
//! label and is disabled while the [`FormTransport`] works, then it is
//! restored and a notification reports the outcome. Successful submissions
//! clear the form.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use square_core::{Millis, TimerQueue};
use square_platform::{ElementId, EventKind, InputEvent, PageEvent};

use crate::config::FormConfig;
use crate::context::ComponentContext;
use crate::error::{InteractError, Result};
use crate::toast::{Severity, ToastManager};

/// Field values collected from a form
#[derive(Clone, Debug, PartialEq)]
pub struct FormSubmission {
    pub form: ElementId,
    /// `name` -> `value`, in document order
    pub fields: IndexMap<String, String>,
}

/// Completion callback handed to a transport
pub type SubmitCallback = Box<dyn FnOnce(Result<()>)>;

/// Delivers form submissions
///
/// Implementations complete by calling `done` exactly once, now or from a
/// timer scheduled on `timers`.
pub trait FormTransport {
    fn submit(&self, submission: FormSubmission, timers: &TimerQueue, done: SubmitCallback);
}

/// Transport that answers after a fixed latency without sending anything
#[derive(Clone, Debug)]
pub struct SimulatedTransport {
    pub latency_ms: Millis,
    pub fail: bool,
}

impl SimulatedTransport {
    pub fn new(latency_ms: Millis) -> Self {
        Self {
            latency_ms,
            fail: false,
        }
    }

    /// Every submission fails
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl FormTransport for SimulatedTransport {
    fn submit(&self, submission: FormSubmission, timers: &TimerQueue, done: SubmitCallback) {
        tracing::debug!(
            "simulating submission of {} field(s), {}ms",
            submission.fields.len(),
            self.latency_ms
        );
        let fail = self.fail;
        timers.after(self.latency_ms, move || {
            if fail {
                done(Err(InteractError::Submission("simulated failure".to_string())));
            } else {
                done(Ok(()));
            }
        });
    }
}

/// Intercepts contact form submits
pub struct FormController {
    ctx: ComponentContext,
    config: FormConfig,
    transport: Rc<dyn FormTransport>,
    toasts: Rc<ToastManager>,
    in_flight: RefCell<FxHashSet<ElementId>>,
}

impl FormController {
    pub fn attach(
        ctx: &ComponentContext,
        config: &FormConfig,
        transport: Rc<dyn FormTransport>,
        toasts: Rc<ToastManager>,
    ) -> Rc<Self> {
        let controller = Rc::new(Self {
            ctx: ctx.clone(),
            config: config.clone(),
            transport,
            toasts,
            in_flight: RefCell::new(FxHashSet::default()),
        });

        let weak = Rc::downgrade(&controller);
        ctx.events.on(EventKind::Submit, move |event, cx| {
            let (Some(controller), PageEvent::Input(InputEvent::Submit { form })) =
                (weak.upgrade(), event)
            else {
                return;
            };
            if controller.ctx.page.matches(*form, &controller.config.selector) {
                cx.prevent_default();
                controller.submit(*form);
            }
        });

        tracing::debug!(
            "form controller attached to {} form(s)",
            ctx.page.query_all(&config.selector).len()
        );
        controller
    }

    /// Submit a form through the transport
    ///
    /// Returns `false` if the form already has a submission in flight.
    pub fn submit(self: &Rc<Self>, form: ElementId) -> bool {
        if !self.in_flight.borrow_mut().insert(form) {
            return false;
        }

        let page = &self.ctx.page;
        let button = self.submit_control(form);
        let label = button.map(|b| page.text(b)).unwrap_or_default();
        if let Some(button) = button {
            page.set_text(button, &self.config.busy_label);
            page.set_attribute(button, "disabled", "");
        }

        let submission = self.collect(form);
        let weak = Rc::downgrade(self);
        self.transport.submit(
            submission,
            &self.ctx.timers,
            Box::new(move |result| {
                if let Some(controller) = weak.upgrade() {
                    controller.complete(form, button, &label, result);
                }
            }),
        );
        true
    }

    pub fn is_submitting(&self, form: ElementId) -> bool {
        self.in_flight.borrow().contains(&form)
    }

    fn complete(&self, form: ElementId, button: Option<ElementId>, label: &str, result: Result<()>) {
        self.in_flight.borrow_mut().remove(&form);
        let page = &self.ctx.page;
        if let Some(button) = button {
            page.set_text(button, label);
            page.remove_attribute(button, "disabled");
        }

        match result {
            Ok(()) => {
                page.reset_form(form);
                self.toasts.show(&self.config.success_message, Severity::Success);
            }
            Err(err) => {
                tracing::warn!("contact form submission failed: {}", err);
                self.toasts.show(&self.config.error_message, Severity::Error);
            }
        }
    }

    fn submit_control(&self, form: ElementId) -> Option<ElementId> {
        self.ctx
            .page
            .query_all(&self.config.submit_selector)
            .into_iter()
            .find(|&el| self.owner(el) == Some(form))
    }

    fn collect(&self, form: ElementId) -> FormSubmission {
        let page = &self.ctx.page;
        let fields = page
            .query_all("input, textarea, select")
            .into_iter()
            .filter(|&el| self.owner(el) == Some(form))
            .filter_map(|el| {
                let name = page.attribute(el, "name")?;
                Some((name, page.attribute(el, "value").unwrap_or_default()))
            })
            .collect();
        FormSubmission { form, fields }
    }

    fn owner(&self, element: ElementId) -> Option<ElementId> {
        self.ctx.page.closest(element, &self.config.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToastConfig;
    use square_core::InteractionRuntime;
    use square_platform::{MemoryPage, Page};
    use std::cell::Cell;

    struct Fixture {
        page: Rc<MemoryPage>,
        runtime: InteractionRuntime,
        toasts: Rc<ToastManager>,
        form: ElementId,
        email: ElementId,
        button: ElementId,
    }

    fn fixture(transport: Rc<dyn FormTransport>) -> (Fixture, Rc<FormController>) {
        let page = Rc::new(MemoryPage::new("/contact.html"));
        let form = page.build("form").attr("data-contact-form", "").finish();
        let email = page.build_in(form, "input").attr("name", "email").finish();
        page.build_in(form, "textarea").attr("name", "message").finish();
        let button = page
            .build_in(form, "button")
            .attr("type", "submit")
            .text("Send Message")
            .finish();
        let runtime = InteractionRuntime::new();
        let ctx = ComponentContext::new(page.clone(), &runtime);
        let toasts = ToastManager::attach(&ctx, &ToastConfig::default());
        let forms = FormController::attach(&ctx, &FormConfig::default(), transport, toasts.clone());
        (
            Fixture {
                page,
                runtime,
                toasts,
                form,
                email,
                button,
            },
            forms,
        )
    }

    #[test]
    fn test_successful_submission() {
        let (f, forms) = fixture(Rc::new(SimulatedTransport::new(1500)));
        f.page.set_value(f.email, "robot@square.dev");

        let outcome = f.runtime.dispatch(&PageEvent::submit(f.form));
        assert!(outcome.default_prevented);
        assert!(forms.is_submitting(f.form));
        assert_eq!(f.page.text(f.button), "Sending...");
        assert!(f.page.attribute(f.button, "disabled").is_some());

        // A second submit while in flight is ignored
        assert!(!forms.submit(f.form));

        f.runtime.advance(1500);
        assert!(!forms.is_submitting(f.form));
        assert_eq!(f.page.text(f.button), "Send Message");
        assert!(f.page.attribute(f.button, "disabled").is_none());
        assert_eq!(f.page.attribute(f.email, "value").as_deref(), Some(""));

        let toast = f.toasts.active()[0];
        let toast = f.toasts.get(toast).unwrap();
        assert_eq!(toast.severity, Severity::Success);
        assert_eq!(toast.message, FormConfig::default().success_message);
    }

    #[test]
    fn test_failed_submission_keeps_fields() {
        let (f, _forms) = fixture(Rc::new(SimulatedTransport::new(1500).failing()));
        f.page.set_value(f.email, "robot@square.dev");
        f.runtime.dispatch(&PageEvent::submit(f.form));
        f.runtime.advance(1500);

        assert_eq!(f.page.attribute(f.email, "value").as_deref(), Some("robot@square.dev"));
        let toast = f.toasts.get(f.toasts.active()[0]).unwrap();
        assert_eq!(toast.severity, Severity::Error);
        assert_eq!(toast.message, "Failed to send message. Please try again.");
    }

    struct Recording {
        seen: RefCell<Vec<FormSubmission>>,
        calls: Cell<usize>,
    }

    impl FormTransport for Recording {
        fn submit(&self, submission: FormSubmission, _: &TimerQueue, done: SubmitCallback) {
            self.calls.set(self.calls.get() + 1);
            self.seen.borrow_mut().push(submission);
            done(Ok(()));
        }
    }

    #[test]
    fn test_collects_named_fields_and_ignores_other_forms() {
        let transport = Rc::new(Recording {
            seen: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        });
        let (f, _forms) = fixture(transport.clone());
        let search = f.page.build("form").class("search").finish();
        f.page.set_value(f.email, "a@b.c");

        let outcome = f.runtime.dispatch(&PageEvent::submit(search));
        assert!(!outcome.default_prevented);
        assert_eq!(transport.calls.get(), 0);

        f.runtime.dispatch(&PageEvent::submit(f.form));
        let seen = transport.seen.borrow();
        assert_eq!(seen[0].fields.get("email").map(String::as_str), Some("a@b.c"));
        assert_eq!(seen[0].fields.get("message").map(String::as_str), Some(""));
    }
}
