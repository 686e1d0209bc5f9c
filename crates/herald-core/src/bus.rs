//! Event Bus
//!
//! Publish/subscribe for lifecycle events. Listeners register for one kind
//! or for every kind (wildcard). A listener that returns an error or panics
//! is logged and skipped; the rest still receive the event.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::{EventKind, FeedbackEvent};

type Listener = Rc<dyn Fn(&FeedbackEvent) -> anyhow::Result<()>>;
type WildcardListener = Rc<dyn Fn(EventKind, &FeedbackEvent) -> anyhow::Result<()>>;

/// Handle returned by a registration, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

#[derive(Clone)]
enum Slot {
    Kind(EventKind, Listener),
    Any(WildcardListener),
}

/// Delivery summary of one emission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Event bus
#[derive(Default)]
pub struct EventBus {
    listeners: RefCell<Vec<(Subscription, Slot)>>,
    next_id: Cell<u64>,
    debug: Cell<bool>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.borrow().len())
            .field("debug", &self.debug.get())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log listener failures at warn level
    pub fn set_debug(&self, debug: bool) {
        self.debug.set(debug);
    }

    /// Listen for one kind
    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&FeedbackEvent) -> anyhow::Result<()> + 'static,
    ) -> Subscription {
        self.register(Slot::Kind(kind, Rc::new(listener)))
    }

    /// Listen for every kind
    pub fn on_any(
        &self,
        listener: impl Fn(EventKind, &FeedbackEvent) -> anyhow::Result<()> + 'static,
    ) -> Subscription {
        self.register(Slot::Any(Rc::new(listener)))
    }

    fn register(&self, slot: Slot) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let subscription = Subscription(id);
        self.listeners.borrow_mut().push((subscription, slot));
        subscription
    }

    /// Remove a listener; false if it was not registered
    pub fn off(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(s, _)| *s != subscription);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Deliver an event to matching listeners in registration order.
    ///
    /// Listeners registered during delivery receive the next emission.
    pub fn emit(&self, kind: EventKind, event: &FeedbackEvent) -> EmitReport {
        let targets: Vec<Slot> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, slot)| match slot {
                Slot::Kind(k, _) => *k == kind,
                Slot::Any(_) => true,
            })
            .map(|(_, slot)| slot.clone())
            .collect();

        let mut report = EmitReport::default();
        for slot in targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| match &slot {
                Slot::Kind(_, listener) => listener(event),
                Slot::Any(listener) => listener(kind, event),
            }));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(err)) => {
                    report.failed += 1;
                    self.log_failure(kind, &event.id, &format!("{err:#}"));
                }
                Err(panic) => {
                    report.failed += 1;
                    self.log_failure(kind, &event.id, &panic_message(&*panic));
                }
            }
        }
        report
    }

    fn log_failure(&self, kind: EventKind, id: &str, message: &str) {
        if self.debug.get() {
            tracing::warn!(%kind, event_id = id, error = message, "event listener failed");
        } else {
            tracing::debug!(%kind, event_id = id, error = message, "event listener failed");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "listener panicked".to_string())
}
