//! Announcer
//!
//! The context object that owns the live regions, per-channel scheduling
//! state, dedupe records, listeners and active events. Everything a caller
//! does goes through here.

use std::cell::{Cell, Ref, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::Instant;

use herald_a11y::{MessageCategory, Politeness, RegionManager};
use herald_dom::SharedDocument;

use crate::event::current_time_ms;
use crate::{
    Config, ConfigError, DedupeEngine, Decision, Delivery, DismissReason, EventBus, EventKind,
    FeedbackEvent, FeedbackOptions, Scheduler, Subscription, focus, i18n,
};

#[derive(Debug)]
struct ActiveEntry {
    serial: u64,
    event: FeedbackEvent,
}

#[derive(Debug)]
struct Inner {
    config: RefCell<Config>,
    scheduler: Scheduler,
    dedupe: RefCell<DedupeEngine>,
    bus: EventBus,
    active: RefCell<Vec<ActiveEntry>>,
    next_id: Cell<u64>,
    next_serial: Cell<u64>,
}

/// Announcement coordinator.
///
/// Cloning is cheap and shares state, so a listener can hold a handle.
#[derive(Debug, Clone)]
pub struct Announcer {
    inner: Rc<Inner>,
}

impl Announcer {
    /// Announcer without a document; timing and events work, writes are skipped
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    /// Announcer writing to `document`
    pub fn with_document(config: Config, document: SharedDocument) -> Result<Self, ConfigError> {
        Self::build(config, Some(document))
    }

    fn build(config: Config, document: Option<SharedDocument>) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            headless = document.is_none(),
            prefix = %config.region_prefix,
            spacing_ms = config.min_announce_spacing_ms,
            dedupe_ms = config.dedupe_window_ms,
            "Initializing announcer"
        );

        let scheduler = Scheduler::new(
            document,
            RegionManager::new(&config.region_prefix),
            config.min_announce_spacing(),
            config.invisible_chars.clone(),
        );
        let bus = EventBus::new();
        bus.set_debug(config.debug);

        Ok(Self {
            inner: Rc::new(Inner {
                dedupe: RefCell::new(DedupeEngine::new(config.dedupe_window())),
                config: RefCell::new(config),
                scheduler,
                bus,
                active: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                next_serial: Cell::new(0),
            }),
        })
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Announce a message of `category`.
    ///
    /// Resolves once the text is in its live region, or once the request was
    /// skipped as a duplicate or superseded by a newer one. The returned event
    /// says which.
    pub async fn submit(
        &self,
        message: &str,
        category: MessageCategory,
        options: FeedbackOptions,
    ) -> FeedbackEvent {
        let inner = &self.inner;
        let id = options.id.clone().unwrap_or_else(|| self.generate_id());
        let default_timeout = inner.config.borrow().default_timeout();
        let mut event = FeedbackEvent::new(id, message, category, options, default_timeout, current_time_ms());

        let decision = inner.dedupe.borrow_mut().evaluate(
            category,
            message,
            event.options.id.as_deref(),
            event.options.force,
            |id| self.is_active(id),
            Instant::now(),
        );
        tracing::debug!(id = %event.id, %category, ?decision, "feedback submitted");

        match decision {
            Decision::Skip => {
                event.deduped = true;
                inner.bus.emit(EventKind::Deduped, &event);
                return event;
            }
            Decision::Replace => {
                event.replaced = true;
                if let Some(old) = self.take_active(&event.id) {
                    self.notify_dismissed(old, DismissReason::Replaced);
                }
            }
            Decision::Proceed => {}
        }

        let mut text = message.to_string();
        if let Some(selector) = event.options.focus.clone() {
            let outcome = focus::move_focus(inner.scheduler.document(), category, &selector);
            if outcome.moved && event.options.explain_focus {
                let label = outcome.label.as_deref().unwrap_or_default();
                let suffix = i18n::focus_moved_message(&inner.config.borrow(), label);
                text = format!("{text} {suffix}");
            }
            event.focus = Some(outcome);
        }

        let serial = inner.next_serial.get();
        inner.next_serial.set(serial + 1);
        inner.active.borrow_mut().push(ActiveEntry {
            serial,
            event: event.clone(),
        });

        let delivery = inner
            .scheduler
            .announce(event.politeness, &text, event.options.force)
            .await;
        match delivery {
            Delivery::Written(written) => event.announced_text = Some(written),
            Delivery::Superseded => event.superseded = true,
        }
        if let Some(entry) = inner
            .active
            .borrow_mut()
            .iter_mut()
            .find(|entry| entry.serial == serial)
        {
            entry.event.announced_text = event.announced_text.clone();
            entry.event.superseded = event.superseded;
        }

        if event.replaced {
            inner.bus.emit(EventKind::Replaced, &event);
        } else if !event.superseded {
            inner.bus.emit(EventKind::Announced, &event);
        }
        if event.superseded {
            inner.bus.emit(EventKind::Superseded, &event);
        }
        if event.focus.as_ref().is_some_and(|f| f.moved) {
            inner.bus.emit(EventKind::FocusMoved, &event);
        }
        event
    }

    pub async fn success(&self, message: &str, options: FeedbackOptions) -> FeedbackEvent {
        self.submit(message, MessageCategory::Success, options).await
    }

    pub async fn info(&self, message: &str, options: FeedbackOptions) -> FeedbackEvent {
        self.submit(message, MessageCategory::Info, options).await
    }

    pub async fn loading(&self, message: &str, options: FeedbackOptions) -> FeedbackEvent {
        self.submit(message, MessageCategory::Loading, options).await
    }

    pub async fn warning(&self, message: &str, options: FeedbackOptions) -> FeedbackEvent {
        self.submit(message, MessageCategory::Warning, options).await
    }

    pub async fn error(&self, message: &str, options: FeedbackOptions) -> FeedbackEvent {
        self.submit(message, MessageCategory::Error, options).await
    }

    /// Write text to a live region directly, without dedupe or events
    pub async fn announce(&self, text: &str, politeness: Politeness, force: bool) -> Delivery {
        self.inner.scheduler.announce(politeness, text, force).await
    }

    fn generate_id(&self) -> String {
        let n = self.inner.next_id.get();
        self.inner.next_id.set(n + 1);
        format!("feedback-{n}")
    }

    // ------------------------------------------------------------------
    // Active events
    // ------------------------------------------------------------------

    pub fn is_active(&self, id: &str) -> bool {
        self.inner.active.borrow().iter().any(|entry| entry.event.id == id)
    }

    /// Active events in submission order
    pub fn active_events(&self) -> Vec<FeedbackEvent> {
        self.inner
            .active
            .borrow()
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    /// Earliest expiry among active events (epoch milliseconds)
    pub fn next_expiry(&self) -> Option<u64> {
        self.inner
            .active
            .borrow()
            .iter()
            .filter_map(|entry| entry.event.expires_at())
            .min()
    }

    /// Dismiss one event
    pub fn dismiss(&self, id: &str) -> Option<FeedbackEvent> {
        let event = self.take_active(id)?;
        Some(self.notify_dismissed(event, DismissReason::Manual))
    }

    /// Dismiss every active event
    pub fn dismiss_all(&self) -> Vec<FeedbackEvent> {
        let events: Vec<_> = self
            .inner
            .active
            .borrow_mut()
            .drain(..)
            .map(|entry| entry.event)
            .collect();
        events
            .into_iter()
            .map(|event| self.notify_dismissed(event, DismissReason::Manual))
            .collect()
    }

    /// Dismiss events whose timeout has elapsed at `now_ms` (epoch milliseconds).
    ///
    /// Events of categories that never auto-dismiss are left alone.
    pub fn dismiss_expired(&self, now_ms: u64) -> Vec<FeedbackEvent> {
        let expired: Vec<_> = {
            let mut active = self.inner.active.borrow_mut();
            let (expired, kept) = std::mem::take(&mut *active)
                .into_iter()
                .partition(|entry| entry.event.expires_at().is_some_and(|at| at <= now_ms));
            *active = kept;
            expired
        };
        expired
            .into_iter()
            .map(|entry| self.notify_dismissed(entry.event, DismissReason::Timeout))
            .collect()
    }

    fn take_active(&self, id: &str) -> Option<FeedbackEvent> {
        let mut active = self.inner.active.borrow_mut();
        let index = active.iter().position(|entry| entry.event.id == id)?;
        Some(active.remove(index).event)
    }

    /// Publish a dismissal and run the event's own callback
    fn notify_dismissed(&self, mut event: FeedbackEvent, reason: DismissReason) -> FeedbackEvent {
        event.dismiss_reason = Some(reason);
        tracing::debug!(id = %event.id, ?reason, "feedback dismissed");
        self.inner.bus.emit(EventKind::Dismissed, &event);

        if let Some(callback) = event.options.on_dismiss.clone() {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                if self.inner.config.borrow().debug {
                    tracing::warn!(id = %event.id, "dismiss callback panicked");
                } else {
                    tracing::debug!(id = %event.id, "dismiss callback panicked");
                }
            }
        }
        event
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&FeedbackEvent) -> anyhow::Result<()> + 'static,
    ) -> Subscription {
        self.inner.bus.on(kind, listener)
    }

    pub fn on_any(
        &self,
        listener: impl Fn(EventKind, &FeedbackEvent) -> anyhow::Result<()> + 'static,
    ) -> Subscription {
        self.inner.bus.on_any(listener)
    }

    pub fn off(&self, subscription: Subscription) -> bool {
        self.inner.bus.off(subscription)
    }

    // ------------------------------------------------------------------
    // Configuration and state
    // ------------------------------------------------------------------

    /// Validate and apply a new configuration, then reset state
    pub fn configure(&self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;
        let inner = &self.inner;
        inner.scheduler.reconfigure(
            config.min_announce_spacing(),
            config.invisible_chars.clone(),
            &config.region_prefix,
        );
        inner.dedupe.borrow_mut().set_window(config.dedupe_window());
        inner.bus.set_debug(config.debug);
        tracing::info!(prefix = %config.region_prefix, debug = config.debug, "announcer reconfigured");
        *inner.config.borrow_mut() = config;
        self.reset();
        Ok(())
    }

    /// Forget channel history, dedupe records and active events.
    ///
    /// Listeners stay registered; no dismissal notifications are sent.
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.scheduler.reset();
        inner.dedupe.borrow_mut().clear();
        inner.active.borrow_mut().clear();
        tracing::debug!("announcer state reset");
    }

    pub fn config(&self) -> Ref<'_, Config> {
        self.inner.config.borrow()
    }

    pub fn document(&self) -> Option<&SharedDocument> {
        self.inner.scheduler.document()
    }

    /// Scheduler, for inspecting regions and channel state
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_config() -> Config {
        Config {
            min_announce_spacing_ms: 5,
            ..Config::default()
        }
    }

    #[test]
    fn test_generated_ids() {
        let announcer = Announcer::new(fast_config()).unwrap();
        let (a, b) = smol::block_on(async {
            (
                announcer.info("one", FeedbackOptions::new()).await,
                announcer.info("two", FeedbackOptions::new()).await,
            )
        });
        assert_eq!(a.id, "feedback-1");
        assert_eq!(b.id, "feedback-2");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = Config {
            invisible_chars: vec![],
            ..Config::default()
        };
        assert_eq!(Announcer::new(config).err(), Some(ConfigError::EmptyInvisiblePool));
    }

    #[test]
    fn test_deduped_event_not_active() {
        let announcer = Announcer::new(fast_config()).unwrap();
        let second = smol::block_on(async {
            announcer.success("Saved", FeedbackOptions::new()).await;
            announcer.success("Saved", FeedbackOptions::new()).await
        });
        assert!(second.deduped);
        assert_eq!(second.announced_text, None);
        assert!(!announcer.is_active(&second.id));
        assert_eq!(announcer.active_events().len(), 1);
    }

    #[test]
    fn test_replacement_dismisses_previous() {
        let announcer = Announcer::new(fast_config()).unwrap();
        let reasons = Rc::new(RefCell::new(Vec::new()));
        let r = reasons.clone();
        let options = move || {
            let r = r.clone();
            FeedbackOptions::new()
                .with_id("upload")
                .on_dismiss(move |e| r.borrow_mut().push(e.dismiss_reason))
        };

        let second = smol::block_on(async {
            announcer.loading("Uploading", options()).await;
            announcer.loading("Uploading 50%", options()).await
        });

        assert!(second.replaced);
        assert_eq!(*reasons.borrow(), vec![Some(DismissReason::Replaced)]);
        let active = announcer.active_events();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "Uploading 50%");
    }

    #[test]
    fn test_dismiss_expired_skips_persistent_categories() {
        let announcer = Announcer::new(fast_config()).unwrap();
        smol::block_on(async {
            announcer.success("Saved", FeedbackOptions::new()).await;
            announcer.error("Failed", FeedbackOptions::new()).await;
            announcer
                .info("Synced", FeedbackOptions::new().with_timeout(Duration::from_secs(60)))
                .await;
        });

        let expiry = announcer.next_expiry().unwrap();
        let dismissed = announcer.dismiss_expired(expiry);
        assert_eq!(dismissed.len(), 1);
        assert_eq!(dismissed[0].message, "Saved");
        assert_eq!(dismissed[0].dismiss_reason, Some(DismissReason::Timeout));

        let dismissed = announcer.dismiss_expired(u64::MAX);
        assert_eq!(dismissed.len(), 1);
        assert_eq!(dismissed[0].message, "Synced");

        let remaining = announcer.active_events();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].category, MessageCategory::Error);
    }

    #[test]
    fn test_dismiss_callback_panic_is_contained() {
        let announcer = Announcer::new(fast_config()).unwrap();
        let event = smol::block_on(announcer.warning(
            "Low disk",
            FeedbackOptions::new().on_dismiss(|_| panic!("callback bug")),
        ));
        let dismissed = announcer.dismiss(&event.id).unwrap();
        assert_eq!(dismissed.dismiss_reason, Some(DismissReason::Manual));
        assert!(announcer.dismiss(&event.id).is_none());
    }

    #[test]
    fn test_reset_clears_state() {
        let announcer = Announcer::new(fast_config()).unwrap();
        smol::block_on(announcer.success("Saved", FeedbackOptions::new()));
        announcer.reset();
        assert!(announcer.active_events().is_empty());

        let again = smol::block_on(announcer.success("Saved", FeedbackOptions::new()));
        assert!(!again.deduped);
        assert_eq!(again.announced_text.as_deref(), Some("Saved"));
    }
}
