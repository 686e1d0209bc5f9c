//! Deduplication & Replacement
//!
//! Decides whether a submission is new, replaces an active event, or is a
//! repeat of something announced moments ago.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use herald_a11y::MessageCategory;

/// Outcome for one candidate message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// New announcement
    Proceed,
    /// An active event has the same explicit id
    Replace,
    /// Same category and text inside the dedupe window
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupeKey {
    category: MessageCategory,
    text: String,
}

/// Deduplication engine
#[derive(Debug)]
pub struct DedupeEngine {
    window: Duration,
    records: HashMap<DedupeKey, Instant>,
}

impl DedupeEngine {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            records: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Records older than this are evicted on the next write
    pub fn retention(&self) -> Duration {
        self.window * 2
    }

    /// Decide what to do with a candidate.
    ///
    /// `is_active` reports whether an explicit id belongs to an active event.
    /// Id replacement wins over content dedupe; `force` skips content dedupe
    /// only. Proceed and replace refresh the key; skip leaves it alone so a
    /// burst of repeats cannot keep extending the window.
    pub fn evaluate(
        &mut self,
        category: MessageCategory,
        text: &str,
        id: Option<&str>,
        force: bool,
        is_active: impl Fn(&str) -> bool,
        now: Instant,
    ) -> Decision {
        let key = DedupeKey {
            category,
            text: text.to_string(),
        };

        let decision = if id.is_some_and(&is_active) {
            Decision::Replace
        } else if !force && self.is_recent(&key, now) {
            Decision::Skip
        } else {
            Decision::Proceed
        };

        if decision != Decision::Skip {
            self.record(key, now);
        }
        tracing::trace!(%category, ?decision, "dedupe decision");
        decision
    }

    fn is_recent(&self, key: &DedupeKey, now: Instant) -> bool {
        self.records
            .get(key)
            .is_some_and(|&at| now.saturating_duration_since(at) < self.window)
    }

    fn record(&mut self, key: DedupeKey, now: Instant) {
        self.purge(now);
        self.records.insert(key, now);
    }

    /// Evict records past the retention window
    pub fn purge(&mut self, now: Instant) {
        let retention = self.retention();
        self.records
            .retain(|_, &mut at| now.saturating_duration_since(at) < retention);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn never_active(_: &str) -> bool {
        false
    }

    #[test]
    fn test_duplicate_within_window_skipped() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        let cat = MessageCategory::Success;

        assert_eq!(engine.evaluate(cat, "Saved", None, false, never_active, t0), Decision::Proceed);
        assert_eq!(
            engine.evaluate(cat, "Saved", None, false, never_active, t0 + Duration::from_millis(100)),
            Decision::Skip
        );
        assert_eq!(
            engine.evaluate(cat, "Saved", None, false, never_active, t0 + WINDOW),
            Decision::Proceed
        );
    }

    #[test]
    fn test_skip_does_not_refresh_window() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        let cat = MessageCategory::Info;
        engine.evaluate(cat, "Syncing", None, false, never_active, t0);

        for ms in [100, 200, 300, 400] {
            let at = t0 + Duration::from_millis(ms);
            assert_eq!(engine.evaluate(cat, "Syncing", None, false, never_active, at), Decision::Skip);
        }
        // Measured from the first announcement, not the last skip
        let at = t0 + Duration::from_millis(520);
        assert_eq!(engine.evaluate(cat, "Syncing", None, false, never_active, at), Decision::Proceed);
    }

    #[test]
    fn test_key_includes_category() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        engine.evaluate(MessageCategory::Info, "Done", None, false, never_active, t0);
        assert_eq!(
            engine.evaluate(MessageCategory::Success, "Done", None, false, never_active, t0),
            Decision::Proceed
        );
        assert_eq!(
            engine.evaluate(MessageCategory::Success, "done", None, false, never_active, t0),
            Decision::Proceed
        );
    }

    #[test]
    fn test_force_bypasses_content_dedupe() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        let cat = MessageCategory::Error;
        engine.evaluate(cat, "Failed", None, false, never_active, t0);
        assert_eq!(engine.evaluate(cat, "Failed", None, true, never_active, t0), Decision::Proceed);
    }

    #[test]
    fn test_active_id_replaces_even_when_forced_or_duplicate() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        let cat = MessageCategory::Loading;
        let active = |id: &str| id == "upload";

        assert_eq!(engine.evaluate(cat, "Uploading", Some("upload"), false, never_active, t0), Decision::Proceed);
        assert_eq!(engine.evaluate(cat, "Uploading", Some("upload"), false, active, t0), Decision::Replace);
        assert_eq!(engine.evaluate(cat, "Uploading", Some("upload"), true, active, t0), Decision::Replace);
    }

    #[test]
    fn test_new_id_still_content_deduped() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        let cat = MessageCategory::Success;
        engine.evaluate(cat, "Saved", None, false, never_active, t0);
        assert_eq!(engine.evaluate(cat, "Saved", Some("fresh"), false, never_active, t0), Decision::Skip);
    }

    #[test]
    fn test_stale_records_purged_on_write() {
        let mut engine = DedupeEngine::new(WINDOW);
        let t0 = Instant::now();
        let cat = MessageCategory::Info;
        engine.evaluate(cat, "one", None, false, never_active, t0);
        engine.evaluate(cat, "two", None, false, never_active, t0 + Duration::from_millis(600));
        assert_eq!(engine.len(), 2);

        engine.evaluate(cat, "three", None, false, never_active, t0 + Duration::from_millis(1_000));
        assert_eq!(engine.len(), 2, "\"one\" is past twice the window");
    }
}
