//! Feedback events
//!
//! The record built for every submission, the options a caller passes, and
//! the lifecycle kinds published on the event bus.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use herald_a11y::{AriaRole, MessageCategory, Politeness, Priority};
use serde::Serialize;

use crate::BlockedReason;

/// Called once when an event is dismissed, for whatever reason
pub type DismissCallback = Rc<dyn Fn(&FeedbackEvent)>;

/// Caller options for one submission
#[derive(Clone, Default, Serialize)]
pub struct FeedbackOptions {
    /// Explicit id; a second submission with the same id replaces the first
    pub id: Option<String>,
    /// Selector of the element to move focus to
    pub focus: Option<String>,
    /// Append "Focus moved to {label}." when focus moves
    pub explain_focus: bool,
    /// Bypass content dedupe and force the text to register as new
    pub force: bool,
    /// Auto-dismiss timeout for categories that allow one
    pub timeout: Option<Duration>,
    #[serde(skip)]
    pub on_dismiss: Option<DismissCallback>,
}

impl fmt::Debug for FeedbackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedbackOptions")
            .field("id", &self.id)
            .field("focus", &self.focus)
            .field("explain_focus", &self.explain_focus)
            .field("force", &self.force)
            .field("timeout", &self.timeout)
            .field("on_dismiss", &self.on_dismiss.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl FeedbackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_focus(mut self, selector: impl Into<String>) -> Self {
        self.focus = Some(selector.into());
        self
    }

    pub fn explain_focus(mut self) -> Self {
        self.explain_focus = true;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn on_dismiss(mut self, callback: impl Fn(&FeedbackEvent) + 'static) -> Self {
        self.on_dismiss = Some(Rc::new(callback));
        self
    }
}

/// Lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new message reached its live region
    Announced,
    /// A message replaced an active one with the same id
    Replaced,
    /// A message was skipped as a duplicate
    Deduped,
    /// Focus moved to the requested target
    FocusMoved,
    /// A pending write was overtaken by a newer one on the same channel
    Superseded,
    /// An active event was removed
    Dismissed,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Announced,
        EventKind::Replaced,
        EventKind::Deduped,
        EventKind::FocusMoved,
        EventKind::Superseded,
        EventKind::Dismissed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Announced => "announced",
            Self::Replaced => "replaced",
            Self::Deduped => "deduped",
            Self::FocusMoved => "focus_moved",
            Self::Superseded => "superseded",
            Self::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an event left the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    Manual,
    Replaced,
    Timeout,
}

/// Result of a focus request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusOutcome {
    /// Selector the caller asked for
    pub target: String,
    pub moved: bool,
    /// Accessible label of the target, when one was resolved
    pub label: Option<String>,
    /// Whether `tabindex="-1"` had to be added
    pub tabindex_added: bool,
    pub blocked_reason: Option<BlockedReason>,
}

impl FocusOutcome {
    pub(crate) fn blocked(target: &str, reason: BlockedReason) -> Self {
        Self {
            target: target.to_string(),
            moved: false,
            label: None,
            tabindex_added: false,
            blocked_reason: Some(reason),
        }
    }
}

/// One notification, as returned to the caller and published to listeners
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEvent {
    pub id: String,
    pub message: String,
    pub category: MessageCategory,
    pub role: AriaRole,
    pub politeness: Politeness,
    pub priority: Priority,
    pub options: FeedbackOptions,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
    pub replaced: bool,
    pub deduped: bool,
    pub superseded: bool,
    /// Exact text written to the live region, invisible characters included
    pub announced_text: Option<String>,
    pub focus: Option<FocusOutcome>,
    /// Auto-dismiss timeout; always `None` for categories that never auto-dismiss
    pub timeout: Option<Duration>,
    /// Set on the copy published with a `Dismissed` notification
    pub dismiss_reason: Option<DismissReason>,
}

impl FeedbackEvent {
    /// Build an event; semantics are copied from the category policy
    pub fn new(
        id: String,
        message: &str,
        category: MessageCategory,
        options: FeedbackOptions,
        default_timeout: Option<Duration>,
        created_at: u64,
    ) -> Self {
        let policy = category.policy();
        let timeout = category.resolve_timeout(options.timeout, default_timeout);
        Self {
            id,
            message: message.to_string(),
            category,
            role: policy.role,
            politeness: policy.politeness,
            priority: policy.priority,
            options,
            created_at,
            replaced: false,
            deduped: false,
            superseded: false,
            announced_text: None,
            focus: None,
            timeout,
            dismiss_reason: None,
        }
    }

    /// Whether the event goes away on its own
    pub fn auto_dismisses(&self) -> bool {
        self.timeout.is_some()
    }

    /// Epoch milliseconds after which the event may be dismissed
    pub fn expires_at(&self) -> Option<u64> {
        self.timeout
            .map(|t| self.created_at.saturating_add(t.as_millis() as u64))
    }
}

/// Milliseconds since the Unix epoch
pub(crate) fn current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(category: MessageCategory, options: FeedbackOptions) -> FeedbackEvent {
        FeedbackEvent::new("feedback-1".into(), "Saved", category, options, None, 1_000)
    }

    #[test]
    fn test_semantics_copied_from_policy() {
        for category in MessageCategory::ALL {
            let e = event(category, FeedbackOptions::new());
            let policy = category.policy();
            assert_eq!(e.role, policy.role);
            assert_eq!(e.politeness, policy.politeness);
            assert_eq!(e.priority, policy.priority);
        }
    }

    #[test]
    fn test_error_never_expires() {
        let e = event(
            MessageCategory::Error,
            FeedbackOptions::new().with_timeout(Duration::from_millis(10)),
        );
        assert!(!e.auto_dismisses());
        assert_eq!(e.expires_at(), None);
    }

    #[test]
    fn test_expires_at_uses_category_default() {
        let e = event(MessageCategory::Success, FeedbackOptions::new());
        assert_eq!(e.expires_at(), Some(4_000));
    }

    #[test]
    fn test_serialize_event() {
        let e = event(MessageCategory::Warning, FeedbackOptions::new().with_id("sync"));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["category"], "warning");
        assert_eq!(json["role"], "alert");
        assert_eq!(json["politeness"], "assertive");
        assert_eq!(json["options"]["id"], "sync");
    }

    #[test]
    fn test_options_debug_hides_callback() {
        let options = FeedbackOptions::new().on_dismiss(|_| {});
        assert!(format!("{options:?}").contains("<callback>"));
    }
}
