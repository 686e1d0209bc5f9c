//! Semantic Policy
//!
//! Fixed mapping from message category to ARIA semantics. The table is
//! compiled in and has no setters: role, politeness and focus permission of
//! a message follow from its category alone.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{A11yError, AriaRole, Politeness};

/// Message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Success,
    Info,
    Loading,
    Warning,
    Error,
}

/// Announcement priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    High,
    Critical,
}

/// Per-category semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemanticPolicy {
    pub role: AriaRole,
    pub politeness: Politeness,
    pub priority: Priority,
    /// Whether a message of this category may move keyboard focus
    pub can_move_focus: bool,
    /// Whether visual representations may disappear on their own
    pub auto_dismiss: bool,
    /// Timeout used when neither the caller nor the config supplies one
    pub default_timeout: Option<Duration>,
}

const SUCCESS: SemanticPolicy = SemanticPolicy {
    role: AriaRole::Status,
    politeness: Politeness::Polite,
    priority: Priority::Low,
    can_move_focus: false,
    auto_dismiss: true,
    default_timeout: Some(Duration::from_millis(3000)),
};

const INFO: SemanticPolicy = SemanticPolicy {
    role: AriaRole::Status,
    politeness: Politeness::Polite,
    priority: Priority::Low,
    can_move_focus: false,
    auto_dismiss: true,
    default_timeout: Some(Duration::from_millis(5000)),
};

const LOADING: SemanticPolicy = SemanticPolicy {
    role: AriaRole::Status,
    politeness: Politeness::Polite,
    priority: Priority::Low,
    can_move_focus: false,
    auto_dismiss: false,
    default_timeout: None,
};

const WARNING: SemanticPolicy = SemanticPolicy {
    role: AriaRole::Alert,
    politeness: Politeness::Assertive,
    priority: Priority::High,
    can_move_focus: true,
    auto_dismiss: true,
    default_timeout: Some(Duration::from_millis(8000)),
};

const ERROR: SemanticPolicy = SemanticPolicy {
    role: AriaRole::Alert,
    politeness: Politeness::Assertive,
    priority: Priority::Critical,
    can_move_focus: true,
    auto_dismiss: false,
    default_timeout: None,
};

/// Look up the policy of a category
pub fn policy(category: MessageCategory) -> &'static SemanticPolicy {
    match category {
        MessageCategory::Success => &SUCCESS,
        MessageCategory::Info => &INFO,
        MessageCategory::Loading => &LOADING,
        MessageCategory::Warning => &WARNING,
        MessageCategory::Error => &ERROR,
    }
}

impl MessageCategory {
    pub const ALL: [MessageCategory; 5] = [
        MessageCategory::Success,
        MessageCategory::Info,
        MessageCategory::Loading,
        MessageCategory::Warning,
        MessageCategory::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Loading => "loading",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Semantic policy of this category
    pub fn policy(&self) -> &'static SemanticPolicy {
        policy(*self)
    }

    /// Resolve the auto-dismiss timeout.
    ///
    /// Categories that never auto-dismiss return `None` whatever is requested.
    /// Otherwise the caller's value wins, then the configured default, then
    /// the category default.
    pub fn resolve_timeout(
        &self,
        requested: Option<Duration>,
        configured: Option<Duration>,
    ) -> Option<Duration> {
        let policy = self.policy();
        if !policy.auto_dismiss {
            return None;
        }
        requested.or(configured).or(policy.default_timeout)
    }
}

impl FromStr for MessageCategory {
    type Err = A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| A11yError::UnknownCategory(s.to_string()))
    }
}

impl std::fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
