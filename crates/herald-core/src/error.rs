//! Error types
//!
//! Nothing on the announcement path fails outright. Configuration can be
//! rejected, and focus requests report why they did not move focus.

use herald_a11y::MessageCategory;
use serde::Serialize;

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid live region prefix: {0:?}")]
    InvalidPrefix(String),

    #[error("Dedupe window must be greater than zero")]
    ZeroDedupeWindow,

    #[error("Invisible character pool is empty")]
    EmptyInvisiblePool,

    #[error("Character {0:?} in the invisible pool would be spoken")]
    VisibleCharacter(char),
}

/// Why a focus request did not move focus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum BlockedReason {
    #[error("focus movement is not permitted for {0} messages")]
    CategoryNotPermitted(MessageCategory),

    #[error("no document is available")]
    NoDocument,

    #[error("no element matches {0:?}")]
    TargetNotFound(String),

    #[error("element {0:?} did not take focus")]
    FocusRejected(String),

    #[error("focus call failed: {0}")]
    FocusFailed(String),
}
