//! herald Accessibility
//!
//! ARIA vocabulary and accessibility rules used by the announcement core.
//!
//! Features:
//! - Live-region roles and politeness levels
//! - Fixed semantic policy per message category
//! - Focusability checks and accessible labels
//! - Live region management (one polite, one assertive)

pub mod aria;
pub mod focus;
pub mod live_region;
pub mod policy;

pub use aria::{AriaRole, Politeness};
pub use focus::{TabIndex, accessible_label, is_natively_focusable, make_programmatically_focusable};
pub use live_region::{RegionManager, DEFAULT_REGION_PREFIX, VISUALLY_HIDDEN_STYLE};
pub use policy::{MessageCategory, Priority, SemanticPolicy, policy};

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Unknown message category: {0}")]
    UnknownCategory(String),

    #[error("Invalid ARIA role: {0}")]
    InvalidRole(String),

    #[error("Live region {0} could not be created")]
    RegionUnavailable(String),

    #[error("DOM error: {0}")]
    Dom(#[from] herald_dom::DomError),
}
