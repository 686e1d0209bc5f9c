//! herald Core
//!
//! Decides whether, when and how a message reaches a screen-reader live
//! region. Duplicates are skipped, events with a repeated id replace each
//! other, writes to each region are spaced and coalesced, identical text is
//! forced to re-announce, and focus moves only for categories allowed to
//! move it.
//!
//! # Example
//! ```rust,ignore
//! use herald_core::{Announcer, Config, FeedbackOptions};
//!
//! let announcer = Announcer::with_document(Config::default(), document)?;
//! let event = smol::block_on(announcer.error(
//!     "Email is required",
//!     FeedbackOptions::new().with_focus("#email").explain_focus(),
//! ));
//! assert!(event.focus.unwrap().moved);
//! ```

mod announcer;
mod bus;
mod config;
mod dedupe;
mod error;
mod event;
pub mod focus;
pub mod i18n;
mod scheduler;

pub use announcer::Announcer;
pub use bus::{EmitReport, EventBus, Subscription};
pub use config::{Config, DEFAULT_INVISIBLE_CHARS};
pub use dedupe::{Decision, DedupeEngine};
pub use error::{BlockedReason, ConfigError};
pub use event::{DismissCallback, DismissReason, EventKind, FeedbackEvent, FeedbackOptions, FocusOutcome};
pub use scheduler::{ChannelState, Delivery, Scheduler};

// Re-export sub-crates for advanced usage
pub use herald_a11y as a11y;
pub use herald_dom as dom;
pub use herald_a11y::{AriaRole, MessageCategory, Politeness, Priority};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
