//! ARIA Support
//!
//! Live-region roles and politeness levels.

use serde::{Deserialize, Serialize};

use crate::A11yError;

/// ARIA roles with implicit live-region semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    Alert,
    Log,
    Marquee,
    Status,
    Timer,
}

impl AriaRole {
    /// Parse from string
    pub fn parse(s: &str) -> Result<Self, A11yError> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "alert" => Self::Alert,
            "log" => Self::Log,
            "marquee" => Self::Marquee,
            "status" => Self::Status,
            "timer" => Self::Timer,
            _ => return Err(A11yError::InvalidRole(s.to_string())),
        })
    }

    /// Attribute value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Log => "log",
            Self::Marquee => "marquee",
            Self::Status => "status",
            Self::Timer => "timer",
        }
    }

    /// Politeness implied by the role; `None` means `aria-live="off"`
    pub fn implicit_politeness(&self) -> Option<Politeness> {
        match self {
            Self::Alert => Some(Politeness::Assertive),
            Self::Log | Self::Status => Some(Politeness::Polite),
            Self::Marquee | Self::Timer => None,
        }
    }
}

impl std::fmt::Display for AriaRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    /// Waits for a pause in speech
    Polite,
    /// Interrupts current speech
    Assertive,
}

impl Politeness {
    pub const ALL: [Politeness; 2] = [Politeness::Polite, Politeness::Assertive];

    /// `aria-live` value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }

    /// Role written on the live region for this channel
    pub fn role(&self) -> AriaRole {
        match self {
            Self::Polite => AriaRole::Status,
            Self::Assertive => AriaRole::Alert,
        }
    }

    /// Dense index, for per-channel arrays
    pub fn index(&self) -> usize {
        match self {
            Self::Polite => 0,
            Self::Assertive => 1,
        }
    }
}

impl std::fmt::Display for Politeness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
