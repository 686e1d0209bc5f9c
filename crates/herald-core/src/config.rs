//! Announcer Configuration

use std::collections::HashMap;
use std::time::Duration;

use herald_a11y::DEFAULT_REGION_PREFIX;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Invisible characters appended to force a repeated announcement
pub const DEFAULT_INVISIBLE_CHARS: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Announcer configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log listener failures and other degraded paths at warn level
    pub debug: bool,

    /// Id prefix of the two live regions
    pub region_prefix: String,

    /// Auto-dismiss timeout for categories that allow it, when the caller
    /// gives none (milliseconds). `None` uses the per-category default.
    pub default_timeout_ms: Option<u64>,

    /// Identical `(category, text)` within this window is skipped (milliseconds)
    pub dedupe_window_ms: u64,

    /// Minimum spacing between writes to one live region (milliseconds)
    pub min_announce_spacing_ms: u64,

    /// Rotation pool for forced re-announcement
    pub invisible_chars: Vec<char>,

    /// Active locale for the focus explanation
    pub locale: String,

    /// Focus explanation templates by locale; `{label}` is substituted
    pub translations: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            region_prefix: DEFAULT_REGION_PREFIX.to_string(),
            default_timeout_ms: None,
            dedupe_window_ms: 500,
            min_announce_spacing_ms: 150,
            invisible_chars: DEFAULT_INVISIBLE_CHARS.to_vec(),
            locale: "en".to_string(),
            translations: HashMap::new(),
        }
    }
}

impl Config {
    /// Check values the announcer cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region_prefix.trim().is_empty()
            || self.region_prefix.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::InvalidPrefix(self.region_prefix.clone()));
        }
        if self.dedupe_window_ms == 0 {
            return Err(ConfigError::ZeroDedupeWindow);
        }
        if self.invisible_chars.is_empty() {
            return Err(ConfigError::EmptyInvisiblePool);
        }
        if let Some(&c) = self.invisible_chars.iter().find(|&&c| !is_invisible(c)) {
            return Err(ConfigError::VisibleCharacter(c));
        }
        Ok(())
    }

    pub fn dedupe_window(&self) -> Duration {
        Duration::from_millis(self.dedupe_window_ms)
    }

    pub fn min_announce_spacing(&self) -> Duration {
        Duration::from_millis(self.min_announce_spacing_ms)
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }
}

/// Zero-width and format characters that screen readers do not speak
fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}')
}
