//! Focus explanation text
//!
//! Templates come from `Config::translations`, keyed by locale, with the
//! primary language subtag as fallback (`fr-CA` falls back to `fr`).

use crate::Config;

/// English template; `{label}` is replaced by the target's accessible label
pub const DEFAULT_FOCUS_TEMPLATE: &str = "Focus moved to {label}.";

/// Template for the configured locale
pub fn focus_template(config: &Config) -> &str {
    let locale = config.locale.as_str();
    let language = locale.split(['-', '_']).next().unwrap_or(locale);
    config
        .translations
        .get(locale)
        .or_else(|| config.translations.get(language))
        .map(String::as_str)
        .unwrap_or(DEFAULT_FOCUS_TEMPLATE)
}

/// "Focus moved to {label}." in the configured locale
pub fn focus_moved_message(config: &Config, label: &str) -> String {
    focus_template(config).replace("{label}", label)
}
