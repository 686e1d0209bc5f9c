//! Focus Mediator
//!
//! Moves focus for categories that are allowed to, and reports why it did
//! not otherwise. Never fails: every problem becomes a [`BlockedReason`].

use herald_a11y::{MessageCategory, accessible_label, make_programmatically_focusable};
use herald_dom::SharedDocument;

use crate::{BlockedReason, FocusOutcome};

/// Try to move focus to the first element matching `selector`
pub fn move_focus(
    document: Option<&SharedDocument>,
    category: MessageCategory,
    selector: &str,
) -> FocusOutcome {
    let outcome = resolve(document, category, selector);
    match &outcome.blocked_reason {
        None => tracing::debug!(%category, selector, "focus moved"),
        Some(reason) => tracing::debug!(%category, selector, %reason, "focus not moved"),
    }
    outcome
}

fn resolve(
    document: Option<&SharedDocument>,
    category: MessageCategory,
    selector: &str,
) -> FocusOutcome {
    if !category.policy().can_move_focus {
        return FocusOutcome::blocked(selector, BlockedReason::CategoryNotPermitted(category));
    }
    let Some(document) = document else {
        return FocusOutcome::blocked(selector, BlockedReason::NoDocument);
    };

    let mut doc = document.borrow_mut();
    let target = match doc.query_selector(selector) {
        Ok(Some(target)) => target,
        Ok(None) | Err(_) => {
            return FocusOutcome::blocked(selector, BlockedReason::TargetNotFound(selector.to_string()));
        }
    };

    let tabindex_added = match make_programmatically_focusable(&mut doc, target) {
        Ok(added) => added,
        Err(err) => {
            return FocusOutcome::blocked(selector, BlockedReason::FocusFailed(err.to_string()));
        }
    };
    let label = Some(accessible_label(&doc, target)).filter(|l| !l.is_empty());

    let blocked_reason = match doc.focus(target) {
        Err(err) => Some(BlockedReason::FocusFailed(err.to_string())),
        Ok(()) if doc.active_element() != Some(target) => {
            Some(BlockedReason::FocusRejected(selector.to_string()))
        }
        Ok(()) => None,
    };

    // Leave a target that did not take focus as it was
    let mut tabindex_added = tabindex_added;
    if blocked_reason.is_some() && tabindex_added {
        match doc.remove_attribute(target, "tabindex") {
            Ok(()) => tabindex_added = false,
            Err(err) => tracing::debug!(%err, selector, "could not restore tabindex"),
        }
    }

    FocusOutcome {
        target: selector.to_string(),
        moved: blocked_reason.is_none(),
        label,
        tabindex_added,
        blocked_reason,
    }
}
