//! Focus Support
//!
//! Focusability checks and accessible labels for focus targets.

use herald_dom::{Document, DomError, NodeId};

/// Parsed tabindex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// No tabindex, or one that does not parse
    Absent,
    /// Negative: focusable by script, skipped by Tab
    Programmatic(i32),
    /// Zero or positive: part of sequential navigation
    Sequential(i32),
}

impl TabIndex {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().parse::<i32>()) {
            Some(Ok(n)) if n < 0 => Self::Programmatic(n),
            Some(Ok(n)) => Self::Sequential(n),
            _ => Self::Absent,
        }
    }

    /// Read the tabindex of an element
    pub fn of(doc: &Document, id: NodeId) -> Self {
        Self::parse(doc.get_attribute(id, "tabindex"))
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::Sequential(_))
    }
}

/// Focusable without help: interactive tag, zero/positive tabindex, or
/// content-editable
pub fn is_natively_focusable(doc: &Document, id: NodeId) -> bool {
    doc.is_interactive(id) || doc.is_content_editable(id) || TabIndex::of(doc, id).is_sequential()
}

/// Give an element `tabindex="-1"` unless it can already take focus.
///
/// Returns whether the attribute was added. The element stays out of the
/// sequential tab order.
pub fn make_programmatically_focusable(doc: &mut Document, id: NodeId) -> Result<bool, DomError> {
    if is_natively_focusable(doc, id) || matches!(TabIndex::of(doc, id), TabIndex::Programmatic(_)) {
        return Ok(false);
    }
    doc.set_attribute(id, "tabindex", "-1")?;
    Ok(true)
}

/// Human-readable label of a focus target.
///
/// Order: `aria-label`, `aria-labelledby` targets, associated `<label>`,
/// `placeholder`, `title`, own text content. Whitespace is collapsed; the
/// result is empty when nothing applies.
pub fn accessible_label(doc: &Document, id: NodeId) -> String {
    let attr = |name: &str| doc.get_attribute(id, name).map(normalize).filter(|s| !s.is_empty());

    if let Some(label) = attr("aria-label") {
        return label;
    }

    if let Some(ids) = doc.get_attribute(id, "aria-labelledby") {
        let text = ids
            .split_whitespace()
            .filter_map(|ref_id| doc.get_element_by_id(ref_id))
            .map(|n| normalize(&doc.text_content(n)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(label) = associated_label(doc, id) {
        return label;
    }

    attr("placeholder")
        .or_else(|| attr("title"))
        .unwrap_or_else(|| normalize(&doc.text_content(id)))
}

/// Text of `<label for=id>`, else of the nearest wrapping `<label>`
fn associated_label(doc: &Document, id: NodeId) -> Option<String> {
    let explicit = doc.get_attribute(id, "id").and_then(|element_id| {
        doc.query_selector_all("label")
            .ok()?
            .into_iter()
            .find(|&l| doc.get_attribute(l, "for") == Some(element_id))
    });
    let label = explicit.or_else(|| {
        doc.tree()
            .ancestors(id)
            .find(|&a| doc.tag_name(a) == Some("label"))
    })?;
    Some(normalize(&doc.text_content(label))).filter(|s| !s.is_empty())
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
