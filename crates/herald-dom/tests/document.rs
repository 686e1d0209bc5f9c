//! Document edge case tests
//!
//! Selector lookups, attribute mutation and focus behaviour through the
//! public `Document` API.

use herald_dom::*;

fn form_document() -> (Document, NodeId, NodeId, NodeId) {
    let mut doc = Document::new();
    let form = doc.create_element("form");
    let label = doc.create_element("label");
    let input = doc.create_element("input");
    doc.set_attribute(form, "id", "checkout").unwrap();
    doc.set_attribute(label, "for", "card").unwrap();
    doc.set_attribute(input, "id", "card").unwrap();
    doc.set_attribute(input, "class", "field field-error").unwrap();
    doc.append_to_body(form).unwrap();
    doc.append_child(form, label).unwrap();
    doc.append_child(form, input).unwrap();
    doc.set_text_content(label, "Card number").unwrap();
    (doc, form, label, input)
}

// ============================================================================
// QUERY TESTS
// ============================================================================

#[test]
fn test_query_selector_by_id_and_class() {
    let (doc, _, _, input) = form_document();
    assert_eq!(doc.query_selector("#card").unwrap(), Some(input));
    assert_eq!(doc.query_selector(".field-error").unwrap(), Some(input));
    assert_eq!(doc.query_selector("#checkout .field").unwrap(), Some(input));
    assert_eq!(doc.query_selector("#missing").unwrap(), None);
}

#[test]
fn test_query_selector_attribute() {
    let (doc, _, label, _) = form_document();
    assert_eq!(doc.query_selector("label[for=\"card\"]").unwrap(), Some(label));
    assert_eq!(doc.query_selector("label[for=other]").unwrap(), None);
}

#[test]
fn test_query_selector_all_in_document_order() {
    let (mut doc, form, label, input) = form_document();
    let second = doc.create_element("input");
    doc.append_child(form, second).unwrap();
    assert_eq!(doc.query_selector_all("form *").unwrap(), vec![label, input, second]);
}

#[test]
fn test_invalid_selector_is_an_error() {
    let (doc, ..) = form_document();
    assert!(matches!(
        doc.query_selector("form > input"),
        Err(DomError::InvalidSelector(_))
    ));
}

// ============================================================================
// ATTRIBUTE & TEXT TESTS
// ============================================================================

#[test]
fn test_attribute_changes_are_logged_once() {
    let (mut doc, _, _, input) = form_document();
    doc.enable_mutation_log();
    doc.set_attribute(input, "tabindex", "-1").unwrap();
    doc.set_attribute(input, "tabindex", "-1").unwrap();
    doc.remove_attribute(input, "tabindex").unwrap();
    doc.remove_attribute(input, "tabindex").unwrap();

    let records = doc.take_mutations();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].new_value.as_deref(), Some("-1"));
    assert_eq!(records[1].prev_value.as_deref(), Some("-1"));
    assert_eq!(records[1].new_value, None);
}

#[test]
fn test_set_attribute_on_text_node_fails() {
    let (mut doc, _, label, _) = form_document();
    let text = doc.tree().children(label)[0];
    assert_eq!(
        doc.set_attribute(text, "id", "x"),
        Err(DomError::NotAnElement(text))
    );
}

// ============================================================================
// FOCUS TESTS
// ============================================================================

#[test]
fn test_focus_missing_node_is_error() {
    let mut doc = Document::new();
    // An id from a larger document points past the end of this arena
    let mut far = Document::new();
    for _ in 0..10 {
        far.create_element("div");
    }
    let far_id = far.create_element("div");
    assert_eq!(doc.focus(far_id), Err(DomError::MissingNode(far_id)));
}

#[test]
fn test_removing_focused_element_clears_active() {
    let (mut doc, form, _, input) = form_document();
    doc.focus(input).unwrap();
    assert_eq!(doc.active_element(), Some(input));

    doc.remove(form);
    assert_eq!(doc.active_element(), None);
    assert!(!doc.is_focusable(input));
}

#[test]
fn test_contenteditable_is_focusable() {
    let mut doc = Document::new();
    let div = doc.create_element("div");
    doc.append_to_body(div).unwrap();
    assert!(!doc.is_focusable(div));
    doc.set_attribute(div, "contenteditable", "true").unwrap();
    assert!(doc.is_focusable(div));
    doc.set_attribute(div, "contenteditable", "false").unwrap();
    assert!(!doc.is_focusable(div));
}
