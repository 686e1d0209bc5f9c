//! Document - High-level document API

use crate::{DomError, DomTree, MutationRecord, NodeId, Selector};

/// Tags that take focus without a tabindex
const INTERACTIVE_TAGS: &[&str] = &[
    "button", "input", "select", "textarea", "iframe", "summary", "embed", "object",
];

/// HTML Document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    active_element: Option<NodeId>,
    /// Container focus is confined to
    focus_trap: Option<NodeId>,
    /// Recorded mutations, when logging is enabled
    mutations: Option<Vec<MutationRecord>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with `<html>`, `<head>` and `<body>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh nodes under a fresh root cannot fail to attach
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            html_element: html,
            head_element: head,
            body_element: body,
            active_element: None,
            focus_trap: None,
            mutations: None,
        }
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get `<head>` element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get `<body>` element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    // ------------------------------------------------------------------
    // Mutation log
    // ------------------------------------------------------------------

    /// Start recording mutations (clears anything recorded before)
    pub fn enable_mutation_log(&mut self) {
        self.mutations = Some(Vec::new());
    }

    /// Drain recorded mutations
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        self.mutations.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, record: MutationRecord) {
        if let Some(log) = self.mutations.as_mut() {
            log.push(record);
        }
    }

    // ------------------------------------------------------------------
    // Tree construction
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Append `child` under `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.tree.append_child(parent, child)?;
        self.record(MutationRecord::node_inserted(child, parent));
        Ok(())
    }

    /// Append `child` to `<body>`
    pub fn append_to_body(&mut self, child: NodeId) -> Result<(), DomError> {
        self.append_child(self.body_element, child)
    }

    /// Detach a node (and its subtree) from the document
    pub fn remove(&mut self, id: NodeId) {
        if self.tree.parent(id).is_none() {
            return;
        }
        self.tree.detach(id);
        if self.active_element.is_some_and(|a| !self.tree.is_connected(a)) {
            self.active_element = None;
        }
        self.record(MutationRecord::node_removed(id));
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.tree.element(id).map(|e| e.tag.as_str())
    }

    /// Get connected element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| self.tree.element(n).and_then(|e| e.id()) == Some(id))
    }

    /// First connected element matching `selector`
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&n| selector.matches(&self.tree, n)))
    }

    /// All connected elements matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|&n| selector.matches(&self.tree, n))
            .collect())
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.tree.element(id).and_then(|e| e.attributes.get(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let old = self.tree.element_mut(id)?.attributes.set(name, value);
        if old.as_deref() != Some(value) {
            self.record(MutationRecord::attr_modified(id, name, old, Some(value)));
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        if let Some(old) = self.tree.element_mut(id)?.attributes.remove(name) {
            self.record(MutationRecord::attr_modified(id, name, Some(old), None));
        }
        Ok(())
    }

    /// Concatenated descendant text
    pub fn text_content(&self, id: NodeId) -> String {
        self.tree.text_content(id)
    }

    /// Replace the children of `id` with `text`
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        let old = self.tree.text_content(id);
        self.tree.set_text_content(id, text)?;
        self.record(MutationRecord::text_modified(id, old, text));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Interactive element that is focusable without a tabindex
    pub fn is_interactive(&self, id: NodeId) -> bool {
        let Some(element) = self.tree.element(id) else {
            return false;
        };
        match element.tag.as_str() {
            "a" | "area" => element.attributes.has("href"),
            "input" => element.attributes.get("type") != Some("hidden"),
            "audio" | "video" => element.attributes.has("controls"),
            tag => INTERACTIVE_TAGS.contains(&tag),
        }
    }

    /// `contenteditable` set to an editing value
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        matches!(
            self.get_attribute(id, "contenteditable"),
            Some("" | "true" | "plaintext-only")
        )
    }

    /// Whether `focus()` would succeed: connected, rendered, enabled, and
    /// interactive, editable, or carrying a parseable tabindex
    pub fn is_focusable(&self, id: NodeId) -> bool {
        if self.tree.element(id).is_none() || !self.tree.is_connected(id) {
            return false;
        }
        if self.has_attribute(id, "disabled") && self.is_interactive(id) {
            return false;
        }
        let hidden = std::iter::once(id)
            .chain(self.tree.ancestors(id))
            .any(|n| self.has_attribute(n, "hidden") || self.has_attribute(n, "inert"));
        if hidden {
            return false;
        }
        let has_tabindex = self
            .get_attribute(id, "tabindex")
            .is_some_and(|t| t.trim().parse::<i32>().is_ok());
        self.is_interactive(id) || self.is_content_editable(id) || has_tabindex
    }

    /// Confine focus to a container, or release with `None`
    pub fn set_focus_trap(&mut self, container: Option<NodeId>) {
        self.focus_trap = container;
    }

    /// Move focus to an element.
    ///
    /// Like the platform call, focusing something that cannot take focus is
    /// silently ignored; callers confirm through `active_element`.
    pub fn focus(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.tree.get(id).is_none() {
            return Err(DomError::MissingNode(id));
        }
        if self.tree.element(id).is_none() {
            return Err(DomError::NotAnElement(id));
        }
        if !self.is_focusable(id) {
            tracing::trace!(?id, "focus ignored: element not focusable");
            return Ok(());
        }
        if let Some(trap) = self.focus_trap {
            if id != trap && !self.tree.ancestors(id).any(|a| a == trap) {
                tracing::trace!(?id, ?trap, "focus ignored: outside focus trap");
                return Ok(());
            }
        }
        if self.active_element != Some(id) {
            self.active_element = Some(id);
            self.record(MutationRecord::focus_changed(id));
        }
        Ok(())
    }

    /// Currently focused element
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }
}
