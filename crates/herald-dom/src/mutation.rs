//! Mutation Records
//!
//! Changes made through the `Document` API, recorded in order when the
//! document's mutation log is enabled.

use crate::NodeId;

/// Mutation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    NodeInserted,
    NodeRemoved,
    AttributeModified,
    TextContentModified,
    FocusChanged,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
    pub attr_name: Option<String>,
    pub prev_value: Option<String>,
    pub new_value: Option<String>,
}

impl MutationRecord {
    /// Node appended under `parent`
    pub fn node_inserted(target: NodeId, parent: NodeId) -> Self {
        Self {
            kind: MutationKind::NodeInserted,
            target,
            attr_name: None,
            prev_value: None,
            new_value: Some(format!("{}", parent.0)),
        }
    }

    /// Node detached from its parent
    pub fn node_removed(target: NodeId) -> Self {
        Self {
            kind: MutationKind::NodeRemoved,
            target,
            attr_name: None,
            prev_value: None,
            new_value: None,
        }
    }

    /// Attribute set or removed
    pub fn attr_modified(target: NodeId, name: &str, old: Option<String>, new: Option<&str>) -> Self {
        Self {
            kind: MutationKind::AttributeModified,
            target,
            attr_name: Some(name.to_string()),
            prev_value: old,
            new_value: new.map(str::to_string),
        }
    }

    /// Text content replaced
    pub fn text_modified(target: NodeId, old: String, new: &str) -> Self {
        Self {
            kind: MutationKind::TextContentModified,
            target,
            attr_name: None,
            prev_value: Some(old),
            new_value: Some(new.to_string()),
        }
    }

    /// Active element changed to `target`
    pub fn focus_changed(target: NodeId) -> Self {
        Self {
            kind: MutationKind::FocusChanged,
            target,
            attr_name: None,
            prev_value: None,
            new_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_modified_record() {
        let record = MutationRecord::attr_modified(NodeId(1), "class", Some("old".into()), Some("new"));

        assert_eq!(record.kind, MutationKind::AttributeModified);
        assert_eq!(record.attr_name, Some("class".to_string()));
        assert_eq!(record.prev_value, Some("old".to_string()));
        assert_eq!(record.new_value, Some("new".to_string()));
    }

    #[test]
    fn test_text_modified_record() {
        let record = MutationRecord::text_modified(NodeId(4), "Saved".into(), "");
        assert_eq!(record.kind, MutationKind::TextContentModified);
        assert_eq!(record.new_value.as_deref(), Some(""));
    }
}
