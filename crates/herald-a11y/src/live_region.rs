//! Live Region Support
//!
//! Owns the two live regions announcements are written into. Regions are
//! created on first use and looked up by id before creation, so several
//! managers sharing one prefix cooperate on the same elements.

use herald_dom::{Document, NodeId};

use crate::{A11yError, Politeness};

/// Default id prefix; regions are `<prefix>-polite` and `<prefix>-assertive`
pub const DEFAULT_REGION_PREFIX: &str = "herald-live";

/// Keeps a region in the accessibility tree while taking no space on screen
pub const VISUALLY_HIDDEN_STYLE: &str = "position:absolute;width:1px;height:1px;padding:0;margin:-1px;overflow:hidden;clip:rect(0,0,0,0);white-space:nowrap;border:0";

/// Live region manager
#[derive(Debug)]
pub struct RegionManager {
    prefix: String,
    regions: [Option<NodeId>; 2],
}

impl Default for RegionManager {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_PREFIX)
    }
}

impl RegionManager {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            regions: [None, None],
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Change the prefix; regions are resolved again on next use
    pub fn set_prefix(&mut self, prefix: &str) {
        if self.prefix != prefix {
            self.prefix = prefix.to_string();
            self.regions = [None, None];
        }
    }

    /// Element id of a region
    pub fn region_id(&self, politeness: Politeness) -> String {
        format!("{}-{}", self.prefix, politeness.as_str())
    }

    /// Region for a politeness level, if resolved
    pub fn region(&self, politeness: Politeness) -> Option<NodeId> {
        self.regions[politeness.index()]
    }

    /// Make sure both regions exist in `doc`.
    ///
    /// Known regions still attached to the document are kept; otherwise an
    /// element with the region id is adopted, or a new one is appended to
    /// `<body>`. Once both are resolved this is a no-op.
    pub fn ensure(&mut self, doc: &mut Document) -> Result<(), A11yError> {
        for politeness in Politeness::ALL {
            let slot = politeness.index();
            if self.regions[slot].is_some_and(|id| doc.tree().is_connected(id)) {
                continue;
            }
            let id = self.region_id(politeness);
            let node = match doc.get_element_by_id(&id) {
                Some(existing) => {
                    tracing::debug!(region = %id, "adopting existing live region");
                    existing
                }
                None => {
                    let node = doc.create_element("div");
                    doc.set_attribute(node, "id", &id)?;
                    doc.set_attribute(node, "style", VISUALLY_HIDDEN_STYLE)?;
                    doc.append_to_body(node)
                        .map_err(|_| A11yError::RegionUnavailable(id.clone()))?;
                    tracing::debug!(region = %id, "created live region");
                    node
                }
            };
            doc.set_attribute(node, "role", politeness.role().as_str())?;
            doc.set_attribute(node, "aria-live", politeness.as_str())?;
            doc.set_attribute(node, "aria-atomic", "true")?;
            self.regions[slot] = Some(node);
        }
        Ok(())
    }
}
