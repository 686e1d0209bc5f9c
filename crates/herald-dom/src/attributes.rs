//! Element Attributes
//!
//! Ordered attribute list with get, set, remove, has.
//! Names are stored lowercased, as HTML attribute names are case-insensitive.

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            value: value.into(),
        }
    }
}

/// Attribute collection of one element
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    attributes: Vec<Attr>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Get attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.attributes[i].value.as_str())
    }

    /// Set attribute, returning the previous value
    pub fn set(&mut self, name: &str, value: &str) -> Option<String> {
        match self.position(name) {
            Some(i) => Some(std::mem::replace(
                &mut self.attributes[i].value,
                value.to_string(),
            )),
            None => {
                self.attributes.push(Attr::new(name, value));
                None
            }
        }
    }

    /// Remove attribute, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.attributes.remove(i).value)
    }

    /// Check if attribute exists
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Whitespace-separated tokens of an attribute (class, aria-labelledby)
    pub fn tokens(&self, name: &str) -> impl Iterator<Item = &str> {
        self.get(name).unwrap_or_default().split_whitespace()
    }

    /// Iterate over attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_attribute() {
        let mut attrs = Attributes::new();
        attrs.set("class", "btn");
        attrs.set("id", "submit");

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("class"), Some("btn"));
        assert_eq!(attrs.get("ID"), Some("submit"));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut attrs = Attributes::new();
        assert_eq!(attrs.set("tabindex", "0"), None);
        assert_eq!(attrs.set("tabindex", "-1"), Some("0".to_string()));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_remove_attribute() {
        let mut attrs = Attributes::new();
        attrs.set("foo", "bar");

        assert!(attrs.has("foo"));
        assert_eq!(attrs.remove("foo"), Some("bar".to_string()));
        assert!(!attrs.has("foo"));
    }

    #[test]
    fn test_tokens() {
        let mut attrs = Attributes::new();
        attrs.set("class", "  toast   toast-error ");
        let classes: Vec<_> = attrs.tokens("class").collect();
        assert_eq!(classes, vec!["toast", "toast-error"]);
        assert_eq!(attrs.tokens("missing").count(), 0);
    }
}
