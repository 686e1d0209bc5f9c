//! Selectors
//!
//! The subset needed to locate focus targets: type, universal, `#id`,
//! `.class`, `[attr]`, `[attr=value]`, compounds of those, the descendant
//! combinator and comma-separated lists. Other combinators and
//! pseudo-classes are rejected as invalid.

use crate::{DomError, DomTree, NodeId};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

/// Simple selectors that must all match one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound(pub Vec<SimpleSelector>);

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Alternatives; each is a chain of compounds joined by descendant combinators
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(input.to_string());

        let mut alternatives = Vec::new();
        for part in split_outside_brackets(input, |c| c == ',') {
            let compounds = split_outside_brackets(part, char::is_whitespace)
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(|s| parse_compound(s).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()?;
            if compounds.is_empty() {
                return Err(invalid());
            }
            alternatives.push(compounds);
        }
        Ok(Self { alternatives })
    }

    /// Check if an element matches
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|chain| matches_chain(tree, element, chain))
    }
}

impl Compound {
    pub fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        let Some(data) = tree.element(element) else {
            return false;
        };
        self.0.iter().all(|simple| match simple {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => data.tag.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => data.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => data.has_class(class),
            SimpleSelector::Attribute { name, value } => match value {
                Some(expected) => data.attributes.get(name) == Some(expected.as_str()),
                None => data.attributes.has(name),
            },
        })
    }
}

fn matches_chain(tree: &DomTree, element: NodeId, chain: &[Compound]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.matches(tree, element) {
        return false;
    }
    // Remaining compounds must match ancestors, right to left
    let mut pending = rest.iter().rev().peekable();
    for ancestor in tree.ancestors(element) {
        match pending.peek() {
            Some(compound) if compound.matches(tree, ancestor) => {
                pending.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    pending.peek().is_none()
}

fn split_outside_brackets(input: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 && is_sep(c) => {
                parts.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut simples = Vec::new();
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        match c {
            '*' => {
                simples.push(SimpleSelector::Universal);
                rest = &rest[1..];
            }
            '#' | '.' => {
                let body = &rest[1..];
                let end = body.find(|ch: char| !is_ident_char(ch)).unwrap_or(body.len());
                if end == 0 {
                    return None;
                }
                let ident = body[..end].to_string();
                simples.push(if c == '#' {
                    SimpleSelector::Id(ident)
                } else {
                    SimpleSelector::Class(ident)
                });
                rest = &body[end..];
            }
            '[' => {
                let close = rest.find(']')?;
                simples.push(parse_attribute(&rest[1..close])?);
                rest = &rest[close + 1..];
            }
            c if is_ident_char(c) && simples.is_empty() => {
                let end = rest.find(|ch: char| !is_ident_char(ch)).unwrap_or(rest.len());
                simples.push(SimpleSelector::Tag(rest[..end].to_ascii_lowercase()));
                rest = &rest[end..];
            }
            _ => return None,
        }
    }

    (!simples.is_empty()).then_some(Compound(simples))
}

fn parse_attribute(inner: &str) -> Option<SimpleSelector> {
    let (name, value) = match inner.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (inner.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    Some(SimpleSelector::Attribute {
        name: name.to_ascii_lowercase(),
        value,
    })
}
