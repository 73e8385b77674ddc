//! Type descriptors for scalar (attribute and text) values
//!
//! Descriptors are resolved once from the catalog into an arena and referenced
//! by [`TypeId`]. They are never mutated afterwards.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Runtime representation a scalar value can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Integer,
    Decimal,
    String,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Integer => write!(f, "integer"),
            Primitive::Decimal => write!(f, "decimal"),
            Primitive::String => write!(f, "string"),
        }
    }
}

/// Whitespace facet applied before enumeration and pattern checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteSpace {
    #[default]
    Preserve,
    Replace,
    Collapse,
}

impl WhiteSpace {
    /// Normalize `text` according to this facet
    pub fn apply<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            WhiteSpace::Preserve => text.into(),
            WhiteSpace::Replace => text.replace(['\t', '\n', '\r'], " ").into(),
            WhiteSpace::Collapse => text.split_whitespace().collect::<Vec<_>>().join(" ").into(),
        }
    }
}

/// A numeric or length restriction, checked in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    MinLength(usize),
    MaxLength(usize),
    MinExclusive(f64),
    MinInclusive(f64),
    MaxInclusive(f64),
    MaxExclusive(f64),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::MinLength(n) => write!(f, "minLength {}", n),
            Bound::MaxLength(n) => write!(f, "maxLength {}", n),
            Bound::MinExclusive(v) => write!(f, "minExclusive {}", v),
            Bound::MinInclusive(v) => write!(f, "minInclusive {}", v),
            Bound::MaxInclusive(v) => write!(f, "maxInclusive {}", v),
            Bound::MaxExclusive(v) => write!(f, "maxExclusive {}", v),
        }
    }
}

/// Handle of a [`TypeDescriptor`] inside a [`TypeTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) usize);

/// A compiled, fully anchored pattern facet
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Validation rules for one scalar type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    /// Accepted runtime kinds (inherited from the base, or merged from union members)
    pub kinds: Vec<Primitive>,
    /// Literals accepted before any other check (e.g. the empty string of an "-or-empty" type)
    pub forced_permitted: Vec<String>,
    pub enumeration: Vec<String>,
    pub pattern: Option<Pattern>,
    pub bounds: Vec<Bound>,
    pub whitespace: WhiteSpace,
    pub union: Vec<TypeId>,
    pub base: Option<TypeId>,
}

impl TypeDescriptor {
    pub fn is_union(&self) -> bool {
        !self.union.is_empty()
    }
}

/// Arena of resolved type descriptors
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    descriptors: Vec<TypeDescriptor>,
}

impl TypeTable {
    pub(crate) fn push(&mut self, descriptor: TypeDescriptor) -> TypeId {
        self.descriptors.push(descriptor);
        TypeId(self.descriptors.len() - 1)
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut TypeDescriptor {
        &mut self.descriptors[id.0]
    }

    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.descriptors[id.0]
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterate the base chain starting at (and including) `id`
    pub fn chain(&self, id: TypeId) -> impl Iterator<Item = &TypeDescriptor> + '_ {
        let mut next = Some(id);
        std::iter::from_fn(move || {
            let current = self.get(next?);
            next = current.base;
            Some(current)
        })
    }

    /// The nearest non-preserving whitespace facet on the base chain
    pub fn effective_whitespace(&self, id: TypeId) -> WhiteSpace {
        self.chain(id)
            .map(|d| d.whitespace)
            .find(|ws| *ws != WhiteSpace::Preserve)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(WhiteSpace::Collapse.apply("  light \n heavy "), "light heavy");
        assert_eq!(WhiteSpace::Replace.apply("a\tb"), "a b");
        assert_eq!(WhiteSpace::Preserve.apply(" a "), " a ");
    }

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = Pattern::new("[1-9][0-9]*").unwrap();
        assert!(pattern.is_full_match("12"));
        assert!(!pattern.is_full_match("12a"));
        assert!(!pattern.is_full_match("012"));
    }
}
