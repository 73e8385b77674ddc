//! Error types for the MusicXML object model
//!
//! Every failure is raised synchronously where it is detected and carries the
//! offending element kind, value or name. Nothing is retried or auto-corrected.

use std::fmt;

use thiserror::Error;

use crate::schema::types::{Bound, Primitive};

/// Errors raised while building, mutating or checking a document tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A structural or value-level rule of the schema is violated
    #[error("{element}: {violation}")]
    SchemaViolation { element: String, violation: Violation },

    /// A child cannot be placed in any eligible slot of its parent's content model
    #[error("{parent} cannot accept child <{child}>: {reason}")]
    ContentModelRejection {
        parent: String,
        child: String,
        reason: RejectionReason,
    },

    /// The runtime kind of a value does not match its type descriptor
    #[error("{element}: value '{value}' is {found} but only {} accepted{}", list_kinds(.expected), permitted_suffix(.permitted))]
    TypeMismatch {
        element: String,
        value: String,
        found: Primitive,
        expected: Vec<Primitive>,
        permitted: Vec<String>,
    },

    /// The target of a remove/replace operation is not a child of this node
    #[error("{parent} has no child matching {target}")]
    NotFound { parent: String, target: String },
}

impl ModelError {
    pub(crate) fn violation(element: impl Into<String>, violation: Violation) -> Self {
        ModelError::SchemaViolation {
            element: element.into(),
            violation,
        }
    }

    pub(crate) fn rejection(
        parent: impl Into<String>,
        child: impl Into<String>,
        reason: RejectionReason,
    ) -> Self {
        ModelError::ContentModelRejection {
            parent: parent.into(),
            child: child.into(),
            reason,
        }
    }

    /// The concrete violation, if this is a `SchemaViolation`
    pub fn as_violation(&self) -> Option<&Violation> {
        match self {
            ModelError::SchemaViolation { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// The specific schema rule that was broken
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("value '{value}' must be one of {permitted:?}")]
    NotInEnumeration { value: String, permitted: Vec<String> },

    #[error("value '{value}' must match the pattern {pattern}")]
    PatternMismatch { value: String, pattern: String },

    #[error("value '{value}' violates {bound}")]
    OutOfBounds { value: String, bound: Bound },

    #[error("value '{value}' is not accepted by any member of the union: {}", .errors.join("; "))]
    NoUnionMember { value: String, errors: Vec<String> },

    #[error("a value is required")]
    MissingValue,

    #[error("value '{value}' is not allowed, the element has no text content")]
    ValueNotAllowed { value: String },

    #[error("requires attribute '{0}'")]
    MissingAttribute(String),

    #[error("requires at least the following children: {0:?}")]
    MissingChildren(Vec<String>),

    #[error("has no attribute '{name}'. Allowed attributes are: {allowed_attributes:?} or possible children as attributes: {allowed_children:?}")]
    UnknownAttribute {
        name: String,
        allowed_attributes: Vec<String>,
        allowed_children: Vec<String>,
    },

    #[error("has no child element '{name}'. Possible children are: {allowed_children:?}")]
    UnknownChild {
        name: String,
        allowed_children: Vec<String>,
    },

    #[error("unknown element kind '{0}'")]
    UnknownElement(String),
}

/// Why the content-model engine refused a child
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The element name does not occur anywhere in the parent's content model
    NotInContentModel,
    /// Every slot for this name is full or excluded by an earlier choice
    NoEligibleSlot,
    /// A disambiguation index was supplied that does not select an eligible slot
    DisambiguationOutOfRange { index: usize, eligible: usize },
    /// The parent kind has simple or empty content
    CannotHaveChildren,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::NotInContentModel => write!(f, "not part of the content model"),
            RejectionReason::NoEligibleSlot => write!(f, "no eligible slot left"),
            RejectionReason::DisambiguationOutOfRange { index, eligible } => write!(
                f,
                "slot index {} out of range ({} eligible slots)",
                index, eligible
            ),
            RejectionReason::CannotHaveChildren => write!(f, "element cannot have children"),
        }
    }
}

/// Errors raised while loading or resolving a schema catalog
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid catalog document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown simple type '{name}' referenced by {referrer}")]
    UnknownType { name: String, referrer: String },

    #[error("Unknown group '{name}' referenced by {referrer}")]
    UnknownGroup { name: String, referrer: String },

    #[error("Unknown attribute group '{name}' referenced by {referrer}")]
    UnknownAttributeGroup { name: String, referrer: String },

    #[error("Unknown element '{name}' referenced by {referrer}")]
    UnknownElement { name: String, referrer: String },

    #[error("Cycle in definition of '{0}'")]
    Cycle(String),

    #[error("Simple type '{0}' declares no kinds and has no base or union members")]
    Untyped(String),

    #[error("Invalid particle in {referrer}: {message}")]
    InvalidParticle { referrer: String, message: String },

    #[error("Invalid pattern in type '{name}': {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

fn list_kinds(kinds: &[Primitive]) -> String {
    kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

fn permitted_suffix(permitted: &[String]) -> String {
    if permitted.is_empty() {
        String::new()
    } else {
        format!(" (permitted values: {:?})", permitted)
    }
}

/// Result alias for model operations
pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_message_names_element() {
        let err = ModelError::violation(
            "score-part",
            Violation::MissingAttribute("id".to_string()),
        );
        assert_eq!(err.to_string(), "score-part: requires attribute 'id'");
    }

    #[test]
    fn test_type_mismatch_message_lists_kinds() {
        let err = ModelError::TypeMismatch {
            element: "octave".to_string(),
            value: "four".to_string(),
            found: Primitive::String,
            expected: vec![Primitive::Integer],
            permitted: vec![],
        };
        assert_eq!(
            err.to_string(),
            "octave: value 'four' is string but only integer accepted"
        );
    }

    #[test]
    fn test_rejection_message() {
        let err = ModelError::rejection("key", "note", RejectionReason::NotInContentModel);
        assert_eq!(
            err.to_string(),
            "key cannot accept child <note>: not part of the content model"
        );
    }
}
