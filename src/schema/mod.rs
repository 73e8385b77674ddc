//! Resolved schema metadata
//!
//! The schema is the read-only input of the object model: for every element
//! kind it supplies the content-model prototype, the flattened attribute
//! descriptors and (for simple content) the type descriptor of its text.
//!
//! # Module Structure
//!
//! - **types**: `TypeDescriptor` arena and facets
//! - **content**: `ContentNode` prototypes (sequence/choice/group/leaf)
//! - **catalog**: YAML catalog format and its one-time resolution
//!
//! The built-in MusicXML catalog lives in `musicxml.yaml` and is resolved on
//! first use by [`Schema::musicxml`].

pub mod catalog;
pub mod content;
pub mod types;

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::OnceCell;

use crate::error::{ModelError, SchemaError, Violation};
use crate::models::node::DocumentNode;
use content::ContentNode;
use types::{TypeDescriptor, TypeId, TypeTable};

const MUSICXML_CATALOG: &str = include_str!("musicxml.yaml");

static MUSICXML: OnceCell<Schema> = OnceCell::new();

/// Name, use and type of one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub required: bool,
    pub type_id: TypeId,
}

/// Everything the object model knows about one element kind
#[derive(Debug, Clone)]
pub struct ElementKind {
    pub name: String,
    /// Name of the complex or simple type the element was declared with
    pub type_name: String,
    /// Content-model prototype, present only for composite kinds
    pub content: Option<ContentNode>,
    /// Flattened closure of own and referenced attribute groups
    pub attributes: Vec<AttributeDescriptor>,
    /// Type of the text content, present only for kinds with simple content
    pub value_type: Option<TypeId>,
}

impl ElementKind {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn is_composite(&self) -> bool {
        self.content.is_some()
    }

    pub fn has_simple_content(&self) -> bool {
        self.value_type.is_some()
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.iter().filter(|a| a.required)
    }

    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attributes.iter().map(|a| a.name.clone()).collect();
        names.sort();
        names
    }

    /// Every element name that may appear as a child of this kind
    pub fn possible_children(&self) -> BTreeSet<&str> {
        self.content
            .as_ref()
            .map(|c| c.element_names())
            .unwrap_or_default()
    }
}

/// Static registry of element kinds and type descriptors
#[derive(Debug)]
pub struct Schema {
    types: TypeTable,
    type_names: HashMap<String, TypeId>,
    elements: HashMap<String, ElementKind>,
}

impl Schema {
    /// Load and resolve a catalog document
    pub fn from_yaml(source: &str) -> Result<Schema, SchemaError> {
        let catalog: catalog::Catalog = serde_yaml::from_str(source)?;
        catalog.resolve()
    }

    /// The built-in MusicXML catalog, resolved once per process
    ///
    /// The catalog is a subset of MusicXML 4.0 built around `score-partwise`:
    /// headers, part lists, measures, attributes, notes with pitch, rhythm,
    /// ties, beams and lyrics, directions, barlines and the common notations.
    /// There is no `score-timewise`, `harmony`, `figured-bass`, `ornaments` or
    /// `technical`; documents using them fail with `UnknownElement`. Load a
    /// fuller catalog through [`Schema::from_yaml`] for those.
    pub fn musicxml() -> Result<&'static Schema, SchemaError> {
        MUSICXML.get_or_try_init(|| {
            let schema = Schema::from_yaml(MUSICXML_CATALOG)?;
            log::info!(
                "MusicXML catalog resolved: {} element kinds, {} types",
                schema.elements.len(),
                schema.types.len()
            );
            Ok(schema)
        })
    }

    pub(crate) fn new(
        types: TypeTable,
        type_names: HashMap<String, TypeId>,
        elements: HashMap<String, ElementKind>,
    ) -> Self {
        Self {
            types,
            type_names,
            elements,
        }
    }

    pub fn element_kind(&self, name: &str) -> Option<&ElementKind> {
        self.elements.get(name)
    }

    pub(crate) fn require_kind(&self, name: &str) -> Result<&ElementKind, ModelError> {
        self.element_kind(name).ok_or_else(|| {
            ModelError::violation(name, Violation::UnknownElement(name.to_string()))
        })
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(|k| k.as_str())
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(name).copied()
    }

    pub fn type_descriptor(&self, name: &str) -> Option<&TypeDescriptor> {
        self.type_id(name).map(|id| self.types.get(id))
    }

    /// Create an empty, strict document node of kind `name`
    pub fn element(&self, name: &str) -> Result<DocumentNode<'_>, ModelError> {
        DocumentNode::new(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_resolves() {
        let schema = Schema::musicxml().expect("built-in catalog should resolve");
        let note = schema.element_kind("note").expect("note kind");
        assert!(note.is_composite());
        assert!(note.possible_children().contains("pitch"));
        assert!(note.possible_children().contains("duration"));

        let step = schema.element_kind("step").expect("step kind");
        assert!(step.has_simple_content());
        assert!(!step.is_composite());
    }

    #[test]
    fn test_kinds_outside_the_builtin_subset() {
        let schema = Schema::musicxml().unwrap();
        for name in ["harmony", "figured-bass", "ornaments", "score-timewise"] {
            assert!(schema.element_kind(name).is_none(), "{} is registered", name);
            assert!(schema.element(name).is_err());
        }
    }

    #[test]
    fn test_every_content_leaf_is_registered() {
        let schema = Schema::musicxml().unwrap();
        for name in schema.element_names() {
            let kind = schema.element_kind(name).unwrap();
            for child in kind.possible_children() {
                assert!(
                    schema.element_kind(child).is_some(),
                    "{} references unregistered child {}",
                    name,
                    child
                );
            }
        }
    }

    #[test]
    fn test_score_part_requires_id() {
        let schema = Schema::musicxml().unwrap();
        let score_part = schema.element_kind("score-part").unwrap();
        let required: Vec<_> = score_part.required_attributes().map(|a| a.name.as_str()).collect();
        assert_eq!(required, vec!["id"]);
    }

    #[test]
    fn test_unknown_element_kind() {
        let schema = Schema::musicxml().unwrap();
        let err = schema.element("no-such-element").unwrap_err();
        assert_eq!(
            err.as_violation(),
            Some(&Violation::UnknownElement("no-such-element".to_string()))
        );
    }
}
