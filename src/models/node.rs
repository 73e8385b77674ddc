//! Document node facade
//!
//! A [`DocumentNode`] owns its attributes, its optional text value and its
//! children (in insertion order). In strict mode it also owns a private
//! [`ContentInstance`] that decides where each child sits in schema order;
//! both order views are derived from the same child list.
//!
//! There is no parent back-reference: a child is owned by the parent's child
//! list and identified there by its [`ChildKey`].

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use crate::content::{ChildKey, ContentInstance};
use crate::error::{ModelError, RejectionReason, Violation};
use crate::models::value::Value;
use crate::renderers::musicxml::{self as writer, SerializeOptions};
use crate::schema::{AttributeDescriptor, ElementKind, Schema};
use crate::validate::validate;

/// Assignment through the child shorthand (see [`DocumentNode::set_child`])
#[derive(Debug, Clone)]
pub enum ChildValue<'s> {
    /// Replace the existing child of that kind, or add this one
    Node(DocumentNode<'s>),
    /// Update the existing child's value, or create a child holding it
    Value(Value),
    /// Remove the existing child, if any
    Clear,
}

impl<'s> From<DocumentNode<'s>> for ChildValue<'s> {
    fn from(node: DocumentNode<'s>) -> Self {
        ChildValue::Node(node)
    }
}

impl<'s> From<Value> for ChildValue<'s> {
    fn from(value: Value) -> Self {
        ChildValue::Value(value)
    }
}

/// One element of a document tree
#[derive(Clone)]
pub struct DocumentNode<'s> {
    schema: &'s Schema,
    kind: &'s ElementKind,
    key: Option<ChildKey>,
    value: Option<Value>,
    attributes: IndexMap<String, Value>,
    children: Vec<DocumentNode<'s>>,
    next_key: u64,
    content: Option<ContentInstance<'s>>,
    strict: bool,
}

impl fmt::Debug for DocumentNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentNode")
            .field("name", &self.name())
            .field("key", &self.key)
            .field("value", &self.value)
            .field("attributes", &self.attributes)
            .field("strict", &self.strict)
            .field("children", &self.children)
            .finish()
    }
}

impl<'s> DocumentNode<'s> {
    /// Empty node of kind `name`, strict mode
    pub fn new(schema: &'s Schema, name: &str) -> Result<Self, ModelError> {
        let kind = schema.require_kind(name)?;
        Ok(Self {
            schema,
            kind,
            key: None,
            value: None,
            attributes: IndexMap::new(),
            children: Vec::new(),
            next_key: 0,
            content: kind
                .content
                .as_ref()
                .map(|proto| ContentInstance::new(&kind.name, proto)),
            strict: true,
        })
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Result<Self, ModelError> {
        self.set_value(value)?;
        Ok(self)
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Result<Self, ModelError> {
        self.set_attribute(name, value)?;
        Ok(self)
    }

    pub fn with_child(mut self, child: DocumentNode<'s>) -> Result<Self, ModelError> {
        self.add_child(child)?;
        Ok(self)
    }

    /// Disable content-model checking for this node
    pub fn relaxed(mut self) -> Self {
        self.strict = false;
        self.content = None;
        self
    }

    pub fn name(&self) -> &'s str {
        &self.kind.name
    }

    pub fn kind(&self) -> &'s ElementKind {
        self.kind
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Key under which this node is attached to its parent
    pub fn key(&self) -> Option<ChildKey> {
        self.key
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn content(&self) -> Option<&ContentInstance<'s>> {
        self.content.as_ref()
    }

    /// Switch between strict and relaxed mode
    ///
    /// Turning strict mode on replays the children in insertion order; if one
    /// of them cannot be placed the node stays relaxed.
    pub fn set_strict(&mut self, strict: bool) -> Result<(), ModelError> {
        if !strict {
            self.strict = false;
            self.content = None;
            return Ok(());
        }
        if self.strict {
            return Ok(());
        }
        self.content = self.replay()?;
        self.strict = true;
        log::debug!("{}: strict mode restored ({} children)", self.name(), self.children.len());
        Ok(())
    }

    /// Content instance rebuilt from the current children
    fn replay(&self) -> Result<Option<ContentInstance<'s>>, ModelError> {
        let proto = match self.kind.content.as_ref() {
            Some(proto) => proto,
            None => return Ok(None),
        };
        let mut instance = ContentInstance::new(&self.kind.name, proto);
        for (key, child) in self.children.iter().filter_map(|c| c.key.map(|k| (k, c))) {
            instance.add_element(child.name(), key, None)?;
        }
        Ok(Some(instance))
    }

    // ------------------------------------------------------------------
    // Value
    // ------------------------------------------------------------------

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Validate and store the text value
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        match self.kind.value_type {
            Some(type_id) => {
                validate(self.schema.types(), &value, type_id, self.name())?;
                self.value = Some(value);
                Ok(())
            }
            None => Err(ModelError::violation(
                self.name(),
                Violation::ValueNotAllowed {
                    value: value.to_string(),
                },
            )),
        }
    }

    pub fn clear_value(&mut self) -> Option<Value> {
        self.value.take()
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn attribute_descriptor(&self, name: &str) -> Result<&'s AttributeDescriptor, ModelError> {
        self.kind.attribute(name).ok_or_else(|| {
            ModelError::violation(
                self.name(),
                Violation::UnknownAttribute {
                    name: name.to_string(),
                    allowed_attributes: self.kind.attribute_names(),
                    allowed_children: self.possible_children_names_owned(),
                },
            )
        })
    }

    /// Validate and store an attribute
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let descriptor = self.attribute_descriptor(name)?;
        let value = value.into();
        validate(self.schema.types(), &value, descriptor.type_id, self.name())?;
        self.attributes.insert(descriptor.name.clone(), value);
        Ok(())
    }

    /// Delete an attribute; the name must still be a known attribute
    pub fn remove_attribute(&mut self, name: &str) -> Result<Option<Value>, ModelError> {
        self.attribute_descriptor(name)?;
        Ok(self.attributes.shift_remove(name))
    }

    /// Set the attribute, or delete it when `value` is `None`
    pub fn assign_attribute(&mut self, name: &str, value: Option<Value>) -> Result<(), ModelError> {
        match value {
            Some(value) => self.set_attribute(name, value),
            None => self.remove_attribute(name).map(|_| ()),
        }
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Sorted names of every element kind this node may contain
    pub fn possible_children_names(&self) -> Vec<&'s str> {
        match &self.content {
            Some(content) => content.possible_element_names().into_iter().collect(),
            None => self.kind.possible_children().into_iter().collect(),
        }
    }

    fn possible_children_names_owned(&self) -> Vec<String> {
        self.possible_children_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Attach `child` at the first eligible slot
    pub fn add_child(&mut self, child: DocumentNode<'s>) -> Result<&mut DocumentNode<'s>, ModelError> {
        self.add_child_at_slot(child, None)
    }

    /// Attach `child`, choosing the `forward`-th eligible slot when several accept it
    ///
    /// In relaxed mode the content model is not consulted.
    pub fn add_child_at_slot(
        &mut self,
        mut child: DocumentNode<'s>,
        forward: Option<usize>,
    ) -> Result<&mut DocumentNode<'s>, ModelError> {
        if !self.kind.is_composite() {
            return Err(ModelError::rejection(
                self.name(),
                child.name(),
                RejectionReason::CannotHaveChildren,
            ));
        }

        let key = ChildKey(self.next_key);
        if let Some(content) = self.content.as_mut() {
            content.add_element(child.name(), key, forward)?;
        }
        self.next_key += 1;
        child.key = Some(key);

        let index = self.children.len();
        self.children.push(child);
        Ok(&mut self.children[index])
    }

    /// Children in schema order (`ordered` in strict mode) or insertion order
    pub fn children(&self, ordered: bool) -> Vec<&DocumentNode<'s>> {
        match (&self.content, ordered) {
            (Some(content), true) => {
                let by_key: HashMap<ChildKey, &DocumentNode<'s>> = self
                    .children
                    .iter()
                    .filter_map(|c| c.key.map(|k| (k, c)))
                    .collect();
                content
                    .ordered_keys()
                    .into_iter()
                    .filter_map(|k| by_key.get(&k).copied())
                    .collect()
            }
            _ => self.children.iter().collect(),
        }
    }

    /// First child of kind `name` in schema order
    pub fn child(&self, name: &str) -> Option<&DocumentNode<'s>> {
        self.children(true).into_iter().find(|c| c.name() == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut DocumentNode<'s>> {
        let key = self.child(name)?.key?;
        self.child_by_key_mut(key)
    }

    pub fn find_children(&self, name: &str) -> Vec<&DocumentNode<'s>> {
        self.children(true)
            .into_iter()
            .filter(|c| c.name() == name)
            .collect()
    }

    pub fn child_by_key(&self, key: ChildKey) -> Option<&DocumentNode<'s>> {
        self.children.iter().find(|c| c.key == Some(key))
    }

    pub fn child_by_key_mut(&mut self, key: ChildKey) -> Option<&mut DocumentNode<'s>> {
        self.children.iter_mut().find(|c| c.key == Some(key))
    }

    /// Value of the first child of kind `name`
    pub fn child_value(&self, name: &str) -> Option<&Value> {
        self.child(name).and_then(|c| c.value())
    }

    fn position_of(&self, key: ChildKey) -> Result<usize, ModelError> {
        self.children
            .iter()
            .position(|c| c.key == Some(key))
            .ok_or_else(|| ModelError::NotFound {
                parent: self.name().to_string(),
                target: format!("child {}", key),
            })
    }

    fn nth_match(
        &self,
        predicate: impl Fn(&DocumentNode<'s>) -> bool,
        index: usize,
    ) -> Result<ChildKey, ModelError> {
        self.children(true)
            .into_iter()
            .filter(|c| predicate(*c))
            .nth(index)
            .and_then(|c| c.key)
            .ok_or_else(|| ModelError::NotFound {
                parent: self.name().to_string(),
                target: format!("predicate match {}", index),
            })
    }

    /// Detach and return the child `key`
    pub fn remove(&mut self, key: ChildKey) -> Result<DocumentNode<'s>, ModelError> {
        let position = self.position_of(key)?;
        if let Some(content) = self.content.as_mut() {
            content.remove_element(key)?;
        }
        let mut removed = self.children.remove(position);
        removed.key = None;
        Ok(removed)
    }

    /// Detach the `index`-th child (schema order) matching `predicate`
    pub fn remove_where(
        &mut self,
        predicate: impl Fn(&DocumentNode<'s>) -> bool,
        index: usize,
    ) -> Result<DocumentNode<'s>, ModelError> {
        let key = self.nth_match(predicate, index)?;
        self.remove(key)
    }

    /// Put `new` where child `key` was and return the old child
    ///
    /// A child of the same kind takes over the old slot. A child of another
    /// kind is placed afresh; if that fails the old child stays attached.
    /// The insertion-order position is kept either way.
    pub fn replace_child(
        &mut self,
        key: ChildKey,
        mut new: DocumentNode<'s>,
    ) -> Result<DocumentNode<'s>, ModelError> {
        let position = self.position_of(key)?;
        let same_kind = self.children[position].name() == new.name();

        let new_key = match self.content.as_mut() {
            Some(content) if !same_kind => {
                let snapshot = content.clone();
                content.remove_element(key)?;
                let new_key = ChildKey(self.next_key);
                if let Err(err) = content.add_element(new.name(), new_key, None) {
                    *content = snapshot;
                    return Err(err);
                }
                self.next_key += 1;
                new_key
            }
            _ => key,
        };

        new.key = Some(new_key);
        let mut old = std::mem::replace(&mut self.children[position], new);
        old.key = None;
        Ok(old)
    }

    /// Replace the `index`-th child (schema order) matching `predicate`
    pub fn replace_child_where(
        &mut self,
        predicate: impl Fn(&DocumentNode<'s>) -> bool,
        new: DocumentNode<'s>,
        index: usize,
    ) -> Result<DocumentNode<'s>, ModelError> {
        let key = self.nth_match(predicate, index)?;
        self.replace_child(key, new)
    }

    /// Child shorthand: treat the child of kind `name` like an attribute
    pub fn set_child(&mut self, name: &str, value: impl Into<ChildValue<'s>>) -> Result<(), ModelError> {
        if !self.kind.possible_children().contains(name) {
            return Err(ModelError::violation(
                self.name(),
                Violation::UnknownChild {
                    name: name.to_string(),
                    allowed_children: self.possible_children_names_owned(),
                },
            ));
        }

        let existing = self.child(name).and_then(|c| c.key);
        match value.into() {
            ChildValue::Node(node) => {
                if node.name() != name {
                    return Err(ModelError::violation(
                        self.name(),
                        Violation::UnknownChild {
                            name: node.name().to_string(),
                            allowed_children: vec![name.to_string()],
                        },
                    ));
                }
                match existing {
                    Some(key) => {
                        self.replace_child(key, node)?;
                    }
                    None => {
                        self.add_child(node)?;
                    }
                }
            }
            ChildValue::Value(value) => match existing.and_then(|key| self.child_by_key_mut(key)) {
                Some(child) => child.set_value(value)?,
                None => {
                    let child = DocumentNode::new(self.schema, name)?.with_value(value)?;
                    self.add_child(child)?;
                }
            },
            ChildValue::Clear => {
                if let Some(key) = existing {
                    self.remove(key)?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Checks and output
    // ------------------------------------------------------------------

    /// Element names still missing for this node to be complete
    ///
    /// A relaxed node derives them from a transient replay of its children.
    pub fn required_children(&self, intelligent_choice: bool) -> Result<Vec<&'s str>, ModelError> {
        match &self.content {
            Some(content) => Ok(content.required_element_names(intelligent_choice)),
            None => Ok(self
                .replay()?
                .map(|instance| instance.required_element_names(intelligent_choice))
                .unwrap_or_default()),
        }
    }

    /// Validate this node and, recursively, its strict descendants
    ///
    /// The first failure aborts the whole check.
    pub fn final_checks(&self, intelligent_choice: bool) -> Result<(), ModelError> {
        self.check_self(intelligent_choice)?;
        for child in self.children(true) {
            if child.strict {
                child.final_checks(intelligent_choice)?;
            }
        }
        Ok(())
    }

    fn check_self(&self, intelligent_choice: bool) -> Result<(), ModelError> {
        if self.kind.has_simple_content() && self.value.is_none() {
            return Err(ModelError::violation(self.name(), Violation::MissingValue));
        }

        if let Some(missing) = self
            .kind
            .required_attributes()
            .find(|a| !self.attributes.contains_key(&a.name))
        {
            return Err(ModelError::violation(
                self.name(),
                Violation::MissingAttribute(missing.name.clone()),
            ));
        }

        let required = self.required_children(intelligent_choice)?;
        if !required.is_empty() {
            return Err(ModelError::violation(
                self.name(),
                Violation::MissingChildren(required.into_iter().map(String::from).collect()),
            ));
        }
        Ok(())
    }

    /// Render this node alone, without XML declaration
    pub fn to_xml(&self) -> Result<String, ModelError> {
        writer::write_fragment(self, &SerializeOptions::default())
    }

    /// Render a complete document rooted at this node
    pub fn serialize(&self) -> Result<String, ModelError> {
        self.serialize_with(&SerializeOptions::default())
    }

    pub fn serialize_with(&self, options: &SerializeOptions) -> Result<String, ModelError> {
        writer::write_document(self, options)
    }
}
