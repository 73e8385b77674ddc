//! XML text to document tree
//!
//! Walks a `roxmltree` document and rebuilds it through the public node
//! operations only, so every attribute, value and child goes through the same
//! checks as hand-built trees.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use super::errors::ParseError;
use crate::models::{DocumentNode, Value};
use crate::schema::types::TypeId;
use crate::schema::Schema;
use crate::validate::validate;

/// Lexical form of `xs:decimal`; no exponent, no `NaN`/`INF`
static DECIMAL_LEXICAL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").ok());

/// Input options for parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Build strict nodes; relaxed nodes keep document order unchecked
    pub strict: bool,

    /// Drop namespaced attributes (`xml:lang`, `xlink:href`, ...) with a warning
    pub skip_unknown_namespaced_attributes: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: true,
            skip_unknown_namespaced_attributes: true,
        }
    }
}

/// Parse MusicXML text into a tree of `schema` nodes
pub fn parse_musicxml<'s>(
    schema: &'s Schema,
    xml: &str,
    options: &ParseOptions,
) -> Result<DocumentNode<'s>, ParseError> {
    let source = strip_doctype(xml);
    let document = Document::parse(&source)
        .map_err(|e| ParseError::InvalidXml(format!("XML parse error: {}", e)))?;

    let root = build_node(schema, document.root_element(), options)?;
    log::debug!("Parsed <{}> ({} children)", root.name(), root.child_count());
    Ok(root)
}

/// Remove the `<!DOCTYPE ...>` declaration (roxmltree rejects DTDs)
fn strip_doctype(xml: &str) -> Cow<'_, str> {
    let start = match xml.find("<!DOCTYPE") {
        Some(start) => start,
        None => return Cow::Borrowed(xml),
    };

    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in xml[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => {
                let end = start + i + 1;
                return Cow::Owned(format!("{}{}", &xml[..start], &xml[end..]));
            }
            _ => {}
        }
    }
    // unterminated; leave it for the XML parser to report
    Cow::Borrowed(xml)
}

fn build_node<'s>(
    schema: &'s Schema,
    element: Node<'_, '_>,
    options: &ParseOptions,
) -> Result<DocumentNode<'s>, ParseError> {
    let name = element.tag_name().name();
    let mut node = DocumentNode::new(schema, name)?;
    if !options.strict {
        node.set_strict(false)?;
    }

    for attribute in element.attributes() {
        if attribute.namespace().is_some() && options.skip_unknown_namespaced_attributes {
            log::warn!("Skipping namespaced attribute '{}' on <{}>", attribute.name(), name);
            continue;
        }
        let value = match node.kind().attribute(attribute.name()) {
            Some(descriptor) => coerce(schema, attribute.value(), descriptor.type_id, name),
            None => Value::from(attribute.value()),
        };
        node.set_attribute(attribute.name(), value)?;
    }

    let text: String = element
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    let text = text.trim();
    match node.kind().value_type {
        Some(type_id) => {
            if !text.is_empty() || accepts(schema, &Value::from(""), type_id, name) {
                node.set_value(coerce(schema, text, type_id, name))?;
            }
        }
        None if !text.is_empty() => node.set_value(text)?,
        None => {}
    }

    for child in element.children().filter(|c| c.is_element()) {
        let child = build_node(schema, child, options)?;
        node.add_child(child)?;
    }
    Ok(node)
}

fn accepts(schema: &Schema, value: &Value, type_id: TypeId, owner: &str) -> bool {
    validate(schema.types(), value, type_id, owner).is_ok()
}

/// First of text, integer, decimal that the type accepts; text otherwise
fn coerce(schema: &Schema, text: &str, type_id: TypeId, owner: &str) -> Value {
    let candidates = [
        Some(Value::from(text)),
        text.parse::<i64>().ok().map(Value::Integer),
        is_decimal_lexical(text)
            .then(|| text.parse::<f64>().ok())
            .flatten()
            .map(Value::Decimal),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| accepts(schema, candidate, type_id, owner))
        .unwrap_or_else(|| Value::from(text))
}

fn is_decimal_lexical(text: &str) -> bool {
    DECIMAL_LEXICAL
        .as_ref()
        .map_or(false, |pattern| pattern.is_match(text))
}
