//! Catalog document format
//!
//! A catalog is a YAML description of the already-resolved structural facts of
//! a schema: simple types, attribute groups, model groups, complex types and
//! element declarations. [`Catalog::resolve`] turns it into a [`Schema`].
//!
//! ```yaml
//! simple-types:
//!   yes-no: { kinds: [string], enumeration: ["yes", "no"] }
//! groups:
//!   voice: { element: voice, min: 0 }
//! elements:
//!   voice: { type: string }
//! ```

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use serde::Deserialize;

use super::content::{ContentNode, MaxOccurs, Occurs};
use super::types::{Bound, Pattern, Primitive, TypeDescriptor, TypeId, TypeTable, WhiteSpace};
use super::{AttributeDescriptor, ElementKind, Schema};
use crate::error::SchemaError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Catalog {
    #[serde(default)]
    pub simple_types: IndexMap<String, SimpleTypeSpec>,
    #[serde(default)]
    pub attribute_groups: IndexMap<String, AttributeGroupSpec>,
    #[serde(default)]
    pub groups: IndexMap<String, ParticleSpec>,
    #[serde(default)]
    pub complex_types: IndexMap<String, ComplexTypeSpec>,
    #[serde(default)]
    pub elements: IndexMap<String, ElementSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SimpleTypeSpec {
    pub base: Option<String>,
    #[serde(default)]
    pub kinds: Vec<Primitive>,
    #[serde(default)]
    pub union: Vec<String>,
    #[serde(default)]
    pub enumeration: Vec<String>,
    pub pattern: Option<String>,
    #[serde(default)]
    pub forced_permitted: Vec<String>,
    pub whitespace: Option<WhiteSpace>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_exclusive: Option<f64>,
    pub min_inclusive: Option<f64>,
    pub max_inclusive: Option<f64>,
    pub max_exclusive: Option<f64>,
}

impl SimpleTypeSpec {
    fn bounds(&self) -> Vec<Bound> {
        let mut bounds = Vec::new();
        bounds.extend(self.min_length.map(Bound::MinLength));
        bounds.extend(self.max_length.map(Bound::MaxLength));
        bounds.extend(self.min_exclusive.map(Bound::MinExclusive));
        bounds.extend(self.min_inclusive.map(Bound::MinInclusive));
        bounds.extend(self.max_inclusive.map(Bound::MaxInclusive));
        bounds.extend(self.max_exclusive.map(Bound::MaxExclusive));
        bounds
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AttributeGroupSpec {
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub attribute_groups: Vec<String>,
}

/// Upper bound as written in the catalog: a count or `unbounded`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaxSpec {
    Count(u32),
    Word(String),
}

/// One particle; exactly one of `element`, `sequence`, `choice`, `group`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleSpec {
    pub element: Option<String>,
    pub sequence: Option<Vec<ParticleSpec>>,
    pub choice: Option<Vec<ParticleSpec>>,
    pub group: Option<String>,
    pub min: Option<u32>,
    pub max: Option<MaxSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ComplexTypeSpec {
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub attribute_groups: Vec<String>,
    pub content: Option<ParticleSpec>,
    /// Simple type of the text content
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ElementSpec {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub attribute_groups: Vec<String>,
    pub content: Option<ParticleSpec>,
    pub value: Option<String>,
}

/// Resolved body of a complex type or an inline element declaration
#[derive(Debug, Clone, Default)]
struct ResolvedBody {
    content: Option<ContentNode>,
    attributes: Vec<AttributeDescriptor>,
    value_type: Option<TypeId>,
}

impl Catalog {
    /// Resolve every reference and build the immutable registry
    pub fn resolve(self) -> Result<Schema, SchemaError> {
        let (types, type_names) = self.resolve_types()?;

        let mut complex = HashMap::new();
        for (name, spec) in &self.complex_types {
            let body = self.resolve_body(
                name,
                &type_names,
                &spec.attributes,
                &spec.attribute_groups,
                spec.content.as_ref(),
                spec.value.as_deref(),
            )?;
            complex.insert(name.as_str(), body);
        }

        let mut elements = HashMap::new();
        for (name, spec) in &self.elements {
            let kind = self.resolve_element(name, spec, &type_names, &complex)?;
            elements.insert(name.clone(), kind);
        }

        Ok(Schema::new(types, type_names, elements))
    }

    fn resolve_types(&self) -> Result<(TypeTable, HashMap<String, TypeId>), SchemaError> {
        let mut table = TypeTable::default();
        let mut names = HashMap::new();

        for (name, spec) in &self.simple_types {
            let pattern = spec
                .pattern
                .as_deref()
                .map(Pattern::new)
                .transpose()
                .map_err(|source| SchemaError::Pattern {
                    name: name.clone(),
                    source,
                })?;
            let id = table.push(TypeDescriptor {
                name: name.clone(),
                kinds: spec.kinds.clone(),
                forced_permitted: spec.forced_permitted.clone(),
                enumeration: spec.enumeration.clone(),
                pattern,
                bounds: spec.bounds(),
                whitespace: spec.whitespace.unwrap_or_default(),
                union: Vec::new(),
                base: None,
            });
            names.insert(name.clone(), id);
        }

        for (name, spec) in &self.simple_types {
            let id = lookup_type(&names, name, name)?;
            let base = spec
                .base
                .as_deref()
                .map(|b| lookup_type(&names, b, name))
                .transpose()?;
            let union = spec
                .union
                .iter()
                .map(|m| lookup_type(&names, m, name))
                .collect::<Result<Vec<_>, _>>()?;
            let descriptor = table.get_mut(id);
            descriptor.base = base;
            descriptor.union = union;
        }

        let mut done = vec![false; table.len()];
        for index in 0..table.len() {
            inherit_kinds(&mut table, TypeId(index), &mut done, &mut Vec::new())?;
        }

        Ok((table, names))
    }

    fn resolve_element(
        &self,
        name: &str,
        spec: &ElementSpec,
        type_names: &HashMap<String, TypeId>,
        complex: &HashMap<&str, ResolvedBody>,
    ) -> Result<ElementKind, SchemaError> {
        let (type_name, mut body) = match &spec.type_name {
            Some(type_name) => {
                if spec.content.is_some() || spec.value.is_some() {
                    return Err(SchemaError::InvalidParticle {
                        referrer: name.to_string(),
                        message: "an element with a type cannot declare inline content".to_string(),
                    });
                }
                let body = match complex.get(type_name.as_str()) {
                    Some(body) => body.clone(),
                    None => ResolvedBody {
                        value_type: Some(lookup_type(type_names, type_name, name)?),
                        ..Default::default()
                    },
                };
                (type_name.clone(), body)
            }
            None => {
                let body = self.resolve_body(
                    name,
                    type_names,
                    &[],
                    &[],
                    spec.content.as_ref(),
                    spec.value.as_deref(),
                )?;
                (name.to_string(), body)
            }
        };

        self.attribute_closure(
            name,
            type_names,
            &spec.attributes,
            &spec.attribute_groups,
            &mut Vec::new(),
            &mut body.attributes,
        )?;

        Ok(ElementKind {
            name: name.to_string(),
            type_name,
            content: body.content,
            attributes: body.attributes,
            value_type: body.value_type,
        })
    }

    fn resolve_body(
        &self,
        referrer: &str,
        type_names: &HashMap<String, TypeId>,
        attributes: &[AttributeSpec],
        attribute_groups: &[String],
        content: Option<&ParticleSpec>,
        value: Option<&str>,
    ) -> Result<ResolvedBody, SchemaError> {
        if content.is_some() && value.is_some() {
            return Err(SchemaError::InvalidParticle {
                referrer: referrer.to_string(),
                message: "mixed content is not supported".to_string(),
            });
        }

        let mut resolved = Vec::new();
        self.attribute_closure(
            referrer,
            type_names,
            attributes,
            attribute_groups,
            &mut Vec::new(),
            &mut resolved,
        )?;

        Ok(ResolvedBody {
            content: content
                .map(|p| self.particle(referrer, p, &mut Vec::new()))
                .transpose()?,
            attributes: resolved,
            value_type: value
                .map(|v| lookup_type(type_names, v, referrer))
                .transpose()?,
        })
    }

    /// Append the flattened attribute closure; the first declaration of a name wins
    fn attribute_closure(
        &self,
        referrer: &str,
        type_names: &HashMap<String, TypeId>,
        attributes: &[AttributeSpec],
        groups: &[String],
        stack: &mut Vec<String>,
        out: &mut Vec<AttributeDescriptor>,
    ) -> Result<(), SchemaError> {
        for attribute in attributes {
            if out.iter().any(|a| a.name == attribute.name) {
                continue;
            }
            out.push(AttributeDescriptor {
                name: attribute.name.clone(),
                required: attribute.required,
                type_id: lookup_type(type_names, &attribute.type_name, referrer)?,
            });
        }

        for group in groups {
            if stack.contains(group) {
                return Err(SchemaError::Cycle(group.clone()));
            }
            let spec = self.attribute_groups.get(group).ok_or_else(|| {
                SchemaError::UnknownAttributeGroup {
                    name: group.clone(),
                    referrer: referrer.to_string(),
                }
            })?;
            stack.push(group.clone());
            self.attribute_closure(
                group,
                type_names,
                &spec.attributes,
                &spec.attribute_groups,
                stack,
                out,
            )?;
            stack.pop();
        }

        Ok(())
    }

    fn particle(
        &self,
        referrer: &str,
        spec: &ParticleSpec,
        stack: &mut Vec<String>,
    ) -> Result<ContentNode, SchemaError> {
        let min = spec.min;
        let max = max_occurs(referrer, spec.max.as_ref())?;
        let occurs = Occurs::new(min.unwrap_or(1), max.unwrap_or(MaxOccurs::Bounded(1)));
        if let MaxOccurs::Bounded(upper) = occurs.max {
            if upper == 0 || occurs.min > upper {
                return Err(SchemaError::InvalidParticle {
                    referrer: referrer.to_string(),
                    message: format!("invalid occurrence bounds {}", occurs),
                });
            }
        }

        match (&spec.element, &spec.sequence, &spec.choice, &spec.group) {
            (Some(element), None, None, None) => {
                if !self.elements.contains_key(element) {
                    return Err(SchemaError::UnknownElement {
                        name: element.clone(),
                        referrer: referrer.to_string(),
                    });
                }
                Ok(ContentNode::Leaf {
                    element: element.clone(),
                    occurs,
                })
            }
            (None, Some(children), None, None) => Ok(ContentNode::Sequence {
                children: children
                    .iter()
                    .map(|c| self.particle(referrer, c, stack))
                    .collect::<Result<_, _>>()?,
                occurs,
            }),
            (None, None, Some(alternatives), None) if !alternatives.is_empty() => {
                Ok(ContentNode::Choice {
                    alternatives: alternatives
                        .iter()
                        .map(|c| self.particle(referrer, c, stack))
                        .collect::<Result<_, _>>()?,
                    occurs,
                })
            }
            (None, None, None, Some(group)) => {
                if stack.contains(group) {
                    return Err(SchemaError::Cycle(group.clone()));
                }
                let body_spec = self
                    .groups
                    .get(group)
                    .ok_or_else(|| SchemaError::UnknownGroup {
                        name: group.clone(),
                        referrer: referrer.to_string(),
                    })?;
                stack.push(group.clone());
                let mut body = self.particle(group, body_spec, stack)?;
                stack.pop();

                if min.is_some() || max.is_some() {
                    let own = body.occurs();
                    set_occurs(
                        &mut body,
                        Occurs::new(min.unwrap_or(own.min), max.unwrap_or(own.max)),
                    );
                }
                Ok(ContentNode::Group {
                    name: group.clone(),
                    body: Box::new(body),
                })
            }
            _ => Err(SchemaError::InvalidParticle {
                referrer: referrer.to_string(),
                message: "a particle needs exactly one of element, sequence, choice or group"
                    .to_string(),
            }),
        }
    }
}

fn lookup_type(
    names: &HashMap<String, TypeId>,
    name: &str,
    referrer: &str,
) -> Result<TypeId, SchemaError> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
            referrer: referrer.to_string(),
        })
}

fn max_occurs(referrer: &str, max: Option<&MaxSpec>) -> Result<Option<MaxOccurs>, SchemaError> {
    match max {
        None => Ok(None),
        Some(MaxSpec::Count(n)) => Ok(Some(MaxOccurs::Bounded(*n))),
        Some(MaxSpec::Word(word)) if word == "unbounded" => Ok(Some(MaxOccurs::Unbounded)),
        Some(MaxSpec::Word(word)) => Err(SchemaError::InvalidParticle {
            referrer: referrer.to_string(),
            message: format!("max must be a count or 'unbounded', got '{}'", word),
        }),
    }
}

fn set_occurs(node: &mut ContentNode, new: Occurs) {
    match node {
        ContentNode::Sequence { occurs, .. }
        | ContentNode::Choice { occurs, .. }
        | ContentNode::Leaf { occurs, .. } => *occurs = new,
        ContentNode::Group { body, .. } => set_occurs(body, new),
    }
}

/// Fill in accepted kinds from the base (or the union members), depth first
fn inherit_kinds(
    table: &mut TypeTable,
    id: TypeId,
    done: &mut [bool],
    visiting: &mut Vec<TypeId>,
) -> Result<(), SchemaError> {
    if done[id.0] {
        return Ok(());
    }
    if visiting.contains(&id) {
        return Err(SchemaError::Cycle(table.get(id).name.clone()));
    }

    visiting.push(id);
    let (base, union) = {
        let descriptor = table.get(id);
        (descriptor.base, descriptor.union.clone())
    };
    for dependency in base.iter().chain(union.iter()) {
        inherit_kinds(table, *dependency, done, visiting)?;
    }
    visiting.pop();

    if table.get(id).kinds.is_empty() {
        let kinds = if !union.is_empty() {
            union
                .iter()
                .flat_map(|m| table.get(*m).kinds.iter().copied())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        } else if let Some(base) = base {
            table.get(base).kinds.clone()
        } else {
            return Err(SchemaError::Untyped(table.get(id).name.clone()));
        };
        table.get_mut(id).kinds = kinds;
    }

    done[id.0] = true;
    Ok(())
}
