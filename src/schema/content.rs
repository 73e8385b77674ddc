//! Content-model prototypes
//!
//! A [`ContentNode`] tree mirrors the sequence/choice/group composition of one
//! complex type. It is built once per element kind and shared read-only by
//! every document node of that kind.

use std::collections::BTreeSet;
use std::fmt;

/// Upper occurrence bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

/// minOccurs / maxOccurs of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Occurs {
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: MaxOccurs::Bounded(1),
    };

    pub fn new(min: u32, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    /// Whether `count` occurrences stay within the upper bound
    pub fn allows(&self, count: usize) -> bool {
        match self.max {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Bounded(max) => count <= max as usize,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Occurs::ONCE
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            MaxOccurs::Bounded(max) => write!(f, "{}..{}", self.min, max),
            MaxOccurs::Unbounded => write!(f, "{}..unbounded", self.min),
        }
    }
}

/// One particle of a content model
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Sequence {
        children: Vec<ContentNode>,
        occurs: Occurs,
    },
    Choice {
        alternatives: Vec<ContentNode>,
        occurs: Occurs,
    },
    /// A named model group, already inlined; transparent for placement
    Group { name: String, body: Box<ContentNode> },
    Leaf { element: String, occurs: Occurs },
}

impl ContentNode {
    /// Whether a leaf named `element` occurs anywhere below this particle
    pub fn contains_element(&self, element: &str) -> bool {
        match self {
            ContentNode::Leaf { element: name, .. } => name == element,
            ContentNode::Group { body, .. } => body.contains_element(element),
            ContentNode::Sequence { children, .. } => {
                children.iter().any(|c| c.contains_element(element))
            }
            ContentNode::Choice { alternatives, .. } => {
                alternatives.iter().any(|c| c.contains_element(element))
            }
        }
    }

    /// All element names reachable from this particle
    pub fn element_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            ContentNode::Leaf { element, .. } => {
                names.insert(element.as_str());
            }
            ContentNode::Group { body, .. } => body.collect_names(names),
            ContentNode::Sequence { children: nodes, .. }
            | ContentNode::Choice {
                alternatives: nodes,
                ..
            } => nodes.iter().for_each(|n| n.collect_names(names)),
        }
    }

    pub fn occurs(&self) -> Occurs {
        match self {
            ContentNode::Sequence { occurs, .. }
            | ContentNode::Choice { occurs, .. }
            | ContentNode::Leaf { occurs, .. } => *occurs,
            ContentNode::Group { body, .. } => body.occurs(),
        }
    }
}
