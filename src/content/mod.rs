//! Content-Model Tree
//!
//! A [`ContentInstance`] is the mutable per-node shadow of a
//! [`ContentNode`] prototype. It records which child (by [`ChildKey`]) sits
//! in which leaf slot, decides where an incoming child may go and reports
//! what is still missing.
//!
//! # Module Structure
//!
//! - **instance**: instance tree, leaf slots, traversal and removal
//! - **placement**: eligibility, repetition duplication, choice re-routing
//! - **requirements**: required-element reporting
//!
//! Shape of an instance:
//!
//! ```text
//! Sequence  -> repetitions: [[member instances]]
//! Choice    -> repetitions: [{ chosen, [alternative instances] }]
//! Group     -> body instance (contributes no path step)
//! Leaf      -> attached child keys
//! ```

mod instance;
mod placement;
mod requirements;

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ModelError;
use crate::schema::content::ContentNode;

pub use instance::{LeafSlot, Leaves};
use instance::InstanceNode;

/// Identity of a child inside its parent, stable for the child's lifetime there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildKey(pub(crate) u64);

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One step of a slot path: repetition index plus member/alternative index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub repetition: usize,
    pub index: usize,
}

impl Step {
    pub(crate) fn new(repetition: usize, index: usize) -> Self {
        Self { repetition, index }
    }
}

/// Snapshot path of the leaf slot a child was placed in
///
/// Only valid until the next mutation; pruning a repetition shifts paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRef {
    steps: Vec<Step>,
}

impl SlotRef {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Per-node content-model state
#[derive(Debug, Clone)]
pub struct ContentInstance<'s> {
    owner: &'s str,
    root: InstanceNode<'s>,
}

impl<'s> ContentInstance<'s> {
    /// Fresh instance of `prototype` for a node of kind `owner`
    pub fn new(owner: &'s str, prototype: &'s ContentNode) -> Self {
        Self {
            owner,
            root: InstanceNode::fresh(prototype),
        }
    }

    pub fn owner(&self) -> &'s str {
        self.owner
    }

    pub fn prototype(&self) -> &'s ContentNode {
        self.root.proto()
    }

    /// Every leaf of the current (possibly duplicated) tree in traversal order
    pub fn leaves(&self) -> Leaves<'_, 's> {
        Leaves::new(&self.root)
    }

    /// Attached children in schema order
    pub fn ordered_keys(&self) -> Vec<ChildKey> {
        self.leaves()
            .flat_map(|leaf| leaf.children().iter().copied())
            .collect()
    }

    /// Every element name the content model can hold
    pub fn possible_element_names(&self) -> BTreeSet<&'s str> {
        self.prototype().element_names()
    }

    /// Current slot of an attached child
    pub fn slot_of(&self, key: ChildKey) -> Option<SlotRef> {
        let mut path = Vec::new();
        self.root
            .find_key(key, &mut path)
            .then_some(SlotRef { steps: path })
    }

    /// Detach `key` from its slot
    ///
    /// Clears a choice whose chosen alternative becomes empty and prunes an
    /// emptied surplus repetition.
    pub fn remove_element(&mut self, key: ChildKey) -> Result<(), ModelError> {
        if self.root.remove_key(key) {
            log::debug!("{}: child {} detached", self.owner, key);
            Ok(())
        } else {
            Err(ModelError::NotFound {
                parent: self.owner.to_string(),
                target: format!("child {}", key),
            })
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::content::{MaxOccurs, Occurs};

    pub(crate) fn leaf(name: &str, min: u32, max: MaxOccurs) -> ContentNode {
        ContentNode::Leaf {
            element: name.to_string(),
            occurs: Occurs::new(min, max),
        }
    }

    #[test]
    fn test_slot_of_follows_placement() {
        let proto = ContentNode::Sequence {
            children: vec![
                leaf("a", 1, MaxOccurs::Bounded(1)),
                leaf("b", 0, MaxOccurs::Unbounded),
            ],
            occurs: Occurs::ONCE,
        };
        let mut instance = ContentInstance::new("box", &proto);

        let slot = instance.add_element("b", ChildKey(7), None).unwrap();
        assert_eq!(slot.steps(), &[Step::new(0, 1)]);
        assert_eq!(instance.slot_of(ChildKey(7)), Some(slot));
        assert_eq!(instance.slot_of(ChildKey(8)), None);
    }

    #[test]
    fn test_remove_unknown_key_is_not_found() {
        let proto = leaf("a", 0, MaxOccurs::Unbounded);
        let mut instance = ContentInstance::new("box", &proto);
        let err = instance.remove_element(ChildKey(1)).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }
}
