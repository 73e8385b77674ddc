//! Instance tree, leaf slots and traversal

use crate::schema::content::{ContentNode, Occurs};

use super::{ChildKey, Step};

/// A leaf slot: one element kind and the children attached to it
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSlot<'s> {
    pub(crate) element: &'s str,
    pub(crate) occurs: Occurs,
    pub(crate) children: Vec<ChildKey>,
}

impl<'s> LeafSlot<'s> {
    pub fn element(&self) -> &'s str {
        self.element
    }

    pub fn occurs(&self) -> Occurs {
        self.occurs
    }

    pub fn children(&self) -> &[ChildKey] {
        &self.children
    }

    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Whether one more child still fits
    pub fn has_room(&self) -> bool {
        self.occurs.allows(self.children.len() + 1)
    }
}

/// One repetition of a choice
#[derive(Debug, Clone)]
pub(crate) struct ChoiceRepetition<'s> {
    /// Unset exactly when every alternative is empty
    pub(crate) chosen: Option<usize>,
    pub(crate) alternatives: Vec<InstanceNode<'s>>,
}

impl<'s> ChoiceRepetition<'s> {
    pub(crate) fn fresh(prototypes: &'s [ContentNode]) -> Self {
        Self {
            chosen: None,
            alternatives: prototypes.iter().map(InstanceNode::fresh).collect(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.alternatives.iter().all(|alt| alt.is_empty())
    }

    fn remove_key(&mut self, key: ChildKey) -> bool {
        match self.alternatives.iter_mut().position(|alt| alt.remove_key(key)) {
            Some(index) => {
                if self.chosen == Some(index) && self.alternatives[index].is_empty() {
                    self.chosen = None;
                }
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum InstanceNode<'s> {
    Sequence {
        proto: &'s ContentNode,
        prototypes: &'s [ContentNode],
        occurs: Occurs,
        repetitions: Vec<Vec<InstanceNode<'s>>>,
    },
    Choice {
        proto: &'s ContentNode,
        prototypes: &'s [ContentNode],
        occurs: Occurs,
        repetitions: Vec<ChoiceRepetition<'s>>,
    },
    Group {
        proto: &'s ContentNode,
        body: Box<InstanceNode<'s>>,
    },
    Leaf(LeafSlot<'s>, &'s ContentNode),
}

/// Repetitions created up front: `min`, but at least one
fn initial_repetitions(occurs: Occurs) -> usize {
    occurs.min.max(1) as usize
}

impl<'s> InstanceNode<'s> {
    /// Structural copy of `proto` with nothing attached
    pub(crate) fn fresh(proto: &'s ContentNode) -> Self {
        match proto {
            ContentNode::Sequence { children, occurs } => InstanceNode::Sequence {
                proto,
                prototypes: children,
                occurs: *occurs,
                repetitions: (0..initial_repetitions(*occurs))
                    .map(|_| children.iter().map(InstanceNode::fresh).collect())
                    .collect(),
            },
            ContentNode::Choice {
                alternatives,
                occurs,
            } => InstanceNode::Choice {
                proto,
                prototypes: alternatives,
                occurs: *occurs,
                repetitions: (0..initial_repetitions(*occurs))
                    .map(|_| ChoiceRepetition::fresh(alternatives))
                    .collect(),
            },
            ContentNode::Group { body, .. } => InstanceNode::Group {
                proto,
                body: Box::new(InstanceNode::fresh(body)),
            },
            ContentNode::Leaf { element, occurs } => InstanceNode::Leaf(
                LeafSlot {
                    element,
                    occurs: *occurs,
                    children: Vec::new(),
                },
                proto,
            ),
        }
    }

    pub(crate) fn proto(&self) -> &'s ContentNode {
        match self {
            InstanceNode::Sequence { proto, .. }
            | InstanceNode::Choice { proto, .. }
            | InstanceNode::Group { proto, .. }
            | InstanceNode::Leaf(_, proto) => *proto,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            InstanceNode::Leaf(slot, _) => slot.children.is_empty(),
            InstanceNode::Group { body, .. } => body.is_empty(),
            InstanceNode::Sequence { repetitions, .. } => repetitions
                .iter()
                .all(|rep| rep.iter().all(|member| member.is_empty())),
            InstanceNode::Choice { repetitions, .. } => {
                repetitions.iter().all(|rep| rep.is_empty())
            }
        }
    }

    /// Paths of every leaf named `name` that can take one more child
    ///
    /// Under a choice only the chosen alternative counts, or every
    /// alternative while none is chosen.
    pub(crate) fn eligible_slots(&self, name: &str) -> Vec<Vec<Step>> {
        let mut out = Vec::new();
        self.collect_eligible(name, &mut Vec::new(), &mut out);
        out
    }

    fn collect_eligible(&self, name: &str, path: &mut Vec<Step>, out: &mut Vec<Vec<Step>>) {
        match self {
            InstanceNode::Leaf(slot, _) => {
                if slot.element == name && slot.has_room() {
                    out.push(path.clone());
                }
            }
            InstanceNode::Group { body, .. } => body.collect_eligible(name, path, out),
            InstanceNode::Sequence { repetitions, .. } => {
                for (r, rep) in repetitions.iter().enumerate() {
                    for (i, member) in rep.iter().enumerate() {
                        path.push(Step::new(r, i));
                        member.collect_eligible(name, path, out);
                        path.pop();
                    }
                }
            }
            InstanceNode::Choice { repetitions, .. } => {
                for (r, rep) in repetitions.iter().enumerate() {
                    for (a, alternative) in rep.alternatives.iter().enumerate() {
                        if rep.chosen.map_or(true, |chosen| chosen == a) {
                            path.push(Step::new(r, a));
                            alternative.collect_eligible(name, path, out);
                            path.pop();
                        }
                    }
                }
            }
        }
    }

    /// Append `key` to the leaf at `steps`, fixing every choice on the way
    pub(crate) fn attach(&mut self, steps: &[Step], key: ChildKey) -> bool {
        match self {
            InstanceNode::Leaf(slot, _) => {
                if steps.is_empty() && slot.has_room() {
                    slot.children.push(key);
                    true
                } else {
                    false
                }
            }
            InstanceNode::Group { body, .. } => body.attach(steps, key),
            InstanceNode::Sequence { repetitions, .. } => match steps.split_first() {
                Some((step, rest)) => repetitions
                    .get_mut(step.repetition)
                    .and_then(|rep| rep.get_mut(step.index))
                    .map_or(false, |member| member.attach(rest, key)),
                None => false,
            },
            InstanceNode::Choice { repetitions, .. } => match steps.split_first() {
                Some((step, rest)) => match repetitions.get_mut(step.repetition) {
                    Some(rep) => {
                        let attached = rep
                            .alternatives
                            .get_mut(step.index)
                            .map_or(false, |alt| alt.attach(rest, key));
                        if attached {
                            rep.chosen = Some(step.index);
                        }
                        attached
                    }
                    None => false,
                },
                None => false,
            },
        }
    }

    /// Detach `key`; clears emptied choices and prunes surplus empty repetitions
    pub(crate) fn remove_key(&mut self, key: ChildKey) -> bool {
        match self {
            InstanceNode::Leaf(slot, _) => match slot.children.iter().position(|k| *k == key) {
                Some(position) => {
                    slot.children.remove(position);
                    true
                }
                None => false,
            },
            InstanceNode::Group { body, .. } => body.remove_key(key),
            InstanceNode::Sequence {
                occurs,
                repetitions,
                ..
            } => {
                let hit = repetitions.iter_mut().enumerate().find_map(|(r, rep)| {
                    rep.iter_mut()
                        .any(|member| member.remove_key(key))
                        .then_some(r)
                });
                match hit {
                    Some(r) => {
                        prune(repetitions, r, *occurs, |rep| {
                            rep.iter().all(|member| member.is_empty())
                        });
                        true
                    }
                    None => false,
                }
            }
            InstanceNode::Choice {
                occurs,
                repetitions,
                ..
            } => {
                let hit = repetitions
                    .iter_mut()
                    .enumerate()
                    .find_map(|(r, rep)| rep.remove_key(key).then_some(r));
                match hit {
                    Some(r) => {
                        prune(repetitions, r, *occurs, |rep| rep.is_empty());
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Path to the leaf holding `key`, written into `path`
    pub(crate) fn find_key(&self, key: ChildKey, path: &mut Vec<Step>) -> bool {
        match self {
            InstanceNode::Leaf(slot, _) => slot.children.contains(&key),
            InstanceNode::Group { body, .. } => body.find_key(key, path),
            InstanceNode::Sequence { repetitions, .. } => {
                for (r, rep) in repetitions.iter().enumerate() {
                    for (i, member) in rep.iter().enumerate() {
                        path.push(Step::new(r, i));
                        if member.find_key(key, path) {
                            return true;
                        }
                        path.pop();
                    }
                }
                false
            }
            InstanceNode::Choice { repetitions, .. } => {
                for (r, rep) in repetitions.iter().enumerate() {
                    for (a, alternative) in rep.alternatives.iter().enumerate() {
                        path.push(Step::new(r, a));
                        if alternative.find_key(key, path) {
                            return true;
                        }
                        path.pop();
                    }
                }
                false
            }
        }
    }

    /// Attached `(key, element)` pairs below this node, in attachment order
    pub(crate) fn attached(&self) -> Vec<(ChildKey, &'s str)> {
        let mut pairs: Vec<_> = Leaves::new(self)
            .flat_map(|leaf| leaf.children.iter().map(move |key| (*key, leaf.element)))
            .collect();
        pairs.sort_by_key(|(key, _)| *key);
        pairs
    }
}

/// Drop repetition `index` if it is empty, surplus to `min` and not the last one in use
fn prune<T>(repetitions: &mut Vec<T>, index: usize, occurs: Occurs, is_empty: impl Fn(&T) -> bool) {
    let floor = initial_repetitions(occurs);
    if repetitions.len() > floor
        && is_empty(&repetitions[index])
        && repetitions
            .iter()
            .enumerate()
            .any(|(i, rep)| i != index && !is_empty(rep))
    {
        repetitions.remove(index);
    }
}

/// Lazy depth-first iterator over leaf slots
///
/// Restartable by calling [`super::ContentInstance::leaves`] again; always
/// reflects the current shape.
pub struct Leaves<'a, 's> {
    stack: Vec<&'a InstanceNode<'s>>,
}

impl<'a, 's> Leaves<'a, 's> {
    pub(crate) fn new(root: &'a InstanceNode<'s>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a, 's> Iterator for Leaves<'a, 's> {
    type Item = &'a LeafSlot<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                InstanceNode::Leaf(slot, _) => return Some(slot),
                InstanceNode::Group { body, .. } => self.stack.push(body),
                InstanceNode::Sequence { repetitions, .. } => {
                    for rep in repetitions.iter().rev() {
                        self.stack.extend(rep.iter().rev());
                    }
                }
                InstanceNode::Choice { repetitions, .. } => {
                    for rep in repetitions.iter().rev() {
                        self.stack.extend(rep.alternatives.iter().rev());
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::leaf;
    use crate::schema::content::MaxOccurs;

    fn sample() -> ContentNode {
        ContentNode::Sequence {
            children: vec![
                leaf("a", 1, MaxOccurs::Bounded(1)),
                ContentNode::Choice {
                    alternatives: vec![
                        leaf("b", 1, MaxOccurs::Bounded(1)),
                        leaf("c", 1, MaxOccurs::Bounded(1)),
                    ],
                    occurs: Occurs::new(1, MaxOccurs::Bounded(2)),
                },
            ],
            occurs: Occurs::ONCE,
        }
    }

    #[test]
    fn test_fresh_instance_is_empty() {
        let proto = sample();
        let node = InstanceNode::fresh(&proto);
        assert!(node.is_empty());
        let names: Vec<_> = Leaves::new(&node).map(|l| l.element()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_attach_sets_chosen_and_remove_clears_it() {
        let proto = sample();
        let mut node = InstanceNode::fresh(&proto);
        let slots = node.eligible_slots("c");
        assert_eq!(slots, vec![vec![Step::new(0, 1), Step::new(0, 1)]]);

        assert!(node.attach(&slots[0], ChildKey(1)));
        // "b" is excluded once the choice picked "c"
        assert!(node.eligible_slots("b").is_empty());

        assert!(node.remove_key(ChildKey(1)));
        assert_eq!(node.eligible_slots("b").len(), 1);
        assert!(node.is_empty());
    }

    #[test]
    fn test_leaf_max_is_enforced_by_attach() {
        let proto = sample();
        let mut node = InstanceNode::fresh(&proto);
        let path = vec![Step::new(0, 0)];
        assert!(node.attach(&path, ChildKey(1)));
        assert!(!node.attach(&path, ChildKey(2)));
        assert!(node.eligible_slots("a").is_empty());
    }

    #[test]
    fn test_attached_pairs_sorted_by_key() {
        let proto = sample();
        let mut node = InstanceNode::fresh(&proto);
        node.attach(&[Step::new(0, 1), Step::new(0, 0)], ChildKey(1));
        node.attach(&[Step::new(0, 0)], ChildKey(2));
        assert_eq!(node.attached(), vec![(ChildKey(1), "b"), (ChildKey(2), "a")]);
    }
}
