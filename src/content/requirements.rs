//! Required-element reporting
//!
//! A leaf under its `min` is required. Sequence and choice repetitions below
//! their own `min` always contribute; optional repetitions only once
//! something is attached to them. A choice contributes its chosen
//! alternative, or while unchosen the first alternative (or, with
//! `intelligent_choice`, the alternative with the smallest requirement set
//! among those examined; best effort, no backtracking).

use indexmap::IndexSet;

use super::instance::InstanceNode;
use super::ContentInstance;

impl<'s> ContentInstance<'s> {
    /// Element names still missing, in traversal order, without duplicates
    pub fn required_element_names(&self, intelligent_choice: bool) -> Vec<&'s str> {
        self.root
            .required_names(intelligent_choice)
            .into_iter()
            .collect()
    }
}

impl<'s> InstanceNode<'s> {
    pub(crate) fn required_names(&self, intelligent_choice: bool) -> IndexSet<&'s str> {
        let mut names = IndexSet::new();
        self.collect_required(intelligent_choice, &mut names);
        names
    }

    /// No requirements left
    pub(crate) fn is_fulfilled(&self) -> bool {
        self.required_names(false).is_empty()
    }

    fn collect_required(&self, intelligent_choice: bool, names: &mut IndexSet<&'s str>) {
        match self {
            InstanceNode::Leaf(slot, _) => {
                if (slot.count() as u64) < u64::from(slot.occurs.min) {
                    names.insert(slot.element);
                }
            }
            InstanceNode::Group { body, .. } => body.collect_required(intelligent_choice, names),
            InstanceNode::Sequence {
                occurs,
                repetitions,
                ..
            } => {
                for (r, rep) in repetitions.iter().enumerate() {
                    let mandatory = (r as u64) < u64::from(occurs.min);
                    if mandatory || rep.iter().any(|member| !member.is_empty()) {
                        for member in rep {
                            member.collect_required(intelligent_choice, names);
                        }
                    }
                }
            }
            InstanceNode::Choice {
                occurs,
                repetitions,
                ..
            } => {
                for (r, rep) in repetitions.iter().enumerate() {
                    match rep.chosen.and_then(|chosen| rep.alternatives.get(chosen)) {
                        Some(alternative) => {
                            alternative.collect_required(intelligent_choice, names)
                        }
                        None if (r as u64) < u64::from(occurs.min) => {
                            let requirement = if intelligent_choice {
                                rep.alternatives
                                    .iter()
                                    .map(|alt| alt.required_names(true))
                                    .reduce(|best, next| {
                                        if next.len() < best.len() {
                                            next
                                        } else {
                                            best
                                        }
                                    })
                            } else {
                                rep.alternatives.first().map(|alt| alt.required_names(false))
                            };
                            names.extend(requirement.unwrap_or_default());
                        }
                        None => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::content::tests::leaf;
    use crate::content::{ChildKey, ContentInstance};
    use crate::schema::content::{ContentNode, MaxOccurs, Occurs};

    fn note_like() -> ContentNode {
        // (grace, cue, pitch) | (pitch, duration)
        ContentNode::Sequence {
            children: vec![
                ContentNode::Choice {
                    alternatives: vec![
                        ContentNode::Sequence {
                            children: vec![
                                leaf("grace", 1, MaxOccurs::Bounded(1)),
                                leaf("cue", 1, MaxOccurs::Bounded(1)),
                                leaf("pitch", 1, MaxOccurs::Bounded(1)),
                            ],
                            occurs: Occurs::ONCE,
                        },
                        ContentNode::Sequence {
                            children: vec![
                                leaf("pitch", 1, MaxOccurs::Bounded(1)),
                                leaf("duration", 1, MaxOccurs::Bounded(1)),
                            ],
                            occurs: Occurs::ONCE,
                        },
                    ],
                    occurs: Occurs::ONCE,
                },
                leaf("type", 0, MaxOccurs::Bounded(1)),
                ContentNode::Sequence {
                    children: vec![leaf("staff", 1, MaxOccurs::Bounded(1))],
                    occurs: Occurs::new(0, MaxOccurs::Bounded(1)),
                },
            ],
            occurs: Occurs::ONCE,
        }
    }

    #[test]
    fn test_unchosen_choice_reports_first_alternative() {
        let proto = note_like();
        let instance = ContentInstance::new("note", &proto);
        assert_eq!(
            instance.required_element_names(false),
            vec!["grace", "cue", "pitch"]
        );
    }

    #[test]
    fn test_intelligent_choice_prefers_smaller_alternative() {
        let proto = note_like();
        let instance = ContentInstance::new("note", &proto);
        assert_eq!(instance.required_element_names(true), vec!["pitch", "duration"]);
    }

    #[test]
    fn test_optional_sequence_counts_once_used() {
        let proto = ContentNode::Sequence {
            children: vec![ContentNode::Sequence {
                children: vec![
                    leaf("page-height", 1, MaxOccurs::Bounded(1)),
                    leaf("page-width", 1, MaxOccurs::Bounded(1)),
                ],
                occurs: Occurs::new(0, MaxOccurs::Bounded(1)),
            }],
            occurs: Occurs::ONCE,
        };
        let mut instance = ContentInstance::new("page-layout", &proto);
        assert!(instance.required_element_names(false).is_empty());

        instance.add_element("page-width", ChildKey(0), None).unwrap();
        assert_eq!(instance.required_element_names(false), vec!["page-height"]);
    }
}
