//! Placement of incoming children
//!
//! Order of attempts for a child named `name`:
//!
//! 1. an eligible leaf slot (first in traversal order, or the `forward`-th
//!    when several are eligible)
//! 2. a new repetition of the innermost repeatable sequence/choice holding `name`
//! 3. re-routing an unfulfilled choice to another alternative that can take
//!    both its current children and `name`
//!
//! Anything else is a `ContentModelRejection`.

use crate::error::{ModelError, RejectionReason};
use crate::schema::content::ContentNode;

use super::instance::{ChoiceRepetition, InstanceNode};
use super::{ChildKey, ContentInstance, SlotRef, Step};

impl<'s> ContentInstance<'s> {
    /// Place the child `key` of kind `name`
    ///
    /// `forward` selects among several eligible slots; without it the first
    /// eligible slot in traversal order is used. With at most one eligible
    /// slot `forward` is ignored.
    pub fn add_element(
        &mut self,
        name: &str,
        key: ChildKey,
        forward: Option<usize>,
    ) -> Result<SlotRef, ModelError> {
        if !self.prototype().contains_element(name) {
            return Err(ModelError::rejection(
                self.owner,
                name,
                RejectionReason::NotInContentModel,
            ));
        }

        let eligible = self.root.eligible_slots(name);
        let count = eligible.len();
        let selected = match forward {
            Some(index) if count > 1 => {
                if index >= count {
                    return Err(ModelError::rejection(
                        self.owner,
                        name,
                        RejectionReason::DisambiguationOutOfRange {
                            index,
                            eligible: count,
                        },
                    ));
                }
                eligible.into_iter().nth(index)
            }
            _ => eligible.into_iter().next(),
        };

        if let Some(steps) = selected {
            if self.root.attach(&steps, key) {
                log::debug!(
                    "{}: <{}> placed in slot {:?} ({} eligible)",
                    self.owner,
                    name,
                    steps,
                    count
                );
                return Ok(SlotRef { steps });
            }
        }

        if let Some(steps) = self.root.duplicate_for(name, key) {
            log::debug!(
                "{}: <{}> placed in a new repetition at {:?}",
                self.owner,
                name,
                steps
            );
            return Ok(SlotRef { steps });
        }

        if let Some(steps) = self.root.reroute(name, key) {
            log::debug!(
                "{}: <{}> placed after re-routing a choice, slot {:?}",
                self.owner,
                name,
                steps
            );
            return Ok(SlotRef { steps });
        }

        Err(ModelError::rejection(
            self.owner,
            name,
            RejectionReason::NoEligibleSlot,
        ))
    }
}

fn prefixed(step: Step, rest: Vec<Step>) -> Vec<Step> {
    let mut steps = Vec::with_capacity(rest.len() + 1);
    steps.push(step);
    steps.extend(rest);
    steps
}

impl<'s> InstanceNode<'s> {
    /// First eligible slot, else a new repetition
    pub(crate) fn place(&mut self, name: &str, key: ChildKey) -> Option<Vec<Step>> {
        if let Some(steps) = self.eligible_slots(name).into_iter().next() {
            if self.attach(&steps, key) {
                return Some(steps);
            }
        }
        self.duplicate_for(name, key)
    }

    /// Duplicate the innermost repeatable compositor that holds `name`
    ///
    /// Existing repetitions are searched last to first before a new
    /// repetition is appended at this level.
    pub(crate) fn duplicate_for(&mut self, name: &str, key: ChildKey) -> Option<Vec<Step>> {
        if !self.proto().contains_element(name) {
            return None;
        }

        match self {
            InstanceNode::Leaf(..) => None,
            InstanceNode::Group { body, .. } => body.duplicate_for(name, key),
            InstanceNode::Sequence {
                prototypes,
                occurs,
                repetitions,
                ..
            } => {
                let prototypes: &'s [ContentNode] = *prototypes;
                for (r, rep) in repetitions.iter_mut().enumerate().rev() {
                    for (i, member) in rep.iter_mut().enumerate() {
                        if let Some(rest) = member.duplicate_for(name, key) {
                            return Some(prefixed(Step::new(r, i), rest));
                        }
                    }
                }

                if !occurs.allows(repetitions.len() + 1) {
                    return None;
                }
                let mut fresh: Vec<InstanceNode<'s>> =
                    prototypes.iter().map(InstanceNode::fresh).collect();
                let r = repetitions.len();
                let placed = fresh.iter_mut().enumerate().find_map(|(i, member)| {
                    member
                        .place(name, key)
                        .map(|rest| prefixed(Step::new(r, i), rest))
                });
                if placed.is_some() {
                    repetitions.push(fresh);
                }
                placed
            }
            InstanceNode::Choice {
                prototypes,
                occurs,
                repetitions,
                ..
            } => {
                let prototypes: &'s [ContentNode] = *prototypes;
                for (r, rep) in repetitions.iter_mut().enumerate().rev() {
                    if let Some(chosen) = rep.chosen {
                        if let Some(alternative) = rep.alternatives.get_mut(chosen) {
                            if let Some(rest) = alternative.duplicate_for(name, key) {
                                return Some(prefixed(Step::new(r, chosen), rest));
                            }
                        }
                    }
                }

                if !occurs.allows(repetitions.len() + 1) {
                    return None;
                }
                let mut fresh = ChoiceRepetition::fresh(prototypes);
                let placed = fresh
                    .alternatives
                    .iter_mut()
                    .enumerate()
                    .find_map(|(a, alternative)| {
                        alternative.place(name, key).map(|rest| (a, rest))
                    });
                match placed {
                    Some((a, rest)) => {
                        fresh.chosen = Some(a);
                        let r = repetitions.len();
                        repetitions.push(fresh);
                        Some(prefixed(Step::new(r, a), rest))
                    }
                    None => None,
                }
            }
        }
    }

    /// Switch an unfulfilled choice to an alternative that accepts `name`
    ///
    /// Inner choices are tried before outer ones, later repetitions before
    /// earlier ones.
    pub(crate) fn reroute(&mut self, name: &str, key: ChildKey) -> Option<Vec<Step>> {
        if !self.proto().contains_element(name) {
            return None;
        }

        match self {
            InstanceNode::Leaf(..) => None,
            InstanceNode::Group { body, .. } => body.reroute(name, key),
            InstanceNode::Sequence { repetitions, .. } => {
                for (r, rep) in repetitions.iter_mut().enumerate().rev() {
                    for (i, member) in rep.iter_mut().enumerate() {
                        if let Some(rest) = member.reroute(name, key) {
                            return Some(prefixed(Step::new(r, i), rest));
                        }
                    }
                }
                None
            }
            InstanceNode::Choice {
                prototypes,
                repetitions,
                ..
            } => {
                let prototypes: &'s [ContentNode] = *prototypes;
                for (r, rep) in repetitions.iter_mut().enumerate().rev() {
                    if let Some(chosen) = rep.chosen {
                        if let Some(alternative) = rep.alternatives.get_mut(chosen) {
                            if let Some(rest) = alternative.reroute(name, key) {
                                return Some(prefixed(Step::new(r, chosen), rest));
                            }
                        }
                    }
                }

                for (r, rep) in repetitions.iter_mut().enumerate().rev() {
                    if let Some((a, rest)) = rep.switch_alternative(prototypes, name, key) {
                        return Some(prefixed(Step::new(r, a), rest));
                    }
                }
                None
            }
        }
    }
}

impl<'s> ChoiceRepetition<'s> {
    /// Replay the chosen alternative's children into a better alternative
    ///
    /// Among the alternatives that take every replayed child plus `name`, the
    /// one with the fewest remaining requirements wins; ties go to the first.
    fn switch_alternative(
        &mut self,
        prototypes: &'s [ContentNode],
        name: &str,
        key: ChildKey,
    ) -> Option<(usize, Vec<Step>)> {
        let current = self.chosen?;
        let old = self.alternatives.get(current)?;
        if old.is_fulfilled() {
            return None;
        }
        let replay = old.attached();

        let mut best: Option<(usize, usize, InstanceNode<'s>, Vec<Step>)> = None;
        for (index, proto) in prototypes.iter().enumerate() {
            if index == current || !proto.contains_element(name) {
                continue;
            }
            let mut candidate = InstanceNode::fresh(proto);
            if !replay
                .iter()
                .all(|(child, element)| candidate.place(element, *child).is_some())
            {
                continue;
            }
            let steps = match candidate.place(name, key) {
                Some(steps) => steps,
                None => continue,
            };
            let remaining = candidate.required_names(false).len();
            if best.as_ref().map_or(true, |(_, fewest, _, _)| remaining < *fewest) {
                best = Some((index, remaining, candidate, steps));
            }
        }

        let (index, remaining, candidate, steps) = best?;
        log::debug!(
            "choice switched from alternative {} to {} ({} children replayed, {} requirements left)",
            current,
            index,
            replay.len(),
            remaining
        );
        self.alternatives[current] = InstanceNode::fresh(&prototypes[current]);
        self.alternatives[index] = candidate;
        self.chosen = Some(index);
        Some((index, steps))
    }
}
