use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::answers::{Answer, AnswerStore};
use crate::condition;
use crate::respondent::RespondentMetadata;
use crate::spec::{Catalog, RoutingPolicy};

/// Ascending, de-duplicated catalog positions the respondent traverses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActivePositions(Vec<usize>);

impl ActivePositions {
    pub fn from_positions(positions: impl IntoIterator<Item = usize>) -> Self {
        let set: BTreeSet<usize> = positions.into_iter().collect();
        Self(set.into_iter().collect())
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, position: usize) -> bool {
        self.0.binary_search(&position).is_ok()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Smallest active position strictly after `position`.
    pub fn next_after(&self, position: usize) -> Option<usize> {
        self.iter().find(|&candidate| candidate > position)
    }

    /// Largest active position strictly before `position`.
    pub fn previous_before(&self, position: usize) -> Option<usize> {
        self.iter().rev().find(|&candidate| candidate < position)
    }

    /// One-based ordinal of `position`, for "question x of y" displays.
    pub fn ordinal_of(&self, position: usize) -> Option<usize> {
        self.0.binary_search(&position).ok().map(|index| index + 1)
    }
}

/// Result of one flow computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowResolution {
    pub active: ActivePositions,
    /// The screening answer routed the respondent to the terminal question.
    pub terminated: bool,
}

/// Computes active positions from authored rules and the routing policy.
pub struct FlowResolver<'a> {
    policy: &'a RoutingPolicy,
}

impl<'a> FlowResolver<'a> {
    pub fn new(policy: &'a RoutingPolicy) -> Self {
        Self { policy }
    }

    pub fn resolve(
        &self,
        catalog: &Catalog,
        answers: &AnswerStore,
        respondent: &RespondentMetadata,
        cursor: usize,
    ) -> FlowResolution {
        let len = catalog.len();
        let index = catalog.index_map();
        let status = respondent.user_status;
        let lookup = |ids: &[String]| -> Vec<usize> {
            ids.iter()
                .filter_map(|id| index.get(id.as_str()).copied())
                .collect()
        };

        let mut excluded: BTreeSet<usize> = BTreeSet::new();
        let mut sequential: BTreeSet<usize> = BTreeSet::from([0]);
        let mut triggered: BTreeSet<usize> = BTreeSet::new();

        if let Some(branch) = self.policy.branch_for(status) {
            debug!(?status, "applying status branch");
            excluded.extend(lookup(&branch.exclude));
            sequential.extend(lookup(&branch.include));
            for refinement in &branch.refinements {
                let answer = answers.get(&refinement.question_id);
                if condition::evaluate(refinement.condition, answer, &refinement.value) {
                    debug!(question_id = %refinement.question_id, "branch refinement matched");
                    excluded.extend(lookup(&refinement.exclude));
                    sequential.extend(lookup(&refinement.include));
                }
            }
        }

        let floor: Vec<usize> = self
            .policy
            .floor_for(status)
            .filter_map(|id| index.get(id).copied())
            .collect();
        sequential.extend(floor.iter().copied());
        sequential.extend((1..len).filter(|position| !excluded.contains(position)));

        let terminal = index.get(self.policy.terminal.as_str()).copied();
        let screening = self.policy.screening.as_ref();
        let province = respondent.province();
        let mut terminated = false;

        for position in 0..len {
            if excluded.contains(&position)
                || (!sequential.contains(&position) && !triggered.contains(&position))
            {
                continue;
            }
            let Some(question) = catalog.get(position) else {
                continue;
            };
            let answer = answers.get(&question.id);

            if let Some(rule) = screening
                && rule.question_id == question.id
            {
                let text = answer.map(Answer::as_text).unwrap_or_default();
                if rule.terminates(province, &text) {
                    match terminal {
                        Some(end) => {
                            info!(question_id = %question.id, province, "respondent screened out");
                            sequential.clear();
                            triggered.clear();
                            triggered.insert(end);
                            terminated = true;
                            break;
                        }
                        None => error!(
                            terminal = %self.policy.terminal,
                            "terminal question missing from catalog; screening ignored"
                        ),
                    }
                }
            }

            let mut matched = false;
            for rule in &question.logic {
                if !condition::evaluate(rule.condition, answer, &rule.value) {
                    continue;
                }
                match index.get(rule.jump_to_question.as_str()) {
                    Some(&target) if !excluded.contains(&target) => {
                        debug!(
                            question_id = %question.id,
                            jump_to = %rule.jump_to_question,
                            "rule matched"
                        );
                        triggered.insert(target);
                        matched = true;
                    }
                    Some(_) => debug!(
                        question_id = %question.id,
                        jump_to = %rule.jump_to_question,
                        "rule matched an excluded target"
                    ),
                    None => warn!(
                        question_id = %question.id,
                        jump_to = %rule.jump_to_question,
                        "ignoring rule with unresolved target"
                    ),
                }
            }
            if !matched && position + 1 < len && !excluded.contains(&(position + 1)) {
                sequential.insert(position + 1);
            }
        }

        // Declared jump targets are reachable only through their rules.
        let declared = catalog.declared_targets();
        for (position, question) in catalog.iter().enumerate() {
            if declared.contains(question.id.as_str()) && !triggered.contains(&position) {
                sequential.remove(&position);
            }
        }

        if let (Some(rule), Some(end)) = (screening, terminal)
            && answers.is_answered(&rule.question_id)
            && !rule.terminates(province, &answers.text(&rule.question_id))
        {
            sequential.remove(&end);
            triggered.remove(&end);
        }

        let mut active: BTreeSet<usize> = sequential
            .union(&triggered)
            .copied()
            .filter(|position| !excluded.contains(position))
            .collect();

        if !terminated {
            active.extend(floor.iter().copied());
        }
        if active.is_empty() {
            return FlowResolution {
                active: ActivePositions::from_positions([0]),
                terminated,
            };
        }
        if !terminated && cursor < len {
            active.insert(cursor);
        }

        FlowResolution {
            active: ActivePositions::from_positions(active),
            terminated,
        }
    }
}
