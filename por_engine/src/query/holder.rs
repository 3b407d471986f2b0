// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Partition-level result containers and best-partition election.

use std::collections::HashMap;

use crate::{config::ResolverConfig, query::result::GroupResult};

/// The scored results of one partition: one [`GroupResult`] per word group, in group order.
#[derive(Clone, Debug)]
pub struct ResultHolder {
    description: String,
    results: Vec<GroupResult>,
    weight: Option<f64>,
}

impl ResultHolder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            results: Vec::new(),
            weight: None,
        }
    }

    pub fn push(&mut self, result: GroupResult) {
        self.results.push(result);
    }

    /// The partition's textual form, e.g. `[rio de][janeiro]`.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn results(&self) -> &[GroupResult] {
        &self.results
    }

    pub fn group_count(&self) -> usize {
        self.results.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| !r.has_full_text_matched())
            .count()
    }

    /// Runs the score combiner over every group and caches the holder weight: the product of the
    /// matched groups' best combined weights, with every unmatched group contributing the empty
    /// penalty. A holder with no matched group at all weighs 0.
    pub fn calculate_weight(
        &mut self,
        token_weights: &HashMap<String, f64>,
        config: &ResolverConfig,
    ) -> crate::Result<f64> {
        let mut weight = 1.0;
        let mut any_matched = false;
        for result in &mut self.results {
            if result.has_full_text_matched() {
                result.calculate_scores(token_weights, config)?;
                weight *= result.best_combined_weight();
                any_matched = true;
            } else {
                weight *= config.empty_group_penalty;
            }
        }
        if !any_matched {
            weight = 0.0;
        }
        self.weight = Some(weight);
        Ok(weight)
    }

    /// The cached weight; 0 until [`ResultHolder::calculate_weight`] ran.
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }

    pub fn is_scored(&self) -> bool {
        self.weight.is_some()
    }
}

/// Where a [`ResultCombination`] stands in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombinationState {
    /// Holders are still being gathered from the partition enumeration.
    Collecting,
    /// Every gathered holder has been scored.
    Scored,
    /// A best holder has been elected.
    Selected,
    /// Scoring found every holder weightless; the query is unresolved.
    NoMatch,
}

/// All [`ResultHolder`]s of one query, one per enumerated partition, plus the elected best.
///
/// The best holder is referenced by index into the collection rather than by pointer, so holders
/// stay plainly owned by the combination.
#[derive(Debug)]
pub struct ResultCombination {
    query: String,
    holders: Vec<ResultHolder>,
    state: CombinationState,
    best: Option<usize>,
}

impl ResultCombination {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            holders: Vec::new(),
            state: CombinationState::Collecting,
            best: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn push(&mut self, holder: ResultHolder) {
        debug_assert_eq!(CombinationState::Collecting, self.state);
        self.holders.push(holder);
    }

    pub fn holders(&self) -> &[ResultHolder] {
        &self.holders
    }

    pub fn state(&self) -> CombinationState {
        self.state
    }

    /// Runs the score combiner over every holder.
    #[tracing::instrument(level = "debug", skip_all, fields(query = %self.query, holders = self.holders.len()))]
    pub fn calculate_weights(
        &mut self,
        token_weights: &HashMap<String, f64>,
        config: &ResolverConfig,
    ) -> crate::Result<()> {
        for holder in &mut self.holders {
            let weight = holder.calculate_weight(token_weights, config)?;
            tracing::debug!(partition = holder.description(), weight, "scored partition");
        }
        self.state = CombinationState::Scored;
        Ok(())
    }

    /// Elects the best holder: maximum weight, ties broken by fewer unmatched groups, then fewer
    /// groups, then the lexicographically smaller description. Returns false when every holder
    /// weighs 0, which leaves the combination in the `NoMatch` state.
    pub fn choose_best_holder(&mut self) -> bool {
        debug_assert_eq!(CombinationState::Scored, self.state);
        let mut best: Option<usize> = None;
        for (i, holder) in self.holders.iter().enumerate() {
            if holder.weight() <= 0.0 {
                continue;
            }
            let better = match best {
                None => true,
                Some(j) => {
                    let current = &self.holders[j];
                    holder
                        .weight()
                        .total_cmp(&current.weight())
                        .then_with(|| current.unmatched_count().cmp(&holder.unmatched_count()))
                        .then_with(|| current.group_count().cmp(&holder.group_count()))
                        .then_with(|| current.description().cmp(holder.description()))
                        .is_gt()
                }
            };
            if better {
                best = Some(i);
            }
        }
        self.best = best;
        self.state = match best {
            Some(_) => CombinationState::Selected,
            None => CombinationState::NoMatch,
        };
        best.is_some()
    }

    /// The elected holder, once [`ResultCombination::choose_best_holder`] succeeded.
    pub fn best_holder(&self) -> Option<&ResultHolder> {
        self.best.map(|i| &self.holders[i])
    }
}
