// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The score combiner.
//!
//! Scoring runs in stages over every hit of a matched group, mirroring the order the components
//! are defined in: PageRank first (parsed once per hit from the data blob), then the caller's
//! input weight, then the group-length heuristic, and finally the combination
//! `FullText/100 · PageRank · UserInput · Heuristic`, whose maximum elects the group's best hit.

use std::collections::HashMap;

use crate::{
    config::ResolverConfig,
    index::document,
    query::result::{GroupResult, ScoreKind},
    ErrorKind,
};

impl GroupResult {
    /// Parses each hit's PageRank out of its data blob and stores it on the score board.
    pub(crate) fn calculate_page_ranks(&mut self) -> crate::Result<()> {
        for hit in self.hits_mut() {
            let page_rank = document::page_rank(&hit.data)?;
            hit.board.set(ScoreKind::PageRank, page_rank);
        }
        Ok(())
    }

    /// Applies the caller-supplied per-token weights: the group weight is the product over its
    /// tokens, each defaulting to 1.0 and clamped to `[0, user_weight_max]`.
    pub(crate) fn calculate_user_input_weights(
        &mut self,
        token_weights: &HashMap<String, f64>,
        config: &ResolverConfig,
    ) {
        let mut weight = 1.0;
        for token in self.query().split_whitespace() {
            if let Some(&w) = token_weights.get(token) {
                let clamped = w.clamp(0.0, config.user_weight_max);
                if clamped != w {
                    tracing::warn!(token, weight = w, clamped, "clamped user token weight");
                }
                weight *= clamped;
            }
        }
        for hit in self.hits_mut() {
            hit.board.set(ScoreKind::UserInput, weight);
        }
    }

    /// Applies the group-length bonus, monotone non-decreasing in token count and bounded.
    pub(crate) fn calculate_heuristic_weights(&mut self, config: &ResolverConfig) {
        let weight = heuristic_weight(self.token_count(), config);
        for hit in self.hits_mut() {
            hit.board.set(ScoreKind::Heuristic, weight);
        }
    }

    /// Computes every hit's combined weight and elects the best hit (ties to the lower doc id).
    pub(crate) fn calculate_combined_weights(&mut self) -> crate::Result<()> {
        let mut best: Option<(f64, u64)> = None;
        for hit in self.hits_mut() {
            let combined = component(hit, ScoreKind::FullText)? / 100.0
                * component(hit, ScoreKind::PageRank)?
                * component(hit, ScoreKind::UserInput)?
                * component(hit, ScoreKind::Heuristic)?;
            hit.board.set(ScoreKind::Combination, combined);

            let replaces = match best {
                None => true,
                Some((best_weight, best_doc_id)) => {
                    combined > best_weight || (combined == best_weight && hit.doc_id < best_doc_id)
                }
            };
            if replaces {
                best = Some((combined, hit.doc_id));
            }
        }
        if let Some((weight, doc_id)) = best {
            self.set_best(doc_id, weight);
        }
        Ok(())
    }

    /// Runs every scoring stage over this group.
    pub(crate) fn calculate_scores(
        &mut self,
        token_weights: &HashMap<String, f64>,
        config: &ResolverConfig,
    ) -> crate::Result<()> {
        self.calculate_page_ranks()?;
        self.calculate_user_input_weights(token_weights, config);
        self.calculate_heuristic_weights(config);
        self.calculate_combined_weights()
    }
}

fn component(hit: &crate::query::result::DocumentHit, kind: ScoreKind) -> crate::Result<f64> {
    hit.board.get(kind).ok_or_else(|| {
        ErrorKind::IndexError
            .with_message(format!("hit {} was not scored for {kind}", hit.doc_id))
    })
}

/// `min(1 + alpha · (tokens − 1), heuristic_max)`, so single-token groups get no bonus.
pub fn heuristic_weight(token_count: usize, config: &ResolverConfig) -> f64 {
    let bonus = 1.0 + config.heuristic_alpha * (token_count.saturating_sub(1)) as f64;
    bonus.min(config.heuristic_max)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::index::{RawHit, TextMatch};

    use super::*;

    fn matched_group(query: &str, hits: Vec<RawHit>) -> GroupResult {
        let mut result = GroupResult::new(query);
        result.record_match(
            TextMatch {
                matched: query.to_string(),
                hits,
            },
            2,
        );
        result
    }

    fn hit(doc_id: u64, page_rank: f64, relevance_pct: f64) -> RawHit {
        RawHit {
            doc_id,
            data: format!("AAA BBBB {doc_id} {page_rank} payload"),
            relevance_pct,
            edit_distance: 0,
        }
    }

    #[test]
    pub fn heuristic_is_monotone_and_bounded() {
        let config = ResolverConfig::default();
        assert_eq!(1.0, heuristic_weight(1, &config));
        assert_eq!(1.25, heuristic_weight(2, &config));
        assert_eq!(1.5, heuristic_weight(3, &config));
        assert_eq!(2.0, heuristic_weight(5, &config));
        // Bounded above no matter the group size.
        assert_eq!(2.0, heuristic_weight(50, &config));
    }

    #[test]
    pub fn combination_is_the_product_of_all_components() {
        let config = ResolverConfig::default();
        let mut group = matched_group("san francisco", vec![hit(1, 0.79, 100.0)]);
        group.calculate_scores(&HashMap::new(), &config).unwrap();

        let board = &group.hits()[0].board;
        assert!(board.is_complete());
        assert_eq!(Some(100.0), board.get(ScoreKind::FullText));
        assert_eq!(Some(0.79), board.get(ScoreKind::PageRank));
        assert_eq!(Some(1.0), board.get(ScoreKind::UserInput));
        assert_eq!(Some(1.25), board.get(ScoreKind::Heuristic));
        let expected = 100.0 / 100.0 * 0.79 * 1.0 * 1.25;
        assert_eq!(Some(expected), board.get(ScoreKind::Combination));
        assert_eq!(expected, group.best_combined_weight());
    }

    #[test]
    pub fn best_hit_is_the_maximum_combination() {
        let config = ResolverConfig::default();
        let mut group = matched_group("rio de janeiro", vec![hit(1, 0.60, 100.0), hit(2, 0.62, 100.0)]);
        group.calculate_scores(&HashMap::new(), &config).unwrap();
        assert_eq!(Some(2), group.best_doc_id());
    }

    #[test]
    pub fn equal_combinations_tie_break_to_the_lower_doc_id() {
        let config = ResolverConfig::default();
        let mut group = matched_group("rio", vec![hit(7, 0.5, 100.0), hit(3, 0.5, 100.0)]);
        group.calculate_scores(&HashMap::new(), &config).unwrap();
        assert_eq!(Some(3), group.best_doc_id());
    }

    #[test]
    pub fn user_token_weights_multiply_into_the_combination() {
        let config = ResolverConfig::default();
        let mut group = matched_group("nce", vec![hit(1, 0.52, 100.0)]);
        let weights = HashMap::from([("nce".to_string(), 2.0)]);
        group.calculate_scores(&weights, &config).unwrap();
        assert_eq!(1.04, group.best_combined_weight());
    }

    #[test]
    pub fn oversized_user_weights_are_clamped() {
        let config = ResolverConfig::default();
        let mut group = matched_group("nce", vec![hit(1, 0.5, 100.0)]);
        let weights = HashMap::from([("nce".to_string(), 1000.0)]);
        group.calculate_scores(&weights, &config).unwrap();
        assert_eq!(0.5 * config.user_weight_max, group.best_combined_weight());
    }

    #[test]
    pub fn malformed_blob_fails_page_rank_scoring() {
        let config = ResolverConfig::default();
        let mut group = matched_group(
            "sfo",
            vec![RawHit {
                doc_id: 1,
                data: "SFO KSFO".to_string(),
                relevance_pct: 100.0,
                edit_distance: 0,
            }],
        );
        let err = group.calculate_scores(&HashMap::new(), &config).unwrap_err();
        assert_eq!(ErrorKind::MalformedIndexDocument, err.kind());
    }
}
