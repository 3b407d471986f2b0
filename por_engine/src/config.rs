// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolver tuning knobs.
//!
//! All scoring constants live here so that behavior is pinned by tests rather than scattered
//! through the pipeline. The defaults are the shipped behavior; embedders may override them when
//! constructing the resolver.

use std::collections::HashSet;

/// Words that never count as unmatched: generic travel vocabulary that carries no destination
/// information on its own.
const DEFAULT_STOP_WORDS: &[&str] = &[
    "airport", "airports", "international", "intl", "city", "municipal", "regional", "station",
    "aeroport", "aeropuerto", "flughafen", "the", "of",
];

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// Slope of the group-length bonus: `heuristic = 1 + alpha * (tokens - 1)`.
    pub heuristic_alpha: f64,
    /// Upper bound on the group-length bonus.
    pub heuristic_max: f64,
    /// Penalty factor a non-matched group contributes to its partition's weight, in `(0, 1)`.
    pub empty_group_penalty: f64,
    /// Advisory upper bound for caller-supplied per-token weights; larger values are clamped.
    pub user_weight_max: f64,
    /// PageRank assigned to POR entries absent from the PageRank file.
    pub page_rank_floor: f64,
    /// Queries with more tokens than this are truncated before partitioning, since the number of
    /// partitions is `2^(n-1)`.
    pub max_query_tokens: usize,
    /// How many candidate documents the full-text backend returns per word group.
    pub hits_per_group: usize,
    /// Single words that are never reported as unmatched.
    pub stop_words: HashSet<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            heuristic_alpha: 0.25,
            heuristic_max: 2.0,
            empty_group_penalty: 0.05,
            user_weight_max: 10.0,
            page_rank_floor: 1e-6,
            max_query_tokens: 10,
            hits_per_group: 30,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl ResolverConfig {
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}
