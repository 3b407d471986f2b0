// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The query resolver.
//!
//! ## Overview
//!
//! Resolving a free-text travel query is a five-stage pipeline:
//!
//! 1. The query is tokenized and every ordered partition of its tokens into contiguous word
//!    groups is enumerated ([`partition`]).
//! 2. For each partition, every word group is matched against the full-text index, yielding one
//!    [`GroupResult`](result::GroupResult) per group ([`matcher`]).
//! 3. Every hit is scored: full-text percentage, PageRank, user-input weight and group-length
//!    heuristic multiply into a combined weight.
//! 4. The partition whose groups jointly explain the query best is elected ([`holder`]).
//! 5. The elected groups' best documents are reconciled with the POR store and projected to
//!    [`Location`](crate::por::Location)s by the [`QueryResolver`].
//!
//! The pipeline is synchronous and single-threaded per query; run concurrent queries on separate
//! workers, each with its own store session and a clone of the index handle.

use std::{
    collections::HashMap,
    sync::{atomic::AtomicBool, Arc},
};

pub mod holder;
pub mod matcher;
pub mod partition;
pub mod result;
mod scoring;

mod interpreter;

pub use interpreter::QueryResolver;
pub use scoring::heuristic_weight;

use crate::por::Location;

/// Caller-facing knobs for one `interpret()` call.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Maximum whole-group edit distance for fuzzy matching.
    pub max_edit_distance: u8,
    /// When false, only verbatim tokens match.
    pub spelling_correction: bool,
    /// Soft per-query deadline, checked between partitions.
    pub deadline_ms: Option<u64>,
    /// Per-token weights multiplied into the combined score.
    pub user_token_weights: HashMap<String, f64>,
    /// Cooperative cancellation flag, checked between partitions.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_edit_distance: 2,
            spelling_correction: true,
            deadline_ms: None,
            user_token_weights: HashMap::new(),
            cancel: None,
        }
    }
}

/// How an `interpret()` call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    /// Every partition was matched and scored.
    Complete,
    /// The deadline elapsed mid-enumeration; the response covers the partitions finished so far.
    DeadlineExceeded,
    /// The caller cancelled mid-enumeration; the response covers the partitions finished so far.
    Cancelled,
}

/// The outcome of one query interpretation.
#[derive(Clone, Debug)]
pub struct InterpretResponse {
    /// Matched locations, in partition (word-group) order.
    pub locations: Vec<Location>,
    /// Single query words that matched nothing and are not stop-listed, without duplicates.
    pub unmatched_words: Vec<String>,
    pub status: QueryStatus,
}
