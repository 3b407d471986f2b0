// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-group match results and their score boards.

use std::fmt::Display;

use crate::index::{RawHit, TextMatch};

/// The closed set of score components.
///
/// `Combination` is the product of the four others and is what ranking ultimately uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreKind {
    /// Full-text relevance percentage reported by the index backend, in `[0, 100]`.
    FullText,
    /// The POR's precomputed PageRank, parsed from the document data blob.
    PageRank,
    /// Caller-supplied weight for the tokens of the group; 1.0 when the caller supplied none.
    UserInput,
    /// Group-length bonus preferring partitions made of fewer, longer groups.
    Heuristic,
    /// `FullText/100 · PageRank · UserInput · Heuristic`.
    Combination,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 5] = [
        ScoreKind::FullText,
        ScoreKind::PageRank,
        ScoreKind::UserInput,
        ScoreKind::Heuristic,
        ScoreKind::Combination,
    ];

    fn slot(self) -> usize {
        match self {
            ScoreKind::FullText => 0,
            ScoreKind::PageRank => 1,
            ScoreKind::UserInput => 2,
            ScoreKind::Heuristic => 3,
            ScoreKind::Combination => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreKind::FullText => "full-text",
            ScoreKind::PageRank => "page-rank",
            ScoreKind::UserInput => "user-input",
            ScoreKind::Heuristic => "heuristic",
            ScoreKind::Combination => "combination",
        }
    }
}

impl Display for ScoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fixed-slot mapping from [`ScoreKind`] to value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreBoard {
    slots: [Option<f64>; 5],
}

impl ScoreBoard {
    pub fn set(&mut self, kind: ScoreKind, value: f64) {
        self.slots[kind.slot()] = Some(value);
    }

    pub fn get(&self, kind: ScoreKind) -> Option<f64> {
        self.slots[kind.slot()]
    }

    /// Whether every kind, components and combination alike, has been scored.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_some())
    }
}

/// One matching document with its scores.
#[derive(Clone, Debug)]
pub struct DocumentHit {
    pub doc_id: u64,
    /// The document's serialized data blob.
    pub data: String,
    pub board: ScoreBoard,
}

/// The match outcome for one word group of one partition.
///
/// A group starts empty, then becomes either matched (at least one hit) or unmatched, and an
/// unmatched group stays unmatched; only matched groups contribute their best combined weight to
/// the partition weight.
#[derive(Clone, Debug)]
pub struct GroupResult {
    query: String,
    token_count: usize,
    corrected: String,
    has_full_text_matched: bool,
    edit_distance: u32,
    allowable_edit_distance: u32,
    hits: Vec<DocumentHit>,
    best_doc_id: Option<u64>,
    best_combined_weight: f64,
}

impl GroupResult {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let token_count = query.split_whitespace().count();
        Self {
            query,
            token_count,
            corrected: String::new(),
            has_full_text_matched: false,
            edit_distance: 0,
            allowable_edit_distance: 0,
            hits: Vec::new(),
            best_doc_id: None,
            best_combined_weight: 0.0,
        }
    }

    /// Records the outcome of the backend match for this group.
    pub fn record_match(&mut self, text_match: TextMatch, allowable_edit_distance: u32) {
        self.allowable_edit_distance = allowable_edit_distance;
        self.has_full_text_matched = text_match.has_matched();
        self.corrected = text_match.matched;
        self.edit_distance = text_match
            .hits
            .first()
            .map(|hit| hit.edit_distance)
            .unwrap_or(0);
        self.hits = text_match
            .hits
            .into_iter()
            .map(|RawHit { doc_id, data, relevance_pct, .. }| {
                let mut board = ScoreBoard::default();
                board.set(ScoreKind::FullText, relevance_pct);
                DocumentHit { doc_id, data, board }
            })
            .collect();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    /// The corrected query string; equals the query when no correction was needed, empty when the
    /// group did not match at all.
    pub fn corrected(&self) -> &str {
        &self.corrected
    }

    pub fn has_full_text_matched(&self) -> bool {
        self.has_full_text_matched
    }

    pub fn edit_distance(&self) -> u32 {
        self.edit_distance
    }

    pub fn allowable_edit_distance(&self) -> u32 {
        self.allowable_edit_distance
    }

    pub fn hits(&self) -> &[DocumentHit] {
        &self.hits
    }

    pub fn hits_mut(&mut self) -> &mut [DocumentHit] {
        &mut self.hits
    }

    pub fn set_best(&mut self, doc_id: u64, weight: f64) {
        self.best_doc_id = Some(doc_id);
        self.best_combined_weight = weight;
    }

    pub fn best_doc_id(&self) -> Option<u64> {
        self.best_doc_id
    }

    /// The combined weight of the elected best hit; 0 until scoring ran or when unmatched.
    pub fn best_combined_weight(&self) -> f64 {
        self.best_combined_weight
    }

    /// The elected best hit, once scoring ran.
    pub fn best_hit(&self) -> Option<&DocumentHit> {
        let best_doc_id = self.best_doc_id?;
        self.hits.iter().find(|hit| hit.doc_id == best_doc_id)
    }
}
