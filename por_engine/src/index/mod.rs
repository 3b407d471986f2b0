// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The full-text index abstraction.
//!
//! The resolver only ever talks to [`SearchHandle`]; the concrete backend is tantivy and is
//! swappable. The one hard contract between the two sides is the document data blob, defined in
//! [`document`].

pub mod document;
mod tantivy_index;

pub use tantivy_index::{TantivyPorIndex, TantivySearchHandle};

/// Per-call matching options, a subset of the caller's search options.
#[derive(Clone, Copy, Debug)]
pub struct MatchOptions {
    /// Maximum whole-group edit distance a correction may realize.
    pub max_edit_distance: u8,
    /// When false, only verbatim tokens match.
    pub spelling_correction: bool,
    /// Candidate pool size per word group.
    pub max_hits: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_edit_distance: 2,
            spelling_correction: true,
            max_hits: 30,
        }
    }
}

/// One scored document returned by the backend.
#[derive(Clone, Debug)]
pub struct RawHit {
    /// Stable document id, assigned in ingestion order.
    pub doc_id: u64,
    /// The document's serialized data blob (see [`document`]).
    pub data: String,
    /// Relevance in `[0, 100]`; 100 means the group matched without any correction.
    pub relevance_pct: f64,
    /// Whole-group edit distance realized by this document's matching tokens.
    pub edit_distance: u32,
}

/// The outcome of matching one word group.
#[derive(Clone, Debug, Default)]
pub struct TextMatch {
    /// The corrected query. Equals the input when it matched verbatim; empty when nothing matched
    /// within the allowable edit distance (in which case `hits` is empty too).
    pub matched: String,
    /// Matching documents, best first.
    pub hits: Vec<RawHit>,
}

impl TextMatch {
    pub const NO_MATCH: Self = Self {
        matched: String::new(),
        hits: Vec::new(),
    };

    pub fn has_matched(&self) -> bool {
        !self.hits.is_empty()
    }
}

/// Read side of the full-text index.
///
/// Handles are cheap to clone and safe to share across query workers; opening one does not take
/// any lock the build path cares about.
pub trait SearchHandle {
    /// Runs a fuzzy full-text match for one word group.
    fn full_text_match(&self, query: &str, options: &MatchOptions) -> crate::Result<TextMatch>;
}

/// Per-token fuzzy budget: short tokens get no typo allowance, medium ones a single edit, long
/// ones two. Always clamped by the caller's whole-group maximum and by the automaton limit of 2.
pub fn token_fuzzy_budget(token: &str, options: &MatchOptions) -> u8 {
    if !options.spelling_correction {
        return 0;
    }
    let by_length: u8 = match token.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    };
    by_length.min(options.max_edit_distance).min(2)
}
