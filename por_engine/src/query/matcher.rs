// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-partition matching: one full-text match per word group.

use std::collections::HashSet;

use crate::{
    config::ResolverConfig,
    index::{MatchOptions, SearchHandle},
    query::{holder::ResultHolder, partition::StringSet, result::GroupResult},
};

/// Accumulates single words that produced no full-text match, without duplicates and without
/// stop-listed words. Multi-word groups are never reported: their words may still match in
/// another partition's grouping.
#[derive(Debug, Default)]
pub struct UnmatchedWords {
    words: Vec<String>,
    seen: HashSet<String>,
}

impl UnmatchedWords {
    pub fn report(&mut self, group: &str, config: &ResolverConfig) {
        let mut tokens = group.split_whitespace();
        let (Some(word), None) = (tokens.next(), tokens.next()) else {
            return;
        };
        if config.is_stop_word(word) {
            return;
        }
        if self.seen.insert(word.to_string()) {
            self.words.push(word.to_string());
        }
    }

    pub fn into_words(self) -> Vec<String> {
        self.words
    }
}

/// Matches every group of one partition against the index, producing that partition's
/// [`ResultHolder`]. Unmatched single words are reported into `unmatched`.
#[tracing::instrument(level = "debug", skip_all, fields(partition = %string_set.describe()))]
pub fn match_partition<H: SearchHandle + ?Sized>(
    string_set: &StringSet,
    handle: &H,
    options: &MatchOptions,
    config: &ResolverConfig,
    unmatched: &mut UnmatchedWords,
) -> crate::Result<ResultHolder> {
    let mut holder = ResultHolder::new(string_set.describe());
    for group in string_set.groups() {
        let mut result = GroupResult::new(group.clone());
        let text_match = handle.full_text_match(group, options)?;
        tracing::debug!(
            group = group.as_str(),
            matched = text_match.matched.as_str(),
            hits = text_match.hits.len(),
            "full-text match"
        );
        if !text_match.has_matched() {
            unmatched.report(group, config);
        }
        result.record_match(text_match, u32::from(options.max_edit_distance));
        holder.push(result);
    }
    Ok(holder)
}
