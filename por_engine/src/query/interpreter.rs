// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, Instant};

use crate::{
    config::ResolverConfig,
    index::{document, MatchOptions, SearchHandle},
    normalize,
    por::Place,
    query::{
        holder::{ResultCombination, ResultHolder},
        matcher::{self, UnmatchedWords},
        partition::StringPartition,
        InterpretResponse, QueryStatus, SearchOptions,
    },
    store::PorStore,
    ErrorKind,
};

/// The top-level query pipeline: partition → match → score → select → reconcile with the store.
///
/// A resolver borrows a store session and an index handle for its lifetime; both are owned by the
/// caller (typically one pooled session per query, and a process-wide handle clone).
pub struct QueryResolver<'a, S: PorStore + ?Sized, H: SearchHandle + ?Sized> {
    store: &'a S,
    index: &'a H,
    config: ResolverConfig,
}

impl<'a, S: PorStore + ?Sized, H: SearchHandle + ?Sized> QueryResolver<'a, S, H> {
    pub fn new(store: &'a S, index: &'a H) -> Self {
        Self::with_config(store, index, ResolverConfig::default())
    }

    pub fn with_config(store: &'a S, index: &'a H, config: ResolverConfig) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Interprets one free-text travel query.
    ///
    /// Returns the matched locations in partition order plus the list of unmatched single words.
    /// Fails with `EmptyQuery` when the query tokenizes to nothing, and with `DeadlineExceeded`
    /// when the deadline elapses before even one partition was matched. Cancellation never fails
    /// the call: the response reports `QueryStatus::Cancelled` over whatever partitions (possibly
    /// none) were matched before the flag was observed.
    #[tracing::instrument(level = "debug", skip(self, options), err)]
    pub fn interpret(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> crate::Result<InterpretResponse> {
        let mut tokens = normalize::tokenize(query);
        if tokens.is_empty() {
            return Err(
                ErrorKind::EmptyQuery.with_message(format!("`{query}` contains no words"))
            );
        }
        if tokens.len() > self.config.max_query_tokens {
            tracing::warn!(
                tokens = tokens.len(),
                kept = self.config.max_query_tokens,
                "query too long, truncating before partitioning"
            );
            tokens.truncate(self.config.max_query_tokens);
        }

        let deadline = options
            .deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let match_options = MatchOptions {
            max_edit_distance: options.max_edit_distance,
            spelling_correction: options.spelling_correction,
            max_hits: self.config.hits_per_group,
        };

        // Stage 1 + 2: enumerate partitions and run the per-group full-text matches.
        let mut combination = ResultCombination::new(normalize::join(&tokens));
        let mut unmatched = UnmatchedWords::default();
        let mut status = QueryStatus::Complete;
        let partition = StringPartition::new(tokens);
        for string_set in partition.iter() {
            if let Some(interrupt) = interrupted(options, deadline) {
                if interrupt == QueryStatus::DeadlineExceeded && combination.holders().is_empty() {
                    return Err(ErrorKind::DeadlineExceeded
                        .with_message("deadline elapsed before any partition was matched"));
                }
                tracing::debug!(
                    matched_partitions = combination.holders().len(),
                    total_partitions = partition.count(),
                    "query interrupted between partitions"
                );
                status = interrupt;
                break;
            }
            let holder = matcher::match_partition(
                &string_set,
                self.index,
                &match_options,
                &self.config,
                &mut unmatched,
            )?;
            combination.push(holder);
        }

        // Stage 3 + 4: score every holder, then elect the best one.
        combination.calculate_weights(&options.user_token_weights, &self.config)?;
        let locations = if combination.choose_best_holder() {
            let best = combination
                .best_holder()
                .expect("a best holder was just elected");
            tracing::debug!(
                partition = best.description(),
                weight = best.weight(),
                "best matching partition"
            );
            // Stage 5: reconcile the elected matches with the POR store.
            let places = self.create_places(best)?;
            places.iter().map(|place| place.to_location()).collect()
        } else {
            tracing::debug!("no partition produced any hit");
            Vec::new()
        };

        Ok(InterpretResponse {
            locations,
            unmatched_words: unmatched.into_words(),
            status,
        })
    }

    /// Builds one [`Place`] per matched group of the elected holder, fetching the authoritative
    /// POR record for each group's best document.
    fn create_places(&self, best: &ResultHolder) -> crate::Result<Vec<Place>> {
        let mut places = Vec::new();
        for result in best.results() {
            if !result.has_full_text_matched() {
                continue;
            }
            let hit = result.best_hit().ok_or_else(|| {
                ErrorKind::IndexError.with_message(format!(
                    "group `{}` matched but was never scored",
                    result.query()
                ))
            })?;
            let key = document::primary_key(&hit.data)?;
            let record = match self.store.select_by_key(&key) {
                Ok(record) => record,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    // The index is built from the store, so a dangling key means the two on-disk
                    // artifacts come from different builds.
                    return Err(ErrorKind::IndexStoreOutOfSync.with_message(format!(
                        "document {} ({key}) has no row in the POR store; \
                         rebuild the full-text index from the POR data",
                        hit.doc_id
                    )));
                }
                Err(e) => return Err(e),
            };
            tracing::debug!(%key, doc_id = hit.doc_id, "retrieved POR record");
            places.push(Place {
                record,
                original_keywords: result.query().to_string(),
                corrected_keywords: result.corrected().to_string(),
                percentage: result.best_combined_weight(),
                edit_distance: result.edit_distance(),
                allowable_edit_distance: result.allowable_edit_distance(),
            });
        }
        Ok(places)
    }
}

/// Checks the cooperative interruption points: cancellation first, then the deadline.
fn interrupted(options: &SearchOptions, deadline: Option<Instant>) -> Option<QueryStatus> {
    if let Some(cancel) = &options.cancel {
        if cancel.load(std::sync::atomic::Ordering::Relaxed) {
            return Some(QueryStatus::Cancelled);
        }
    }
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return Some(QueryStatus::DeadlineExceeded);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};

    use pretty_assertions::assert_eq;

    use crate::{
        index::{MatchOptions, RawHit, TextMatch},
        por::{PorKey, PorRecord},
        store::SqliteStore,
        ErrorKind,
    };

    use super::*;

    /// An index of canned single-word entries; a group matches when every one of its tokens is
    /// the word of some entry (so multi-word groups never match, which is enough here).
    struct WordIndex {
        entries: Vec<(&'static str, u64, f64)>,
    }

    impl SearchHandle for WordIndex {
        fn full_text_match(
            &self,
            query: &str,
            _options: &MatchOptions,
        ) -> crate::Result<TextMatch> {
            let hits: Vec<RawHit> = self
                .entries
                .iter()
                .filter(|(word, _, _)| *word == query)
                .map(|(word, doc_id, page_rank)| RawHit {
                    doc_id: *doc_id,
                    data: format!("{} X{} {} {} payload", word.to_uppercase(), doc_id, doc_id, page_rank),
                    relevance_pct: 100.0,
                    edit_distance: 0,
                })
                .collect();
            if hits.is_empty() {
                Ok(TextMatch::NO_MATCH)
            } else {
                Ok(TextMatch {
                    matched: query.to_string(),
                    hits,
                })
            }
        }
    }

    fn store_with(entries: &[(&str, u64, f64)]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_empty().unwrap();
        for (word, doc_id, page_rank) in entries {
            let record = PorRecord {
                key: PorKey::new(word.to_uppercase(), format!("X{doc_id}"), *doc_id),
                page_rank: *page_rank,
                name: format!("{word} station"),
                doc_id: Some(*doc_id),
                ..Default::default()
            };
            store.insert(&record).unwrap();
        }
        store
    }

    #[test]
    pub fn empty_query_is_rejected() {
        let index = WordIndex { entries: vec![] };
        let store = store_with(&[]);
        let resolver = QueryResolver::new(&store, &index);
        let err = resolver
            .interpret(" ,. ", &SearchOptions::default())
            .unwrap_err();
        assert_eq!(ErrorKind::EmptyQuery, err.kind());
    }

    #[test]
    pub fn single_word_query_resolves_to_its_location() {
        let entries = [("nce", 1u64, 0.52)];
        let index = WordIndex { entries: entries.to_vec() };
        let store = store_with(&entries);
        let resolver = QueryResolver::new(&store, &index);

        let response = resolver.interpret("NCE", &SearchOptions::default()).unwrap();
        assert_eq!(QueryStatus::Complete, response.status);
        assert_eq!(1, response.locations.len());
        assert_eq!(PorKey::new("NCE", "X1", 1), response.locations[0].key);
        assert_eq!(0.52, response.locations[0].combined_weight);
        assert_eq!(Vec::<String>::new(), response.unmatched_words);
    }

    #[test]
    pub fn two_word_query_resolves_in_partition_order() {
        let entries = [("nce", 1u64, 0.52), ("kbp", 2u64, 0.55)];
        let index = WordIndex { entries: entries.to_vec() };
        let store = store_with(&entries);
        let resolver = QueryResolver::new(&store, &index);

        let response = resolver
            .interpret("nce kbp", &SearchOptions::default())
            .unwrap();
        assert_eq!(
            vec!["NCE", "KBP"],
            response
                .locations
                .iter()
                .map(|l| l.key.iata.as_str())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    pub fn unresolved_query_reports_unmatched_words() {
        let index = WordIndex { entries: vec![] };
        let store = store_with(&[]);
        let resolver = QueryResolver::new(&store, &index);

        let response = resolver.interpret("zzz", &SearchOptions::default()).unwrap();
        assert_eq!(QueryStatus::Complete, response.status);
        assert!(response.locations.is_empty());
        assert_eq!(vec!["zzz"], response.unmatched_words);
    }

    #[test]
    pub fn dangling_index_document_is_out_of_sync() {
        let entries = [("nce", 1u64, 0.52)];
        let index = WordIndex { entries: entries.to_vec() };
        // The store misses the record the index knows about.
        let store = store_with(&[]);
        let resolver = QueryResolver::new(&store, &index);

        let err = resolver
            .interpret("nce", &SearchOptions::default())
            .unwrap_err();
        assert_eq!(ErrorKind::IndexStoreOutOfSync, err.kind());
    }

    #[test]
    pub fn cancelled_query_returns_partial_status() {
        let entries = [("nce", 1u64, 0.52)];
        let index = WordIndex { entries: entries.to_vec() };
        let store = store_with(&entries);
        let resolver = QueryResolver::new(&store, &index);

        let cancel = Arc::new(AtomicBool::new(true));
        let options = SearchOptions {
            cancel: Some(Arc::clone(&cancel)),
            ..Default::default()
        };
        // Cancelled before the first partition: nothing was matched, nothing is returned.
        let response = resolver.interpret("nce", &options).unwrap();
        assert_eq!(QueryStatus::Cancelled, response.status);
        assert!(response.locations.is_empty());

        cancel.store(false, Ordering::Relaxed);
        let response = resolver.interpret("nce", &options).unwrap();
        assert_eq!(QueryStatus::Complete, response.status);
    }

    #[test]
    pub fn elapsed_deadline_without_any_partition_fails() {
        let entries = [("nce", 1u64, 0.52)];
        let index = WordIndex { entries: entries.to_vec() };
        let store = store_with(&entries);
        let resolver = QueryResolver::new(&store, &index);

        let options = SearchOptions {
            deadline_ms: Some(0),
            ..Default::default()
        };
        let err = resolver.interpret("nce", &options).unwrap_err();
        assert_eq!(ErrorKind::DeadlineExceeded, err.kind());
    }

    #[test]
    pub fn overlong_queries_are_truncated_not_rejected() {
        let entries = [("nce", 1u64, 0.52)];
        let index = WordIndex { entries: entries.to_vec() };
        let store = store_with(&entries);
        let resolver = QueryResolver::new(&store, &index);

        let query = "nce ".repeat(40);
        let response = resolver.interpret(&query, &SearchOptions::default()).unwrap();
        assert_eq!(QueryStatus::Complete, response.status);
        assert!(!response.locations.is_empty());
    }
}
