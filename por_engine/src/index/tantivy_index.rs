// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tantivy-backed full-text index.
//!
//! ## Matching model
//!
//! A word group matches a document when every token of the group matches at least one term of the
//! document, in any of the searchable fields, within that token's fuzzy budget. The candidate pool
//! is gathered with a BM25 search (intersection of per-token fuzzy term queries, disjunction
//! across fields per token); the reported relevance, however, is correction-based: a document that
//! matches the group verbatim scores 100, and every realized edit costs a share proportional to
//! the group length. This keeps the percentage independent of corpus statistics, which the
//! combined-weight formula depends on.
//!
//! ## Document identity
//!
//! Tantivy's internal addresses are not stable across segment merges, so every document carries an
//! explicit `doc_id` field assigned sequentially in ingestion order. That id is what the POR store
//! back-pointer refers to, and what tie-breaks equal combined weights.

use std::{path::Path, sync::Arc};

use tantivy::{
    collector::TopDocs,
    doc,
    query::{BooleanQuery, BoostQuery, DisjunctionMaxQuery, FuzzyTermQuery, Query},
    schema::{Field, Schema, SchemaBuilder, Value, FAST, INDEXED, STORED, TEXT},
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};

use crate::{
    index::{document, token_fuzzy_budget, MatchOptions, RawHit, SearchHandle, TextMatch},
    normalize,
    por::PorRecord,
    ErrorKind,
};

/// Heap budget for the index writer, shared by all segments.
const WRITER_HEAP_SIZE_IN_BYTES: usize = 50_000_000;

/// Field handles, resolved once per index open.
struct PorFields {
    doc_id: Field,
    codes: Field,
    name: Field,
    alternates: Field,
    data: Field,
}

impl PorFields {
    fn build_schema() -> (Self, Schema) {
        let mut schema_builder = SchemaBuilder::default();
        let fields = Self {
            doc_id: schema_builder.add_u64_field("doc_id", INDEXED | STORED | FAST),
            codes: schema_builder.add_text_field("codes", TEXT | STORED),
            name: schema_builder.add_text_field("name", TEXT | STORED),
            alternates: schema_builder.add_text_field("alternates", TEXT | STORED),
            data: schema_builder.add_text_field("data", STORED),
        };
        (fields, schema_builder.build())
    }

    fn from_schema(schema: &Schema) -> crate::Result<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| ErrorKind::IndexError.with_source(e))
        };
        Ok(Self {
            doc_id: field("doc_id")?,
            codes: field("codes")?,
            name: field("name")?,
            alternates: field("alternates")?,
            data: field("data")?,
        })
    }

    fn searchable(&self) -> [Field; 3] {
        [self.codes, self.name, self.alternates]
    }

    /// Searchable fields with their query-time boosts: exact transport codes over the primary
    /// name over alternate names. The boosts shape the candidate pool ordering only; the reported
    /// relevance is correction-based.
    fn weighted(&self) -> [(Field, f32); 3] {
        [(self.codes, 3.0), (self.name, 2.0), (self.alternates, 1.0)]
    }
}

/// Write side: used exclusively by the index builder.
pub struct TantivyPorIndex {
    fields: PorFields,
    writer: IndexWriter,
    next_doc_id: u64,
}

impl TantivyPorIndex {
    /// Creates a fresh index in `dir` (which must exist and hold no previous index).
    pub fn create(dir: &Path) -> crate::Result<Self> {
        let (fields, schema) = PorFields::build_schema();
        let index =
            Index::create_in_dir(dir, schema).map_err(|e| ErrorKind::IndexError.with_source(e))?;
        let writer = index
            .writer(WRITER_HEAP_SIZE_IN_BYTES)
            .map_err(|e| ErrorKind::IndexError.with_source(e))?;
        Ok(Self {
            fields,
            writer,
            next_doc_id: 1,
        })
    }

    /// Adds the index document for one POR record and returns its assigned document id.
    ///
    /// Ids are assigned sequentially in call order, so ingestion order fully determines them.
    pub fn add_document(&mut self, record: &PorRecord) -> crate::Result<u64> {
        let doc_id = self.next_doc_id;

        let codes = normalize::join(&[
            normalize::fold(&record.key.iata).trim().to_string(),
            normalize::fold(&record.key.icao).trim().to_string(),
        ]);
        let name = normalize::fold(&record.name);
        let mut alternates = vec![normalize::fold(&record.asciiname), normalize::fold(&record.city_code)];
        alternates.extend(record.alternate_names.iter().map(|n| normalize::fold(n)));
        let alternates = alternates.join(" ");

        self.writer
            .add_document(doc!(
                self.fields.doc_id => doc_id,
                self.fields.codes => codes,
                self.fields.name => name,
                self.fields.alternates => alternates,
                self.fields.data => document::format_blob(record),
            ))
            .map_err(|e| ErrorKind::IndexError.with_source(e))?;

        self.next_doc_id += 1;
        Ok(doc_id)
    }

    /// Commits all pending documents. Nothing is visible to readers before this.
    pub fn commit(&mut self) -> crate::Result<()> {
        self.writer
            .commit()
            .map_err(|e| ErrorKind::IndexError.with_source(e))?;
        Ok(())
    }
}

struct HandleInner {
    reader: IndexReader,
    fields: PorFields,
}

/// Read side: cheap to clone, shared across query workers.
#[derive(Clone)]
pub struct TantivySearchHandle {
    inner: Arc<HandleInner>,
}

impl TantivySearchHandle {
    /// Opens an existing index read-only.
    pub fn open(dir: &Path) -> crate::Result<Self> {
        let index = Index::open_in_dir(dir).map_err(|e| ErrorKind::IndexError.with_source(e))?;
        let fields = PorFields::from_schema(&index.schema())?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e: tantivy::TantivyError| ErrorKind::IndexError.with_source(e))?;
        Ok(Self {
            inner: Arc::new(HandleInner { reader, fields }),
        })
    }
}

struct Candidate {
    doc_id: u64,
    data: String,
    corrected: String,
    edit_distance: u32,
    relevance_pct: f64,
    bm25: f64,
}

impl SearchHandle for TantivySearchHandle {
    #[tracing::instrument(level = "debug", skip(self), err)]
    fn full_text_match(&self, query: &str, options: &MatchOptions) -> crate::Result<TextMatch> {
        let tokens = normalize::tokenize(query);
        if tokens.is_empty() {
            return Ok(TextMatch::NO_MATCH);
        }
        let group = normalize::join(&tokens);
        let group_chars = group.chars().count();

        let fields = &self.inner.fields;
        let mut clauses: Vec<Box<dyn Query>> = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let budget = token_fuzzy_budget(token, options);
            let per_field: Vec<Box<dyn Query>> = fields
                .weighted()
                .iter()
                .map(|(field, boost)| {
                    let fuzzy = FuzzyTermQuery::new(Term::from_field_text(*field, token), budget, true);
                    Box::new(BoostQuery::new(Box::new(fuzzy), *boost)) as Box<dyn Query>
                })
                .collect();
            clauses.push(Box::new(DisjunctionMaxQuery::new(per_field)));
        }
        let group_query = BooleanQuery::intersection(clauses);

        let searcher = self.inner.reader.searcher();
        let top_docs = searcher
            .search(&group_query, &TopDocs::with_limit(options.max_hits.max(1)))
            .map_err(|e| ErrorKind::IndexError.with_source(e))?;

        let mut candidates = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| ErrorKind::IndexError.with_source(e))?;
            let doc_id = stored
                .get_first(fields.doc_id)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    ErrorKind::IndexError.with_message("indexed document is missing its doc_id")
                })?;
            let data = stored
                .get_first(fields.data)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    ErrorKind::IndexError.with_message("indexed document is missing its data blob")
                })?
                .to_string();

            let mut pool: Vec<&str> = Vec::new();
            for field in fields.searchable() {
                for value in stored.get_all(field) {
                    if let Some(text) = value.as_str() {
                        pool.extend(text.split_whitespace());
                    }
                }
            }

            let corrected_tokens: Vec<String> = tokens
                .iter()
                .map(|token| closest_token(token, &pool))
                .collect();
            let corrected = normalize::join(&corrected_tokens);
            let edit_distance = strsim::damerau_levenshtein(&group, &corrected) as u32;
            if edit_distance > u32::from(options.max_edit_distance) {
                tracing::trace!(doc_id, %corrected, edit_distance, "candidate over edit budget");
                continue;
            }

            let relevance_pct = 100.0
                * (group_chars.saturating_sub(edit_distance as usize)) as f64
                / group_chars as f64;
            candidates.push(Candidate {
                doc_id,
                data,
                corrected,
                edit_distance,
                relevance_pct,
                bm25: f64::from(score),
            });
        }

        if candidates.is_empty() {
            return Ok(TextMatch::NO_MATCH);
        }

        candidates.sort_by(|a, b| {
            b.relevance_pct
                .total_cmp(&a.relevance_pct)
                .then(b.bm25.total_cmp(&a.bm25))
                .then(a.doc_id.cmp(&b.doc_id))
        });

        let matched = candidates[0].corrected.clone();
        let hits = candidates
            .into_iter()
            .map(|c| RawHit {
                doc_id: c.doc_id,
                data: c.data,
                relevance_pct: c.relevance_pct,
                edit_distance: c.edit_distance,
            })
            .collect();
        Ok(TextMatch { matched, hits })
    }
}

/// Picks the pool token with the smallest Damerau-Levenshtein distance to `token`; ties go to the
/// lexicographically smaller token so corrections are deterministic.
fn closest_token(token: &str, pool: &[&str]) -> String {
    let mut best: Option<(usize, &str)> = None;
    for candidate in pool.iter().copied() {
        let distance = strsim::damerau_levenshtein(token, candidate);
        let better = match best {
            None => true,
            Some((best_distance, best_token)) => {
                distance < best_distance || (distance == best_distance && candidate < best_token)
            }
        };
        if better {
            best = Some((distance, candidate));
        }
        if distance == 0 {
            break;
        }
    }
    best.map(|(_, t)| t.to_string()).unwrap_or_else(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    pub fn closest_token_prefers_exact_then_distance_then_lexicographic() {
        let pool = vec!["san", "francisco", "sfo"];
        assert_eq!("san", closest_token("san", &pool));
        assert_eq!("san", closest_token("sna", &pool));
        assert_eq!("francisco", closest_token("francicso", &pool));
    }

    #[test]
    pub fn closest_token_falls_back_to_input_on_empty_pool() {
        assert_eq!("sfo", closest_token("sfo", &[]));
    }
}
