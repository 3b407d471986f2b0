// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Travel point-of-reference (POR) search engine.
//!
//! Given a free-text travel query such as `rio de janeiro` or `sna francicso`, the engine returns
//! a ranked list of matching airports, cities and other PORs, tolerant of misspellings and word
//! reordering. Ranking combines the full-text match quality with a precomputed per-POR PageRank
//! and optional caller-supplied weights.
//!
//! The crate has two halves:
//!
//! * the [build path](build): ingest a POR CSV and a PageRank CSV into a SQLite POR store and a
//!   tantivy full-text index (offline, exclusive);
//! * the [query path](query): resolve queries against those two artifacts (read-only, shared).
//!
//! See [`query`] for the resolver pipeline and [`build::build_search_index`] for the builder.

// Warnings are errors when building on CI.
#![cfg_attr(not(debug_assertions), deny(warnings))]

mod error;

pub(crate) use error::Result;
pub use error::{Error, ErrorKind};

pub mod build;
pub mod config;
pub mod index;
pub mod normalize;
pub mod por;
pub mod query;
pub mod store;

/// The crate version, for the CLI `--version` surfaces.
pub static VERSION: &str = env!("CARGO_PKG_VERSION");
