// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolves one free-text travel query against a previously built database.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use por_cli::{init_logging, parse_args, DB_FILE_NAME, INDEX_DIR_NAME};
use por_engine::{
    index::TantivySearchHandle,
    query::{QueryResolver, SearchOptions},
    store::SessionPool,
};

#[derive(Parser)]
#[command(name = "searcher", version = por_engine::VERSION, about = "Search the travel POR database")]
struct Args {
    /// Database directory, as produced by the indexer
    #[arg(long, short = 'd', default_value = "/tmp/por-search/traveldb")]
    database: PathBuf,

    /// The travel query, e.g. "rio de janeiro"
    #[arg(long, short = 'q')]
    query: String,

    /// Log file; logs go to stderr when omitted
    #[arg(long, short = 'l')]
    log: Option<PathBuf>,

    /// Maximum edit distance for fuzzy matching
    #[arg(long, default_value_t = 2)]
    max_edit_distance: u8,

    /// Disable spelling correction (exact tokens only)
    #[arg(long)]
    no_spelling_correction: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    init_logging(args.log.as_deref())?;

    let pool = SessionPool::new(args.database.join(DB_FILE_NAME), 1);
    let session = pool.checkout().context("cannot open the POR store")?;
    let index = TantivySearchHandle::open(&args.database.join(INDEX_DIR_NAME))
        .context("cannot open the full-text index")?;

    let resolver = QueryResolver::new(&*session, &index);
    let options = SearchOptions {
        max_edit_distance: args.max_edit_distance,
        spelling_correction: !args.no_spelling_correction,
        ..Default::default()
    };
    let response = resolver
        .interpret(&args.query, &options)
        .context("query failed")?;

    for (rank, location) in response.locations.iter().enumerate() {
        println!(
            "{}\t{}\t{:.4}\t{}",
            rank + 1,
            location.key,
            location.combined_weight,
            location.name
        );
    }
    if !response.unmatched_words.is_empty() {
        eprintln!("unmatched words: {}", response.unmatched_words.join(", "));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    if let Err(e) = run(args) {
        eprintln!("searcher: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
