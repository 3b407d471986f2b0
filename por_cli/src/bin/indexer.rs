// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builds the POR store and full-text index from the POR and PageRank CSVs.

use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use por_cli::{init_logging, parse_args, DB_FILE_NAME, INDEX_DIR_NAME};
use por_engine::{
    build::{build_search_index, BuildMode},
    config::ResolverConfig,
};

#[derive(Parser)]
#[command(name = "indexer", version = por_engine::VERSION, about = "Build the travel POR search database")]
struct Args {
    /// PageRank value file
    #[arg(long, short = 'r', default_value = "ref_airport_pageranked.csv")]
    prfile: PathBuf,

    /// POR (points of reference) file
    #[arg(long, short = 'p', default_value = "ori_por_public.csv")]
    porfile: PathBuf,

    /// Database directory (will hold the POR store and the full-text index)
    #[arg(long, short = 'd', default_value = "/tmp/por-search/traveldb")]
    database: PathBuf,

    /// Log file; logs go to stderr when omitted
    #[arg(long, short = 'l')]
    log: Option<PathBuf>,

    /// Abort on the first malformed CSV row instead of skipping it
    #[arg(long)]
    strict: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    init_logging(args.log.as_deref())?;
    fs::create_dir_all(&args.database)
        .with_context(|| format!("cannot create {}", args.database.display()))?;

    let mode = if args.strict {
        BuildMode::Strict
    } else {
        BuildMode::Lenient
    };
    println!("Building the search index may take a few minutes on large POR files...");
    let report = build_search_index(
        &args.porfile,
        &args.prfile,
        &args.database.join(DB_FILE_NAME),
        &args.database.join(INDEX_DIR_NAME),
        mode,
        &ResolverConfig::default(),
    )
    .context("build failed")?;

    println!("{} entries have been processed", report.indexed);
    if report.skipped > 0 {
        println!("{} malformed rows have been skipped", report.skipped);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args::<Args>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    if let Err(e) = run(args) {
        eprintln!("indexer: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
