// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared plumbing for the `indexer` and `searcher` binaries.

use std::{fs::File, path::Path, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Exit code for early help/version returns, distinguishable from real failures.
pub const EXIT_CODE_EARLY: u8 = 99;

/// Database layout: the `--database` directory holds both artifacts, so they travel together.
pub const DB_FILE_NAME: &str = "por.db";
pub const INDEX_DIR_NAME: &str = "index";

/// Parses command-line arguments; help/version requests print and exit with
/// [`EXIT_CODE_EARLY`], other parse failures with the usual clap exit code.
pub fn parse_args<T: Parser>() -> Result<T, ExitCode> {
    match T::try_parse() {
        Ok(args) => Ok(args),
        Err(e)
            if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion =>
        {
            let _ = e.print();
            Err(ExitCode::from(EXIT_CODE_EARLY))
        }
        Err(e) => {
            let _ = e.print();
            Err(ExitCode::from(2))
        }
    }
}

/// Installs the tracing subscriber, writing to the given file or to stderr.
///
/// `RUST_LOG` overrides the default `info` filter either way.
pub fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
