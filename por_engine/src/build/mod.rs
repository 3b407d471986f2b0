// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The index builder: ingests the POR and PageRank CSVs into the POR store and the full-text
//! index.
//!
//! ## Atomicity
//!
//! Both artifacts are built at temporary paths and only renamed over the published paths after
//! both commits succeeded, so a failing or aborted build leaves whatever was there before fully
//! intact. A lock file next to the target database serializes builds; queries read the published
//! paths and never take the lock.
//!
//! ## Determinism
//!
//! Rows are processed in CSV order and document ids are assigned sequentially, so two builds from
//! identical inputs produce identical stores.

mod pagerank;
mod por_csv;

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

pub use por_csv::{PorRows, REQUIRED_COLUMNS};

use crate::{
    config::ResolverConfig,
    index::TantivyPorIndex,
    store::{PorStore, SqliteStore},
    ErrorKind,
};

/// How row-level errors are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// The first malformed row aborts the whole build.
    Strict,
    /// Malformed rows are logged with their line number and skipped.
    Lenient,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Rows ingested into both stores.
    pub indexed: u64,
    /// Rows skipped in lenient mode.
    pub skipped: u64,
}

/// Guards a build: created with `create_new` so a second concurrent build fails fast, removed on
/// drop (including on build failure).
#[derive(Debug)]
struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    fn acquire(path: PathBuf) -> crate::Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ErrorKind::BuildConflict.with_message(format!(
                    "build lock {} is held; is another build running?",
                    path.display()
                )))
            }
            Err(e) => Err(ErrorKind::StoreError.with_source(e)),
        }
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Builds the POR store and the full-text index from the two CSVs.
///
/// Returns the number of indexed entries. Fails without touching the published `db_path` /
/// `index_dir` on any error; in [`BuildMode::Lenient`], row-level errors are skipped instead of
/// failing.
#[tracing::instrument(level = "info", skip(config), err)]
pub fn build_search_index(
    por_csv: &Path,
    pagerank_csv: &Path,
    db_path: &Path,
    index_dir: &Path,
    mode: BuildMode,
    config: &ResolverConfig,
) -> crate::Result<BuildReport> {
    let _lock = BuildLock::acquire(db_path.with_extension("build-lock"))?;

    let page_ranks = pagerank::load_page_ranks(pagerank_csv, mode)?;
    tracing::info!(entries = page_ranks.len(), "loaded PageRank file");

    let tmp_db = temp_sibling(db_path)?;
    let tmp_index = temp_sibling(index_dir)?;
    fs::create_dir_all(&tmp_index).map_err(|e| ErrorKind::IndexError.with_source(e))?;

    let report = ingest(por_csv, &page_ranks, &tmp_db, &tmp_index, mode, config)?;

    // Make sure the database bytes are on disk before the swap publishes them.
    let db_file = fs::File::open(&tmp_db).map_err(|e| ErrorKind::StoreError.with_source(e))?;
    db_file
        .sync_all()
        .map_err(|e| ErrorKind::StoreError.with_source(e))?;
    drop(db_file);

    swap_into_place(&tmp_db, db_path).map_err(|e| ErrorKind::StoreError.with_source(e))?;
    swap_into_place(&tmp_index, index_dir).map_err(|e| ErrorKind::IndexError.with_source(e))?;

    tracing::info!(indexed = report.indexed, skipped = report.skipped, "build complete");
    Ok(report)
}

/// Streams the POR CSV into freshly-created stores at the temporary paths.
fn ingest(
    por_csv: &Path,
    page_ranks: &std::collections::HashMap<crate::por::PorKey, f64>,
    tmp_db: &Path,
    tmp_index: &Path,
    mode: BuildMode,
    config: &ResolverConfig,
) -> crate::Result<BuildReport> {
    let store = SqliteStore::open(tmp_db)?;
    store.create_empty()?;
    let mut index = TantivyPorIndex::create(tmp_index)?;

    let mut report = BuildReport::default();
    for (line, row) in PorRows::open(por_csv)? {
        let result = row.and_then(|mut record| {
            record.page_rank = page_ranks
                .get(&record.key)
                .copied()
                .unwrap_or(config.page_rank_floor);
            store.insert(&record)?;
            let doc_id = index.add_document(&record)?;
            store.update_doc_id(&record.key, doc_id)?;
            Ok(())
        });
        match result {
            Ok(()) => report.indexed += 1,
            Err(error) => match mode {
                BuildMode::Strict => return Err(error),
                BuildMode::Lenient => {
                    tracing::warn!(line, %error, "skipping POR row");
                    report.skipped += 1;
                }
            },
        }
    }

    index.commit()?;
    Ok(report)
}

/// The temporary build path for a target: `<target>.tmp`, cleared of any previous leftovers.
fn temp_sibling(target: &Path) -> crate::Result<PathBuf> {
    let mut name = target
        .file_name()
        .unwrap_or_default()
        .to_os_string();
    name.push(".tmp");
    let tmp = target.with_file_name(name);
    if tmp.is_dir() {
        fs::remove_dir_all(&tmp).map_err(|e| ErrorKind::StoreError.with_source(e))?;
    } else if tmp.exists() {
        fs::remove_file(&tmp).map_err(|e| ErrorKind::StoreError.with_source(e))?;
    }
    Ok(tmp)
}

/// Replaces `target` with `tmp` by rename.
fn swap_into_place(tmp: &Path, target: &Path) -> std::io::Result<()> {
    if target.is_dir() {
        fs::remove_dir_all(target)?;
    } else if target.exists() {
        fs::remove_file(target)?;
    }
    fs::rename(tmp, target)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    pub fn build_lock_conflicts_while_held_and_releases_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("por.build-lock");

        let lock = BuildLock::acquire(lock_path.clone()).unwrap();
        let err = BuildLock::acquire(lock_path.clone()).unwrap_err();
        assert_eq!(ErrorKind::BuildConflict, err.kind());

        drop(lock);
        BuildLock::acquire(lock_path).unwrap();
    }

    #[test]
    pub fn temp_sibling_appends_tmp_to_the_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = temp_sibling(&dir.path().join("por.db")).unwrap();
        assert_eq!("por.db.tmp", tmp.file_name().unwrap().to_str().unwrap());
    }
}
