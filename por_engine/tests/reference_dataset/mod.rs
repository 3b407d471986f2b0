// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A small reference dataset built for real: the POR and PageRank CSVs are written to a temp
//! directory and ingested through the actual build pipeline into a SQLite store and a tantivy
//! index, so the tests drive exactly what production drives.

use std::{
    fs,
    path::{Path, PathBuf},
};

use por_engine::{
    build::{build_search_index, BuildMode, BuildReport},
    config::ResolverConfig,
    index::TantivySearchHandle,
    store::SqliteStore,
};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub const POR_HEADER: &str = "iata_code^icao_code^geoname_id^name^asciiname^latitude^longitude^country_code^adm1_code^city_code^country_name^alternatenames^feature_class^feature_code";

/// The reference POR rows: two San Francisco-adjacent entries would be too easy to tell apart, so
/// the interesting pair is Rio (the city, PageRank 0.60) vs Galeão (its airport, PageRank 0.62).
pub const POR_ROWS: &[&str] = &[
    "SFO^KSFO^5391959^San Francisco International Airport^San Francisco Intl^37.618972^-122.374889^US^CA^SFO^United States^San Francisco^S^AIRP",
    "RIO^SBGL^3451190^Rio de Janeiro^Rio de Janeiro^-22.906847^-43.172897^BR^21^RIO^Brazil^Rio^P^PPLA",
    "GIG^SBGL^3451191^Galeao Antonio Carlos Jobim International Airport^Galeao Airport^-22.809999^-43.250556^BR^21^RIO^Brazil^Rio de Janeiro^S^AIRP",
    "KBP^UKBB^6300952^Boryspil International Airport^Boryspil International Airport^50.345^30.894722^UA^13^IEV^Ukraine^Kyiv,Kiev^S^AIRP",
    "NCE^LFMN^6299418^Nice Côte d'Azur International Airport^Nice Cote d'Azur International Airport^43.658411^7.215872^FR^93^NCE^France^Nice^S^AIRP",
];

pub const PAGERANK_CSV: &str = "IATA,ICAO,GeonamesID,pagerank\n\
    SFO,KSFO,5391959,0.79\n\
    RIO,SBGL,3451190,0.6\n\
    GIG,SBGL,3451191,0.62\n\
    KBP,UKBB,6300952,0.55\n\
    NCE,LFMN,6299418,0.52\n";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Writes the two reference CSVs into `dir` and returns their paths.
pub fn write_reference_csvs(dir: &Path) -> (PathBuf, PathBuf) {
    let mut por = String::from(POR_HEADER);
    por.push('\n');
    for row in POR_ROWS {
        por.push_str(row);
        por.push('\n');
    }
    let por_path = dir.join("ori_por_public.csv");
    let pr_path = dir.join("ref_airport_pageranked.csv");
    fs::write(&por_path, por).unwrap();
    fs::write(&pr_path, PAGERANK_CSV).unwrap();
    (por_path, pr_path)
}

pub struct ReferenceDb {
    // Held for its Drop: removing it deletes every artifact built below.
    #[allow(dead_code)]
    pub dir: TempDir,
    pub db_path: PathBuf,
    pub index_dir: PathBuf,
    pub report: BuildReport,
}

impl ReferenceDb {
    pub fn store(&self) -> SqliteStore {
        SqliteStore::open_read_only(&self.db_path).unwrap()
    }

    pub fn index(&self) -> TantivySearchHandle {
        TantivySearchHandle::open(&self.index_dir).unwrap()
    }
}

/// Builds the reference dataset end to end.
pub fn build_reference() -> ReferenceDb {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let (por_path, pr_path) = write_reference_csvs(dir.path());
    let db_path = dir.path().join("por.db");
    let index_dir = dir.path().join("index");
    let report = build_search_index(
        &por_path,
        &pr_path,
        &db_path,
        &index_dir,
        BuildMode::Strict,
        &ResolverConfig::default(),
    )
    .unwrap();
    ReferenceDb {
        dir,
        db_path,
        index_dir,
        report,
    }
}
