// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;

use crate::{
    build::BuildMode,
    por::PorKey,
    ErrorKind,
};

/// One row of the PageRank CSV: `IATA,ICAO,GeonamesID,pagerank`.
#[derive(Debug, Deserialize)]
struct PageRankRow {
    #[serde(rename = "IATA")]
    iata: String,
    #[serde(rename = "ICAO")]
    icao: String,
    #[serde(rename = "GeonamesID")]
    geoname_id: u64,
    pagerank: f64,
}

/// Loads the PageRank CSV into a key → rank mapping.
///
/// Duplicate keys keep the last value, with a warning. Out-of-range ranks are row errors:
/// skipped in lenient mode, fatal in strict mode.
pub fn load_page_ranks(path: &Path, mode: BuildMode) -> crate::Result<HashMap<PorKey, f64>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ErrorKind::CsvParse
            .with_source(e)
            .with_message(format!("cannot open PageRank file {}", path.display()))
    })?;

    let mut ranks = HashMap::new();
    for (index, row) in reader.deserialize::<PageRankRow>().enumerate() {
        let line = index as u64 + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                let error = ErrorKind::CsvParse
                    .with_source(e)
                    .with_message(format!("PageRank row at line {line} is malformed"));
                match mode {
                    BuildMode::Strict => return Err(error),
                    BuildMode::Lenient => {
                        tracing::warn!(line, %error, "skipping malformed PageRank row");
                        continue;
                    }
                }
            }
        };
        if !(row.pagerank > 0.0 && row.pagerank <= 1.0) {
            let error = ErrorKind::CsvParse.with_message(format!(
                "PageRank {} at line {line} is outside (0, 1]",
                row.pagerank
            ));
            match mode {
                BuildMode::Strict => return Err(error),
                BuildMode::Lenient => {
                    tracing::warn!(line, %error, "skipping malformed PageRank row");
                    continue;
                }
            }
        }
        let key = PorKey::new(row.iata, row.icao, row.geoname_id);
        if let Some(previous) = ranks.insert(key.clone(), row.pagerank) {
            tracing::warn!(%key, previous, kept = row.pagerank, "duplicate PageRank key, last wins");
        }
    }
    Ok(ranks)
}
