// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fs::File, path::Path};

use serde::Deserialize;

use crate::{
    por::{PorKey, PorRecord, TransportType},
    ErrorKind,
};

/// Columns the build cannot do without. Anything else in the file is ignored.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "iata_code",
    "icao_code",
    "geoname_id",
    "name",
    "asciiname",
    "latitude",
    "longitude",
    "country_code",
    "adm1_code",
    "city_code",
    "country_name",
    "alternatenames",
    "feature_class",
    "feature_code",
];

/// One raw row of the POR CSV. Everything is read as text and validated in
/// [`RawPorRow::into_record`], so one bad cell fails one row rather than the whole deserializer.
#[derive(Debug, Deserialize)]
struct RawPorRow {
    iata_code: String,
    icao_code: String,
    geoname_id: String,
    name: String,
    asciiname: String,
    latitude: String,
    longitude: String,
    country_code: String,
    adm1_code: String,
    city_code: String,
    country_name: String,
    alternatenames: String,
    feature_class: String,
    feature_code: String,
}

impl RawPorRow {
    fn into_record(self, line: u64) -> crate::Result<PorRecord> {
        let row_error = |message: String| {
            ErrorKind::CsvParse.with_message(format!("POR row at line {line}: {message}"))
        };

        let key = PorKey::new(
            self.iata_code.trim(),
            self.icao_code.trim(),
            parse_geoname_id(&self.geoname_id)
                .map_err(|_| row_error(format!("Geonames id `{}` is not an integer", self.geoname_id)))?,
        );
        if !key.is_valid() {
            return Err(row_error("both IATA and ICAO codes are empty".to_string()));
        }
        let latitude = parse_coordinate(&self.latitude)
            .map_err(|_| row_error(format!("latitude `{}` is not a number", self.latitude)))?;
        let longitude = parse_coordinate(&self.longitude)
            .map_err(|_| row_error(format!("longitude `{}` is not a number", self.longitude)))?;

        let alternate_names = self
            .alternatenames
            .split(',')
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string())
            .collect();

        Ok(PorRecord {
            key,
            // The builder attaches the PageRank after parsing.
            page_rank: 0.0,
            latitude,
            longitude,
            name: self.name,
            asciiname: self.asciiname,
            country_code: self.country_code,
            country_name: self.country_name,
            adm1_code: self.adm1_code,
            city_code: self.city_code,
            alternate_names,
            transport_type: TransportType::from_feature(&self.feature_class, &self.feature_code),
            feature_class: self.feature_class,
            feature_code: self.feature_code,
            doc_id: None,
        })
    }
}

fn parse_geoname_id(raw: &str) -> Result<u64, std::num::ParseIntError> {
    let raw = raw.trim();
    if raw.is_empty() {
        // No Geonames entry.
        return Ok(0);
    }
    raw.parse()
}

fn parse_coordinate(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse()
}

/// Streaming reader over the POR CSV: caret-separated, UTF-8, header row.
pub struct PorRows {
    rows: csv::DeserializeRecordsIntoIter<File, RawPorRow>,
    line: u64,
}

impl std::fmt::Debug for PorRows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PorRows").field("line", &self.line).finish()
    }
}

impl PorRows {
    /// Opens the file and validates that every required column is present; a missing column
    /// aborts the build before any row is read.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'^')
            .from_path(path)
            .map_err(|e| {
                ErrorKind::CsvParse
                    .with_source(e)
                    .with_message(format!("cannot open POR file {}", path.display()))
            })?;
        let headers = reader
            .headers()
            .map_err(|e| ErrorKind::CsvParse.with_source(e))?;
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *column) {
                return Err(ErrorKind::CsvParse.with_message(format!(
                    "POR file {} is missing required column `{column}`",
                    path.display()
                )));
            }
        }
        Ok(Self {
            rows: reader.into_deserialize(),
            line: 1,
        })
    }
}

impl Iterator for PorRows {
    /// The 1-based line number of the row, plus the parsed record or the row's error.
    type Item = (u64, crate::Result<PorRecord>);

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        self.line += 1;
        let line = self.line;
        let record = match row {
            Ok(raw) => raw.into_record(line),
            Err(e) => Err(ErrorKind::CsvParse
                .with_source(e)
                .with_message(format!("POR row at line {line} is malformed"))),
        };
        Some((line, record))
    }
}
