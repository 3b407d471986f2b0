// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The index document data-blob contract.
//!
//! Every document in the full-text index stores a serialized data blob whose first four
//! whitespace-separated tokens are, contractually:
//!
//! ```text
//! IATA ICAO GEONAMEID PAGERANK <opaque payload>
//! ```
//!
//! The resolver parses only those four tokens; the remaining payload is display text. The parse
//! functions are free functions over `&str` so callers can cache the parsed values per hit instead
//! of re-parsing on every access.

use crate::{por::PorKey, por::PorRecord, ErrorKind};

/// Serializes the blob for one record. The payload is the primary name, the city code in
/// parentheses and the country code.
pub fn format_blob(record: &PorRecord) -> String {
    format!(
        "{} {} {} {} {} ({}) {}",
        record.key.iata,
        record.key.icao,
        record.key.geoname_id,
        record.page_rank,
        record.name,
        record.city_code,
        record.country_code,
    )
}

/// Extracts the composite key from the first three tokens of a blob.
pub fn primary_key(blob: &str) -> crate::Result<PorKey> {
    let mut tokens = blob.split_whitespace();
    let (Some(iata), Some(icao), Some(geoname), Some(_page_rank)) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ErrorKind::MalformedIndexDocument
            .with_message(format!("expected at least four tokens in data blob `{blob}`")));
    };
    let geoname_id = geoname.parse::<u64>().map_err(|e| {
        ErrorKind::MalformedIndexDocument
            .with_source(e)
            .with_message(format!("Geonames id `{geoname}` in data blob is not an integer"))
    })?;
    Ok(PorKey::new(iata, icao, geoname_id))
}

/// Extracts the PageRank from the fourth token of a blob.
pub fn page_rank(blob: &str) -> crate::Result<f64> {
    let Some(token) = blob.split_whitespace().nth(3) else {
        return Err(ErrorKind::MalformedIndexDocument
            .with_message(format!("expected at least four tokens in data blob `{blob}`")));
    };
    let value = token.parse::<f64>().map_err(|e| {
        ErrorKind::MalformedIndexDocument
            .with_source(e)
            .with_message(format!("PageRank `{token}` in data blob is not a number"))
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ErrorKind::MalformedIndexDocument
            .with_message(format!("PageRank `{value}` in data blob is outside [0, 1]")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ErrorKind;

    use super::*;

    fn sfo() -> PorRecord {
        PorRecord {
            key: PorKey::new("SFO", "KSFO", 5391959),
            page_rank: 0.79,
            name: "San Francisco International Airport".to_string(),
            city_code: "SFO".to_string(),
            country_code: "US".to_string(),
            ..Default::default()
        }
    }

    #[test]
    pub fn blob_round_trips_key_and_page_rank() {
        let blob = format_blob(&sfo());
        assert_eq!(PorKey::new("SFO", "KSFO", 5391959), primary_key(&blob).unwrap());
        assert_eq!(0.79, page_rank(&blob).unwrap());
    }

    #[test]
    pub fn blob_with_fewer_than_four_tokens_is_malformed() {
        for blob in ["", "SFO", "SFO KSFO", "SFO KSFO 5391959"] {
            assert_eq!(
                ErrorKind::MalformedIndexDocument,
                primary_key(blob).unwrap_err().kind()
            );
            assert_eq!(
                ErrorKind::MalformedIndexDocument,
                page_rank(blob).unwrap_err().kind()
            );
        }
    }

    #[test]
    pub fn blob_with_non_numeric_page_rank_is_malformed() {
        let err = page_rank("SFO KSFO 5391959 high").unwrap_err();
        assert_eq!(ErrorKind::MalformedIndexDocument, err.kind());
    }

    #[test]
    pub fn blob_with_out_of_range_page_rank_is_malformed() {
        let err = page_rank("SFO KSFO 5391959 1.5").unwrap_err();
        assert_eq!(ErrorKind::MalformedIndexDocument, err.kind());
    }

    #[test]
    pub fn blob_with_non_numeric_geoname_id_is_malformed() {
        let err = primary_key("SFO KSFO abc 0.79").unwrap_err();
        assert_eq!(ErrorKind::MalformedIndexDocument, err.kind());
    }
}
