// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The composite key of a point of reference: IATA code, ICAO code and Geonames id.
///
/// At least one of the IATA and ICAO codes is non-empty. A Geonames id of `0` means the POR has no
/// Geonames entry. The key uniquely identifies a record in the POR store, and the first three
/// tokens of every index document's data blob spell it out.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PorKey {
    pub iata: String,
    pub icao: String,
    pub geoname_id: u64,
}

impl PorKey {
    pub fn new(iata: impl Into<String>, icao: impl Into<String>, geoname_id: u64) -> Self {
        Self {
            iata: iata.into(),
            icao: icao.into(),
            geoname_id,
        }
    }

    /// A key is usable when at least one of its transport codes is present.
    pub fn is_valid(&self) -> bool {
        !(self.iata.is_empty() && self.icao.is_empty())
    }
}

impl Display for PorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.iata, self.icao, self.geoname_id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    pub fn key_displays_as_dash_separated_triple() {
        let key = PorKey::new("SFO", "KSFO", 5391959);
        assert_eq!("SFO-KSFO-5391959", key.to_string());
    }

    #[test]
    pub fn key_requires_at_least_one_code() {
        assert!(PorKey::new("SFO", "", 0).is_valid());
        assert!(PorKey::new("", "KSFO", 0).is_valid());
        assert!(!PorKey::new("", "", 5391959).is_valid());
    }

    #[test]
    pub fn keys_order_lexicographically_by_fields() {
        let gig = PorKey::new("GIG", "SBGL", 3451191);
        let rio = PorKey::new("RIO", "SBGL", 3451190);
        assert!(gig < rio);
    }
}
