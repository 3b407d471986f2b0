// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

use super::PorKey;

/// The kind of transport facility a POR represents, derived from its Geonames feature code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportType {
    Airport,
    Heliport,
    RailStation,
    BusStation,
    Port,
    City,
    #[default]
    Other,
}

impl TransportType {
    /// Maps a Geonames `(feature_class, feature_code)` pair to a transport type.
    ///
    /// Populated-place codes all start with `PPL`; everything unrecognized maps to `Other` rather
    /// than failing, since the feature code does not participate in any contract.
    pub fn from_feature(feature_class: &str, feature_code: &str) -> Self {
        match feature_code {
            "AIRP" | "AIRF" | "AIRB" => TransportType::Airport,
            "AIRH" => TransportType::Heliport,
            "RSTN" | "RSTP" => TransportType::RailStation,
            "BUSTN" | "BUSTP" => TransportType::BusStation,
            "PRT" | "NVB" => TransportType::Port,
            _ if feature_class == "P" || feature_code.starts_with("PPL") => TransportType::City,
            _ => TransportType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Airport => "airport",
            TransportType::Heliport => "heliport",
            TransportType::RailStation => "rail-station",
            TransportType::BusStation => "bus-station",
            TransportType::Port => "port",
            TransportType::City => "city",
            TransportType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "airport" => TransportType::Airport,
            "heliport" => TransportType::Heliport,
            "rail-station" => TransportType::RailStation,
            "bus-station" => TransportType::BusStation,
            "port" => TransportType::Port,
            "city" => TransportType::City,
            _ => TransportType::Other,
        }
    }
}

/// One point of reference, as stored in the POR store.
///
/// Created by the index builder from a POR CSV row with the PageRank attached; `doc_id` is written
/// back once the matching index document has been added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PorRecord {
    pub key: PorKey,
    /// Precomputed importance score in `[0, 1]`.
    pub page_rank: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub asciiname: String,
    pub country_code: String,
    pub country_name: String,
    pub adm1_code: String,
    pub city_code: String,
    pub alternate_names: Vec<String>,
    pub feature_class: String,
    pub feature_code: String,
    pub transport_type: TransportType,
    /// Back-pointer to the full-text index document, absent until indexing assigns one.
    pub doc_id: Option<u64>,
}
