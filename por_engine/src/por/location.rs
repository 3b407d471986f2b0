// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::Serialize;

use super::{PorKey, PorRecord, TransportType};

/// A POR reconstructed during query finalization, enriched with match metadata.
///
/// Places exist only between best-holder election and response construction; they are owned by the
/// one `interpret()` call that created them.
#[derive(Clone, Debug)]
pub struct Place {
    pub record: PorRecord,
    pub original_keywords: String,
    pub corrected_keywords: String,
    /// The best combined weight of the group that matched this place.
    pub percentage: f64,
    pub edit_distance: u32,
    pub allowable_edit_distance: u32,
}

impl Place {
    /// Projects this place to the read-only snapshot handed back to the caller.
    pub fn to_location(&self) -> Location {
        Location {
            key: self.record.key.clone(),
            name: self.record.name.clone(),
            city_code: self.record.city_code.clone(),
            country_code: self.record.country_code.clone(),
            country_name: self.record.country_name.clone(),
            latitude: self.record.latitude,
            longitude: self.record.longitude,
            transport_type: self.record.transport_type,
            page_rank: self.record.page_rank,
            original_keywords: self.original_keywords.clone(),
            corrected_keywords: self.corrected_keywords.clone(),
            combined_weight: self.percentage,
            edit_distance: self.edit_distance,
            allowable_edit_distance: self.allowable_edit_distance,
        }
    }
}

/// The caller-facing, read-only view of a matched POR.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Location {
    pub key: PorKey,
    pub name: String,
    pub city_code: String,
    pub country_code: String,
    pub country_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub transport_type: TransportType,
    pub page_rank: f64,
    /// The word group that produced this location, as typed by the caller.
    pub original_keywords: String,
    /// The same group after spelling correction; equals `original_keywords` when no correction was
    /// needed.
    pub corrected_keywords: String,
    pub combined_weight: f64,
    pub edit_distance: u32,
    pub allowable_edit_distance: u32,
}
