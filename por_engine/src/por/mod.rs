// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The point-of-reference (POR) data model.
//!
//! A POR is an airport, rail station, bus station, heliport, port or city, identified by the
//! composite key `(IATA, ICAO, Geonames id)`. [`PorRecord`]s are created by the index builder from
//! the POR CSV and never mutated afterwards, except for the index back-pointer written once the
//! corresponding index document exists.

mod key;
mod location;
mod record;

pub use key::PorKey;
pub use location::{Location, Place};
pub use record::{PorRecord, TransportType};
