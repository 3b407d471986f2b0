// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use crate::{
    por::{PorKey, PorRecord, TransportType},
    store::{haversine_km, PorStore},
    ErrorKind,
};

/// Separator for the packed alternate-names column. Alternate names are free text, so a control
/// character is the only safe join character.
const ALTERNATE_NAMES_SEPARATOR: char = '\x1f';

const SCHEMA: &str = "
DROP TABLE IF EXISTS por;
CREATE TABLE por (
    iata            TEXT NOT NULL,
    icao            TEXT NOT NULL,
    geoname_id      INTEGER NOT NULL,
    page_rank       REAL NOT NULL,
    latitude        REAL NOT NULL DEFAULT 0.0,
    longitude       REAL NOT NULL DEFAULT 0.0,
    name            TEXT NOT NULL DEFAULT '',
    asciiname       TEXT NOT NULL DEFAULT '',
    country_code    TEXT NOT NULL DEFAULT '',
    country_name    TEXT NOT NULL DEFAULT '',
    adm1_code       TEXT NOT NULL DEFAULT '',
    city_code       TEXT NOT NULL DEFAULT '',
    alternate_names TEXT NOT NULL DEFAULT '',
    feature_class   TEXT NOT NULL DEFAULT '',
    feature_code    TEXT NOT NULL DEFAULT '',
    transport_type  TEXT NOT NULL DEFAULT 'other',
    doc_id          INTEGER,
    PRIMARY KEY (iata, icao, geoname_id)
);
CREATE INDEX idx_por_iata ON por(iata);
CREATE INDEX idx_por_geoname ON por(geoname_id);
";

const ALL_COLUMNS: &str = "iata, icao, geoname_id, page_rank, latitude, longitude, name, \
                           asciiname, country_code, country_name, adm1_code, city_code, \
                           alternate_names, feature_class, feature_code, transport_type, doc_id";

/// SQLite implementation of [`PorStore`], one connection per instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if needed) a read-write store. Used by the build path only.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let conn = Connection::open(path).map_err(|e| ErrorKind::StoreError.with_source(e))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| ErrorKind::StoreError.with_source(e))?;
        Ok(Self { conn })
    }

    /// Opens an existing store read-only. Used by query sessions.
    pub fn open_read_only(path: &Path) -> crate::Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| ErrorKind::StoreError.with_source(e))?;
        Ok(Self { conn })
    }

    /// An in-memory store, for tests.
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ErrorKind::StoreError.with_source(e))?;
        Ok(Self { conn })
    }

    fn select_where(&self, clause: &str, params: &[&dyn rusqlite::ToSql]) -> crate::Result<Vec<PorRecord>> {
        let sql = format!("SELECT {ALL_COLUMNS} FROM por {clause}");
        let mut statement = self
            .conn
            .prepare(&sql)
            .map_err(|e| ErrorKind::StoreError.with_source(e))?;
        let rows = statement
            .query_map(params, row_to_record)
            .map_err(|e| ErrorKind::StoreError.with_source(e))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| ErrorKind::StoreError.with_source(e))?);
        }
        Ok(records)
    }
}

fn row_to_record(row: &Row) -> rusqlite::Result<PorRecord> {
    let alternate_names: String = row.get("alternate_names")?;
    let transport_type: String = row.get("transport_type")?;
    Ok(PorRecord {
        key: PorKey {
            iata: row.get("iata")?,
            icao: row.get("icao")?,
            geoname_id: row.get::<_, i64>("geoname_id")? as u64,
        },
        page_rank: row.get("page_rank")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        name: row.get("name")?,
        asciiname: row.get("asciiname")?,
        country_code: row.get("country_code")?,
        country_name: row.get("country_name")?,
        adm1_code: row.get("adm1_code")?,
        city_code: row.get("city_code")?,
        alternate_names: if alternate_names.is_empty() {
            Vec::new()
        } else {
            alternate_names
                .split(ALTERNATE_NAMES_SEPARATOR)
                .map(|n| n.to_string())
                .collect()
        },
        feature_class: row.get("feature_class")?,
        feature_code: row.get("feature_code")?,
        transport_type: TransportType::parse(&transport_type),
        doc_id: row.get::<_, Option<i64>>("doc_id")?.map(|id| id as u64),
    })
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl PorStore for SqliteStore {
    fn create_empty(&self) -> crate::Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|e| ErrorKind::StoreError.with_source(e))
    }

    fn insert(&self, record: &PorRecord) -> crate::Result<()> {
        let result = self.conn.execute(
            "INSERT INTO por (iata, icao, geoname_id, page_rank, latitude, longitude, name, \
             asciiname, country_code, country_name, adm1_code, city_code, alternate_names, \
             feature_class, feature_code, transport_type, doc_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                record.key.iata,
                record.key.icao,
                record.key.geoname_id as i64,
                record.page_rank,
                record.latitude,
                record.longitude,
                record.name,
                record.asciiname,
                record.country_code,
                record.country_name,
                record.adm1_code,
                record.city_code,
                record
                    .alternate_names
                    .join(&ALTERNATE_NAMES_SEPARATOR.to_string()),
                record.feature_class,
                record.feature_code,
                record.transport_type.as_str(),
                record.doc_id.map(|id| id as i64),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(ErrorKind::DuplicateKey
                .with_source(e)
                .with_message(format!("POR {} already inserted", record.key))),
            Err(e) => Err(ErrorKind::StoreError.with_source(e)),
        }
    }

    fn update_doc_id(&self, key: &PorKey, doc_id: u64) -> crate::Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE por SET doc_id = ?1 WHERE iata = ?2 AND icao = ?3 AND geoname_id = ?4",
                params![doc_id as i64, key.iata, key.icao, key.geoname_id as i64],
            )
            .map_err(|e| ErrorKind::StoreError.with_source(e))?;
        if updated == 0 {
            return Err(
                ErrorKind::NotFound.with_message(format!("no POR {key} to attach doc id to"))
            );
        }
        Ok(())
    }

    fn select_by_key(&self, key: &PorKey) -> crate::Result<PorRecord> {
        let sql = format!(
            "SELECT {ALL_COLUMNS} FROM por WHERE iata = ?1 AND icao = ?2 AND geoname_id = ?3"
        );
        self.conn
            .query_row(
                &sql,
                params![key.iata, key.icao, key.geoname_id as i64],
                row_to_record,
            )
            .optional()
            .map_err(|e| ErrorKind::StoreError.with_source(e))?
            .ok_or_else(|| ErrorKind::NotFound.with_message(format!("no POR {key} in the store")))
    }

    fn select_by_iata(&self, iata: &str) -> crate::Result<Vec<PorRecord>> {
        self.select_where(
            "WHERE iata = ?1 ORDER BY page_rank DESC, icao, geoname_id",
            &[&iata],
        )
    }

    fn select_by_coord(&self, latitude: f64, longitude: f64) -> crate::Result<Vec<PorRecord>> {
        // The table is offline-built reference data; ordering in memory keeps the SQL portable.
        let mut records = self.scan_all()?;
        records.sort_by(|a, b| {
            let da = haversine_km(latitude, longitude, a.latitude, a.longitude);
            let db = haversine_km(latitude, longitude, b.latitude, b.longitude);
            da.total_cmp(&db)
                .then(b.page_rank.total_cmp(&a.page_rank))
                .then(a.key.cmp(&b.key))
        });
        Ok(records)
    }

    fn scan_all(&self) -> crate::Result<Vec<PorRecord>> {
        self.select_where("ORDER BY rowid", &[])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::ErrorKind;

    use super::*;

    fn record(iata: &str, icao: &str, geoname_id: u64, page_rank: f64) -> PorRecord {
        PorRecord {
            key: PorKey::new(iata, icao, geoname_id),
            page_rank,
            name: format!("{iata} airport"),
            ..Default::default()
        }
    }

    fn fresh_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_empty().unwrap();
        store
    }

    #[test]
    pub fn insert_then_select_round_trips() {
        let store = fresh_store();
        let mut sfo = record("SFO", "KSFO", 5391959, 0.79);
        sfo.alternate_names = vec!["San Francisco".to_string(), "Frisco".to_string()];
        store.insert(&sfo).unwrap();

        let loaded = store.select_by_key(&sfo.key).unwrap();
        assert_eq!(sfo, loaded);
    }

    #[test]
    pub fn duplicate_insert_is_rejected() {
        let store = fresh_store();
        let sfo = record("SFO", "KSFO", 5391959, 0.79);
        store.insert(&sfo).unwrap();
        let err = store.insert(&sfo).unwrap_err();
        assert_eq!(ErrorKind::DuplicateKey, err.kind());
    }

    #[test]
    pub fn select_missing_key_is_not_found() {
        let store = fresh_store();
        let err = store
            .select_by_key(&PorKey::new("ZZZ", "", 0))
            .unwrap_err();
        assert_eq!(ErrorKind::NotFound, err.kind());
    }

    #[test]
    pub fn update_doc_id_writes_back_pointer() {
        let store = fresh_store();
        let sfo = record("SFO", "KSFO", 5391959, 0.79);
        store.insert(&sfo).unwrap();
        store.update_doc_id(&sfo.key, 42).unwrap();
        assert_eq!(Some(42), store.select_by_key(&sfo.key).unwrap().doc_id);

        let err = store
            .update_doc_id(&PorKey::new("ZZZ", "", 0), 1)
            .unwrap_err();
        assert_eq!(ErrorKind::NotFound, err.kind());
    }

    #[test]
    pub fn scan_all_preserves_insertion_order() {
        let store = fresh_store();
        let records = vec![
            record("SFO", "KSFO", 5391959, 0.79),
            record("RIO", "SBGL", 3451190, 0.60),
            record("GIG", "SBGL", 3451191, 0.62),
        ];
        for r in &records {
            store.insert(r).unwrap();
        }
        let scanned = store.scan_all().unwrap();
        assert_eq!(records, scanned);
    }

    #[test]
    pub fn select_by_iata_orders_by_page_rank() {
        let store = fresh_store();
        store.insert(&record("RIO", "SBGL", 3451190, 0.60)).unwrap();
        store.insert(&record("RIO", "", 3451192, 0.70)).unwrap();
        let rows = store.select_by_iata("RIO").unwrap();
        assert_eq!(
            vec![0.70, 0.60],
            rows.iter().map(|r| r.page_rank).collect::<Vec<_>>()
        );
    }

    #[test]
    pub fn select_by_coord_orders_by_distance_then_page_rank() {
        let store = fresh_store();
        let mut nce = record("NCE", "LFMN", 6299418, 0.52);
        nce.latitude = 43.66;
        nce.longitude = 7.21;
        let mut sfo = record("SFO", "KSFO", 5391959, 0.79);
        sfo.latitude = 37.62;
        sfo.longitude = -122.37;
        // Same coordinates as NCE but a higher PageRank: wins the tie.
        let mut twin = record("NCX", "LFMX", 6299419, 0.99);
        twin.latitude = 43.66;
        twin.longitude = 7.21;

        store.insert(&sfo).unwrap();
        store.insert(&nce).unwrap();
        store.insert(&twin).unwrap();

        let near_nice = store.select_by_coord(43.7, 7.2).unwrap();
        assert_eq!(
            vec!["NCX", "NCE", "SFO"],
            near_nice.iter().map(|r| r.key.iata.as_str()).collect::<Vec<_>>()
        );
    }
}
