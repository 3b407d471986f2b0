// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The POR store abstraction.
//!
//! A keyed tabular store of [`PorRecord`]s. The resolver reads it during query finalization; the
//! index builder writes it. Read sessions come from a bounded [`SessionPool`]; the build path
//! opens its own exclusive connection.

mod sqlite;

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Condvar, Mutex},
};

pub use sqlite::SqliteStore;

use crate::por::{PorKey, PorRecord};

/// Store contract. Any tabular engine with a composite primary key and secondary indexes on the
/// IATA code and the Geonames id can implement it.
pub trait PorStore {
    /// Drops and recreates the table and its indexes.
    fn create_empty(&self) -> crate::Result<()>;

    /// Inserts one record; fails with `DuplicateKey` when the composite key already exists.
    fn insert(&self, record: &PorRecord) -> crate::Result<()>;

    /// Writes the index back-pointer; fails with `NotFound` when the key is absent.
    fn update_doc_id(&self, key: &PorKey, doc_id: u64) -> crate::Result<()>;

    /// Fails with `NotFound` when the key is absent.
    fn select_by_key(&self, key: &PorKey) -> crate::Result<PorRecord>;

    /// All records carrying the given IATA code, PageRank-descending.
    fn select_by_iata(&self, iata: &str) -> crate::Result<Vec<PorRecord>>;

    /// All records ordered by ascending great-circle distance from `(latitude, longitude)`; ties
    /// broken by PageRank descending, then by lexicographic key.
    fn select_by_coord(&self, latitude: f64, longitude: f64) -> crate::Result<Vec<PorRecord>>;

    /// All records in insertion (CSV) order.
    fn scan_all(&self) -> crate::Result<Vec<PorRecord>>;
}

/// Great-circle distance in kilometers (haversine formula).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

struct PoolState {
    idle: VecDeque<SqliteStore>,
    outstanding: usize,
}

/// A bounded pool of read-only store sessions.
///
/// Each query worker checks a session out for the duration of one query and returns it on drop.
/// `checkout` blocks when every session is in use.
pub struct SessionPool {
    path: PathBuf,
    capacity: usize,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl SessionPool {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            capacity: capacity.max(1),
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                outstanding: 0,
            }),
            available: Condvar::new(),
        })
    }

    /// Checks a read-only session out of the pool, opening a new connection while under capacity.
    pub fn checkout(self: &Arc<Self>) -> crate::Result<PooledSession> {
        let mut state = self.state.lock().expect("session pool lock poisoned");
        loop {
            if let Some(store) = state.idle.pop_front() {
                state.outstanding += 1;
                return Ok(PooledSession {
                    store: Some(store),
                    pool: Arc::clone(self),
                });
            }
            if state.outstanding < self.capacity {
                state.outstanding += 1;
                drop(state);
                let store = match SqliteStore::open_read_only(&self.path) {
                    Ok(store) => store,
                    Err(e) => {
                        let mut state = self.state.lock().expect("session pool lock poisoned");
                        state.outstanding -= 1;
                        self.available.notify_one();
                        return Err(e);
                    }
                };
                return Ok(PooledSession {
                    store: Some(store),
                    pool: Arc::clone(self),
                });
            }
            state = self
                .available
                .wait(state)
                .expect("session pool lock poisoned");
        }
    }

    fn checkin(&self, store: SqliteStore) {
        let mut state = self.state.lock().expect("session pool lock poisoned");
        state.outstanding -= 1;
        state.idle.push_back(store);
        self.available.notify_one();
    }
}

/// A store session borrowed from a [`SessionPool`]; returns itself on drop.
pub struct PooledSession {
    store: Option<SqliteStore>,
    pool: Arc<SessionPool>,
}

impl std::ops::Deref for PooledSession {
    type Target = SqliteStore;

    fn deref(&self) -> &SqliteStore {
        self.store.as_ref().expect("session already returned")
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if let Some(store) = self.store.take() {
            self.pool.checkin(store);
        }
    }
}
