//! On-disk [`CacheStore`] backed by sled.
//!
//! Values are postcard-encoded `(expires_at_ms, CacheEntry)` pairs. Expired
//! entries are dropped lazily when read.

use std::path::Path;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::store::{CacheStore, StoreResult};
use crate::core::date::to_millis;
use crate::data::CacheEntry;
use crate::error::StoreError;

#[derive(Serialize, Deserialize)]
struct Record {
    expires_at_ms: i64,
    entry: CacheEntry,
}

#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = sled::open(path)
            .map_err(|e| StoreError::with_source("failed to open sled database", e))?;
        Ok(Self { db })
    }

    /// Use an already opened database, e.g. a temporary one.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> StoreResult<usize> {
        let now = to_millis(SystemTime::now());
        let mut removed = 0;
        for item in self.db.iter() {
            let (key, value) = item.map_err(db_error)?;
            let expired = postcard::from_bytes::<Record>(&value)
                .map(|record| record.expires_at_ms <= now)
                .unwrap_or(true);
            if expired {
                self.db.remove(key).map_err(db_error)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn db_error(e: sled::Error) -> StoreError {
    StoreError::with_source("sled database error", e)
}

#[async_trait]
impl CacheStore for SledStore {
    async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        let Some(value) = self.db.get(key.as_bytes()).map_err(db_error)? else {
            return Ok(None);
        };

        let record: Record = postcard::from_bytes(&value)
            .map_err(|e| StoreError::with_source(format!("corrupt cache record for {key}"), e))?;

        if record.expires_at_ms <= to_millis(SystemTime::now()) {
            trace!(key, "Dropping expired cache record");
            self.db.remove(key.as_bytes()).map_err(db_error)?;
            return Ok(None);
        }

        Ok(Some(record.entry))
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> StoreResult<()> {
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .map(to_millis)
            .unwrap_or(i64::MAX);
        let record = Record {
            expires_at_ms: expires_at,
            entry,
        };
        let value = postcard::to_allocvec(&record)
            .map_err(|e| StoreError::with_source("failed to encode cache record", e))?;
        self.db.insert(key.as_bytes(), value).map_err(db_error)?;
        Ok(())
    }
}
