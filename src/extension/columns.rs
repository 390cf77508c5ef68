//! Storage column pool for extension fields.
//!
//! Every extension target reserves `pool_size` generic columns named
//! `<prefix>1..=<prefix>N`. A new field takes the first column not yet used
//! under its extension.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::store::{StoreError, UniqueConstraint};
use crate::error::{FieldforgeError, Result};

pub struct ColumnAllocator {
    prefix: String,
    pool_size: usize,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ColumnAllocator {
    pub fn new(prefix: impl Into<String>, pool_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pool_size,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.pool_size).map(move |n| format!("{}{}", self.prefix, n))
    }

    /// First pool column absent from `used`.
    pub fn first_free(&self, used: &[String]) -> Option<String> {
        self.pool().find(|column| !used.contains(column))
    }

    /// Allocate a column and persist with it.
    ///
    /// Runs under the extension's lock. `used` reads the columns already
    /// taken, `insert` persists with the chosen column. A column conflict
    /// reported by the store is retried once with a fresh read.
    pub fn allocate<T, U, I>(&self, extension_id: i64, used: U, mut insert: I) -> Result<T>
    where
        U: Fn() -> std::result::Result<Vec<String>, StoreError>,
        I: FnMut(String) -> std::result::Result<T, StoreError>,
    {
        let lock = self.lock_for(extension_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| FieldforgeError::Internal("column allocation lock poisoned".to_string()))?;

        let mut retried = false;
        loop {
            let taken = used()?;
            let column = self.first_free(&taken).ok_or_else(|| {
                FieldforgeError::invalid(format!(
                    "No free storage column left; at most {} extension fields are supported",
                    self.pool_size
                ))
            })?;

            match insert(column.clone()) {
                Ok(saved) => return Ok(saved),
                Err(StoreError::UniqueViolation {
                    constraint: UniqueConstraint::FieldColumn,
                    ..
                }) if !retried => {
                    tracing::warn!(
                        "Column '{}' was taken concurrently in extension {}, retrying",
                        column,
                        extension_id
                    );
                    retried = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn lock_for(&self, extension_id: i64) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| FieldforgeError::Internal("column lock table poisoned".to_string()))?;
        Ok(Arc::clone(locks.entry(extension_id).or_default()))
    }
}
