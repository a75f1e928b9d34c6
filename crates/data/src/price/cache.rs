use chrono::NaiveDate;
use newsalpha_core::Instrument;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use super::PriceBar;
use crate::store::{JsonStore, StoreError};

/// Persistent memo of fetched daily series.
///
/// Historical windows do not change once they have passed, so entries are
/// never invalidated; the resolver only inserts closed, complete windows. Only non-empty series are stored. Changes are kept in
/// memory until [`flush`](Self::flush).
#[derive(Debug)]
pub struct PriceCache {
    store: Option<JsonStore>,
    entries: BTreeMap<String, Vec<PriceBar>>,
    dirty: bool,
}

impl PriceCache {
    /// Opens the cache file, starting empty if it is missing or unreadable.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = JsonStore::new(path);
        let entries: BTreeMap<String, Vec<PriceBar>> = store.load_or_default();
        info!(
            path = %store.path().display(),
            entries = entries.len(),
            "Opened price cache"
        );
        Self {
            store: Some(store),
            entries,
            dirty: false,
        }
    }

    /// A cache that is never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: None,
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// `{market}_{symbol}_{start}_{end}`
    #[must_use]
    pub fn key(instrument: &Instrument, start: NaiveDate, end: NaiveDate) -> String {
        format!("{}_{start}_{end}", instrument.key())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[PriceBar]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Stores a series. Empty series are ignored so a later run can retry.
    pub fn insert(&mut self, key: String, bars: Vec<PriceBar>) {
        if bars.is_empty() {
            return;
        }
        self.entries.insert(key, bars);
        self.dirty = true;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes pending changes atomically. No-op when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written. The in-memory
    /// entries stay dirty so a later flush can retry.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        store.save(&self.entries)?;
        self.dirty = false;
        debug!(path = %store.path().display(), entries = self.entries.len(), "Flushed price cache");
        Ok(())
    }
}
