//! Spoken device name to discovered device.
//!
//! The index is immutable once built. A discovery refresh builds a new
//! [`NameIndex`] and swaps it in, so a command always resolves against one
//! complete snapshot.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use pmocast::DeviceRecord;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No device specified and no default device set")]
    NoDeviceSpecified,
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
}

/// Case-insensitive index of discovered devices, keyed by lower-cased
/// display name, keeping discovery order for listing.
#[derive(Debug, Default, Clone)]
pub struct NameIndex {
    order: Vec<String>,
    entries: HashMap<String, DeviceRecord>,
}

impl NameIndex {
    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Builds an index. A record whose name collides (case-insensitively)
    /// with an earlier one replaces it but keeps the earlier position.
    pub fn from_records(records: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let mut index = NameIndex::default();
        for record in records {
            let key = Self::key(&record.display_name);
            if index.entries.insert(key.clone(), record).is_none() {
                index.order.push(key);
            }
        }
        index
    }

    pub fn get(&self, name: &str) -> Option<&DeviceRecord> {
        self.entries.get(&Self::key(name))
    }

    /// Lookup by canonical name, used for the stored default device.
    pub fn get_canonical(&self, canonical_name: &str) -> Option<&DeviceRecord> {
        let wanted = Self::key(canonical_name);
        self.get(canonical_name).or_else(|| {
            self.records()
                .find(|record| Self::key(&record.canonical_name) == wanted)
        })
    }

    /// Records in discovery order.
    pub fn records(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Display names in discovery order.
    pub fn names(&self) -> Vec<String> {
        self.records().map(|r| r.display_name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Shared resolver, read by commands and replaced by the discovery refresh.
#[derive(Debug, Default)]
pub struct NameResolver {
    index: RwLock<Arc<NameIndex>>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole index with `records`. Returns the number of
    /// distinct names published.
    pub fn publish(&self, records: Vec<DeviceRecord>) -> usize {
        // Built before taking the lock, the swap itself is a pointer store.
        let index = Arc::new(NameIndex::from_records(records));
        let count = index.len();
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
        debug!(count, "Published device name index");
        count
    }

    pub fn snapshot(&self) -> Arc<NameIndex> {
        Arc::clone(&self.index.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Resolves a spoken name.
    pub fn resolve(&self, spoken: &str) -> Result<DeviceRecord, ResolveError> {
        if spoken.trim().is_empty() {
            return Err(ResolveError::NoDeviceSpecified);
        }
        self.snapshot()
            .get(spoken)
            .cloned()
            .ok_or_else(|| ResolveError::DeviceNotFound(spoken.trim().to_string()))
    }

    /// Resolves `spoken` if present, else the `default` canonical name.
    pub fn resolve_or_default(
        &self,
        spoken: Option<&str>,
        default: Option<&str>,
    ) -> Result<DeviceRecord, ResolveError> {
        if let Some(spoken) = spoken.filter(|s| !s.trim().is_empty()) {
            return self.resolve(spoken);
        }

        match default.filter(|d| !d.trim().is_empty()) {
            Some(default) => self
                .snapshot()
                .get_canonical(default)
                .cloned()
                .ok_or_else(|| ResolveError::DeviceNotFound(default.to_string())),
            None => Err(ResolveError::NoDeviceSpecified),
        }
    }
}
