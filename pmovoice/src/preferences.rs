//! Default-device preference, stored in a small JSON document.
//!
//! The document is read once and kept in memory. A write marks the cached
//! copy dirty so the next read goes back to the file. A missing or corrupt
//! file reads as "no default".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

/// File name of the preference document inside the skill data directory.
pub const PREFERENCES_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Cannot write preferences to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct PreferenceDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_device: Option<String>,
    /// Keys written by someone else are kept as they are.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Read-through, write-through cache of the preference document.
#[derive(Debug)]
pub struct PreferenceCache {
    path: PathBuf,
    cached: Option<PreferenceDocument>,
    dirty: bool,
}

impl PreferenceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: None,
            dirty: false,
        }
    }

    /// Cache backed by [`PREFERENCES_FILE`] in `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(PREFERENCES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored default device, if any.
    pub fn get(&mut self) -> Option<String> {
        self.load()
            .default_device
            .clone()
            .filter(|d| !d.trim().is_empty())
    }

    /// Stores `device` as the default device.
    pub fn set(&mut self, device: &str) -> Result<(), PreferenceError> {
        let mut document = self.load().clone();
        document.default_device = Some(device.to_string());
        self.store(&document)?;
        info!(device, path = %self.path.display(), "Default device saved");
        Ok(())
    }

    /// Removes the default device.
    pub fn clear(&mut self) -> Result<(), PreferenceError> {
        let mut document = self.load().clone();
        document.default_device = None;
        self.store(&document)
    }

    fn load(&mut self) -> &PreferenceDocument {
        if self.dirty {
            self.cached = None;
            self.dirty = false;
        }
        let path = &self.path;
        self.cached.get_or_insert_with(|| read_document(path))
    }

    fn store(&mut self, document: &PreferenceDocument) -> Result<(), PreferenceError> {
        let json = serde_json::to_string_pretty(document)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| PreferenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = true;
        Ok(())
    }
}

fn read_document(path: &Path) -> PreferenceDocument {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No preference file yet");
            return PreferenceDocument::default();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Cannot read preference file, ignoring it");
            return PreferenceDocument::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(document) => document,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Malformed preference file, ignoring it");
            PreferenceDocument::default()
        }
    }
}
