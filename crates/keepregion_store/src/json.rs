//! JSON document store.
//!
//! The whole region set lives in one document. Saves write a sibling
//! temporary file, sync it and rename it over the document, so an
//! interrupted save leaves the previous document intact.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use keepregion_model::Region;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::RegionStore;
use crate::error::StoreError;
use crate::record::{self, REGIONS_KEY, RegionDocument};

/// Default document file name inside the data directory.
pub const DEFAULT_FILE_NAME: &str = "regions.json";

/// Region store backed by a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonRegionStore {
    path: PathBuf,
}

impl JsonRegionStore {
    /// Store the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the document as [`DEFAULT_FILE_NAME`] inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FILE_NAME))
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the containing directory and an empty document if missing.
    fn ensure_document(&self) {
        if self.path.exists() {
            return;
        }
        info!(path = %self.path.display(), "initialising empty region document");
        if let Err(e) = self.write_atomically(&[]) {
            warn!(error = %e, "failed to initialise region document");
        }
    }

    fn write_atomically(&self, regions: &[Region]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let payload = serde_json::to_vec_pretty(&RegionDocument::from_regions(regions))?;

        let temp_path = self.temp_path();
        let io_err = |source: std::io::Error| StoreError::Io {
            path: temp_path.clone(),
            source,
        };
        let file = File::create(&temp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&payload).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
        drop(writer);

        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RegionStore for JsonRegionStore {
    fn load(&self) -> Vec<Region> {
        self.ensure_document();

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read region document");
                return Vec::new();
            }
        };
        if raw.trim().is_empty() {
            return Vec::new();
        }

        let document: Value = match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "region document is not valid JSON");
                return Vec::new();
            }
        };
        let Some(entries) = document.get(REGIONS_KEY).and_then(Value::as_array) else {
            warn!(
                path = %self.path.display(),
                key = REGIONS_KEY,
                "region document has no region list"
            );
            return Vec::new();
        };

        let mut regions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match record::parse_record(entry) {
                Ok(region) => regions.push(region),
                Err(e) => warn!(index, error = %e, "skipping invalid region entry"),
            }
        }
        debug!(
            loaded = regions.len(),
            skipped = entries.len() - regions.len(),
            "region document loaded"
        );
        regions
    }

    fn save(&self, regions: &[Region]) -> Result<(), StoreError> {
        self.write_atomically(regions).inspect_err(|e| {
            error!(path = %self.path.display(), error = %e, "failed to save region document");
        })
    }
}
