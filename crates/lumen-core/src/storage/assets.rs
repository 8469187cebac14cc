//! Local asset catalog
//!
//! Maps user-facing names to private copies of image files. The catalog
//! document and the managed directory are kept in step:
//! - add: copy the file, then append to the catalog
//! - remove: drop from the catalog, then delete the file
//!
//! A crash between the two steps can leave an unreferenced file behind,
//! never a record pointing at a missing file. [`AssetStore::scan`] finds
//! such leftovers.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::write_atomic;
use crate::constants::assets::MAX_ASSET_BYTES;
use crate::paths;

const MAX_SLUG_LEN: usize = 48;

/// A catalog entry
///
/// `file_path` is absolute in memory. On disk it is stored as the bare file
/// name and resolved against the managed directory on load, so the catalog
/// stays valid when the home directory moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Where the image was imported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
}

/// Coarse error category, for callers that branch on kind rather than variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Persistence,
    CorruptState,
    Io,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset name is empty")]
    EmptyName,
    #[error("an asset named '{0}' already exists")]
    NameTaken(String),
    #[error("{} is {size} bytes, above the {limit} byte limit", .path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("cannot read {}: {source}", .path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },
    #[error("no asset named '{0}'")]
    NotFound(String),
    #[error("failed to persist asset catalog: {0}")]
    PersistFailed(#[source] io::Error),
    #[error("asset catalog {} is corrupt: {source}", .path.display())]
    CorruptCatalog {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("asset storage I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AssetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssetError::EmptyName
            | AssetError::NameTaken(_)
            | AssetError::FileTooLarge { .. }
            | AssetError::SourceUnreadable { .. } => ErrorKind::Validation,
            AssetError::NotFound(_) => ErrorKind::NotFound,
            AssetError::PersistFailed(_) => ErrorKind::Persistence,
            AssetError::CorruptCatalog { .. } => ErrorKind::CorruptState,
            AssetError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result of comparing the catalog with the managed directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsistencyReport {
    /// Files in the managed directory no record points at
    pub orphaned_files: Vec<PathBuf>,
    /// Records whose backing file is gone
    pub missing_files: Vec<AssetRecord>,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_files.is_empty() && self.missing_files.is_empty()
    }
}

/// Durable catalog of named local assets
///
/// Assumes a single owning process; no file locking is done.
#[derive(Debug)]
pub struct AssetStore {
    catalog_path: PathBuf,
    assets_dir: PathBuf,
    records: Vec<AssetRecord>,
    max_bytes: u64,
}

impl AssetStore {
    /// Create an empty store; call [`AssetStore::load`] to read the catalog
    pub fn new(catalog_path: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            assets_dir: assets_dir.into(),
            records: Vec::new(),
            max_bytes: MAX_ASSET_BYTES,
        }
    }

    /// Create a store and load its catalog
    pub fn open(
        catalog_path: impl Into<PathBuf>,
        assets_dir: impl Into<PathBuf>,
    ) -> Result<Self, AssetError> {
        let mut store = Self::new(catalog_path, assets_dir);
        store.load()?;
        Ok(store)
    }

    /// Open the store under the Lumen home directory
    pub fn open_default() -> Result<Self, AssetError> {
        Self::open(paths::catalog_path(), paths::assets_dir())
    }

    /// Override the size ceiling for imported files
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Rebuild the in-memory catalog from disk
    ///
    /// A missing document means an empty catalog. A malformed one is an
    /// error; nothing is discarded.
    pub fn load(&mut self) -> Result<(), AssetError> {
        let contents = match fs::read_to_string(&self.catalog_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.catalog_path.display(), "No asset catalog yet");
                self.records.clear();
                return Ok(());
            }
            Err(e) => return Err(AssetError::Io(e)),
        };

        let mut records: Vec<AssetRecord> =
            serde_json::from_str(&contents).map_err(|source| AssetError::CorruptCatalog {
                path: self.catalog_path.clone(),
                source,
            })?;
        for record in &mut records {
            record.file_path = self.resolve(&record.file_path);
        }

        debug!(count = records.len(), "Loaded asset catalog");
        self.records = records;
        Ok(())
    }

    /// Records in insertion order
    pub fn list(&self) -> &[AssetRecord] {
        &self.records
    }

    /// First record with the given name
    pub fn find(&self, name: &str) -> Option<&AssetRecord> {
        let name = name.trim();
        self.records.iter().find(|r| r.name == name)
    }

    /// Import `source` under `name`
    ///
    /// The catalog is on disk before this returns `Ok`. If writing it fails
    /// the in-memory catalog is rolled back and the copied file stays in the
    /// managed directory as an orphan.
    pub fn add(&mut self, name: &str, source: &Path) -> Result<AssetRecord, AssetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AssetError::EmptyName);
        }
        if self.find(name).is_some() {
            return Err(AssetError::NameTaken(name.to_string()));
        }

        let unreadable = |source_err| AssetError::SourceUnreadable {
            path: source.to_path_buf(),
            source: source_err,
        };

        let size = fs::metadata(source).map_err(unreadable)?.len();
        self.check_size(source, size)?;

        let bytes = fs::read(source).map_err(unreadable)?;
        self.check_size(source, bytes.len() as u64)?;

        let id = Uuid::new_v4().to_string();
        let file_path = self.assets_dir.join(stored_file_name(name, &id, source));
        write_atomic(&file_path, &bytes)?;

        let record = AssetRecord {
            id,
            name: name.to_string(),
            file_path,
            created_at: Utc::now(),
            original_path: Some(source.to_path_buf()),
        };

        self.records.push(record.clone());
        if let Err(e) = self.persist() {
            self.records.pop();
            warn!(name = %name, error = %e, "Asset catalog write failed, add rolled back");
            return Err(AssetError::PersistFailed(e));
        }

        info!(name = %name, id = %record.id, bytes = bytes.len(), "Asset added");
        Ok(record)
    }

    /// Remove the first record named `name`, then its file
    pub fn remove(&mut self, name: &str) -> Result<AssetRecord, AssetError> {
        let name = name.trim();
        let index = self
            .records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        let record = self.records.remove(index);
        if let Err(e) = self.persist() {
            self.records.insert(index, record);
            warn!(name = %name, error = %e, "Asset catalog write failed, remove rolled back");
            return Err(AssetError::PersistFailed(e));
        }

        if record.file_path.starts_with(&self.assets_dir) {
            match fs::remove_file(&record.file_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    path = %record.file_path.display(),
                    error = %e,
                    "Asset removed from catalog but file could not be deleted"
                ),
            }
        } else {
            warn!(
                path = %record.file_path.display(),
                "Asset file is outside the managed directory, leaving it in place"
            );
        }

        info!(name = %name, id = %record.id, "Asset removed");
        Ok(record)
    }

    /// Compare the catalog with the managed directory
    pub fn scan(&self) -> Result<ConsistencyReport, AssetError> {
        let referenced: HashSet<&Path> =
            self.records.iter().map(|r| r.file_path.as_path()).collect();

        let mut orphaned_files = Vec::new();
        match fs::read_dir(&self.assets_dir) {
            Ok(entries) => {
                for entry in entries {
                    let path = entry?.path();
                    if path.is_file() && !referenced.contains(path.as_path()) {
                        orphaned_files.push(path);
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(AssetError::Io(e)),
        }
        orphaned_files.sort();

        let missing_files = self
            .records
            .iter()
            .filter(|r| !r.file_path.is_file())
            .cloned()
            .collect();

        Ok(ConsistencyReport {
            orphaned_files,
            missing_files,
        })
    }

    /// Delete files no record references; returns what was deleted
    pub fn prune_orphans(&self) -> Result<Vec<PathBuf>, AssetError> {
        let report = self.scan()?;
        for path in &report.orphaned_files {
            fs::remove_file(path)?;
            info!(path = %path.display(), "Pruned orphaned asset file");
        }
        Ok(report.orphaned_files)
    }

    fn check_size(&self, source: &Path, size: u64) -> Result<(), AssetError> {
        if size > self.max_bytes {
            return Err(AssetError::FileTooLarge {
                path: source.to_path_buf(),
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Managed files live directly in `assets_dir`; the file name identifies them
    fn resolve(&self, path: &Path) -> PathBuf {
        match path.file_name() {
            Some(name) => self.assets_dir.join(name),
            None => path.to_path_buf(),
        }
    }

    fn persist(&self) -> io::Result<()> {
        let stored: Vec<AssetRecord> = self
            .records
            .iter()
            .map(|r| AssetRecord {
                file_path: r
                    .file_path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| r.file_path.clone()),
                ..r.clone()
            })
            .collect();
        let contents = serde_json::to_vec_pretty(&stored)?;
        write_atomic(&self.catalog_path, &contents)
    }
}

/// `<slug>_<id><.ext>`, unique because the id is
fn stored_file_name(name: &str, id: &str, source: &Path) -> String {
    let mut slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_SLUG_LEN)
        .collect();
    if slug.trim_matches('_').is_empty() {
        slug = "asset".to_string();
    }

    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    format!("{}_{}{}", slug, id, ext)
}
