//! Persistence layer
//!
//! File-backed storage for:
//! - The asset catalog and its managed image directory
//! - Non-secret user configuration
//!
//! Both documents are replaced atomically through [`write_atomic`].

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

pub mod assets;
pub mod config;

pub use assets::{AssetError, AssetRecord, AssetStore, ConsistencyReport, ErrorKind};
pub use config::{Config, ConfigError, ConfigStore};

/// Get current Unix timestamp in seconds
#[inline]
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Replace `path` with `contents` so readers only ever see the old or the new document
///
/// Writes to a temp file in the same directory, syncs it, renames it over the target,
/// then syncs the directory so the rename itself is durable.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

/// Flush directory entries (renames, creations) to disk
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
