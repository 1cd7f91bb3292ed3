//! Canonical file paths for the local data directory.
//!
//! Holds client-side persisted state (currently just the session token).
//! `PEST_MAP_DATA_DIR` overrides the default `data/` directory under the
//! workspace root.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the workspace root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find workspace root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the local data directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os("PEST_MAP_DATA_DIR")
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the session token file path.
#[must_use]
pub fn session_token_path() -> PathBuf {
    data_dir().join("session.token")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
