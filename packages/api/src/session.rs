//! Bearer-token session persistence.
//!
//! The token is stored in a plain file and re-read on every request, so a
//! login or logout from another process takes effect without restarting.
//! `PEST_MAP_TOKEN` overrides the stored token when set.

use std::path::PathBuf;

use crate::paths;

/// File-backed bearer-token store.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
}

impl Session {
    /// Creates a session store backed by the given file.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a session store at the default location,
    /// `<data_dir>/session.token`.
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(paths::session_token_path())
    }

    /// Returns the current token, if any.
    ///
    /// Reads `PEST_MAP_TOKEN` first, then the token file. Whitespace is
    /// trimmed; an empty file counts as no token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("PEST_MAP_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Some(token);
            }
        }

        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = contents.trim().to_string();
        if token.is_empty() { None } else { Some(token) }
    }

    /// Persists a token, creating the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub fn store(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            paths::ensure_dir(parent)?;
        }
        std::fs::write(&self.path, token.trim())
    }

    /// Removes the stored token. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists but cannot be removed.
    pub fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_session(name: &str) -> Session {
        let dir = std::env::temp_dir().join(format!("pest-map-test-{}", std::process::id()));
        Session::new(dir.join(name))
    }

    #[test]
    fn stores_and_reads_back_a_token() {
        let session = temp_session("roundtrip.token");
        session.store("  abc123  ").unwrap();
        assert_eq!(session.token().as_deref(), Some("abc123"));
        session.clear().unwrap();
        assert_eq!(session.token(), None);
    }

    #[test]
    fn missing_file_means_no_token() {
        let session = temp_session("never-written.token");
        assert_eq!(session.token(), None);
        // Clearing a missing token is fine.
        session.clear().unwrap();
    }

    #[test]
    fn empty_file_means_no_token() {
        let session = temp_session("empty.token");
        session.store("   ").unwrap();
        assert_eq!(session.token(), None);
        session.clear().unwrap();
    }
}
