use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::SessionToken;

use super::TokenStore;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: SessionToken,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }
}

/// Token store backed by `session.json` in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    /// Read the whole stored document, including when it was written
    pub fn load(&self) -> Result<Option<StoredSession>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let stored: StoredSession =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(stored))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<SessionToken>> {
        let stored = self.load()?;
        if let Some(ref s) = stored {
            debug!(age_minutes = s.age_minutes(), "Stored session found");
        }
        Ok(stored.map(|s| s.token))
    }

    fn set(&mut self, token: &SessionToken) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }

        let stored = StoredSession {
            token: token.clone(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        write_private(&path, contents.as_bytes())
    }

    fn delete(&mut self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Write the session file readable by the owner only.
///
/// The mode is set at creation, and reapplied for a file left by an older
/// build with wider permissions.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .context("Failed to open session file")?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .context("Failed to restrict session file permissions")?;
    file.write_all(contents).context("Failed to write session file")?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    std::fs::write(path, contents).context("Failed to write session file")
}
