use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::User;

/// Credential file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Snapshot persisted between process runs: the opaque token and the
/// last-known user it corresponds to. Always written and cleared together
/// so the pair stays consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
}

/// Durable key/value persistence for the session token and user snapshot.
///
/// The session layer is the sole writer; resource views never read the
/// token or user from here directly.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    data_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Load the persisted session, if any. A corrupt file is treated as no
    /// stored session rather than an error.
    pub fn load(&self) -> Result<Option<StoredSession>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read credential store")?;
        match serde_json::from_str(&contents) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                warn!(error = %e, "Discarding unparseable credential store");
                Ok(None)
            }
        }
    }

    /// Persist token and user snapshot together.
    pub fn save(&self, token: &str, user: &User) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            token: token.to_string(),
            user: user.clone(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(path, contents).context("Failed to write credential store")?;
        Ok(())
    }

    /// Remove any persisted session. A no-op when nothing is stored.
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to clear credential store")?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}
