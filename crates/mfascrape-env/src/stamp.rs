//! Install stamp: records which manifest digest the environment was last
//! installed from. Persisted as `<env>/.mfascrape-install.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EnvError;

const STAMP_FILENAME: &str = ".mfascrape-install.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStamp {
    pub manifest_sha256: String,
    pub packages: Vec<String>,
    pub installed_at: DateTime<Utc>,
}

pub fn stamp_path(env_dir: &Path) -> PathBuf {
    env_dir.join(STAMP_FILENAME)
}

impl InstallStamp {
    pub fn new(manifest_sha256: &str, packages: &[String]) -> Self {
        Self {
            manifest_sha256: manifest_sha256.to_string(),
            packages: packages.to_vec(),
            installed_at: Utc::now(),
        }
    }

    /// Read the stamp; a missing or unreadable stamp counts as absent.
    pub fn read(env_dir: &Path) -> Option<Self> {
        let content = fs::read_to_string(stamp_path(env_dir)).ok()?;
        match serde_json::from_str(&content) {
            Ok(stamp) => Some(stamp),
            Err(e) => {
                tracing::warn!("ignoring corrupt install stamp in {}: {}", env_dir.display(), e);
                None
            }
        }
    }

    pub fn write(&self, env_dir: &Path) -> Result<(), EnvError> {
        let path = stamp_path(env_dir);
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            EnvError::io(
                format!("serialize {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        fs::write(&path, content).map_err(|e| EnvError::io(format!("write {}", path.display()), e))
    }

    pub fn matches(&self, manifest_sha256: &str) -> bool {
        self.manifest_sha256 == manifest_sha256
    }
}
