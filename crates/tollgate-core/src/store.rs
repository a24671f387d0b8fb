//! Ledger Store
//!
//! Stores one ledger as a pretty-printed JSON document. The store holds
//! no state besides its path and never caches: every `load` re-reads the
//! file so cooperating processes see each other's writes.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// JSON file holding a single ledger document
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store for the file at `path`
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Ledger file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the ledger file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the ledger.
    ///
    /// A missing file is `Ok(None)`; an unreadable or unparsable one is an
    /// error the caller decides how to recover from.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| Error::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Save the ledger.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// target, so readers see either the old or the new document.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(value)?;
        let tmp = self.temp_path();

        std::fs::write(&tmp, content).map_err(|source| Error::Io {
            path: tmp.clone(),
            source,
        })?;

        if let Err(source) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Io {
                path: self.path.clone(),
                source,
            });
        }

        debug!(path = ?self.path, "Ledger saved");
        Ok(())
    }

    /// Delete the ledger file (no-op if absent)
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
    }
}

#[cfg(test)]
mod tests;
