//! Global context for Quay operations.
//!
//! Resolves the working directory, the user's Quay home and the manifest
//! once, so commands don't each reimplement path lookup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::manifest::{find_manifest, ManifestError};
use crate::util::config::{load_config, Config};

/// Name of both the global (`~/.quay`) and project (`.quay`) directories.
const QUAY_DIR: &str = ".quay";

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Quay data (~/.quay/)
    home: PathBuf,

    /// Explicit manifest path from the command line
    manifest_path: Option<PathBuf>,
}

impl GlobalContext {
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context rooted at a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = std::env::var_os("QUAY_HOME")
            .map(PathBuf::from)
            .or_else(|| directories::BaseDirs::new().map(|b| b.home_dir().join(QUAY_DIR)))
            .unwrap_or_else(|| PathBuf::from(QUAY_DIR));

        GlobalContext {
            cwd,
            home,
            manifest_path: None,
        }
    }

    pub fn with_manifest_path(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_path = path.map(|p| if p.is_absolute() { p } else { self.cwd.join(p) });
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Global configuration file path (`$QUAY_HOME/config.toml`).
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Project-local Quay directory, next to the manifest when there is one.
    pub fn project_quay_dir(&self) -> PathBuf {
        let root = self
            .find_manifest()
            .ok()
            .and_then(|m| m.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.cwd.clone());
        root.join(QUAY_DIR)
    }

    /// Merged global and project configuration.
    pub fn config(&self) -> Config {
        load_config(
            &self.config_path(),
            &self.project_quay_dir().join("config.toml"),
        )
    }

    /// The manifest: the `--manifest-path` value, or the nearest `Quay.toml`
    /// at or above the working directory.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        if let Some(path) = &self.manifest_path {
            return if path.is_file() {
                Ok(path.clone())
            } else {
                Err(ManifestError::NotFound { dir: path.clone() })
            };
        }
        find_manifest(&self.cwd).ok_or_else(|| ManifestError::NotFound {
            dir: self.cwd.clone(),
        })
    }
}
