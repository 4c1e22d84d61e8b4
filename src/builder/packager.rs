//! Package assembly.
//!
//! The backend installs into a staging folder next to the package root.
//! License files and any extra files (the consumer metadata) are written
//! into staging as well, so the package is complete before it becomes
//! visible. An existing package is renamed aside, staging is renamed into
//! its place, and only then is the old copy deleted. If the swap fails the
//! old package is moved back.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::builder::backend::{BackendFailure, BuildBackend};
use crate::builder::lifecycle::BuiltOutput;
use crate::util::fs::glob_under;

/// Folder inside a package that receives license files.
pub const LICENSES_DIR: &str = "licenses";

const STAGING_PREFIX: &str = ".quay-staging-";
const OLD_PREFIX: &str = ".quay-old-";

/// Error assembling a package.
#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("install failed:\n{0}")]
    Install(#[source] BackendFailure),

    #[error("failed to {action} `{}`", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PackagingError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> PackagingError + 'a {
        move |source| PackagingError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An assembled package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl Package {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files in the package, relative to its root, sorted.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn licenses(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().filter(|f| f.starts_with(LICENSES_DIR))
    }
}

/// Install `output` into `package_root` and add license files.
///
/// `license_patterns` are globs relative to the source root. Missing
/// license files are not an error. `extra_files` are `(relative path,
/// contents)` pairs written into the package before it is published.
pub fn package<B: BuildBackend + ?Sized>(
    backend: &mut B,
    output: &BuiltOutput,
    package_root: &Path,
    license_patterns: &[String],
    extra_files: &[(&str, String)],
) -> Result<Package, PackagingError> {
    let parent = package_root.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(PackagingError::io("create", parent))?;

    // Removed on drop unless renamed into place first.
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(PackagingError::io("create staging folder in", parent))?;

    tracing::info!("Packaging into {}", package_root.display());
    backend
        .install(output.build_dir(), output.build_type(), staging.path())
        .map_err(PackagingError::Install)?;

    copy_licenses(output.source_root(), license_patterns, staging.path())?;

    for (name, contents) in extra_files {
        let path = staging.path().join(name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(PackagingError::io("create", dir))?;
        }
        std::fs::write(&path, contents).map_err(PackagingError::io("write", &path))?;
    }

    let files = list_files(staging.path());
    publish(staging.path(), package_root)?;
    tracing::info!("Packaged {} files", files.len());

    Ok(Package {
        root: package_root.to_path_buf(),
        files,
    })
}

/// Move the finished `staging` folder to `package_root`.
fn publish(staging: &Path, package_root: &Path) -> Result<(), PackagingError> {
    if !package_root.exists() {
        return std::fs::rename(staging, package_root)
            .map_err(PackagingError::io("move package into", package_root));
    }

    let old = aside_path(staging);
    tracing::debug!("replacing existing package at {}", package_root.display());
    std::fs::rename(package_root, &old)
        .map_err(PackagingError::io("move old package out of", package_root))?;

    if let Err(e) = std::fs::rename(staging, package_root) {
        if let Err(restore) = std::fs::rename(&old, package_root) {
            tracing::error!(
                "could not restore previous package from {}: {}",
                old.display(),
                restore
            );
        }
        return Err(PackagingError::io("move package into", package_root)(e));
    }

    if let Err(e) = std::fs::remove_dir_all(&old) {
        tracing::warn!("failed to remove old package {}: {}", old.display(), e);
    }
    Ok(())
}

/// A sibling of `staging` that shares its unique suffix.
fn aside_path(staging: &Path) -> PathBuf {
    let name = staging
        .file_name()
        .map(|n| n.to_string_lossy().replacen(STAGING_PREFIX, OLD_PREFIX, 1))
        .unwrap_or_else(|| OLD_PREFIX.to_string());
    staging.with_file_name(name)
}

/// Copy license files matching `patterns` into `<dest>/licenses`.
fn copy_licenses(
    source_root: &Path,
    patterns: &[String],
    dest: &Path,
) -> Result<Vec<PathBuf>, PackagingError> {
    let licenses_dir = dest.join(LICENSES_DIR);
    let mut copied = Vec::new();

    for pattern in patterns {
        let entries = match glob_under(source_root, pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("ignoring invalid license pattern `{}`: {}", pattern, e);
                continue;
            }
        };

        for path in entries.flatten().filter(|p| p.is_file()) {
            let relative = path.strip_prefix(source_root).unwrap_or(&path);
            let target = licenses_dir.join(relative);
            if let Some(dir) = target.parent() {
                std::fs::create_dir_all(dir).map_err(PackagingError::io("create", dir))?;
            }
            std::fs::copy(&path, &target).map_err(PackagingError::io("copy", &path))?;
            copied.push(target);
        }
    }

    if copied.is_empty() {
        tracing::warn!("no license files matched {:?}", patterns);
    }
    Ok(copied)
}

fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| pathdiff::diff_paths(e.path(), root))
        .collect();
    files.sort();
    files
}
