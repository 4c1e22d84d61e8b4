//! Package version resolution.
//!
//! A recipe either pins a literal version or leaves it unset, in which
//! case the version is the commit checked out in the source tree.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

use git2::Repository;
use thiserror::Error;

/// A resolved package version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// Fixed in the recipe.
    Literal(String),
    /// Full hex id of the commit the source tree is at.
    Revision(String),
}

impl Version {
    pub fn as_str(&self) -> &str {
        match self {
            Version::Literal(v) | Version::Revision(v) => v,
        }
    }

    pub fn is_revision(&self) -> bool {
        matches!(self, Version::Revision(_))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error resolving a version.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("no version was given and `{}` has no resolvable revision history", source_root.display())]
    NoVersionControlState {
        source_root: PathBuf,
        #[source]
        cause: Option<git2::Error>,
    },
}

/// Resolve a version without caching.
///
/// A non-blank `explicit` version is returned unchanged and the source
/// tree is never inspected.
pub fn resolve(explicit: Option<&str>, source_root: &Path) -> Result<Version, VersionError> {
    if let Some(version) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(Version::Literal(version.to_string()));
    }

    head_commit(source_root).map(Version::Revision)
}

/// Id of the commit `HEAD` points at in the repository containing `source_root`.
pub fn head_commit(source_root: &Path) -> Result<String, VersionError> {
    let no_state = |cause: Option<git2::Error>| VersionError::NoVersionControlState {
        source_root: source_root.to_path_buf(),
        cause,
    };

    let repo = Repository::discover(source_root).map_err(|e| no_state(Some(e)))?;
    let head = repo.head().map_err(|e| no_state(Some(e)))?;
    let commit = head.peel_to_commit().map_err(|e| no_state(Some(e)))?;

    tracing::debug!(
        "resolved {} to commit {}",
        source_root.display(),
        commit.id()
    );
    Ok(commit.id().to_string())
}

/// Caches the first successful resolution for the rest of one lifecycle.
///
/// One resolver belongs to one settings combination and is not `Sync`.
/// Parallel combinations each hold their own.
#[derive(Debug, Default)]
pub struct VersionResolver {
    resolved: OnceCell<Version>,
}

impl VersionResolver {
    pub fn new() -> Self {
        VersionResolver::default()
    }

    pub fn resolve(
        &self,
        explicit: Option<&str>,
        source_root: &Path,
    ) -> Result<Version, VersionError> {
        if let Some(version) = self.resolved.get() {
            return Ok(version.clone());
        }

        let version = resolve(explicit, source_root)?;
        tracing::info!("Resolved version {}", version);
        Ok(self.resolved.get_or_init(|| version).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
        let sig = git2::Signature::now("Quay Test", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_explicit_version_wins() {
        let tmp = TempDir::new().unwrap();
        // No repository at all: the explicit version must not need one.
        let version = resolve(Some("1.2.3"), tmp.path()).unwrap();
        assert_eq!(version, Version::Literal("1.2.3".to_string()));
    }

    #[test]
    fn test_no_history_fails() {
        let tmp = TempDir::new().unwrap();
        let err = resolve(None, tmp.path()).unwrap_err();
        assert!(matches!(err, VersionError::NoVersionControlState { .. }));
    }

    #[test]
    fn test_blank_explicit_falls_back() {
        let tmp = TempDir::new().unwrap();
        assert!(resolve(Some("  "), tmp.path()).is_err());
    }

    #[test]
    fn test_empty_repository_fails() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        assert!(matches!(
            resolve(None, tmp.path()),
            Err(VersionError::NoVersionControlState { .. })
        ));
    }

    #[test]
    fn test_revision_from_head() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("CMakeLists.txt"), "project(x)").unwrap();
        let oid = commit_all(&repo, "initial");

        let version = resolve(None, tmp.path()).unwrap();
        assert_eq!(version, Version::Revision(oid.to_string()));
        assert!(version.is_revision());
    }

    #[test]
    fn test_resolver_caches_first_result() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let first = commit_all(&repo, "first");

        let resolver = VersionResolver::new();
        let v1 = resolver.resolve(None, tmp.path()).unwrap();

        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();
        commit_all(&repo, "second");

        let v2 = resolver.resolve(None, tmp.path()).unwrap();
        assert_eq!(v1, v2);
        assert_eq!(v2.as_str(), first.to_string());
    }
}
