//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Create `path` and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

/// Write `contents` to `path`, creating parent directories first.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Copy `src` to `dst`, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Files under `base` matching any of `patterns`, sorted and deduplicated.
///
/// Patterns are relative to `base`. Directories are skipped, and a pattern
/// that matches nothing contributes nothing.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let matches =
            glob_under(base, pattern).with_context(|| format!("invalid glob pattern: {}", pattern))?;

        for entry in matches {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping unreadable path: {}", e),
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Expand `pattern` relative to `base`.
///
/// `base` is matched literally, so a root like `proj[1]` is not read as a
/// character class.
pub fn glob_under(base: &Path, pattern: &str) -> Result<glob::Paths, glob::PatternError> {
    let literal = glob::Pattern::escape(&base.to_string_lossy());
    glob::glob(&Path::new(&literal).join(pattern).to_string_lossy())
}

/// `path` relative to `base`, or `path` unchanged if no relative form exists.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files_skips_dirs_and_dedups() {
        let tmp = TempDir::new().unwrap();
        let include = tmp.path().join("include/stdexec");
        fs::create_dir_all(&include).unwrap();
        fs::write(include.join("execution.hpp"), "#pragma once").unwrap();
        fs::write(tmp.path().join("CMakeLists.txt"), "project(x)").unwrap();

        let files = glob_files(
            tmp.path(),
            &[
                "include/**/*".to_string(),
                "include/stdexec/*.hpp".to_string(),
                "CMakeLists.txt".to_string(),
                "missing/*".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(
            files,
            vec![
                tmp.path().join("CMakeLists.txt"),
                include.join("execution.hpp"),
            ]
        );
    }

    #[test]
    fn test_glob_files_under_bracketed_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj[1]");
        fs::create_dir_all(root.join("include")).unwrap();
        fs::write(root.join("include/a.hpp"), "#pragma once").unwrap();
        fs::write(root.join("CMakeLists.txt"), "project(x)").unwrap();

        let files = glob_files(
            &root,
            &["include/**/*".to_string(), "CMakeLists.txt".to_string()],
        )
        .unwrap();

        assert_eq!(
            files,
            vec![root.join("CMakeLists.txt"), root.join("include/a.hpp")]
        );
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.txt");
        fs::write(&src, "content").unwrap();
        let dst = tmp.path().join("out/nested/a.txt");

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst).unwrap(), "content");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/src"), Path::new("/src/include/a.hpp")),
            PathBuf::from("include/a.hpp")
        );
    }
}
