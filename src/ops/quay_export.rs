//! Implementation of `quay export`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::manifest::{Recipe, MANIFEST_NAME};
use crate::util::fs::{copy_file, glob_files, relative_path};

/// Copy the recipe's sources into `dest`, preserving relative paths.
///
/// The manifest itself is always exported. Patterns that match nothing
/// are not an error.
pub fn export_sources(recipe: &Recipe, source_root: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    if dest.starts_with(source_root) && dest != source_root {
        let inside = relative_path(source_root, dest);
        if recipe
            .package
            .exports_sources
            .iter()
            .any(|pattern| glob_covers(pattern, &inside))
        {
            bail!(
                "export destination `{}` is inside the exported sources",
                dest.display()
            );
        }
    }

    let mut files = glob_files(source_root, &recipe.package.exports_sources)?;
    let manifest = source_root.join(MANIFEST_NAME);
    if manifest.is_file() && !files.contains(&manifest) {
        files.push(manifest);
    }

    let mut exported = Vec::with_capacity(files.len());
    for file in files {
        let relative = relative_path(source_root, &file);
        copy_file(&file, &dest.join(&relative))?;
        exported.push(relative);
    }
    exported.sort();

    tracing::info!(
        "Exported {} files from {} to {}",
        exported.len(),
        recipe.name(),
        dest.display()
    );
    Ok(exported)
}

fn glob_covers(pattern: &str, path: &Path) -> bool {
    glob::Pattern::new(pattern)
        .map(|p| path.ancestors().any(|a| p.matches_path(a)))
        .unwrap_or(false)
}
