//! Command implementations

pub mod completions;
pub mod export;
pub mod flags;
pub mod layout;
pub mod lifecycle;
pub mod metadata;
pub mod validate;
pub mod version;

use anyhow::Result;

use crate::cli::GlobalArgs;
use quay::core::settings::Settings;
use quay::ops::Project;
use quay::util::GlobalContext;

/// Load the project the global options point at.
pub fn load_project(global: &GlobalArgs) -> Result<Project> {
    let ctx = GlobalContext::new()?.with_manifest_path(global.manifest_path.clone());
    Project::load(&ctx)
}

/// Load the project and resolve its settings from all sources.
pub fn load_with_settings(global: &GlobalArgs) -> Result<(Project, Settings)> {
    let project = load_project(global)?;
    let settings = project.settings(&global.settings)?;
    tracing::debug!("settings: {}", settings);
    Ok((project, settings))
}
