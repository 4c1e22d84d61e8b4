//! Loading a recipe project and resolving its settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::context::{BuildContext, PrepareError};
use crate::core::manifest::Recipe;
use crate::core::settings::{PartialSettings, Settings, SettingsError};
use crate::util::diagnostic::suggestions;
use crate::util::{Config, Diagnostic, GlobalContext};

/// A recipe together with where it lives and the configuration around it.
#[derive(Debug, Clone)]
pub struct Project {
    pub recipe: Recipe,
    pub manifest_path: PathBuf,
    pub source_root: PathBuf,
    pub build_root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Find and load the manifest for `ctx`, along with merged config.
    pub fn load(ctx: &GlobalContext) -> Result<Self> {
        let manifest_path = ctx.find_manifest().map_err(|e| {
            Diagnostic::error(e.to_string()).with_suggestion(suggestions::NO_MANIFEST)
        })?;
        let recipe = Recipe::load(&manifest_path)?;
        let source_root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ctx.cwd().to_path_buf());

        let config = ctx.config();
        let build_root = match &config.build.build_root {
            Some(root) => source_root.join(root),
            None => source_root.clone(),
        };

        tracing::debug!(
            "loaded {} from {}",
            recipe.name(),
            manifest_path.display()
        );

        Ok(Project {
            recipe,
            manifest_path,
            source_root,
            build_root,
            config,
        })
    }

    /// Settings for this project: host defaults, then config, then `assignments`.
    pub fn settings(&self, assignments: &[String]) -> Result<Settings> {
        resolve_settings(&self.config.settings, assignments)
    }

    /// Like [`Project::settings`], leaving unset keys unset.
    pub fn partial_settings(&self, assignments: &[String]) -> Result<PartialSettings> {
        layer_settings(&self.config.settings, assignments)
    }

    /// Validate `settings` and compute the build context.
    pub fn prepare(&self, settings: Settings) -> Result<BuildContext> {
        BuildContext::prepare(&self.recipe, settings, &self.source_root, &self.build_root)
            .map_err(prepare_error)
    }
}

/// Layer settings sources, lowest precedence first, and complete them.
pub fn resolve_settings(profile: &PartialSettings, assignments: &[String]) -> Result<Settings> {
    complete_settings(&layer_settings(profile, assignments)?)
}

/// Host defaults, overlaid with `profile`, overlaid with `key=value` assignments.
pub fn layer_settings(profile: &PartialSettings, assignments: &[String]) -> Result<PartialSettings> {
    let mut partial = PartialSettings::host();
    partial.merge(profile);
    for assignment in assignments {
        partial
            .apply(assignment)
            .with_context(|| format!("invalid setting `{}`", assignment))?;
    }
    Ok(partial)
}

/// Complete `partial`, pointing at how to supply a missing key.
pub fn complete_settings(partial: &PartialSettings) -> Result<Settings> {
    partial.complete().map_err(|e| match e {
        SettingsError::Missing(_) => {
            Diagnostic::error(e.to_string()).with_suggestion(suggestions::MISSING_SETTING).into()
        }
        other => anyhow::Error::new(other),
    })
}

/// Turn a preparation failure into a CLI-friendly error.
pub fn prepare_error(err: PrepareError) -> anyhow::Error {
    match err {
        PrepareError::Validation(v) => Diagnostic::from_miette(&v).into(),
        other => anyhow::Error::new(other),
    }
}
