//! Build context: the facts fixed for one settings combination.
//!
//! A context is computed once, before any backend runs, and never changes
//! afterwards. Every later stage reads from it.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builder::backend::{can_run_binaries, ConfigureRequest};
use crate::builder::flags::{FlagRequest, FlagSet};
use crate::core::language::CppStandard;
use crate::core::layout::{plan_layout, FolderLayout};
use crate::core::manifest::Recipe;
use crate::core::metadata::{self, CMakeIntegration, ConsumerMetadata};
use crate::core::settings::{validate, Settings, ValidationError};
use crate::core::version::{Version, VersionError, VersionResolver};

/// Failure computing a build context. Nothing has been built yet.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Immutable per-combination build facts.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Package name
    pub name: String,

    /// The settings combination being built
    pub settings: Settings,

    /// Resolved package version
    pub version: Version,

    /// Effective C++ standard, already checked against the minimum
    pub cppstd: CppStandard,

    /// Folder layout for this combination
    pub layout: FolderLayout,

    /// Extra compiler flags for this combination
    pub flags: FlagSet,

    /// Root of the package sources
    pub source_root: PathBuf,

    /// Root under which `build/` and `package/` folders are created
    pub build_root: PathBuf,

    /// Whether produced binaries can run here
    pub can_run: bool,

    libs: Vec<String>,
    cmake: CMakeIntegration,
    license_patterns: Vec<String>,
}

impl BuildContext {
    /// Validate the settings and compute version, layout and flags.
    ///
    /// Validation runs first, so an unsupported combination never touches
    /// the source tree.
    pub fn prepare(
        recipe: &Recipe,
        settings: Settings,
        source_root: &Path,
        build_root: &Path,
    ) -> Result<Self, PrepareError> {
        let cppstd = validate(&settings, recipe.requirements.min_cppstd)?;
        let version = VersionResolver::new().resolve(recipe.explicit_version(), source_root)?;
        let layout = plan_layout(&settings, recipe.variant_keys());
        let flags = recipe
            .flag_policy()
            .select(&FlagRequest::new(&settings, &recipe.requirements.features));
        let can_run = can_run_binaries(&settings);

        tracing::debug!(
            "prepared {} {} for [{}] in layout `{}`",
            recipe.name(),
            version,
            settings,
            layout
        );

        Ok(BuildContext {
            name: recipe.name().to_string(),
            settings,
            version,
            cppstd,
            layout,
            flags,
            source_root: source_root.to_path_buf(),
            build_root: build_root.to_path_buf(),
            can_run,
            libs: recipe.libs(),
            cmake: CMakeIntegration::new(recipe.cmake_file_name(), recipe.cmake_target_name()),
            license_patterns: recipe.license_patterns(),
        })
    }

    /// Override host detection for whether test binaries can run.
    pub fn with_can_run(mut self, can_run: bool) -> Self {
        self.can_run = can_run;
        self
    }

    pub fn build_dir(&self) -> PathBuf {
        self.layout.build_folder(&self.build_root)
    }

    pub fn generators_dir(&self) -> PathBuf {
        self.layout.generators_folder(&self.build_root)
    }

    /// Default package folder for this combination.
    pub fn package_dir(&self) -> PathBuf {
        self.layout.package_folder(&self.build_root)
    }

    pub fn license_patterns(&self) -> &[String] {
        &self.license_patterns
    }

    pub fn configure_request(&self) -> ConfigureRequest<'_> {
        ConfigureRequest {
            settings: &self.settings,
            flags: &self.flags,
            cppstd: self.cppstd,
            source_dir: &self.source_root,
            build_dir: self.build_dir(),
            generators_dir: self.generators_dir(),
        }
    }

    /// Consumer metadata for this combination.
    pub fn consumer_metadata(&self) -> ConsumerMetadata {
        metadata::emit(&self.flags, &self.libs, self.cmake.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::flags::{COROUTINES, GCC_CONCEPTS_DIAGNOSTICS};
    use crate::core::settings::{PartialSettings, SettingsKey};
    use tempfile::TempDir;

    const RECIPE: &str = r#"
[package]
name = "stdexec"
version = "0.11.0"

[layout]
variant-keys = ["os", "arch", "compiler", "compiler.version"]
"#;

    fn gcc13(cppstd: &str) -> Settings {
        PartialSettings::new()
            .with(SettingsKey::Os, "linux")
            .with(SettingsKey::Arch, "x86_64")
            .with(SettingsKey::Compiler, "gcc")
            .with(SettingsKey::CompilerVersion, "13")
            .with(SettingsKey::BuildType, "Release")
            .with(SettingsKey::CompilerCppstd, cppstd)
            .complete()
            .unwrap()
    }

    #[test]
    fn test_prepare_gcc13() {
        let tmp = TempDir::new().unwrap();
        let recipe = Recipe::parse(RECIPE).unwrap();
        let ctx = BuildContext::prepare(&recipe, gcc13("20"), tmp.path(), tmp.path()).unwrap();

        assert_eq!(ctx.layout.name(), "linux-x86_64-gcc-13");
        assert_eq!(ctx.version, Version::Literal("0.11.0".to_string()));
        assert_eq!(ctx.cppstd, CppStandard::Cpp20);
        assert!(ctx.flags.contains(GCC_CONCEPTS_DIAGNOSTICS));
        assert!(ctx.flags.contains(COROUTINES));
        assert_eq!(ctx.build_dir(), tmp.path().join("build/linux-x86_64-gcc-13"));

        let meta = ctx.consumer_metadata();
        assert_eq!(meta.libs, vec!["stdexec".to_string()]);
        assert_eq!(meta.cxxflags, ctx.flags);
    }

    #[test]
    fn test_validation_runs_before_version() {
        let tmp = TempDir::new().unwrap();
        // No version and no repository: only validation should be reported.
        let recipe = Recipe::parse("[package]\nname = \"stdexec\"\n").unwrap();
        let err = BuildContext::prepare(&recipe, gcc13("17"), tmp.path(), tmp.path()).unwrap_err();
        assert!(matches!(err, PrepareError::Validation(_)));

        let err = BuildContext::prepare(&recipe, gcc13("20"), tmp.path(), tmp.path()).unwrap_err();
        assert!(matches!(err, PrepareError::Version(_)));
    }
}
