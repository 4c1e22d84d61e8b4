//! Recipe manifest (`Quay.toml`) parsing.
//!
//! The manifest declares what is being packaged and which settings the
//! package is sensitive to. Everything except `package.name` has a
//! default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::flags::{FlagPolicy, FlagRule};
use crate::core::language::{CppStandard, LanguageFeature};
use crate::core::settings::SettingsKey;
use crate::util::Diagnostic;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Quay.toml";

/// A manifest that could not be found or is semantically invalid.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{MANIFEST_NAME}` in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },

    #[error("package name cannot be empty")]
    EmptyName,

    #[error("invalid package name `{0}`: only ASCII letters, digits, `-`, `_`, `.` and `+` are allowed")]
    InvalidName(String),

    #[error("variant key `{0}` is listed more than once")]
    DuplicateVariantKey(SettingsKey),
}

/// A parsed recipe manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Recipe {
    pub package: PackageMetadata,

    #[serde(default)]
    pub requirements: Requirements,

    #[serde(default)]
    pub layout: LayoutSpec,

    #[serde(default)]
    pub consumer: ConsumerSpec,

    /// Extra flag rules layered over the built-in table.
    #[serde(default, rename = "flags", skip_serializing_if = "Vec::is_empty")]
    pub flag_rules: Vec<FlagRule>,
}

/// The `[package]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageMetadata {
    pub name: String,

    /// Literal version. When absent, the version is the source tree's commit.
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default)]
    pub homepage: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    /// Globs, relative to the source root, of files that make up the sources.
    #[serde(default = "default_exports_sources")]
    pub exports_sources: Vec<String>,
}

fn default_exports_sources() -> Vec<String> {
    vec![
        "include/**/*".to_string(),
        "src/**/*".to_string(),
        "CMakeLists.txt".to_string(),
    ]
}

/// The `[requirements]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Requirements {
    #[serde(default = "default_min_cppstd")]
    pub min_cppstd: CppStandard,

    #[serde(default = "default_features")]
    pub features: Vec<LanguageFeature>,
}

fn default_min_cppstd() -> CppStandard {
    CppStandard::Cpp20
}

fn default_features() -> Vec<LanguageFeature> {
    vec![LanguageFeature::Coroutines]
}

impl Default for Requirements {
    fn default() -> Self {
        Requirements {
            min_cppstd: default_min_cppstd(),
            features: default_features(),
        }
    }
}

/// The `[layout]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutSpec {
    /// Settings keys that must produce distinct folders, in folder-name order.
    #[serde(default)]
    pub variant_keys: Vec<SettingsKey>,
}

/// The `[consumer]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsumerSpec {
    /// Link names. Defaults to the package name.
    #[serde(default)]
    pub libs: Vec<String>,

    #[serde(default)]
    pub cmake_file_name: Option<String>,

    #[serde(default)]
    pub cmake_target_name: Option<String>,

    /// Globs, relative to the source root, copied into `licenses/`.
    #[serde(default)]
    pub license_files: Vec<String>,
}

impl Recipe {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents).map_err(|e| {
            Diagnostic::error(format!("failed to parse manifest: {:#}", e))
                .with_location(path)
                .into()
        })
    }

    /// Parse a manifest from a string.
    pub fn parse(contents: &str) -> Result<Self> {
        let recipe: Recipe = toml::from_str(contents)?;
        recipe.check()?;
        Ok(recipe)
    }

    fn check(&self) -> Result<(), ManifestError> {
        let name = self.package.name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyName);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
        {
            return Err(ManifestError::InvalidName(name.to_string()));
        }

        let keys = &self.layout.variant_keys;
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(ManifestError::DuplicateVariantKey(*key));
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.package.name
    }

    pub fn explicit_version(&self) -> Option<&str> {
        self.package.version.as_deref()
    }

    pub fn variant_keys(&self) -> &[SettingsKey] {
        &self.layout.variant_keys
    }

    /// Link names consumers should use.
    pub fn libs(&self) -> Vec<String> {
        if self.consumer.libs.is_empty() {
            vec![self.package.name.clone()]
        } else {
            self.consumer.libs.clone()
        }
    }

    pub fn cmake_file_name(&self) -> String {
        self.consumer
            .cmake_file_name
            .clone()
            .unwrap_or_else(|| self.package.name.clone())
    }

    pub fn cmake_target_name(&self) -> String {
        self.consumer
            .cmake_target_name
            .clone()
            .unwrap_or_else(|| format!("{0}::{0}", self.package.name))
    }

    pub fn license_patterns(&self) -> Vec<String> {
        if self.consumer.license_files.is_empty() {
            vec!["LICENSE*".to_string()]
        } else {
            self.consumer.license_files.clone()
        }
    }

    /// Built-in flag table with this recipe's rules layered on top.
    pub fn flag_policy(&self) -> FlagPolicy {
        FlagPolicy::builtin().with_rules(self.flag_rules.iter().cloned())
    }
}

/// Find the manifest by walking up from `start`.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::CompilerFamily;

    const STDEXEC: &str = r#"
[package]
name = "stdexec"
description = "std::execution"
license = "Apache-2.0"
topics = ["WG21", "concurrency"]

[requirements]
min-cppstd = "20"

[layout]
variant-keys = ["os", "arch", "compiler", "compiler.version"]

[consumer]
cmake-target-name = "stdexec::stdexec"

[[flags]]
compiler = "gcc"
os = "linux"
flags = ["-fcoroutines"]
"#;

    #[test]
    fn test_parse_full_manifest() {
        let recipe = Recipe::parse(STDEXEC).unwrap();
        assert_eq!(recipe.name(), "stdexec");
        assert_eq!(recipe.explicit_version(), None);
        assert_eq!(recipe.requirements.min_cppstd, CppStandard::Cpp20);
        assert_eq!(recipe.requirements.features, vec![LanguageFeature::Coroutines]);
        assert_eq!(
            recipe.variant_keys(),
            &[
                SettingsKey::Os,
                SettingsKey::Arch,
                SettingsKey::Compiler,
                SettingsKey::CompilerVersion
            ]
        );
        assert_eq!(recipe.flag_rules.len(), 1);
        assert_eq!(recipe.flag_rules[0].compiler, CompilerFamily::Gcc);
    }

    #[test]
    fn test_defaults() {
        let recipe = Recipe::parse("[package]\nname = \"zlib\"\nversion = \"1.3.1\"\n").unwrap();
        assert_eq!(recipe.explicit_version(), Some("1.3.1"));
        assert_eq!(recipe.libs(), vec!["zlib".to_string()]);
        assert_eq!(recipe.cmake_file_name(), "zlib");
        assert_eq!(recipe.cmake_target_name(), "zlib::zlib");
        assert_eq!(recipe.license_patterns(), vec!["LICENSE*".to_string()]);
        assert!(recipe.variant_keys().is_empty());
        assert_eq!(recipe.requirements, Requirements::default());
        assert!(recipe.package.exports_sources.contains(&"CMakeLists.txt".to_string()));
    }

    #[test]
    fn test_rejects_bad_manifests() {
        assert!(Recipe::parse("[package]\nname = \"\"\n").is_err());
        assert!(Recipe::parse("[package]\nname = \"a b\"\n").is_err());
        assert!(Recipe::parse(
            "[package]\nname = \"x\"\n[layout]\nvariant-keys = [\"os\", \"os\"]\n"
        )
        .is_err());
        assert!(Recipe::parse(
            "[package]\nname = \"x\"\n[layout]\nvariant-keys = [\"compiler.versoin\"]\n"
        )
        .is_err());
    }

    #[test]
    fn test_load_error_points_at_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, "[package]\nname = \"std exec\"\n").unwrap();

        let message = Recipe::load(&path).unwrap_err().to_string();
        assert!(message.starts_with("failed to parse manifest: invalid package name `std exec`"));
        assert!(message.contains(&format!("--> {}", path.display())));
    }

    #[test]
    fn test_find_manifest_walks_up() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "[package]\nname = \"x\"\n").unwrap();
        let nested = tmp.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_manifest(&nested), Some(tmp.path().join(MANIFEST_NAME)));
    }
}
