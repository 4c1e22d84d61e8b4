//! Build and package folder layout.
//!
//! The folder name for a settings combination is built from the values of
//! the recipe's variant keys, in order, joined by `-`. Folder names are
//! persisted on disk between runs, so the mapping must never change.
//!
//! Recognized values (`gcc`, `apple-clang`, `Release`) use a fixed
//! lowercase spelling. Any other value is sanitized and lowercased, and if
//! that changed it at all it carries a short SHA-256 suffix of its raw
//! form. Two distinct raw values therefore never share a folder, even on a
//! case-insensitive filesystem.

use std::path::{Path, PathBuf};

use crate::core::settings::{Settings, SettingsKey};
use crate::util::hash::sha256_str;

/// Separator between variant components.
pub const SEPARATOR: char = '-';

/// Folder name shared by every combination when no variant keys are declared.
pub const DEFAULT_LAYOUT_NAME: &str = "default";

/// Length of the disambiguation suffix, in hex digits.
const SUFFIX_LEN: usize = 8;

/// The folder layout for one settings combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderLayout {
    name: String,
}

impl FolderLayout {
    /// The variant folder name, e.g. `linux-x86_64-gcc-13`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` when no variant keys were declared.
    pub fn is_shared(&self) -> bool {
        self.name == DEFAULT_LAYOUT_NAME
    }

    /// Where the backend configures and builds.
    pub fn build_folder(&self, root: &Path) -> PathBuf {
        root.join("build").join(&self.name)
    }

    /// Where generated build-system integration files go.
    pub fn generators_folder(&self, root: &Path) -> PathBuf {
        self.build_folder(root).join("generators")
    }

    /// Default package folder when none is given explicitly.
    pub fn package_folder(&self, root: &Path) -> PathBuf {
        root.join("package").join(&self.name)
    }
}

impl std::fmt::Display for FolderLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Derive the folder layout for `settings`.
///
/// Never fails. An unset optional key contributes an empty value, which is
/// itself disambiguated like any other rewritten value.
pub fn plan_layout(settings: &Settings, variant_keys: &[SettingsKey]) -> FolderLayout {
    if variant_keys.is_empty() {
        return FolderLayout {
            name: DEFAULT_LAYOUT_NAME.to_string(),
        };
    }

    let name = variant_keys
        .iter()
        .map(|key| match settings.folder_name(*key) {
            Some(fixed) => fixed.to_string(),
            None => sanitize_component(settings.get(*key).unwrap_or("")),
        })
        .collect::<Vec<_>>()
        .join(&SEPARATOR.to_string());

    FolderLayout { name }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+')
}

/// Make one value filesystem-safe without losing distinctness.
fn sanitize_component(raw: &str) -> String {
    let mut safe: String = raw
        .chars()
        .map(|c| if is_safe(c) { c.to_ascii_lowercase() } else { '_' })
        .collect();

    // A lone "." or ".." is a path component with meaning of its own.
    let rewritten = safe != raw || raw.is_empty() || raw.chars().all(|c| c == '.');
    if rewritten {
        if raw.chars().all(|c| c == '.') {
            safe = safe.replace('.', "_");
        }
        safe.push('_');
        safe.push_str(&sha256_str(raw)[..SUFFIX_LEN]);
    }

    safe
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::PartialSettings;

    fn settings(pairs: &[(SettingsKey, &str)]) -> Settings {
        let mut partial = PartialSettings::new()
            .with(SettingsKey::Os, "linux")
            .with(SettingsKey::Arch, "x86_64")
            .with(SettingsKey::Compiler, "gcc")
            .with(SettingsKey::CompilerVersion, "13")
            .with(SettingsKey::BuildType, "Release");
        for (key, value) in pairs {
            partial.set(*key, *value);
        }
        partial.complete().unwrap()
    }

    const VARIANT: [SettingsKey; 4] = [
        SettingsKey::Os,
        SettingsKey::Arch,
        SettingsKey::Compiler,
        SettingsKey::CompilerVersion,
    ];

    #[test]
    fn test_plan_layout_gcc13() {
        let layout = plan_layout(&settings(&[]), &VARIANT);
        assert_eq!(layout.name(), "linux-x86_64-gcc-13");
        assert_eq!(
            layout.build_folder(Path::new("/w")),
            PathBuf::from("/w/build/linux-x86_64-gcc-13")
        );
    }

    #[test]
    fn test_non_variant_key_shares_folder() {
        let release = plan_layout(&settings(&[]), &VARIANT);
        let debug = plan_layout(&settings(&[(SettingsKey::BuildType, "Debug")]), &VARIANT);
        assert_eq!(release, debug);
    }

    #[test]
    fn test_variant_key_splits_folder() {
        let gcc13 = plan_layout(&settings(&[]), &VARIANT);
        let gcc12 = plan_layout(&settings(&[(SettingsKey::CompilerVersion, "12")]), &VARIANT);
        assert_ne!(gcc13, gcc12);
    }

    #[test]
    fn test_empty_variant_keys_share_default() {
        let a = plan_layout(&settings(&[]), &[]);
        let b = plan_layout(&settings(&[(SettingsKey::Os, "windows")]), &[]);
        assert_eq!(a.name(), DEFAULT_LAYOUT_NAME);
        assert!(a.is_shared());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsafe_values_are_sanitized() {
        let layout = plan_layout(
            &settings(&[(SettingsKey::Compiler, "my/cc tool")]),
            &[SettingsKey::Compiler],
        );
        let name = layout.name();
        assert!(name.starts_with("my_cc_tool_"));
        assert!(name.chars().all(is_safe));
    }

    #[test]
    fn test_sanitizing_does_not_collide() {
        // "x86-64" parses to the x86_64 arch, so use an unrecognized compiler.
        let dashed = plan_layout(&settings(&[(SettingsKey::Compiler, "my-cc")]), &[SettingsKey::Compiler]);
        let underscored =
            plan_layout(&settings(&[(SettingsKey::Compiler, "my_cc")]), &[SettingsKey::Compiler]);
        assert_eq!(underscored.name(), "my_cc");
        assert_ne!(dashed, underscored);
    }

    #[test]
    fn test_dot_components_are_rewritten() {
        let layout = plan_layout(
            &settings(&[(SettingsKey::CompilerVersion, "..")]),
            &[SettingsKey::CompilerVersion],
        );
        assert_ne!(layout.name(), "..");
        assert!(!layout.name().starts_with('.'));
    }

    #[test]
    fn test_recognized_values_use_fixed_names() {
        let layout = plan_layout(
            &settings(&[
                (SettingsKey::Os, "Macos"),
                (SettingsKey::Arch, "arm64"),
                (SettingsKey::Compiler, "apple-clang"),
                (SettingsKey::CompilerVersion, "15"),
            ]),
            &VARIANT,
        );
        assert_eq!(layout.name(), "macos-armv8-apple_clang-15");

        let release = plan_layout(&settings(&[]), &[SettingsKey::BuildType]);
        assert_eq!(release.name(), "release");
    }

    #[test]
    fn test_case_variants_do_not_collide() {
        let keys = [SettingsKey::Compiler];
        let upper = plan_layout(&settings(&[(SettingsKey::Compiler, "Tcc")]), &keys);
        let lower = plan_layout(&settings(&[(SettingsKey::Compiler, "tcc")]), &keys);

        assert_eq!(lower.name(), "tcc");
        assert!(upper.name().starts_with("tcc_"));
        assert!(!upper.name().eq_ignore_ascii_case(lower.name()));
        assert!(upper.name().chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_unset_optional_key() {
        let unset = plan_layout(&settings(&[]), &[SettingsKey::CompilerCppstd]);
        let set = plan_layout(
            &settings(&[(SettingsKey::CompilerCppstd, "20")]),
            &[SettingsKey::CompilerCppstd],
        );
        assert_eq!(set.name(), "20");
        assert_ne!(unset, set);
        assert!(!unset.name().is_empty());
    }
}
