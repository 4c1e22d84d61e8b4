//! The settings model: a typed description of the target environment.
//!
//! A recipe is authored against [`PartialSettings`], where any key may be
//! unset. Before a build starts the partial map is completed into a
//! [`Settings`], which always carries the five required keys.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use miette::Diagnostic as MietteDiagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::language::CppStandard;

/// A recognized settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SettingsKey {
    #[serde(rename = "os")]
    Os,
    #[serde(rename = "arch")]
    Arch,
    #[serde(rename = "compiler")]
    Compiler,
    #[serde(rename = "compiler.version")]
    CompilerVersion,
    #[serde(rename = "build_type")]
    BuildType,
    /// Optional sub-setting: the language standard the build compiles with.
    #[serde(rename = "compiler.cppstd")]
    CompilerCppstd,
}

impl SettingsKey {
    /// Keys that must be present for any concrete build.
    pub const REQUIRED: [SettingsKey; 5] = [
        SettingsKey::Os,
        SettingsKey::Arch,
        SettingsKey::Compiler,
        SettingsKey::CompilerVersion,
        SettingsKey::BuildType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsKey::Os => "os",
            SettingsKey::Arch => "arch",
            SettingsKey::Compiler => "compiler",
            SettingsKey::CompilerVersion => "compiler.version",
            SettingsKey::BuildType => "build_type",
            SettingsKey::CompilerCppstd => "compiler.cppstd",
        }
    }
}

impl FromStr for SettingsKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "os" => Ok(SettingsKey::Os),
            "arch" => Ok(SettingsKey::Arch),
            "compiler" => Ok(SettingsKey::Compiler),
            "compiler.version" => Ok(SettingsKey::CompilerVersion),
            "build_type" => Ok(SettingsKey::BuildType),
            "compiler.cppstd" => Ok(SettingsKey::CompilerCppstd),
            other => Err(SettingsError::UnknownKey(other.to_string())),
        }
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target operating system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Os {
    Linux,
    Windows,
    Macos,
    FreeBsd,
    Android,
    Ios,
    /// Any value outside the recognized set, kept verbatim.
    Other(String),
}

impl Os {
    pub fn as_str(&self) -> &str {
        match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::Macos => "macos",
            Os::FreeBsd => "freebsd",
            Os::Android => "android",
            Os::Ios => "ios",
            Os::Other(s) => s,
        }
    }

    /// Folder spelling of a recognized value.
    pub fn folder_name(&self) -> Option<&'static str> {
        match self {
            Os::Other(_) => None,
            Os::Linux => Some("linux"),
            Os::Windows => Some("windows"),
            Os::Macos => Some("macos"),
            Os::FreeBsd => Some("freebsd"),
            Os::Android => Some("android"),
            Os::Ios => Some("ios"),
        }
    }

    /// The operating system this process is running on.
    pub fn host() -> Self {
        Os::from(std::env::consts::OS)
    }
}

impl From<&str> for Os {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            "macos" | "darwin" | "osx" => Os::Macos,
            "freebsd" => Os::FreeBsd,
            "android" => Os::Android,
            "ios" => Os::Ios,
            _ => Os::Other(s.to_string()),
        }
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Arch {
    X86,
    X86_64,
    Armv7,
    Armv8,
    Wasm,
    Other(String),
}

impl Arch {
    pub fn as_str(&self) -> &str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Armv7 => "armv7",
            Arch::Armv8 => "armv8",
            Arch::Wasm => "wasm",
            Arch::Other(s) => s,
        }
    }

    /// Folder spelling of a recognized value.
    pub fn folder_name(&self) -> Option<&'static str> {
        match self {
            Arch::Other(_) => None,
            Arch::X86 => Some("x86"),
            Arch::X86_64 => Some("x86_64"),
            Arch::Armv7 => Some("armv7"),
            Arch::Armv8 => Some("armv8"),
            Arch::Wasm => Some("wasm"),
        }
    }

    pub fn host() -> Self {
        Arch::from(std::env::consts::ARCH)
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i686" | "i386" => Arch::X86,
            "x86_64" | "x86-64" | "amd64" => Arch::X86_64,
            "armv7" | "arm" => Arch::Armv7,
            "armv8" | "aarch64" | "arm64" => Arch::Armv8,
            "wasm" | "wasm32" => Arch::Wasm,
            _ => Arch::Other(s.to_string()),
        }
    }
}

/// Compiler family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompilerFamily {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
    IntelCc,
    Other(String),
}

impl CompilerFamily {
    pub fn as_str(&self) -> &str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang => "clang",
            CompilerFamily::AppleClang => "apple-clang",
            CompilerFamily::Msvc => "msvc",
            CompilerFamily::IntelCc => "intel-cc",
            CompilerFamily::Other(s) => s,
        }
    }

    /// Folder spelling of a recognized value. Uses `_` where the
    /// canonical name has `-`, which is the layout separator.
    pub fn folder_name(&self) -> Option<&'static str> {
        match self {
            CompilerFamily::Other(_) => None,
            CompilerFamily::Gcc => Some("gcc"),
            CompilerFamily::Clang => Some("clang"),
            CompilerFamily::AppleClang => Some("apple_clang"),
            CompilerFamily::Msvc => Some("msvc"),
            CompilerFamily::IntelCc => Some("intel_cc"),
        }
    }
}

impl From<&str> for CompilerFamily {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "gcc" | "gnu" => CompilerFamily::Gcc,
            "clang" | "llvm" => CompilerFamily::Clang,
            "apple-clang" | "appleclang" | "apple_clang" => CompilerFamily::AppleClang,
            "msvc" | "visual studio" => CompilerFamily::Msvc,
            "intel-cc" | "intel_cc" | "icx" => CompilerFamily::IntelCc,
            _ => CompilerFamily::Other(s.to_string()),
        }
    }
}

/// Build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildType {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
    Other(String),
}

impl BuildType {
    /// The CMake configuration name.
    pub fn as_str(&self) -> &str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
            BuildType::Other(s) => s,
        }
    }

    /// Folder spelling of a recognized value.
    pub fn folder_name(&self) -> Option<&'static str> {
        match self {
            BuildType::Other(_) => None,
            BuildType::Debug => Some("debug"),
            BuildType::Release => Some("release"),
            BuildType::RelWithDebInfo => Some("relwithdebinfo"),
            BuildType::MinSizeRel => Some("minsizerel"),
        }
    }
}

impl From<&str> for BuildType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" => BuildType::Debug,
            "release" => BuildType::Release,
            "relwithdebinfo" => BuildType::RelWithDebInfo,
            "minsizerel" => BuildType::MinSizeRel,
            _ => BuildType::Other(s.to_string()),
        }
    }
}

macro_rules! string_setting {
    ($($ty:ident),*) => {
        $(
            impl From<String> for $ty {
                fn from(s: String) -> Self {
                    $ty::from(s.as_str())
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.as_str().to_string()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

string_setting!(Os, Arch, CompilerFamily, BuildType);

/// Errors raised while assembling settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("setting `{0}` is not set")]
    Missing(SettingsKey),

    #[error("unknown setting `{0}`, valid settings: os, arch, compiler, compiler.version, build_type, compiler.cppstd")]
    UnknownKey(String),

    #[error("invalid setting `{0}`, expected `key=value`")]
    Malformed(String),
}

/// Settings where any key may still be unset.
///
/// Used while authoring recipes and for config-file profiles. Unset keys
/// are wildcards until [`PartialSettings::complete`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialSettings {
    values: BTreeMap<SettingsKey, String>,
}

impl PartialSettings {
    pub fn new() -> Self {
        PartialSettings::default()
    }

    /// Defaults taken from the machine we are running on.
    pub fn host() -> Self {
        let mut settings = PartialSettings::new();
        settings.set(SettingsKey::Os, Os::host().as_str());
        settings.set(SettingsKey::Arch, Arch::host().as_str());
        settings.set(SettingsKey::BuildType, BuildType::Release.as_str());
        settings
    }

    pub fn set(&mut self, key: SettingsKey, value: impl Into<String>) -> &mut Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn with(mut self, key: SettingsKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: SettingsKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Parse and apply a `key=value` assignment.
    pub fn apply(&mut self, assignment: &str) -> Result<&mut Self, SettingsError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| SettingsError::Malformed(assignment.to_string()))?;
        let key: SettingsKey = key.trim().parse()?;
        Ok(self.set(key, value.trim()))
    }

    /// Overlay `other` onto this map; values in `other` win.
    pub fn merge(&mut self, other: &PartialSettings) {
        for (key, value) in &other.values {
            self.values.insert(*key, value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolve into concrete settings, failing on the first unset required key.
    pub fn complete(&self) -> Result<Settings, SettingsError> {
        let require = |key: SettingsKey| self.get(key).ok_or(SettingsError::Missing(key));

        Ok(Settings {
            os: Os::from(require(SettingsKey::Os)?),
            arch: Arch::from(require(SettingsKey::Arch)?),
            compiler: CompilerFamily::from(require(SettingsKey::Compiler)?),
            compiler_version: require(SettingsKey::CompilerVersion)?.to_string(),
            build_type: BuildType::from(require(SettingsKey::BuildType)?),
            cppstd: self.get(SettingsKey::CompilerCppstd).map(str::to_string),
        })
    }
}

/// One concrete settings combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Settings {
    os: Os,
    arch: Arch,
    compiler: CompilerFamily,
    compiler_version: String,
    build_type: BuildType,
    cppstd: Option<String>,
}

impl Settings {
    pub fn os(&self) -> &Os {
        &self.os
    }

    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    pub fn compiler(&self) -> &CompilerFamily {
        &self.compiler
    }

    pub fn compiler_version(&self) -> &str {
        &self.compiler_version
    }

    pub fn build_type(&self) -> &BuildType {
        &self.build_type
    }

    /// The explicitly configured language standard, if any.
    pub fn cppstd(&self) -> Option<&str> {
        self.cppstd.as_deref()
    }

    /// Look up a value by key. Only `compiler.cppstd` can be absent.
    pub fn get(&self, key: SettingsKey) -> Option<&str> {
        match key {
            SettingsKey::Os => Some(self.os.as_str()),
            SettingsKey::Arch => Some(self.arch.as_str()),
            SettingsKey::Compiler => Some(self.compiler.as_str()),
            SettingsKey::CompilerVersion => Some(&self.compiler_version),
            SettingsKey::BuildType => Some(self.build_type.as_str()),
            SettingsKey::CompilerCppstd => self.cppstd.as_deref(),
        }
    }

    /// Fixed folder spelling for `key` when its value is a recognized one.
    /// Free-form values (versions, standards, unrecognized names) give `None`.
    pub fn folder_name(&self, key: SettingsKey) -> Option<&'static str> {
        match key {
            SettingsKey::Os => self.os.folder_name(),
            SettingsKey::Arch => self.arch.folder_name(),
            SettingsKey::Compiler => self.compiler.folder_name(),
            SettingsKey::BuildType => self.build_type.folder_name(),
            SettingsKey::CompilerVersion | SettingsKey::CompilerCppstd => None,
        }
    }

    /// Leading numeric component of the compiler version ("13.2" -> 13).
    pub fn compiler_major(&self) -> Option<u32> {
        self.compiler_version
            .split(['.', '-'])
            .next()
            .and_then(|major| major.trim().parse().ok())
    }

    /// The standard the compiler will actually use.
    ///
    /// An explicit `compiler.cppstd` wins; otherwise this is the
    /// compiler's own default for its version. `Ok(None)` means the
    /// compiler and version are not known well enough to tell.
    pub fn effective_standard(&self) -> Result<Option<CppStandard>, ValidationError> {
        if let Some(raw) = &self.cppstd {
            return raw
                .parse::<CppStandard>()
                .map(Some)
                .map_err(|_| ValidationError::UnknownStandard { value: raw.clone() });
        }

        Ok(self.default_standard())
    }

    fn default_standard(&self) -> Option<CppStandard> {
        let major = self.compiler_major()?;
        match self.compiler {
            CompilerFamily::Gcc => match major {
                11.. => Some(CppStandard::Cpp17),
                6..=10 => Some(CppStandard::Cpp14),
                _ => None,
            },
            CompilerFamily::Clang => match major {
                16.. => Some(CppStandard::Cpp17),
                6..=15 => Some(CppStandard::Cpp14),
                _ => None,
            },
            CompilerFamily::AppleClang => match major {
                17.. => Some(CppStandard::Cpp17),
                _ => Some(CppStandard::Cpp14),
            },
            CompilerFamily::Msvc => match major {
                190.. => Some(CppStandard::Cpp14),
                _ => None,
            },
            CompilerFamily::IntelCc | CompilerFamily::Other(_) => None,
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "os={} arch={} compiler={} compiler.version={} build_type={}",
            self.os, self.arch, self.compiler, self.compiler_version, self.build_type
        )?;
        if let Some(cppstd) = &self.cppstd {
            write!(f, " compiler.cppstd={}", cppstd)?;
        }
        Ok(())
    }
}

/// A settings combination that cannot build this package.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ValidationError {
    #[error("current cppstd ({effective}) is lower than the required {required}")]
    #[diagnostic(
        code(quay::validate::unsupported_standard),
        help("raise the standard with `-s compiler.cppstd=<std>`")
    )]
    UnsupportedStandard {
        required: CppStandard,
        effective: CppStandard,
    },

    #[error("cannot determine the default cppstd of {compiler} {version}")]
    #[diagnostic(
        code(quay::validate::unknown_default),
        help("set the standard explicitly with `-s compiler.cppstd=...`")
    )]
    NoEffectiveStandard { compiler: String, version: String },

    #[error("invalid compiler.cppstd value `{value}`")]
    #[diagnostic(code(quay::validate::invalid_standard))]
    UnknownStandard { value: String },
}

/// Check that `settings` can build a package needing `minimum`.
///
/// Returns the effective standard on success. Never touches the settings.
pub fn validate(settings: &Settings, minimum: CppStandard) -> Result<CppStandard, ValidationError> {
    let effective = settings.effective_standard()?.ok_or_else(|| {
        ValidationError::NoEffectiveStandard {
            compiler: settings.compiler().to_string(),
            version: settings.compiler_version().to_string(),
        }
    })?;

    if effective < minimum {
        return Err(ValidationError::UnsupportedStandard {
            required: minimum,
            effective,
        });
    }

    tracing::debug!("cppstd {} satisfies minimum {}", effective, minimum);
    Ok(effective)
}
