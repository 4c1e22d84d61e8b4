//! The build backend seam.
//!
//! A backend is whatever actually compiles and installs the sources. The
//! lifecycle only ever talks to it through [`BuildBackend`], so tests can
//! substitute a recording backend and real builds use CMake.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::builder::flags::FlagSet;
use crate::core::language::CppStandard;
use crate::core::settings::{Arch, BuildType, Os, Settings};

/// A backend step failed. `diagnostics` is the backend's own output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{diagnostics}")]
pub struct BackendFailure {
    pub diagnostics: String,
}

impl BackendFailure {
    pub fn new(diagnostics: impl Into<String>) -> Self {
        BackendFailure {
            diagnostics: diagnostics.into(),
        }
    }
}

/// Everything a backend needs to configure a build folder.
#[derive(Debug, Clone)]
pub struct ConfigureRequest<'a> {
    pub settings: &'a Settings,
    pub flags: &'a FlagSet,
    pub cppstd: CppStandard,
    pub source_dir: &'a Path,
    pub build_dir: PathBuf,
    pub generators_dir: PathBuf,
}

/// A build backend.
pub trait BuildBackend {
    /// Short name for logs.
    fn name(&self) -> &str;

    fn configure(&mut self, request: &ConfigureRequest<'_>) -> Result<(), BackendFailure>;

    fn build(&mut self, build_dir: &Path, build_type: &BuildType) -> Result<(), BackendFailure>;

    fn test(&mut self, build_dir: &Path, build_type: &BuildType) -> Result<(), BackendFailure>;

    /// Install the build outputs under `prefix`.
    fn install(
        &mut self,
        build_dir: &Path,
        build_type: &BuildType,
        prefix: &Path,
    ) -> Result<(), BackendFailure>;
}

/// Whether binaries built for `settings` can execute on this machine.
pub fn can_run_binaries(settings: &Settings) -> bool {
    can_run_on(settings, &Os::host(), &Arch::host())
}

fn can_run_on(settings: &Settings, host_os: &Os, host_arch: &Arch) -> bool {
    if settings.os() != host_os {
        return false;
    }

    // 64-bit x86 hosts run 32-bit x86 code; macOS arm64 runs x86_64 via Rosetta.
    settings.arch() == host_arch
        || (*host_arch == Arch::X86_64 && *settings.arch() == Arch::X86 && *host_os != Os::Macos)
        || (*host_os == Os::Macos && *host_arch == Arch::Armv8 && *settings.arch() == Arch::X86_64)
}
