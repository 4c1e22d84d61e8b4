//! CMake build backend.

use std::path::{Path, PathBuf};

use crate::builder::backend::{BackendFailure, BuildBackend, ConfigureRequest};
use crate::core::settings::BuildType;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cmake, find_ctest, ProcessBuilder};

/// Drives `cmake` and `ctest`.
#[derive(Debug, Clone)]
pub struct CMakeBackend {
    cmake: PathBuf,
    ctest: Option<PathBuf>,
    generator: Option<String>,
    jobs: Option<usize>,
}

impl CMakeBackend {
    /// Locate CMake on `PATH`.
    pub fn detect() -> Result<Self, BackendFailure> {
        let cmake = find_cmake().ok_or_else(|| {
            BackendFailure::new(
                "CMake not found\n\
                 \n\
                 CMake is required to build packages.\n\
                 Install CMake and ensure it's in your PATH.",
            )
        })?;
        Ok(CMakeBackend::new(cmake).with_ctest(find_ctest()))
    }

    pub fn new(cmake: PathBuf) -> Self {
        CMakeBackend {
            cmake,
            ctest: None,
            generator: None,
            jobs: None,
        }
    }

    pub fn with_ctest(mut self, ctest: Option<PathBuf>) -> Self {
        self.ctest = ctest;
        self
    }

    /// Set the CMake generator (e.g. "Ninja").
    pub fn generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    /// Number of parallel build jobs.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// The configure command for `request`, without running it.
    ///
    /// `CMAKE_CXX_FLAGS` is always passed, even when empty, so a reused
    /// build folder never keeps flags cached by an earlier configure.
    pub fn configure_command(&self, request: &ConfigureRequest<'_>) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("-S")
            .arg(request.source_dir)
            .arg("-B")
            .arg(&request.build_dir);

        if let Some(generator) = &self.generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        cmd.arg(format!("-DCMAKE_BUILD_TYPE={}", request.settings.build_type()))
            .arg(format!("-DCMAKE_CXX_STANDARD={}", request.cppstd.as_ordinal()))
            .arg("-DCMAKE_CXX_STANDARD_REQUIRED=ON")
            .arg(format!("-DCMAKE_PREFIX_PATH={}", request.generators_dir.display()))
            .arg(format!("-DCMAKE_CXX_FLAGS={}", request.flags.to_command_line()))
    }

    pub fn build_command(&self, build_dir: &Path, build_type: &BuildType) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.cmake)
            .arg("--build")
            .arg(build_dir)
            // Multi-config generators (Visual Studio, Xcode) select here
            .arg("--config")
            .arg(build_type.as_str())
            .arg("--parallel");

        if let Some(jobs) = self.jobs {
            cmd = cmd.arg(jobs.to_string());
        }
        cmd
    }

    pub fn install_command(&self, build_dir: &Path, build_type: &BuildType, prefix: &Path) -> ProcessBuilder {
        ProcessBuilder::new(&self.cmake)
            .arg("--install")
            .arg(build_dir)
            .arg("--config")
            .arg(build_type.as_str())
            .arg("--prefix")
            .arg(prefix)
    }
}

/// Run `cmd` and turn a non-zero exit into a failure carrying its output.
fn run(cmd: ProcessBuilder) -> Result<(), BackendFailure> {
    tracing::debug!("running `{}`", cmd.display_command());

    let output = cmd
        .exec()
        .map_err(|e| BackendFailure::new(format!("{:#}", e)))?;

    if output.status.success() {
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut diagnostics = String::new();
    if !stdout.trim().is_empty() {
        diagnostics.push_str(&stdout);
    }
    diagnostics.push_str(&stderr);
    Err(BackendFailure::new(diagnostics))
}

impl BuildBackend for CMakeBackend {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&mut self, request: &ConfigureRequest<'_>) -> Result<(), BackendFailure> {
        ensure_dir(&request.build_dir).map_err(|e| BackendFailure::new(format!("{:#}", e)))?;
        ensure_dir(&request.generators_dir).map_err(|e| BackendFailure::new(format!("{:#}", e)))?;
        run(self.configure_command(request))
    }

    fn build(&mut self, build_dir: &Path, build_type: &BuildType) -> Result<(), BackendFailure> {
        run(self.build_command(build_dir, build_type))
    }

    fn test(&mut self, build_dir: &Path, build_type: &BuildType) -> Result<(), BackendFailure> {
        let ctest = self.ctest.as_ref().ok_or_else(|| {
            BackendFailure::new("ctest not found; install CMake's ctest or skip tests")
        })?;

        run(ProcessBuilder::new(ctest)
            .arg("--test-dir")
            .arg(build_dir)
            .args(["--build-config", build_type.as_str(), "--output-on-failure"]))
    }

    fn install(&mut self, build_dir: &Path, build_type: &BuildType, prefix: &Path) -> Result<(), BackendFailure> {
        run(self.install_command(build_dir, build_type, prefix))
    }
}
