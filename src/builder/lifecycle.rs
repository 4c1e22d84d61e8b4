//! The build lifecycle state machine.
//!
//! ```text
//! Unconfigured -> Configured -> Built -> (Tested) -> Done
//!        \             \          \         \
//!         `-------------`----------`---------`--> Failed
//! ```
//!
//! Steps run strictly in order and are never retried. A backend failure
//! moves the lifecycle to `Failed`, after which every step is refused.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::builder::backend::{BackendFailure, BuildBackend};
use crate::builder::context::BuildContext;
use crate::core::settings::BuildType;

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconfigured,
    Configured,
    Built,
    Tested,
    Done,
    Failed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Unconfigured => "unconfigured",
            LifecycleState::Configured => "configured",
            LifecycleState::Built => "built",
            LifecycleState::Tested => "tested",
            LifecycleState::Done => "done",
            LifecycleState::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error driving the lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration failed:\n{0}")]
    Configuration(#[source] BackendFailure),

    #[error("build failed:\n{0}")]
    Build(#[source] BackendFailure),

    #[error("tests failed:\n{0}")]
    Test(#[source] BackendFailure),

    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: LifecycleState,
    },
}

/// Result of the optional test step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// Not run. This is not a failure.
    Skipped { reason: String },
}

/// Proof of a successful build, required to package.
///
/// Only the orchestrator can create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltOutput {
    build_dir: PathBuf,
    build_type: BuildType,
    source_root: PathBuf,
}

impl BuiltOutput {
    pub fn build_dir(&self) -> &std::path::Path {
        &self.build_dir
    }

    pub fn build_type(&self) -> &BuildType {
        &self.build_type
    }

    pub fn source_root(&self) -> &std::path::Path {
        &self.source_root
    }
}

/// Drives one settings combination through the backend.
pub struct BuildOrchestrator<'a, B: BuildBackend + ?Sized> {
    ctx: &'a BuildContext,
    backend: &'a mut B,
    state: LifecycleState,
}

impl<'a, B: BuildBackend + ?Sized> BuildOrchestrator<'a, B> {
    pub fn new(ctx: &'a BuildContext, backend: &'a mut B) -> Self {
        BuildOrchestrator {
            ctx,
            backend,
            state: LifecycleState::Unconfigured,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn require(&self, operation: &'static str, allowed: &[LifecycleState]) -> Result<(), LifecycleError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!("{}: {} -> {}", self.ctx.name, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: LifecycleError) -> LifecycleError {
        self.transition(LifecycleState::Failed);
        err
    }

    /// Configure the build folder.
    pub fn configure(&mut self) -> Result<(), LifecycleError> {
        self.require("configure", &[LifecycleState::Unconfigured])?;
        tracing::info!(
            "Configuring {} {} ({}) with {}",
            self.ctx.name,
            self.ctx.version,
            self.ctx.layout,
            self.backend.name()
        );

        let ctx = self.ctx;
        let request = ctx.configure_request();
        match self.backend.configure(&request) {
            Ok(()) => {
                self.transition(LifecycleState::Configured);
                Ok(())
            }
            Err(failure) => Err(self.fail(LifecycleError::Configuration(failure))),
        }
    }

    /// Build. Only valid once configured.
    pub fn build(&mut self) -> Result<(), LifecycleError> {
        self.require("build", &[LifecycleState::Configured])?;
        tracing::info!("Building {} ({})", self.ctx.name, self.ctx.settings.build_type());

        match self
            .backend
            .build(&self.ctx.build_dir(), self.ctx.settings.build_type())
        {
            Ok(()) => {
                self.transition(LifecycleState::Built);
                Ok(())
            }
            Err(failure) => Err(self.fail(LifecycleError::Build(failure))),
        }
    }

    /// Run the tests, or skip them when the binaries cannot run here.
    ///
    /// A skip leaves the lifecycle in `Built`.
    pub fn test(&mut self) -> Result<TestOutcome, LifecycleError> {
        self.require("test", &[LifecycleState::Built])?;

        if !self.ctx.can_run {
            let reason = format!(
                "binaries for {}/{} cannot run on this machine",
                self.ctx.settings.os(),
                self.ctx.settings.arch()
            );
            tracing::info!("Skipping tests: {}", reason);
            return Ok(TestOutcome::Skipped { reason });
        }

        tracing::info!("Testing {}", self.ctx.name);
        match self
            .backend
            .test(&self.ctx.build_dir(), self.ctx.settings.build_type())
        {
            Ok(()) => {
                self.transition(LifecycleState::Tested);
                Ok(TestOutcome::Passed)
            }
            Err(failure) => Err(self.fail(LifecycleError::Test(failure))),
        }
    }

    /// Finish the lifecycle and hand out the build output.
    pub fn finish(mut self) -> Result<BuiltOutput, LifecycleError> {
        self.require("finish", &[LifecycleState::Built, LifecycleState::Tested])?;
        self.transition(LifecycleState::Done);

        Ok(BuiltOutput {
            build_dir: self.ctx.build_dir(),
            build_type: self.ctx.settings.build_type().clone(),
            source_root: self.ctx.source_root.clone(),
        })
    }

    /// Configure, build and optionally test in one go.
    pub fn run(mut self, run_tests: bool) -> Result<(BuiltOutput, Option<TestOutcome>), LifecycleError> {
        self.configure()?;
        self.build()?;
        let outcome = if run_tests { Some(self.test()?) } else { None };
        Ok((self.finish()?, outcome))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::builder::backend::ConfigureRequest;
    use crate::core::manifest::Recipe;
    use crate::core::settings::{PartialSettings, SettingsKey};
    use std::path::Path;
    use tempfile::TempDir;

    /// Records every call; fails the step named in `fail_on`.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingBackend {
        pub calls: Vec<&'static str>,
        pub fail_on: Option<&'static str>,
        pub configured_flags: Vec<String>,
    }

    impl RecordingBackend {
        pub(crate) fn failing(step: &'static str) -> Self {
            RecordingBackend {
                fail_on: Some(step),
                ..Default::default()
            }
        }

        fn step(&mut self, name: &'static str) -> Result<(), BackendFailure> {
            self.calls.push(name);
            if self.fail_on == Some(name) {
                Err(BackendFailure::new(format!("{name}: exit status 2\nerror: boom")))
            } else {
                Ok(())
            }
        }
    }

    impl BuildBackend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        fn configure(&mut self, request: &ConfigureRequest<'_>) -> Result<(), BackendFailure> {
            self.configured_flags = request.flags.as_slice().to_vec();
            self.step("configure")
        }

        fn build(&mut self, _: &Path, _: &BuildType) -> Result<(), BackendFailure> {
            self.step("build")
        }

        fn test(&mut self, _: &Path, _: &BuildType) -> Result<(), BackendFailure> {
            self.step("test")
        }

        fn install(&mut self, _: &Path, _: &BuildType, prefix: &Path) -> Result<(), BackendFailure> {
            self.step("install")?;
            let lib = prefix.join("lib");
            std::fs::create_dir_all(&lib).map_err(|e| BackendFailure::new(e.to_string()))?;
            std::fs::write(lib.join("libstdexec.a"), b"!<arch>\n")
                .map_err(|e| BackendFailure::new(e.to_string()))?;
            Ok(())
        }
    }

    pub(crate) fn context(root: &Path) -> BuildContext {
        let recipe = Recipe::parse(
            "[package]\nname = \"stdexec\"\nversion = \"0.11.0\"\n[layout]\nvariant-keys = [\"os\", \"compiler\"]\n",
        )
        .unwrap();
        let settings = PartialSettings::new()
            .with(SettingsKey::Os, "linux")
            .with(SettingsKey::Arch, "x86_64")
            .with(SettingsKey::Compiler, "gcc")
            .with(SettingsKey::CompilerVersion, "13")
            .with(SettingsKey::BuildType, "Release")
            .with(SettingsKey::CompilerCppstd, "20")
            .complete()
            .unwrap();
        BuildContext::prepare(&recipe, settings, root, root)
            .unwrap()
            .with_can_run(true)
    }

    #[test]
    fn test_full_run() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut backend = RecordingBackend::default();

        let (output, outcome) = BuildOrchestrator::new(&ctx, &mut backend).run(true).unwrap();
        assert_eq!(outcome, Some(TestOutcome::Passed));
        assert_eq!(output.build_dir(), ctx.build_dir());
        assert_eq!(backend.calls, vec!["configure", "build", "test"]);
        assert_eq!(backend.configured_flags, ctx.flags.as_slice());
    }

    #[test]
    fn test_configure_failure_blocks_build() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut backend = RecordingBackend::failing("configure");

        let mut orchestrator = BuildOrchestrator::new(&ctx, &mut backend);
        let err = orchestrator.configure().unwrap_err();
        assert!(matches!(err, LifecycleError::Configuration(_)));
        assert!(err.to_string().contains("error: boom"));
        assert_eq!(orchestrator.state(), LifecycleState::Failed);

        let err = orchestrator.build().unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                operation: "build",
                state: LifecycleState::Failed
            }
        ));
        assert_eq!(orchestrator.state(), LifecycleState::Failed);
        drop(orchestrator);
        assert_eq!(backend.calls, vec!["configure"]);
    }

    #[test]
    fn test_build_requires_configure() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut backend = RecordingBackend::default();

        let mut orchestrator = BuildOrchestrator::new(&ctx, &mut backend);
        assert!(orchestrator.build().is_err());
        assert_eq!(orchestrator.state(), LifecycleState::Unconfigured);
        assert!(orchestrator.test().is_err());
    }

    #[test]
    fn test_build_failure() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut backend = RecordingBackend::failing("build");

        let err = BuildOrchestrator::new(&ctx, &mut backend).run(true).unwrap_err();
        assert!(matches!(err, LifecycleError::Build(_)));
        assert_eq!(backend.calls, vec!["configure", "build"]);
    }

    #[test]
    fn test_skip_tests_when_cannot_run() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path()).with_can_run(false);
        let mut backend = RecordingBackend::default();

        let mut orchestrator = BuildOrchestrator::new(&ctx, &mut backend);
        orchestrator.configure().unwrap();
        orchestrator.build().unwrap();
        let outcome = orchestrator.test().unwrap();
        assert!(matches!(outcome, TestOutcome::Skipped { .. }));
        assert_eq!(orchestrator.state(), LifecycleState::Built);
        assert!(orchestrator.finish().is_ok());
        assert_eq!(backend.calls, vec!["configure", "build"]);
    }

    #[test]
    fn test_failed_tests_fail_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut backend = RecordingBackend::failing("test");

        let mut orchestrator = BuildOrchestrator::new(&ctx, &mut backend);
        orchestrator.configure().unwrap();
        orchestrator.build().unwrap();
        assert!(matches!(orchestrator.test(), Err(LifecycleError::Test(_))));
        assert_eq!(orchestrator.state(), LifecycleState::Failed);
        assert!(orchestrator.finish().is_err());
    }

    #[test]
    fn test_finish_requires_build() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(tmp.path());
        let mut backend = RecordingBackend::default();

        let mut orchestrator = BuildOrchestrator::new(&ctx, &mut backend);
        orchestrator.configure().unwrap();
        assert!(matches!(
            orchestrator.finish(),
            Err(LifecycleError::InvalidTransition { operation: "finish", .. })
        ));
    }
}
