//! Implementation of `quay create` and its partial forms
//! (`configure`, `build`, `test`, `package`).

use std::path::PathBuf;

use anyhow::Result;

use crate::builder::backend::BuildBackend;
use crate::builder::context::BuildContext;
use crate::builder::lifecycle::{BuildOrchestrator, LifecycleState, TestOutcome};
use crate::builder::packager::{self, Package};
use crate::core::metadata::{ConsumerMetadata, METADATA_FILE};

/// The last lifecycle stage to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Configure,
    Build,
    Test,
    Package,
}

/// Options for the create command.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Stop once this stage has completed
    pub stop_after: Stage,

    /// Don't run tests even when the stage range includes them
    pub skip_tests: bool,

    /// Package folder override (default: the layout's package folder)
    pub package_dir: Option<PathBuf>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        CreateOptions {
            stop_after: Stage::Package,
            skip_tests: false,
            package_dir: None,
        }
    }
}

/// What a create run produced.
#[derive(Debug)]
pub struct CreateResult {
    pub state: LifecycleState,
    pub test: Option<TestOutcome>,
    pub package: Option<Package>,
    pub metadata: ConsumerMetadata,
}

/// Drive one settings combination through the lifecycle up to `opts.stop_after`.
pub fn create<B: BuildBackend + ?Sized>(
    ctx: &BuildContext,
    backend: &mut B,
    opts: &CreateOptions,
) -> Result<CreateResult> {
    let metadata = ctx.consumer_metadata();
    let mut orchestrator = BuildOrchestrator::new(ctx, &mut *backend);

    orchestrator.configure()?;
    if opts.stop_after == Stage::Configure {
        return Ok(CreateResult {
            state: orchestrator.state(),
            test: None,
            package: None,
            metadata,
        });
    }

    orchestrator.build()?;

    let test = if opts.stop_after >= Stage::Test && !opts.skip_tests {
        Some(orchestrator.test()?)
    } else {
        None
    };

    if opts.stop_after < Stage::Package {
        return Ok(CreateResult {
            state: orchestrator.state(),
            test,
            package: None,
            metadata,
        });
    }

    let output = orchestrator.finish()?;
    let package_root = opts.package_dir.clone().unwrap_or_else(|| ctx.package_dir());
    let extra = [(METADATA_FILE, metadata.to_json()?)];
    let package = packager::package(
        backend,
        &output,
        &package_root,
        ctx.license_patterns(),
        &extra,
    )?;

    Ok(CreateResult {
        state: LifecycleState::Done,
        test,
        package: Some(package),
        metadata,
    })
}
