//! `quay configure`, `build`, `test`, `package` and `create` commands
//!
//! Each command runs the lifecycle from the start up to its own stage.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use super::load_project;
use crate::cli::{BackendArgs, CreateArgs, GlobalArgs, PackageArgs};
use quay::builder::lifecycle::TestOutcome;
use quay::builder::{BuildContext, CMakeBackend};
use quay::ops::matrix::{create_matrix, expand, prepare_matrix, Axis};
use quay::ops::{CreateOptions, CreateResult, Stage};
use quay::util::diagnostic::suggestions;

pub fn configure(global: &GlobalArgs, args: BackendArgs) -> Result<()> {
    run(global, &args, &[], stage(Stage::Configure, true, None))
}

pub fn build(global: &GlobalArgs, args: BackendArgs) -> Result<()> {
    run(global, &args, &[], stage(Stage::Build, true, None))
}

pub fn test(global: &GlobalArgs, args: BackendArgs) -> Result<()> {
    run(global, &args, &[], stage(Stage::Test, false, None))
}

pub fn package(global: &GlobalArgs, args: PackageArgs) -> Result<()> {
    run(global, &args.backend, &[], stage(Stage::Package, true, args.output))
}

pub fn create(global: &GlobalArgs, args: CreateArgs) -> Result<()> {
    let opts = stage(Stage::Package, args.skip_tests, args.output);
    run(global, &args.backend, &args.axis, opts)
}

fn stage(stop_after: Stage, skip_tests: bool, package_dir: Option<PathBuf>) -> CreateOptions {
    CreateOptions {
        stop_after,
        skip_tests,
        package_dir,
    }
}

fn run(
    global: &GlobalArgs,
    backend: &BackendArgs,
    axes: &[String],
    opts: CreateOptions,
) -> Result<()> {
    let project = load_project(global)?;
    let axes = axes
        .iter()
        .map(|a| a.parse::<Axis>().with_context(|| format!("invalid axis `{}`", a)))
        .collect::<Result<Vec<_>>>()?;

    let combos = expand(&project.partial_settings(&global.settings)?, &axes);
    let contexts = prepare_matrix(&project, &combos)
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let generator = backend.generator.clone().or_else(|| project.config.build.generator.clone());
    let jobs = backend.jobs.or(project.config.build.jobs);
    let make_backend = || -> Result<CMakeBackend> {
        Ok(CMakeBackend::detect()?.generator(generator.clone()).jobs(jobs))
    };

    let results = create_matrix(&contexts, make_backend, &opts)?;

    let mut failures = 0;
    for (ctx, result) in contexts.iter().zip(results) {
        match result {
            Ok(result) => report(ctx, &result),
            Err(e) if contexts.len() == 1 => return Err(e),
            Err(e) => {
                failures += 1;
                eprintln!("error: [{}] {:#}", ctx.layout, e);
            }
        }
    }

    if failures > 0 {
        bail!(
            "{} of {} combinations failed\nhelp: {}",
            failures,
            contexts.len(),
            suggestions::BACKEND_FAILED
        );
    }
    Ok(())
}

fn report(ctx: &BuildContext, result: &CreateResult) {
    let id = format!("{}/{} ({})", ctx.name, ctx.version, ctx.layout);

    if let Some(TestOutcome::Skipped { reason }) = &result.test {
        println!("{}: tests skipped: {}", id, reason);
    }

    match &result.package {
        Some(package) => println!(
            "{}: packaged {} files into {}",
            id,
            package.files().len(),
            package.root().display()
        ),
        None => println!("{}: {}", id, result.state),
    }
}
