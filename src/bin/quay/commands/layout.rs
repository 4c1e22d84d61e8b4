//! `quay layout` command

use anyhow::{Context, Result};

use super::load_project;
use crate::cli::{GlobalArgs, LayoutArgs};
use quay::core::layout::plan_layout;
use quay::ops::matrix::{expand, Axis};
use quay::ops::project::complete_settings;

pub fn execute(global: &GlobalArgs, args: LayoutArgs) -> Result<()> {
    let project = load_project(global)?;
    let axes = args
        .axis
        .iter()
        .map(|a| a.parse::<Axis>().with_context(|| format!("invalid axis `{}`", a)))
        .collect::<Result<Vec<_>>>()?;

    let base = project.partial_settings(&global.settings)?;
    let combos = expand(&base, &axes);
    let variant_keys = project.recipe.variant_keys();

    for partial in &combos {
        let settings = complete_settings(partial)?;
        let layout = plan_layout(&settings, variant_keys);

        if axes.is_empty() {
            println!("{}", layout);
            tracing::debug!("build folder: {}", layout.build_folder(&project.build_root).display());
            tracing::debug!("package folder: {}", layout.package_folder(&project.build_root).display());
        } else {
            println!("{}\t{}", layout, settings);
        }
    }

    if variant_keys.is_empty() && combos.len() > 1 {
        tracing::warn!(
            "no variant keys are declared, so all {} combinations share one folder",
            combos.len()
        );
    }
    Ok(())
}
