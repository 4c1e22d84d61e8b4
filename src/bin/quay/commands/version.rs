//! `quay version` command

use anyhow::Result;

use super::load_project;
use crate::cli::GlobalArgs;
use quay::core::version::resolve;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let version = resolve(project.recipe.explicit_version(), &project.source_root)?;

    println!("{}", version);
    Ok(())
}
