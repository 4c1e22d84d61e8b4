//! `quay export` command

use anyhow::Result;

use super::load_project;
use crate::cli::{ExportArgs, GlobalArgs};
use quay::ops::export_sources;

pub fn execute(global: &GlobalArgs, args: ExportArgs) -> Result<()> {
    let project = load_project(global)?;
    let dest = args.dest.unwrap_or_else(|| {
        project
            .build_root
            .join("export")
            .join(project.recipe.name())
    });

    let files = export_sources(&project.recipe, &project.source_root, &dest)?;
    println!("exported {} files to {}", files.len(), dest.display());
    Ok(())
}
