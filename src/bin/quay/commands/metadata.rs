//! `quay metadata` command

use anyhow::Result;

use super::load_with_settings;
use crate::cli::{GlobalArgs, MetadataArgs};
use quay::builder::flags::FlagRequest;
use quay::core::metadata::{emit, CMakeIntegration};

pub fn execute(global: &GlobalArgs, args: MetadataArgs) -> Result<()> {
    let (project, settings) = load_with_settings(global)?;
    let recipe = &project.recipe;

    let flags = recipe
        .flag_policy()
        .select(&FlagRequest::new(&settings, &recipe.requirements.features));
    let metadata = emit(
        &flags,
        &recipe.libs(),
        CMakeIntegration::new(recipe.cmake_file_name(), recipe.cmake_target_name()),
    );

    if args.json {
        println!("{}", metadata.to_json()?);
    } else {
        print!("{}", metadata);
    }
    Ok(())
}
