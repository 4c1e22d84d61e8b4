//! `quay flags` command

use anyhow::Result;

use super::load_with_settings;
use crate::cli::GlobalArgs;
use quay::builder::flags::FlagRequest;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let (project, settings) = load_with_settings(global)?;
    let request = FlagRequest::new(&settings, &project.recipe.requirements.features);
    let flags = project.recipe.flag_policy().select(&request);

    if flags.is_empty() {
        tracing::info!("No extra flags for {} {}", settings.compiler(), settings.compiler_version());
    }
    for flag in flags.iter() {
        println!("{}", flag);
    }
    Ok(())
}
