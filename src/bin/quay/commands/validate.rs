//! `quay validate` command

use anyhow::Result;

use super::load_with_settings;
use crate::cli::GlobalArgs;
use quay::core::settings::validate;
use quay::util::Diagnostic;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let (project, settings) = load_with_settings(global)?;
    let minimum = project.recipe.requirements.min_cppstd;

    let effective = validate(&settings, minimum).map_err(|e| {
        Diagnostic::from_miette(&e).with_context(format!("settings: {}", settings))
    })?;

    println!(
        "ok: {} {} uses {}, {} requires {}",
        settings.compiler(),
        settings.compiler_version(),
        effective,
        project.recipe.name(),
        minimum
    );
    Ok(())
}
