//! Settings matrices: many independent combinations of one recipe.
//!
//! Each combination gets its own context, version resolver and backend,
//! and combinations run in parallel. Two combinations that would share a
//! build folder are refused before anything runs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use rayon::prelude::*;

use crate::builder::backend::BuildBackend;
use crate::builder::context::BuildContext;
use crate::core::settings::{PartialSettings, SettingsError, SettingsKey};
use crate::ops::project::{complete_settings, Project};
use crate::ops::quay_create::{create, CreateOptions, CreateResult};

/// One settings key and the values it takes across the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis {
    pub key: SettingsKey,
    pub values: Vec<String>,
}

impl FromStr for Axis {
    type Err = SettingsError;

    /// `key=value1,value2,...`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, values) = s
            .split_once('=')
            .ok_or_else(|| SettingsError::Malformed(s.to_string()))?;
        let values: Vec<String> = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return Err(SettingsError::Malformed(s.to_string()));
        }

        Ok(Axis {
            key: key.trim().parse()?,
            values,
        })
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.values.join(","))
    }
}

/// Cartesian product of `axes` over `base`, in axis order.
pub fn expand(base: &PartialSettings, axes: &[Axis]) -> Vec<PartialSettings> {
    axes.iter().fold(vec![base.clone()], |combos, axis| {
        combos
            .iter()
            .flat_map(|combo| {
                axis.values
                    .iter()
                    .map(move |value| combo.clone().with(axis.key, value.as_str()))
            })
            .collect()
    })
}

/// Prepare every combination in parallel. Results keep `combos` order.
pub fn prepare_matrix(project: &Project, combos: &[PartialSettings]) -> Vec<Result<BuildContext>> {
    combos
        .par_iter()
        .map(|partial| project.prepare(complete_settings(partial)?))
        .collect()
}

/// Fail if any two contexts would build into the same folder.
pub fn check_isolated(contexts: &[BuildContext]) -> Result<()> {
    let mut seen: BTreeMap<PathBuf, &BuildContext> = BTreeMap::new();
    for ctx in contexts {
        if let Some(other) = seen.insert(ctx.build_dir(), ctx) {
            bail!(
                "[{}] and [{}] share the build folder `{}`\n\
                 help: add the keys that differ to `[layout] variant-keys`",
                other.settings,
                ctx.settings,
                ctx.build_dir().display()
            );
        }
    }
    Ok(())
}

/// Run `create` for every context in parallel, each with a fresh backend.
pub fn create_matrix<B, F>(
    contexts: &[BuildContext],
    make_backend: F,
    opts: &CreateOptions,
) -> Result<Vec<Result<CreateResult>>>
where
    B: BuildBackend,
    F: Fn() -> Result<B> + Sync,
{
    check_isolated(contexts)?;
    if contexts.len() > 1 && opts.package_dir.is_some() {
        bail!("a package folder override cannot be shared by {} combinations", contexts.len());
    }

    tracing::info!("Running {} combinations", contexts.len());
    Ok(contexts
        .par_iter()
        .map(|ctx| {
            let mut backend = make_backend()?;
            create(ctx, &mut backend, opts)
        })
        .collect())
}
