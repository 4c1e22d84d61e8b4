//! Quay - a package recipe engine for C++ libraries
//!
//! This crate provides the library behind the `quay` CLI: settings
//! validation, version resolution, folder layout, compiler flag
//! selection, the build lifecycle and packaging.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use core::{
    manifest::Recipe, settings::PartialSettings, settings::Settings, version::Version,
};

pub use builder::BuildContext;
pub use util::context::GlobalContext;
