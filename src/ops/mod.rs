//! High-level operations.
//!
//! This module contains the implementation of Quay commands.

pub mod matrix;
pub mod project;
pub mod quay_create;
pub mod quay_export;

pub use matrix::{check_isolated, create_matrix, expand, prepare_matrix, Axis};
pub use project::{resolve_settings, Project};
pub use quay_create::{create, CreateOptions, CreateResult, Stage};
pub use quay_export::export_sources;
