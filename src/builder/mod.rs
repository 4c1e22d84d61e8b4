//! Building and packaging one settings combination.
//!
//! This module selects compiler flags, drives the build backend through
//! the lifecycle and assembles the package.

pub mod backend;
pub mod cmake;
pub mod context;
pub mod flags;
pub mod lifecycle;
pub mod packager;

pub use backend::{can_run_binaries, BackendFailure, BuildBackend};
pub use cmake::CMakeBackend;
pub use context::BuildContext;
pub use flags::{select_flags, FlagPolicy, FlagSet};
pub use lifecycle::{BuildOrchestrator, LifecycleState, TestOutcome};
pub use packager::{package, Package};
