//! Core data structures for Quay.
//!
//! This module contains the foundational types used throughout Quay:
//! - Settings and the language standards they imply
//! - The recipe manifest
//! - Version resolution and folder layout
//! - Consumer metadata

pub mod language;
pub mod layout;
pub mod manifest;
pub mod metadata;
pub mod settings;
pub mod version;

pub use language::{CppStandard, LanguageFeature};
pub use layout::{plan_layout, FolderLayout};
pub use manifest::{find_manifest, ManifestError, Recipe, MANIFEST_NAME};
pub use metadata::{CMakeIntegration, ConsumerMetadata};
pub use settings::{validate, PartialSettings, Settings, SettingsKey, ValidationError};
pub use version::{Version, VersionResolver};
