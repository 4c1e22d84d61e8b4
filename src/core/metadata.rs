//! Consumer-facing package metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::flags::FlagSet;

/// File name the metadata is written to inside a package folder.
pub const METADATA_FILE: &str = "quay-package.json";

/// How downstream CMake projects find the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CMakeIntegration {
    /// Name used in `find_package(<file_name>)`.
    pub file_name: String,
    /// Imported target, e.g. `stdexec::stdexec`.
    pub target_name: String,
}

impl CMakeIntegration {
    pub fn new(file_name: impl Into<String>, target_name: impl Into<String>) -> Self {
        CMakeIntegration {
            file_name: file_name.into(),
            target_name: target_name.into(),
        }
    }

    /// `alias` for the file name and `alias::alias` for the target.
    pub fn from_alias(alias: &str) -> Self {
        CMakeIntegration::new(alias, format!("{0}::{0}", alias))
    }
}

/// What a downstream project needs to link against the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerMetadata {
    pub libs: Vec<String>,
    pub cmake: CMakeIntegration,
    /// Must be applied by consumers too, in this order.
    pub cxxflags: FlagSet,
}

/// Describe the package for consumers. Pure; always succeeds.
pub fn emit(flags: &FlagSet, libs: &[String], cmake: CMakeIntegration) -> ConsumerMetadata {
    ConsumerMetadata {
        libs: libs.to_vec(),
        cmake,
        cxxflags: flags.clone(),
    }
}

impl ConsumerMetadata {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ConsumerMetadata {
    /// `key = value` lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "libs = {}", self.libs.join(" "))?;
        writeln!(f, "cmake_file_name = {}", self.cmake.file_name)?;
        writeln!(f, "cmake_target_name = {}", self.cmake.target_name)?;
        writeln!(f, "cxxflags = {}", self.cxxflags.to_command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_keeps_flags_verbatim() {
        let flags: FlagSet = ["-fconcepts-diagnostics-depth=10", "-fcoroutines"]
            .into_iter()
            .collect();
        let meta = emit(
            &flags,
            &["stdexec".to_string()],
            CMakeIntegration::from_alias("stdexec"),
        );

        assert_eq!(meta.cxxflags, flags);
        assert_eq!(meta.cmake.target_name, "stdexec::stdexec");

        let text = meta.to_string();
        assert!(text.contains("libs = stdexec"));
        assert!(text.contains("cxxflags = -fconcepts-diagnostics-depth=10 -fcoroutines"));
    }

    #[test]
    fn test_json_shape() {
        let meta = emit(&FlagSet::new(), &["a".into(), "b".into()], CMakeIntegration::new("ab", "ab::core"));
        let value: serde_json::Value = serde_json::from_str(&meta.to_json().unwrap()).unwrap();
        assert_eq!(value["libs"], serde_json::json!(["a", "b"]));
        assert_eq!(value["cmake"]["target_name"], "ab::core");
        assert_eq!(value["cxxflags"], serde_json::json!([]));
    }
}
