//! Language standards and language features.
//!
//! `CppStandard` is ordered, so a minimum-standard check is a plain
//! comparison. GNU-extension spellings (`gnu20`) parse to the same
//! ordinal as the ISO ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// C++ standard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CppStandard {
    /// C++98
    #[serde(rename = "98", alias = "c++98", alias = "gnu98")]
    Cpp98,
    /// C++11
    #[serde(rename = "11", alias = "c++11", alias = "gnu11")]
    Cpp11,
    /// C++14
    #[serde(rename = "14", alias = "c++14", alias = "gnu14")]
    Cpp14,
    /// C++17
    #[serde(rename = "17", alias = "c++17", alias = "gnu17")]
    Cpp17,
    /// C++20
    #[serde(rename = "20", alias = "c++20", alias = "gnu20")]
    Cpp20,
    /// C++23
    #[serde(rename = "23", alias = "c++23", alias = "gnu23")]
    Cpp23,
    /// C++26
    #[serde(rename = "26", alias = "c++26", alias = "gnu26")]
    Cpp26,
}

impl CppStandard {
    /// The bare ordinal, as CMake's `CMAKE_CXX_STANDARD` expects it.
    pub fn as_ordinal(&self) -> &'static str {
        match self {
            CppStandard::Cpp98 => "98",
            CppStandard::Cpp11 => "11",
            CppStandard::Cpp14 => "14",
            CppStandard::Cpp17 => "17",
            CppStandard::Cpp20 => "20",
            CppStandard::Cpp23 => "23",
            CppStandard::Cpp26 => "26",
        }
    }
}

impl FromStr for CppStandard {
    type Err = CppStandardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let ordinal = trimmed
            .strip_prefix("gnu")
            .or_else(|| trimmed.strip_prefix("c++"))
            .or_else(|| trimmed.strip_prefix("cpp"))
            .unwrap_or(trimmed);

        match ordinal {
            "98" => Ok(CppStandard::Cpp98),
            "11" => Ok(CppStandard::Cpp11),
            "14" => Ok(CppStandard::Cpp14),
            "17" => Ok(CppStandard::Cpp17),
            "20" => Ok(CppStandard::Cpp20),
            "23" => Ok(CppStandard::Cpp23),
            "26" => Ok(CppStandard::Cpp26),
            _ => Err(CppStandardParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid C++ standard string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CppStandardParseError(pub String);

impl fmt::Display for CppStandardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid C++ standard '{}', valid values: 98, 11, 14, 17, 20, 23, 26",
            self.0
        )
    }
}

impl std::error::Error for CppStandardParseError {}

impl fmt::Display for CppStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C++{}", self.as_ordinal())
    }
}

/// A language feature a package needs from the compiler beyond the
/// standard ordinal itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageFeature {
    /// C++20 coroutines. Older GCC releases gate them behind `-fcoroutines`.
    Coroutines,
}

impl LanguageFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageFeature::Coroutines => "coroutines",
        }
    }
}

impl fmt::Display for LanguageFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
