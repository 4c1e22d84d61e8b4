//! Compiler flag selection.
//!
//! Flags come from an explicit rule table. Every rule names a compiler
//! family and may additionally require a target OS and a language
//! feature. For a given request, the matching rule with the most
//! qualifiers wins and its flags are used as-is; flags from other
//! matching rules are never merged in. Ties go to the rule declared
//! last, so rules appended from a manifest override the built-ins.
//!
//! Compilers with no matching rule get an empty flag set.

use serde::{Deserialize, Serialize};

use crate::core::language::LanguageFeature;
use crate::core::settings::{CompilerFamily, Os, Settings};

/// Makes MSVC report the real `__cplusplus` value.
pub const MSVC_CPLUSPLUS: &str = "/Zc:__cplusplus";
/// Selects MSVC's standards-conforming preprocessor.
pub const MSVC_PREPROCESSOR: &str = "/Zc:preprocessor";
/// Deeper concept-failure diagnostics in GCC.
pub const GCC_CONCEPTS_DIAGNOSTICS: &str = "-fconcepts-diagnostics-depth=10";
/// Enables coroutine support.
pub const COROUTINES: &str = "-fcoroutines";

/// An ordered list of compiler flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
    pub fn new() -> Self {
        FlagSet::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.iter().any(|f| f == flag)
    }

    /// Space-joined, as a single `CXXFLAGS`-style string.
    pub fn to_command_line(&self) -> String {
        self.0.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for FlagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FlagSet(iter.into_iter().map(Into::into).collect())
    }
}

/// What the flags are being selected for.
#[derive(Debug, Clone, Copy)]
pub struct FlagRequest<'a> {
    pub compiler: &'a CompilerFamily,
    pub os: &'a Os,
    pub features: &'a [LanguageFeature],
}

impl<'a> FlagRequest<'a> {
    pub fn new(settings: &'a Settings, features: &'a [LanguageFeature]) -> Self {
        FlagRequest {
            compiler: settings.compiler(),
            os: settings.os(),
            features,
        }
    }
}

/// One row of the flag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagRule {
    pub compiler: CompilerFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<LanguageFeature>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl FlagRule {
    pub fn new(compiler: CompilerFamily, flags: &[&str]) -> Self {
        FlagRule {
            compiler,
            os: None,
            requires: None,
            flags: flags.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn on_os(mut self, os: Os) -> Self {
        self.os = Some(os);
        self
    }

    pub fn requiring(mut self, feature: LanguageFeature) -> Self {
        self.requires = Some(feature);
        self
    }

    fn matches(&self, request: &FlagRequest<'_>) -> bool {
        self.compiler == *request.compiler
            && self.os.as_ref().map_or(true, |os| os == request.os)
            && self
                .requires
                .map_or(true, |feature| request.features.contains(&feature))
    }

    fn specificity(&self) -> u8 {
        1 + u8::from(self.os.is_some()) + u8::from(self.requires.is_some())
    }
}

/// An ordered flag table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagPolicy {
    rules: Vec<FlagRule>,
}

impl Default for FlagPolicy {
    fn default() -> Self {
        FlagPolicy::builtin()
    }
}

impl FlagPolicy {
    /// A table with no rules; every request maps to the empty set.
    pub fn empty() -> Self {
        FlagPolicy { rules: Vec::new() }
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        FlagPolicy {
            rules: vec![
                FlagRule::new(CompilerFamily::Msvc, &[MSVC_CPLUSPLUS, MSVC_PREPROCESSOR]),
                FlagRule::new(CompilerFamily::Gcc, &[GCC_CONCEPTS_DIAGNOSTICS]),
                FlagRule::new(CompilerFamily::Gcc, &[GCC_CONCEPTS_DIAGNOSTICS, COROUTINES])
                    .requiring(LanguageFeature::Coroutines),
                FlagRule::new(CompilerFamily::Clang, &[COROUTINES]),
                FlagRule::new(CompilerFamily::AppleClang, &[COROUTINES]),
            ],
        }
    }

    /// Append rules that take precedence over equally specific existing ones.
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = FlagRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// The rule that applies to `request`, if any.
    pub fn best_match(&self, request: &FlagRequest<'_>) -> Option<&FlagRule> {
        // `max_by_key` keeps the last of equal maxima.
        self.rules
            .iter()
            .filter(|rule| rule.matches(request))
            .max_by_key(|rule| rule.specificity())
    }

    /// Select flags for `request`. Total: unknown compilers get an empty set.
    pub fn select(&self, request: &FlagRequest<'_>) -> FlagSet {
        match self.best_match(request) {
            Some(rule) => {
                tracing::debug!(
                    "flag rule for {} selected: {:?}",
                    request.compiler,
                    rule.flags
                );
                rule.flags.iter().cloned().collect()
            }
            None => {
                tracing::debug!("no flag rule for {}, using no extra flags", request.compiler);
                FlagSet::new()
            }
        }
    }
}

/// Select flags from the built-in table.
pub fn select_flags(settings: &Settings, features: &[LanguageFeature]) -> FlagSet {
    FlagPolicy::builtin().select(&FlagRequest::new(settings, features))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(
        compiler: &'a CompilerFamily,
        os: &'a Os,
        features: &'a [LanguageFeature],
    ) -> FlagRequest<'a> {
        FlagRequest {
            compiler,
            os,
            features,
        }
    }

    const CORO: &[LanguageFeature] = &[LanguageFeature::Coroutines];

    #[test]
    fn test_msvc_conformance_flags() {
        let flags = FlagPolicy::builtin().select(&request(&CompilerFamily::Msvc, &Os::Windows, CORO));
        assert_eq!(flags.as_slice(), [MSVC_CPLUSPLUS, MSVC_PREPROCESSOR]);
    }

    #[test]
    fn test_gcc_with_coroutines() {
        let flags = FlagPolicy::builtin().select(&request(&CompilerFamily::Gcc, &Os::Linux, CORO));
        assert_eq!(flags.as_slice(), [GCC_CONCEPTS_DIAGNOSTICS, COROUTINES]);
    }

    #[test]
    fn test_gcc_without_coroutines() {
        let flags = FlagPolicy::builtin().select(&request(&CompilerFamily::Gcc, &Os::Linux, &[]));
        assert_eq!(flags.as_slice(), [GCC_CONCEPTS_DIAGNOSTICS]);
    }

    #[test]
    fn test_clang_families() {
        for compiler in [CompilerFamily::Clang, CompilerFamily::AppleClang] {
            let flags = FlagPolicy::builtin().select(&request(&compiler, &Os::Macos, CORO));
            assert_eq!(flags.as_slice(), [COROUTINES]);
        }
    }

    #[test]
    fn test_unknown_compiler_is_empty() {
        for name in ["tcc", "", "intel-cc", "sdcc"] {
            let compiler = CompilerFamily::from(name);
            let flags = FlagPolicy::builtin().select(&request(&compiler, &Os::Linux, CORO));
            assert!(flags.is_empty(), "{name} should have no flags");
        }
    }

    #[test]
    fn test_most_specific_rule_wins_without_merge() {
        let policy = FlagPolicy::builtin().with_rules([FlagRule::new(
            CompilerFamily::Clang,
            &["-fms-compatibility"],
        )
        .on_os(Os::Windows)]);

        let windows = policy.select(&request(&CompilerFamily::Clang, &Os::Windows, CORO));
        assert_eq!(windows.as_slice(), ["-fms-compatibility"]);

        let linux = policy.select(&request(&CompilerFamily::Clang, &Os::Linux, CORO));
        assert_eq!(linux.as_slice(), [COROUTINES]);
    }

    #[test]
    fn test_later_rule_wins_tie() {
        let policy = FlagPolicy::builtin()
            .with_rules([FlagRule::new(CompilerFamily::Clang, &["-fcoroutines-ts"])]);
        let flags = policy.select(&request(&CompilerFamily::Clang, &Os::Linux, &[]));
        assert_eq!(flags.as_slice(), ["-fcoroutines-ts"]);
    }

    #[test]
    fn test_empty_policy() {
        let flags = FlagPolicy::empty().select(&request(&CompilerFamily::Gcc, &Os::Linux, CORO));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_rule_from_toml() {
        let rule: FlagRule = toml::from_str(
            r#"
            compiler = "gcc"
            os = "linux"
            requires = "coroutines"
            flags = ["-fcoroutines", "-Wno-interference-size"]
            "#,
        )
        .unwrap();
        assert_eq!(rule.compiler, CompilerFamily::Gcc);
        assert_eq!(rule.os, Some(Os::Linux));
        assert_eq!(rule.requires, Some(LanguageFeature::Coroutines));
        assert_eq!(rule.specificity(), 3);
    }
}
