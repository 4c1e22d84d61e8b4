//! User-facing error messages with fix suggestions.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;

/// Common suggestion messages.
pub mod suggestions {
    /// No manifest was found.
    pub const NO_MANIFEST: &str =
        "Create a `Quay.toml` with a `[package]` table, or pass `--manifest-path`";

    /// A required setting was not given anywhere.
    pub const MISSING_SETTING: &str =
        "Pass it with `-s key=value` or add it to `[settings]` in `.quay/config.toml`";

    /// The backend reported a failure.
    pub const BACKEND_FAILED: &str = "Run again with `--verbose` to see each backend command";
}

/// An error message with optional context and suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Build from a `miette` diagnostic, carrying its help text over.
    pub fn from_miette(err: &dyn MietteDiagnostic) -> Self {
        let mut diag = Diagnostic::error(err.to_string());
        if let Some(code) = err.code() {
            diag = diag.with_context(format!("[{}]", code));
        }
        if let Some(help) = err.help() {
            diag = diag.with_suggestion(help.to_string());
        }
        diag
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(path) = &self.location {
            write!(f, "\n  --> {}", path.display())?;
        }
        for line in &self.context {
            write!(f, "\n  {}", line)?;
        }
        for suggestion in &self.suggestions {
            write!(f, "\nhelp: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
