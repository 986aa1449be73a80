//! User-friendly diagnostic messages.
//!
//! Every fatal error carries a precise description and, where one exists, a
//! suggested fix. Model errors are typed so callers and tests can match on
//! the exact failure.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a component cannot be located.
    pub const COMPONENT_NOT_FOUND: &str =
        "help: Add the directory containing the component with `--source-search <dir>`";

    /// Suggestion when an API file cannot be located.
    pub const API_NOT_FOUND: &str =
        "help: Add the directory containing the .api file with `--interface-search <dir>`";

    /// Suggestion when the external executor is missing.
    pub const NINJA_NOT_FOUND: &str =
        "help: Install ninja or set the NINJA environment variable to its location";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  - {}\n", ctx));
        }

        for suggestion in &self.suggestions {
            output.push_str(&format!("  {}\n", suggestion));
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// A component could not be located on the source search path.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("couldn't find component `{component}`")]
#[diagnostic(
    code(slipway::config::component_not_found),
    help("Add the directory containing the component with `--source-search <dir>`")
)]
pub struct ComponentNotFoundError {
    pub component: String,
    pub searched: Vec<PathBuf>,
}

/// An API file could not be located on the interface search path.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("couldn't find API file `{api}` referenced by `{referrer}`")]
#[diagnostic(
    code(slipway::config::api_not_found),
    help("Add the directory containing the .api file with `--interface-search <dir>`")
)]
pub struct ApiFileNotFoundError {
    pub api: String,
    pub referrer: String,
}

/// A second API file object was created for an already-registered path.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("API file object already exists for `{path}`")]
#[diagnostic(code(slipway::model::duplicate_api))]
pub struct DuplicateApiFileError {
    pub path: PathBuf,
}

/// Two interfaces in one component share an internal name.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("duplicate interface name `{name}` in component `{component}`")]
#[diagnostic(
    code(slipway::model::duplicate_interface),
    help("Rename one of the interfaces; internal names must be unique within a component")
)]
pub struct DuplicateInterfaceError {
    pub component: String,
    pub name: String,
}

/// The API include relation contains a cycle.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("API file type inclusion cycle involving `{path}`")]
#[diagnostic(
    code(slipway::model::api_include_cycle),
    help("Break the cycle by moving the shared types into a third .api file")
)]
pub struct ApiIncludeCycleError {
    pub path: PathBuf,
}

/// A component or interface name is not a valid C identifier.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("invalid name `{name}`: must be a C identifier")]
#[diagnostic(code(slipway::model::invalid_name))]
pub struct InvalidNameError {
    pub name: String,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("couldn't find component `sensorMgr`")
            .with_context("searched: /work/components")
            .with_suggestion(suggestions::COMPONENT_NOT_FOUND);

        let output = diag.format(false);
        assert!(output.contains("error: couldn't find component"));
        assert!(output.contains("searched: /work/components"));
        assert!(output.contains("--source-search"));
    }

    #[test]
    fn test_typed_errors_downcast() {
        let err: anyhow::Error = DuplicateInterfaceError {
            component: "sensorMgr".to_string(),
            name: "dataSvc".to_string(),
        }
        .into();

        assert!(err.downcast_ref::<DuplicateInterfaceError>().is_some());
        assert!(err.to_string().contains("dataSvc"));
    }
}
