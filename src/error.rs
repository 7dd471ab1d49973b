//! Error types for stylesheet processing
//!
//! Every failure that aborts a processing run is a variant of [`ProcessError`].
//! Syntax errors in `var()` references are always fatal; diagnostics only
//! become errors when the policy says so.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::css::tree::Position;
use crate::custom_properties::policy::Category;

/// The declaration a failure or diagnostic points at
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceLocation {
    pub property: String,
    pub position: Option<Position>,
}

impl SourceLocation {
    pub fn new(property: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            property: property.into(),
            position,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} ({})", position, self.property),
            None => write!(f, "({})", self.property),
        }
    }
}

/// Main error type for stylesheet processing
#[derive(Error, Debug)]
pub enum ProcessError {
    /// `var()` with nothing but whitespace inside
    #[error("{location}: var() must contain a non-whitespace string")]
    EmptyReference { location: SourceLocation },

    /// `var(` without a matching closing parenthesis
    #[error("{location}: Unclosed bracket in '{value}'")]
    UnclosedBracket { value: String, location: SourceLocation },

    /// `var()` whose first argument is not a custom property name
    #[error("{location}: var() expects a custom property name, found '{argument}'")]
    InvalidReference { argument: String, location: SourceLocation },

    /// A diagnostic the policy configured as an error
    #[error("{location}: {message}")]
    Diagnostic {
        category: Category,
        message: String,
        location: SourceLocation,
    },

    /// Strict mode rejected a resolved value
    #[error("{location}: resolved value '{value}' is not a well-formed CSS value")]
    MalformedValue { value: String, location: SourceLocation },

    /// The CSS parser produced a tree with syntax errors
    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Tree-sitter language setup errors
    #[error("Failed to set up tree-sitter language: {message}")]
    TreeSitterLanguage { message: String },

    /// IO errors while loading input files
    #[error("IO error for {path:?}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Options files that are not valid JSON
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProcessError {
    /// Diagnostic category, for failures raised by the policy
    pub fn category(&self) -> Option<Category> {
        match self {
            ProcessError::Diagnostic { category, .. } => Some(*category),
            _ => None,
        }
    }
}

/// Result type alias for processing operations
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Helper trait for converting IO errors with the path involved
pub trait IoContext<T> {
    fn with_path(self, path: impl Into<PathBuf>, message: &str) -> ProcessResult<T>;
}

impl<T> IoContext<T> for Result<T, std::io::Error> {
    fn with_path(self, path: impl Into<PathBuf>, message: &str) -> ProcessResult<T> {
        self.map_err(|e| ProcessError::Io {
            path: path.into(),
            message: message.to_string(),
            source: e,
        })
    }
}

/// Helper trait for converting JSON errors with context
pub trait JsonContext<T> {
    fn with_json_context(self, message: &str) -> ProcessResult<T>;
}

impl<T> JsonContext<T> for Result<T, serde_json::Error> {
    fn with_json_context(self, message: &str) -> ProcessResult<T> {
        self.map_err(|e| ProcessError::Json {
            message: message.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let located = SourceLocation::new("color", Some(Position::new(3, 5)));
        assert_eq!(located.to_string(), "3:5 (color)");

        let detached = SourceLocation::new("--a", None);
        assert_eq!(detached.to_string(), "(--a)");
    }

    #[test]
    fn test_diagnostic_error_message_keeps_text() {
        let error = ProcessError::Diagnostic {
            category: Category::NoValue,
            message: "variable '--test' is undefined and used without a fallback".to_string(),
            location: SourceLocation::new("color", Some(Position::new(1, 8))),
        };
        assert_eq!(
            error.to_string(),
            "1:8 (color): variable '--test' is undefined and used without a fallback"
        );
        assert_eq!(error.category(), Some(Category::NoValue));
    }

    #[test]
    fn test_io_context() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let error = result.with_path("a.css", "Failed to read stylesheet").unwrap_err();
        assert!(matches!(error, ProcessError::Io { .. }));
        assert!(error.to_string().contains("a.css"));
    }
}
