//! Diagnostics policy
//!
//! The `warnings` option can be a boolean, the string `"error"`, or an object
//! with per-category settings. It is normalized once per run into a
//! [`DiagnosticsPolicy`] so the collector and resolver only ever ask
//! "how severe is this category?".

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ProcessError, ProcessResult, SourceLocation};

/// Blanket key inside a `warnings` object
const KEY_BLANKET: &str = "warnings";
/// Key for reporting undefined variables that do have a fallback
const KEY_NO_VALUE_WITH_FALLBACK: [&str; 2] = ["no-value-with-fallback", "noValueWithFallback"];
/// Option value that turns a category into a fatal error
const SEVERITY_ERROR: &str = "error";

/// Diagnostic categories raised while processing custom properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// A `var()` reference to an undefined variable
    NoValue,
    /// A custom property declared outside the top-level `:root` rule
    NotScopedToRoot,
    /// A variable whose value refers back to itself
    CircularReference,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::NoValue,
        Category::NotScopedToRoot,
        Category::CircularReference,
    ];

    /// Name used in diagnostic output
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NoValue => "no-value",
            Category::NotScopedToRoot => "not-scoped-to-root",
            Category::CircularReference => "circular-reference",
        }
    }

    /// Keys accepted in a `warnings` object, kebab-case first
    fn config_keys(&self) -> [&'static str; 2] {
        match self {
            Category::NoValue => ["no-value-notifications", "noValueNotifications"],
            Category::NotScopedToRoot => ["not-scoped-to-root", "notScopedToRoot"],
            Category::CircularReference => ["circular-reference", "circularReference"],
        }
    }

    fn index(&self) -> usize {
        match self {
            Category::NoValue => 0,
            Category::NotScopedToRoot => 1,
            Category::CircularReference => 2,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when a category is triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Silent,
    Warn,
    Error,
}

impl Severity {
    /// `true` → warn, `"error"` → error, anything else → silent
    fn from_setting(setting: &Value) -> Self {
        match setting {
            Value::Bool(true) => Severity::Warn,
            Value::String(s) if s == SEVERITY_ERROR => Severity::Error,
            Value::Bool(false) | Value::Null => Severity::Silent,
            other => {
                warn!("Unrecognized diagnostic setting {}, treating it as silent", other);
                Severity::Silent
            }
        }
    }
}

/// Per-category decision table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticsPolicy {
    severities: [Severity; 3],
    report_fallbacks: bool,
}

impl DiagnosticsPolicy {
    /// Every category silent
    pub fn silent() -> Self {
        Self::uniform(Severity::Silent)
    }

    /// Every category at the same severity
    pub fn uniform(severity: Severity) -> Self {
        Self {
            severities: [severity; 3],
            report_fallbacks: false,
        }
    }

    /// Normalize a `warnings` option value
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => Self::silent(),
            Value::Bool(true) => Self::uniform(Severity::Warn),
            Value::String(s) if s == SEVERITY_ERROR => Self::uniform(Severity::Error),
            Value::Object(settings) => Self::from_object(settings),
            other => {
                warn!("Unrecognized warnings option {}, all diagnostics are silent", other);
                Self::silent()
            }
        }
    }

    fn from_object(settings: &Map<String, Value>) -> Self {
        let default = settings
            .get(KEY_BLANKET)
            .map(Severity::from_setting)
            .unwrap_or_default();

        let mut policy = Self::uniform(default);
        for category in Category::ALL {
            let specific = category
                .config_keys()
                .iter()
                .find_map(|key| settings.get(*key));
            if let Some(setting) = specific {
                policy.severities[category.index()] = Severity::from_setting(setting);
            }
        }

        policy.report_fallbacks = KEY_NO_VALUE_WITH_FALLBACK
            .iter()
            .find_map(|key| settings.get(*key))
            .map(|setting| matches!(setting, Value::Bool(true)))
            .unwrap_or(false);

        debug!("Normalized diagnostics policy: {:?}", policy);
        policy
    }

    /// Severity for a category
    pub fn severity(&self, category: Category) -> Severity {
        self.severities[category.index()]
    }

    /// Whether an undefined variable with a fallback is reported
    pub fn reports_fallbacks(&self) -> bool {
        self.report_fallbacks
    }

    pub fn with_severity(mut self, category: Category, severity: Severity) -> Self {
        self.severities[category.index()] = severity;
        self
    }

    pub fn with_fallback_reports(mut self, enabled: bool) -> Self {
        self.report_fallbacks = enabled;
        self
    }
}

/// A diagnostic reported during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEvent {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl std::fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} [{}]", self.location, self.message, self.category)
    }
}

/// Per-run diagnostic stream
#[derive(Debug, Default)]
pub struct Diagnostics {
    policy: DiagnosticsPolicy,
    events: Vec<DiagnosticEvent>,
}

impl Diagnostics {
    pub fn new(policy: DiagnosticsPolicy) -> Self {
        Self {
            policy,
            events: Vec::new(),
        }
    }

    pub fn policy(&self) -> &DiagnosticsPolicy {
        &self.policy
    }

    /// Report a violation; fails when the policy makes the category an error
    pub fn report(
        &mut self,
        category: Category,
        message: String,
        location: &SourceLocation,
    ) -> ProcessResult<()> {
        match self.policy.severity(category) {
            Severity::Silent => {
                debug!("Suppressed {} diagnostic: {}", category, message);
                Ok(())
            }
            Severity::Warn => {
                warn!("{}: {}", location, message);
                self.events.push(DiagnosticEvent {
                    category,
                    severity: Severity::Warn,
                    message,
                    location: location.clone(),
                });
                Ok(())
            }
            Severity::Error => Err(ProcessError::Diagnostic {
                category,
                message,
                location: location.clone(),
            }),
        }
    }

    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<DiagnosticEvent> {
        self.events
    }
}
