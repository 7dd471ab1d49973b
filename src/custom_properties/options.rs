//! Engine options
//!
//! Deserialized from JSON with camelCase keys. A malformed field never fails
//! the load: it falls back to its default and the problem is logged.

use log::warn;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{JsonContext, ProcessResult};

/// What happens to `:root` custom property declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preserve {
    /// Remove them once folded into the variable table
    #[default]
    Off,
    /// Keep them as written, and keep usages next to their resolved copy
    Verbatim,
    /// Keep them with their value rewritten to the resolved literal
    Computed,
}

impl<'de> Deserialize<'de> for Preserve {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(false) | Value::Null => Ok(Preserve::Off),
            Value::Bool(true) => Ok(Preserve::Verbatim),
            Value::String(s) if s == "computed" => Ok(Preserve::Computed),
            other => Err(serde::de::Error::custom(format!(
                "expected false, true or \"computed\", found {}",
                other
            ))),
        }
    }
}

/// Options for a [`CustomProperties`](crate::custom_properties::CustomProperties) engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Variables merged into the table before the stylesheet is read
    #[serde(deserialize_with = "lenient")]
    pub variables: Map<String, Value>,
    #[serde(deserialize_with = "lenient")]
    pub preserve: Preserve,
    /// Append configured variables to the `:root` rule
    #[serde(deserialize_with = "lenient")]
    pub append_variables: bool,
    /// Check that resolved values are well-formed
    #[serde(deserialize_with = "lenient_strict")]
    pub strict: bool,
    /// Raw diagnostics configuration, normalized at the start of each run
    pub warnings: Value,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            variables: Map::new(),
            preserve: Preserve::Off,
            append_variables: false,
            strict: true,
            warnings: Value::Bool(true),
        }
    }
}

impl Options {
    /// Build options from an arbitrary JSON value, tolerating bad shapes
    pub fn from_value(value: Value) -> Self {
        if !value.is_object() {
            if !value.is_null() {
                warn!("Options must be an object, found {}; using defaults", value);
            }
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Failed to read options ({}); using defaults", e);
            Self::default()
        })
    }

    /// Parse options from JSON text
    pub fn from_json(text: &str) -> ProcessResult<Self> {
        let value: Value = serde_json::from_str(text).with_json_context("Invalid options file")?;
        Ok(Self::from_value(value))
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_preserve(mut self, preserve: Preserve) -> Self {
        self.preserve = preserve;
        self
    }

    pub fn with_append_variables(mut self, append: bool) -> Self {
        self.append_variables = append;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_warnings(mut self, warnings: Value) -> Self {
        self.warnings = warnings;
        self
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    lenient_or(deserializer, T::default)
}

fn lenient_strict<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_or(deserializer, || true)
}

fn lenient_or<'de, D, T, F>(deserializer: D, fallback: F) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("Ignoring malformed option value: {}", e);
        fallback()
    }))
}
