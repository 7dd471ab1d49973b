//! Variable table
//!
//! Name → value store for custom properties. Seeded from configuration, then
//! overwritten by `:root` declarations in document order. Last write wins;
//! iteration follows first insertion so appended output is deterministic.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde_json::{Map, Value};

use crate::css::constants::CUSTOM_PROPERTY_PREFIX;
use crate::css::tree::Position;

/// A custom property name, always carrying the `--` prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableName(String);

impl VariableName {
    /// Normalize a name, adding the `--` prefix when it is missing
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim();
        if name.starts_with(CUSTOM_PROPERTY_PREFIX) {
            Self(name.to_string())
        } else {
            Self(format!("{}{}", CUSTOM_PROPERTY_PREFIX, name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for VariableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VariableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A raw, unresolved value token string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableValue(String);

impl VariableValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Coerce a configuration value; strings, numbers and booleans are accepted
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        Self(value.to_string())
    }
}

/// Where a table entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by configuration or the runtime mutation API
    Configured,
    /// Declared in a top-level `:root` rule
    Declared(Option<Position>),
}

/// A single table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableEntry {
    pub value: VariableValue,
    pub important: bool,
    pub origin: Origin,
}

/// Ordered name → value store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    entries: HashMap<VariableName, VariableEntry>,
    order: Vec<VariableName>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge configured variables into the table
    pub fn seed<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<VariableValue>,
    {
        for (name, value) in variables {
            self.set(VariableName::new(name), value.into());
        }
    }

    /// Merge a JSON object of configured variables, coercing scalar values
    pub fn seed_json(&mut self, variables: &Map<String, Value>) {
        for (name, value) in variables {
            match VariableValue::from_json(value) {
                Some(value) => self.set(VariableName::new(name), value),
                None => warn!("Ignoring variable '{}' with unsupported value {}", name, value),
            }
        }
    }

    /// Overwrite an entry with a configured value
    pub fn set(&mut self, name: VariableName, value: VariableValue) {
        self.insert(
            name,
            VariableEntry {
                value,
                important: false,
                origin: Origin::Configured,
            },
        );
    }

    /// Overwrite an entry with a value declared in the stylesheet
    pub fn set_declared(
        &mut self,
        name: VariableName,
        value: VariableValue,
        important: bool,
        position: Option<Position>,
    ) {
        self.insert(
            name,
            VariableEntry {
                value,
                important,
                origin: Origin::Declared(position),
            },
        );
    }

    fn insert(&mut self, name: VariableName, entry: VariableEntry) {
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, entry);
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn entry(&self, name: &str) -> Option<&VariableEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in first-insertion order
    pub fn names(&self) -> impl Iterator<Item = &VariableName> {
        self.order.iter()
    }

    /// Entries in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&VariableName, &VariableEntry)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|entry| (name, entry)))
    }

    /// Replace the value of an existing entry, keeping its origin
    pub(crate) fn replace_value(&mut self, name: &str, value: VariableValue) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.value = value;
        }
    }
}
