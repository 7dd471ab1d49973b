//! CSS Custom Properties
//!
//! Resolves `--name: value` declarations and `var()` usages into literal
//! values:
//! - the collector reads `:root` declarations into a variable table
//! - the resolver expands `var()` references with cycle detection
//! - the emitter rewrites the stylesheet
//! - a diagnostics policy decides which problems are silent, warnings or errors

pub mod collector;
pub mod emitter;
pub mod options;
pub mod policy;
pub mod processor;
pub mod variable_resolver;
pub mod variable_table;

pub use options::{Options, Preserve};
pub use policy::{Category, DiagnosticEvent, DiagnosticsPolicy, Severity};
pub use processor::{CustomProperties, ProcessOutput};
pub use variable_table::{VariableName, VariableTable, VariableValue};

#[cfg(test)]
mod variable_resolver_tests;
