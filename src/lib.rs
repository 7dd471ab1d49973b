//! CSS Custom Properties Library
//!
//! Resolves CSS custom properties (`--name: value`) and their `var()` usages
//! into literal values inside a parsed stylesheet, with configurable
//! diagnostics for undefined, unscoped and circular variables.

pub mod css;
pub mod custom_properties;
pub mod error;
#[cfg(test)]
pub(crate) mod test_utils;

pub use custom_properties::{CustomProperties, Options, ProcessOutput};
pub use error::{ProcessError, ProcessResult};
