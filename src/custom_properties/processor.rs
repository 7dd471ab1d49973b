//! Custom property engine
//!
//! [`CustomProperties`] owns the options and the configured variables. Each
//! call to [`CustomProperties::process`] is one run: a fresh variable table
//! seeded from the configured variables, one collection pass, one
//! substitution pass, and an optional append pass. A run either succeeds and
//! commits the rewritten tree, or fails and leaves the caller's tree as it was.

use log::{debug, info, warn};

use crate::css::tree::Stylesheet;
use crate::custom_properties::collector::collect;
use crate::custom_properties::emitter::Emitter;
use crate::custom_properties::options::Options;
use crate::custom_properties::policy::{DiagnosticEvent, Diagnostics, DiagnosticsPolicy};
use crate::custom_properties::variable_resolver::{ResolutionCache, Resolver};
use crate::custom_properties::variable_table::{VariableName, VariableTable, VariableValue};
use crate::error::{ProcessResult, SourceLocation};

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Warnings reported during the run, in the order they were raised
    pub diagnostics: Vec<DiagnosticEvent>,
    /// The run's variable table with every value resolved to a literal
    pub variables: VariableTable,
}

/// Resolves custom properties in stylesheets
#[derive(Debug, Clone)]
pub struct CustomProperties {
    options: Options,
    configured: VariableTable,
}

impl CustomProperties {
    pub fn new(options: Options) -> Self {
        let mut configured = VariableTable::new();
        configured.seed_json(&options.variables);
        Self { options, configured }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Variables every run starts from
    pub fn variables(&self) -> &VariableTable {
        &self.configured
    }

    /// Replace the configured variables for subsequent runs
    pub fn set_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<VariableValue>,
    {
        self.configured = VariableTable::new();
        self.configured.seed(variables);
    }

    /// Merge variables into the configured set for subsequent runs
    pub fn merge_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<VariableValue>,
    {
        self.configured.seed(variables);
    }

    /// Run the engine over a stylesheet
    pub fn process(&self, stylesheet: &mut Stylesheet) -> ProcessResult<ProcessOutput> {
        let policy = DiagnosticsPolicy::from_value(&self.options.warnings);
        let mut diagnostics = Diagnostics::new(policy);
        let mut table = self.configured.clone();
        let mut working = stylesheet.clone();

        let collection = collect(&working, &mut table, &mut diagnostics)?;
        debug!("Variable table holds {} entries", table.len());

        let cache = {
            let mut resolver = Resolver::new(&table, &mut diagnostics, self.options.strict);
            let mut emitter = Emitter::new(&mut resolver, self.options.preserve);
            emitter.emit(&mut working)?;

            if self.options.append_variables {
                let configured: Vec<VariableName> = self.configured.names().cloned().collect();
                emitter.append_variables(&mut working, &configured, &collection)?;
            }
            resolver.into_cache()
        };
        debug!("{} variables resolved while emitting", cache.len());

        let variables = finalize(&table, self.options.strict, cache);
        let diagnostics = diagnostics.into_events();
        info!(
            "Processed stylesheet: {} variables, {} warnings",
            variables.len(),
            diagnostics.len()
        );

        *stylesheet = working;
        Ok(ProcessOutput { diagnostics, variables })
    }
}

impl Default for CustomProperties {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

/// Resolve every entry of the run's table
///
/// Diagnostics were already raised where the variables were used, so this
/// pass runs silently. A variable that cannot be resolved here was never
/// used (a used one would have failed the run already) and is finalized to
/// the empty string.
fn finalize(table: &VariableTable, strict: bool, cache: ResolutionCache) -> VariableTable {
    let mut quiet = Diagnostics::new(DiagnosticsPolicy::silent());
    let mut resolved = table.clone();
    let mut resolver = Resolver::with_cache(table, &mut quiet, strict, cache);
    for name in table.names() {
        let location = SourceLocation::new(name.as_str(), None);
        let literal = resolver.resolve_variable(name, &location).unwrap_or_else(|e| {
            warn!("Unused variable {} cannot be resolved: {}", name, e);
            String::new()
        });
        resolved.replace_value(name.as_str(), VariableValue::new(literal));
    }
    resolved
}
