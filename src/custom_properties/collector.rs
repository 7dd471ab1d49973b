//! Declaration collector
//!
//! Walks the stylesheet once and classifies every custom property
//! declaration. Only declarations in a top-level `:root` rule feed the
//! variable table; those elsewhere in a rule are reported as not scoped to
//! root, and those inside a grouping at-rule (`@media`, `@supports`, ...) are
//! ignored without a diagnostic.

use log::debug;

use crate::css::tree::{Declaration, Node, Position, Rule, Stylesheet};
use crate::custom_properties::policy::{Category, Diagnostics};
use crate::custom_properties::variable_table::{VariableName, VariableTable, VariableValue};
use crate::error::{ProcessResult, SourceLocation};

/// Where a declaration sits relative to the document root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Directly inside a top-level `:root` rule
    Root,
    /// Inside any other rule outside a grouping at-rule
    NonRoot,
    /// Somewhere inside a grouping at-rule
    Grouped,
}

/// A custom property declaration found in the stylesheet
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationSite {
    pub name: VariableName,
    pub value: VariableValue,
    pub important: bool,
    pub scope: Scope,
    pub position: Option<Position>,
}

/// Everything the collection pass found
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub sites: Vec<DeclarationSite>,
}

impl Collection {
    pub fn root_sites(&self) -> impl Iterator<Item = &DeclarationSite> {
        self.sites.iter().filter(|site| site.scope == Scope::Root)
    }

    /// Whether `name` has a `:root` declaration anywhere in the document
    pub fn declares_at_root(&self, name: &str) -> bool {
        self.root_sites().any(|site| site.name.as_str() == name)
    }
}

/// Scope of the declarations directly inside `rule`
///
/// `nested_in_rule` is true when the rule itself sits in another rule,
/// `grouped` when any ancestor is an at-rule.
pub fn rule_scope(rule: &Rule, nested_in_rule: bool, grouped: bool) -> Scope {
    if grouped {
        Scope::Grouped
    } else if rule.is_root_selector() && !nested_in_rule {
        Scope::Root
    } else {
        Scope::NonRoot
    }
}

/// Collect custom property declarations, writing root-scope ones into `table`
pub fn collect(
    stylesheet: &Stylesheet,
    table: &mut VariableTable,
    diagnostics: &mut Diagnostics,
) -> ProcessResult<Collection> {
    let mut collection = Collection::default();
    for node in &stylesheet.nodes {
        collect_node(node, false, false, table, diagnostics, &mut collection)?;
    }
    debug!(
        "Collected {} custom property declarations ({} at root)",
        collection.sites.len(),
        collection.root_sites().count()
    );
    Ok(collection)
}

fn collect_node(
    node: &Node,
    nested_in_rule: bool,
    grouped: bool,
    table: &mut VariableTable,
    diagnostics: &mut Diagnostics,
    collection: &mut Collection,
) -> ProcessResult<()> {
    match node {
        Node::Rule(rule) => {
            let scope = rule_scope(rule, nested_in_rule, grouped);
            for child in &rule.nodes {
                match child {
                    Node::Declaration(declaration) if declaration.is_custom_property() => {
                        collect_declaration(rule, declaration, scope, nested_in_rule, table, diagnostics, collection)?;
                    }
                    other => collect_node(other, true, grouped, table, diagnostics, collection)?,
                }
            }
        }
        Node::AtRule(at_rule) => {
            for child in at_rule.nodes.iter().flatten() {
                collect_node(child, nested_in_rule, true, table, diagnostics, collection)?;
            }
        }
        // Declarations outside any rule and comments carry no variables
        Node::Declaration(_) | Node::Comment(_) => {}
    }
    Ok(())
}

fn collect_declaration(
    rule: &Rule,
    declaration: &Declaration,
    scope: Scope,
    nested_in_rule: bool,
    table: &mut VariableTable,
    diagnostics: &mut Diagnostics,
    collection: &mut Collection,
) -> ProcessResult<()> {
    let site = DeclarationSite {
        name: VariableName::new(&declaration.property),
        value: VariableValue::new(declaration.value.clone()),
        important: declaration.important,
        scope,
        position: declaration.position,
    };

    match scope {
        Scope::Root => {
            table.set_declared(
                site.name.clone(),
                site.value.clone(),
                site.important,
                site.position,
            );
        }
        Scope::NonRoot => {
            let mut message = format!(
                "Custom property ignored: not scoped to the top-level :root element ({} {{ ... {}: ... }})",
                rule.selector, declaration.property
            );
            if nested_in_rule {
                message.push_str(", in rule");
            }
            let location = SourceLocation::new(&declaration.property, declaration.position);
            diagnostics.report(Category::NotScopedToRoot, message, &location)?;
        }
        Scope::Grouped => {
            debug!("Ignoring {} inside a grouping at-rule", declaration.property);
        }
    }

    collection.sites.push(site);
    Ok(())
}
