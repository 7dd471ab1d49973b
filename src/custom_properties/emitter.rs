//! Emitter
//!
//! Rewrites the stylesheet once the variable table is known: usages get
//! their resolved literal, `:root` custom properties are removed, kept, or
//! rewritten according to [`Preserve`], and configured variables can be
//! appended to the root rule.

use log::debug;

use crate::css::constants::ROOT_SELECTOR;
use crate::css::tree::{Declaration, Node, Rule, Stylesheet};
use crate::custom_properties::collector::{rule_scope, Collection, Scope};
use crate::custom_properties::options::Preserve;
use crate::custom_properties::variable_resolver::{contains_reference, Resolver};
use crate::custom_properties::variable_table::VariableName;
use crate::error::{ProcessResult, SourceLocation};

/// Rewrites usage sites and root declarations
pub struct Emitter<'r, 'a> {
    resolver: &'r mut Resolver<'a>,
    preserve: Preserve,
}

impl<'r, 'a> Emitter<'r, 'a> {
    pub fn new(resolver: &'r mut Resolver<'a>, preserve: Preserve) -> Self {
        Self { resolver, preserve }
    }

    /// Substitute every usage and apply the preservation mode
    pub fn emit(&mut self, stylesheet: &mut Stylesheet) -> ProcessResult<()> {
        self.emit_nodes(&mut stylesheet.nodes, false, false)
    }

    fn emit_nodes(&mut self, nodes: &mut Vec<Node>, nested_in_rule: bool, grouped: bool) -> ProcessResult<()> {
        let original = std::mem::take(nodes);
        for node in original {
            match node {
                Node::Rule(mut rule) => {
                    let scope = rule_scope(&rule, nested_in_rule, grouped);
                    self.emit_rule(&mut rule, scope, grouped)?;
                    let emptied_root = scope == Scope::Root
                        && self.preserve == Preserve::Off
                        && rule.nodes.is_empty();
                    if emptied_root {
                        debug!("Removing empty {} rule", ROOT_SELECTOR);
                    } else {
                        nodes.push(Node::Rule(rule));
                    }
                }
                Node::AtRule(mut at_rule) => {
                    if let Some(children) = at_rule.nodes.as_mut() {
                        self.emit_nodes(children, nested_in_rule, true)?;
                    }
                    nodes.push(Node::AtRule(at_rule));
                }
                Node::Declaration(declaration) => self.emit_usage(declaration, nodes)?,
                comment @ Node::Comment(_) => nodes.push(comment),
            }
        }
        Ok(())
    }

    fn emit_rule(&mut self, rule: &mut Rule, scope: Scope, grouped: bool) -> ProcessResult<()> {
        let original = std::mem::take(&mut rule.nodes);
        for node in original {
            match node {
                Node::Declaration(declaration)
                    if scope == Scope::Root && declaration.is_custom_property() =>
                {
                    self.emit_root_declaration(declaration, &mut rule.nodes)?;
                }
                Node::Declaration(declaration) => self.emit_usage(declaration, &mut rule.nodes)?,
                other => {
                    let mut nested = vec![other];
                    self.emit_nodes(&mut nested, true, grouped)?;
                    rule.nodes.append(&mut nested);
                }
            }
        }
        Ok(())
    }

    fn emit_root_declaration(&mut self, mut declaration: Declaration, out: &mut Vec<Node>) -> ProcessResult<()> {
        match self.preserve {
            Preserve::Off => {}
            Preserve::Verbatim => out.push(Node::Declaration(declaration)),
            Preserve::Computed => {
                let name = VariableName::new(&declaration.property);
                let location = SourceLocation::new(&declaration.property, declaration.position);
                let resolved = self.resolver.resolve(&declaration.value, &location, Some(&name))?;
                declaration.set_value(resolved);
                out.push(Node::Declaration(declaration));
            }
        }
        Ok(())
    }

    fn emit_usage(&mut self, mut declaration: Declaration, out: &mut Vec<Node>) -> ProcessResult<()> {
        if !contains_reference(&declaration.value) {
            out.push(Node::Declaration(declaration));
            return Ok(());
        }

        let location = SourceLocation::new(&declaration.property, declaration.position);
        let resolved = self.resolver.resolve(&declaration.value, &location, None)?;

        if self.preserve == Preserve::Verbatim {
            let mut copy = declaration.clone();
            copy.set_value(resolved);
            out.push(Node::Declaration(copy));
            out.push(Node::Declaration(declaration));
        } else {
            declaration.set_value(resolved);
            out.push(Node::Declaration(declaration));
        }
        Ok(())
    }

    /// Append configured variables that the document does not declare at root
    ///
    /// The declarations go into the last top-level `:root` rule, or a new one
    /// at the end of the stylesheet. Values are written fully resolved.
    pub fn append_variables(
        &mut self,
        stylesheet: &mut Stylesheet,
        configured: &[VariableName],
        collection: &Collection,
    ) -> ProcessResult<usize> {
        let table = self.resolver.table();
        let mut pending = Vec::new();
        for name in configured {
            if collection.declares_at_root(name.as_str()) {
                continue;
            }
            if !table.contains(name.as_str()) {
                continue;
            }
            let location = SourceLocation::new(name.as_str(), None);
            let resolved = self.resolver.resolve_variable(name, &location)?;
            pending.push(Declaration::new(name.as_str(), resolved));
        }

        let target = stylesheet.nodes.iter_mut().rev().find_map(|node| match node {
            Node::Rule(rule) if rule.is_root_selector() => Some(rule),
            _ => None,
        });

        let mut appended = 0;
        match target {
            Some(rule) => {
                for declaration in pending {
                    if !rule.declares(&declaration.property) {
                        rule.insert_declaration(declaration);
                        appended += 1;
                    }
                }
            }
            None if !pending.is_empty() => {
                let mut rule = Rule::new(ROOT_SELECTOR);
                appended = pending.len();
                for declaration in pending {
                    rule.insert_declaration(declaration);
                }
                stylesheet.push(rule);
            }
            None => {}
        }

        debug!("Appended {} configured variables", appended);
        Ok(appended)
    }
}
