//! Stylesheet printer
//!
//! Serializes a [`Stylesheet`] back to CSS text in a fixed layout: two-space
//! indentation, one declaration per line and a blank line between top-level
//! nodes. Also offers an outline dump for debugging.

use std::fmt::Write;

use crate::css::constants::IMPORTANT_FLAG;
use crate::css::tree::{AtRule, Declaration, Node, Rule, Stylesheet};

const INDENT: &str = "  ";

/// Serialize a stylesheet to CSS text
pub fn print_stylesheet(stylesheet: &Stylesheet) -> String {
    stylesheet
        .nodes
        .iter()
        .map(|node| {
            let mut out = String::new();
            write_node(&mut out, node, 0);
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a single declaration without indentation or newline
pub fn print_declaration(declaration: &Declaration) -> String {
    let mut out = format!("{}: {}", declaration.property, declaration.value);
    if declaration.important {
        out.push(' ');
        out.push_str(IMPORTANT_FLAG);
    }
    out.push(';');
    out
}

impl std::fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&print_stylesheet(self))
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = INDENT.repeat(depth);
    match node {
        Node::Declaration(declaration) => {
            let _ = writeln!(out, "{}{}", indent, print_declaration(declaration));
        }
        Node::Comment(text) => {
            let _ = writeln!(out, "{}{}", indent, text);
        }
        Node::Rule(rule) => write_rule(out, rule, depth),
        Node::AtRule(at_rule) => write_at_rule(out, at_rule, depth),
    }
}

fn write_rule(out: &mut String, rule: &Rule, depth: usize) {
    let indent = INDENT.repeat(depth);
    let _ = writeln!(out, "{}{} {{", indent, rule.selector);
    for child in &rule.nodes {
        write_node(out, child, depth + 1);
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn write_at_rule(out: &mut String, at_rule: &AtRule, depth: usize) {
    let indent = INDENT.repeat(depth);
    let prelude = if at_rule.params.is_empty() {
        format!("@{}", at_rule.name)
    } else {
        format!("@{} {}", at_rule.name, at_rule.params)
    };

    match &at_rule.nodes {
        None => {
            let _ = writeln!(out, "{}{};", indent, prelude);
        }
        Some(children) => {
            let _ = writeln!(out, "{}{} {{", indent, prelude);
            for child in children {
                write_node(out, child, depth + 1);
            }
            let _ = writeln!(out, "{}}}", indent);
        }
    }
}

/// Print an outline of the tree, one node per line, for debugging
pub fn print_outline(stylesheet: &Stylesheet) -> String {
    let mut out = String::new();
    for node in &stylesheet.nodes {
        write_outline(&mut out, node, 0);
    }
    out
}

fn write_outline(out: &mut String, node: &Node, depth: usize) {
    let indent = INDENT.repeat(depth);
    let position = |position: Option<crate::css::tree::Position>| {
        position.map(|p| format!("[{}]", p)).unwrap_or_default()
    };

    match node {
        Node::Rule(rule) => {
            let _ = writeln!(out, "{}rule{} '{}'", indent, position(rule.position), rule.selector);
            for child in &rule.nodes {
                write_outline(out, child, depth + 1);
            }
        }
        Node::AtRule(at_rule) => {
            let _ = writeln!(
                out,
                "{}at_rule{} '@{}' '{}'",
                indent,
                position(at_rule.position),
                at_rule.name,
                at_rule.params
            );
            for child in at_rule.nodes.iter().flatten() {
                write_outline(out, child, depth + 1);
            }
        }
        Node::Declaration(declaration) => {
            let _ = writeln!(
                out,
                "{}declaration{} '{}'",
                indent,
                position(declaration.position),
                print_declaration(declaration)
            );
        }
        Node::Comment(text) => {
            let _ = writeln!(out, "{}comment '{}'", indent, text.replace('\n', "\\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::tree::Position;

    #[test]
    fn test_print_rules_and_at_rules() {
        let sheet = Stylesheet {
            nodes: vec![
                Node::Comment("/* vars */".to_string()),
                Rule::new(":root")
                    .with(Declaration::new("--a", "1px"))
                    .with(Declaration::new("--b", "red").important())
                    .into(),
                AtRule::statement("import", "\"a.css\"").into(),
                AtRule::block("media", "print")
                    .with(Rule::new(".x").with(Declaration::new("width", "1px")))
                    .into(),
            ],
        };

        let expected = "/* vars */\n\
\n\
:root {\n  --a: 1px;\n  --b: red !important;\n}\n\
\n\
@import \"a.css\";\n\
\n\
@media print {\n  .x {\n    width: 1px;\n  }\n}\n";
        assert_eq!(print_stylesheet(&sheet), expected);
        assert_eq!(sheet.to_string(), expected);
    }

    #[test]
    fn test_print_empty_stylesheet() {
        assert_eq!(print_stylesheet(&Stylesheet::new()), "");
    }

    #[test]
    fn test_outline_includes_positions() {
        let sheet = Stylesheet {
            nodes: vec![Rule::new(".a")
                .at(Position::new(1, 1))
                .with(Declaration::new("color", "red").at(Position::new(1, 6)))
                .into()],
        };
        let outline = print_outline(&sheet);
        assert_eq!(outline, "rule[1:1] '.a'\n  declaration[1:6] 'color: red;'\n");
    }
}
