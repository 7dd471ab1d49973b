//! Owned stylesheet tree
//!
//! A small, mutable model of a parsed stylesheet: rules, at-rules,
//! declarations and comments. The custom property engine reads and rewrites
//! this tree; the parser adapter builds it and the printer serializes it.

use crate::css::constants::{CUSTOM_PROPERTY_PREFIX, ROOT_SELECTOR};

/// 1-based source position of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A complete stylesheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
}

/// Any node that can appear in a stylesheet or a block
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
    /// Comment text including its delimiters
    Comment(String),
}

/// A style rule: `selector { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub position: Option<Position>,
}

/// An at-rule, either a statement (`@import "a.css";`) or a block
/// (`@media print { ... }`)
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Name without the leading `@`
    pub name: String,
    pub params: String,
    /// `None` for statement at-rules
    pub nodes: Option<Vec<Node>>,
    pub position: Option<Position>,
}

/// A `property: value` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
    pub position: Option<Position>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node at the end of the stylesheet
    pub fn push(&mut self, node: impl Into<Node>) {
        self.nodes.push(node.into());
    }

    /// All declarations in document order, at any depth
    pub fn declarations(&self) -> Vec<&Declaration> {
        let mut found = Vec::new();
        collect_declarations(&self.nodes, &mut found);
        found
    }

    /// Values of every declaration of `property`, in document order
    pub fn values_of(&self, property: &str) -> Vec<&str> {
        self.declarations()
            .into_iter()
            .filter(|decl| decl.property == property)
            .map(|decl| decl.value.as_str())
            .collect()
    }

    /// Top-level rules only
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Rule(rule) => Some(rule),
            _ => None,
        })
    }
}

fn collect_declarations<'a>(nodes: &'a [Node], found: &mut Vec<&'a Declaration>) {
    for node in nodes {
        match node {
            Node::Declaration(decl) => found.push(decl),
            Node::Rule(rule) => collect_declarations(&rule.nodes, found),
            Node::AtRule(at_rule) => {
                if let Some(children) = &at_rule.nodes {
                    collect_declarations(children, found);
                }
            }
            Node::Comment(_) => {}
        }
    }
}

impl Rule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            nodes: Vec::new(),
            position: None,
        }
    }

    /// Builder-style helper for adding a child node
    pub fn with(mut self, node: impl Into<Node>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Whether this rule targets exactly the document root
    pub fn is_root_selector(&self) -> bool {
        self.selector.trim() == ROOT_SELECTOR
    }

    /// Whether the rule directly declares `property`
    pub fn declares(&self, property: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node, Node::Declaration(decl) if decl.property == property))
    }

    /// Append a declaration at the end of the rule
    pub fn insert_declaration(&mut self, declaration: Declaration) {
        self.nodes.push(Node::Declaration(declaration));
    }
}

impl AtRule {
    /// A block at-rule with no children yet
    pub fn block(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            nodes: Some(Vec::new()),
            position: None,
        }
    }

    /// A statement at-rule such as `@import`
    pub fn statement(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            nodes: None,
            position: None,
        }
    }

    pub fn with(mut self, node: impl Into<Node>) -> Self {
        self.nodes.get_or_insert_with(Vec::new).push(node.into());
        self
    }
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
            position: None,
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Whether this declares a custom property (`--name: ...`)
    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with(CUSTOM_PROPERTY_PREFIX)
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

impl From<Rule> for Node {
    fn from(rule: Rule) -> Self {
        Node::Rule(rule)
    }
}

impl From<AtRule> for Node {
    fn from(at_rule: AtRule) -> Self {
        Node::AtRule(at_rule)
    }
}

impl From<Declaration> for Node {
    fn from(declaration: Declaration) -> Self {
        Node::Declaration(declaration)
    }
}
