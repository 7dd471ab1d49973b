//! CSS Parser using tree-sitter-css
//!
//! Parses stylesheet text with the tree-sitter-css grammar and converts the
//! concrete syntax tree into the owned [`Stylesheet`] model the custom
//! property engine works on. Documents the grammar rejects are read again
//! by [`recovery`](crate::css::recovery), which keeps declaration values as
//! raw text.

use log::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::css::constants::*;
use crate::css::recovery;
use crate::css::tree::{AtRule, Declaration, Node as CssNode, Position, Rule, Stylesheet};
use crate::error::{ProcessError, ProcessResult};

/// CSS parser wrapper around tree-sitter-css
pub struct CssParser {
    parser: Parser,
}

impl CssParser {
    /// Create a new CSS parser
    pub fn new() -> ProcessResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_css::LANGUAGE.into())
            .map_err(|e| ProcessError::TreeSitterLanguage {
                message: e.to_string(),
            })?;

        Ok(Self { parser })
    }

    /// Parse CSS content and return the raw syntax tree
    pub fn parse_tree(&mut self, content: &str) -> Option<Tree> {
        self.parser.parse(content, None)
    }

    /// Parse CSS content into a stylesheet
    ///
    /// Content the grammar rejects is read by the recovering reader, so
    /// values such as `var(--a, )` or an unclosed `var(` reach the engine as
    /// written. Content neither can read is rejected with the position of
    /// the first syntax error.
    pub fn parse(&mut self, content: &str) -> ProcessResult<Stylesheet> {
        let tree = self.parse_tree(content).ok_or_else(|| ProcessError::Parse {
            line: 1,
            column: 1,
            message: "parser produced no tree".to_string(),
        })?;
        let root = tree.root_node();

        if root.has_error() {
            match recovery::parse_stylesheet(content) {
                Ok(stylesheet) => {
                    debug!("Syntax tree has errors, read the stylesheet with the recovering reader");
                    return Ok(stylesheet);
                }
                Err(e) => debug!("Recovering reader failed too: {}", e),
            }

            let (position, message) = match find_first_error(root) {
                Some(error_node) if error_node.is_missing() => (
                    node_position(error_node),
                    format!("missing '{}'", error_node.kind()),
                ),
                Some(error_node) => (
                    node_position(error_node),
                    format!("unexpected '{}'", node_text(error_node, content).trim()),
                ),
                None => (node_position(root), "syntax error".to_string()),
            };
            return Err(ProcessError::Parse {
                line: position.line,
                column: position.column,
                message,
            });
        }

        Ok(Stylesheet {
            nodes: convert_children(root, content),
        })
    }
}

/// Depth-first search for the first ERROR or MISSING node
fn find_first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if let Some(found) = find_first_error(child) {
                return Some(found);
            }
        }
    }
    None
}

/// Convert the statements of a stylesheet or block
fn convert_children(parent: Node, content: &str) -> Vec<CssNode> {
    let mut nodes = Vec::new();
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        match child.kind() {
            NODE_RULE_SET => nodes.push(CssNode::Rule(convert_rule(child, content))),
            NODE_DECLARATION => {
                if let Some(declaration) = convert_declaration(child, content) {
                    nodes.push(CssNode::Declaration(declaration));
                }
            }
            NODE_COMMENT => nodes.push(CssNode::Comment(node_text(child, content).to_string())),
            NODE_MEDIA_STATEMENT
            | NODE_SUPPORTS_STATEMENT
            | NODE_SCOPE_STATEMENT
            | NODE_AT_RULE
            | NODE_IMPORT_STATEMENT
            | NODE_CHARSET_STATEMENT
            | NODE_NAMESPACE_STATEMENT
            | NODE_KEYFRAMES_STATEMENT => {
                nodes.push(CssNode::AtRule(convert_at_rule(child, content)));
            }
            _ => {
                // Braces and other punctuation carry nothing
            }
        }
    }
    nodes
}

fn convert_rule(node: Node, content: &str) -> Rule {
    let selector = find_child_by_kind(node, NODE_SELECTORS)
        .map(|selectors| node_text(selectors, content).trim().to_string())
        .unwrap_or_default();
    let nodes = find_child_by_kind(node, NODE_BLOCK)
        .map(|block| convert_children(block, content))
        .unwrap_or_default();

    Rule {
        selector,
        nodes,
        position: Some(node_position(node)),
    }
}

fn convert_declaration(node: Node, content: &str) -> Option<Declaration> {
    let property = find_child_by_kind(node, NODE_PROPERTY_NAME)?;
    let colon = find_child_by_kind(node, NODE_COLON)?;
    let important = find_child_by_kind(node, NODE_IMPORTANT);

    // Value runs from the colon up to `!important`, the semicolon, or the end
    let value_end = important
        .or_else(|| find_child_by_kind(node, NODE_SEMICOLON))
        .map(|end| end.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let value = content
        .get(colon.end_byte()..value_end)
        .unwrap_or("")
        .trim();

    Some(Declaration {
        property: node_text(property, content).to_string(),
        value: value.to_string(),
        important: important.is_some(),
        position: Some(node_position(node)),
    })
}

fn convert_at_rule(node: Node, content: &str) -> AtRule {
    let keyword = node.child(0);
    let name = keyword
        .map(|keyword| node_text(keyword, content).trim_start_matches('@').to_string())
        .unwrap_or_default();

    let body = find_child_by_kind(node, NODE_BLOCK)
        .or_else(|| find_child_by_kind(node, NODE_KEYFRAME_BLOCK_LIST));
    let params_start = keyword.map(|keyword| keyword.end_byte()).unwrap_or(node.start_byte());
    let params_end = body
        .or_else(|| find_child_by_kind(node, NODE_SEMICOLON))
        .map(|end| end.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let params = content
        .get(params_start..params_end)
        .unwrap_or("")
        .trim()
        .to_string();

    let nodes = body.map(|body| {
        if body.kind() == NODE_KEYFRAME_BLOCK_LIST {
            convert_keyframes(body, content)
        } else {
            convert_children(body, content)
        }
    });

    AtRule {
        name,
        params,
        nodes,
        position: Some(node_position(node)),
    }
}

/// Keyframe blocks become rules whose selector is the keyframe selector
fn convert_keyframes(list: Node, content: &str) -> Vec<CssNode> {
    let mut nodes = Vec::new();
    let mut cursor = list.walk();
    for child in list.children(&mut cursor) {
        match child.kind() {
            NODE_KEYFRAME_BLOCK => {
                let selector = child
                    .child(0)
                    .map(|first| node_text(first, content).trim().to_string())
                    .unwrap_or_default();
                let children = find_child_by_kind(child, NODE_BLOCK)
                    .map(|block| convert_children(block, content))
                    .unwrap_or_default();
                nodes.push(CssNode::Rule(Rule {
                    selector,
                    nodes: children,
                    position: Some(node_position(child)),
                }));
            }
            NODE_COMMENT => nodes.push(CssNode::Comment(node_text(child, content).to_string())),
            _ => {}
        }
    }
    nodes
}

/// Helper function to find a child node by its kind
fn find_child_by_kind<'a>(node: Node<'a>, target_kind: &str) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == target_kind {
                return Some(child);
            }
        }
    }
    None
}

/// Get text content of a node
fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    content.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

fn node_position(node: Node) -> Position {
    let point = node.start_position();
    Position::new(point.row + 1, point.column + 1)
}
