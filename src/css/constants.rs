//! CSS Tree-sitter Node Kind Constants
//!
//! Node kinds produced by tree-sitter-css that the parser adapter cares about,
//! plus the handful of CSS tokens the custom property engine matches on.
//! Centralizing these keeps the string literals out of the conversion code.

// Basic structural nodes
/// Root node of the CSS syntax tree
pub const NODE_STYLESHEET: &str = "stylesheet";
/// A CSS rule containing selectors and a declaration block
pub const NODE_RULE_SET: &str = "rule_set";
/// A block of declarations enclosed in curly braces
pub const NODE_BLOCK: &str = "block";
/// A single property-value pair (e.g., `color: red;`)
pub const NODE_DECLARATION: &str = "declaration";
/// Container for one or more selectors
pub const NODE_SELECTORS: &str = "selectors";
/// Property name of a declaration (e.g., `color`, `--main-bg`)
pub const NODE_PROPERTY_NAME: &str = "property_name";
/// The `!important` flag of a declaration
pub const NODE_IMPORTANT: &str = "important";

// At-rules
/// Generic CSS at-rule (e.g., `@layer`, `@font-face`)
pub const NODE_AT_RULE: &str = "at_rule";
/// CSS import statement for external stylesheets
pub const NODE_IMPORT_STATEMENT: &str = "import_statement";
/// CSS charset declaration statement
pub const NODE_CHARSET_STATEMENT: &str = "charset_statement";
/// CSS namespace declaration statement
pub const NODE_NAMESPACE_STATEMENT: &str = "namespace_statement";
/// CSS media query statement
pub const NODE_MEDIA_STATEMENT: &str = "media_statement";
/// CSS feature query statement
pub const NODE_SUPPORTS_STATEMENT: &str = "supports_statement";
/// CSS scope statement
pub const NODE_SCOPE_STATEMENT: &str = "scope_statement";
/// CSS keyframes animation definition
pub const NODE_KEYFRAMES_STATEMENT: &str = "keyframes_statement";
/// Brace-delimited list of keyframe blocks
pub const NODE_KEYFRAME_BLOCK_LIST: &str = "keyframe_block_list";
/// A single `from { ... }` / `50% { ... }` keyframe
pub const NODE_KEYFRAME_BLOCK: &str = "keyframe_block";

// Punctuation
/// Colon separator between property and value
pub const NODE_COLON: &str = ":";
/// Semicolon terminator for declarations
pub const NODE_SEMICOLON: &str = ";";

// Comments
/// CSS comment block (e.g., `/* comment */`)
pub const NODE_COMMENT: &str = "comment";

// CSS tokens
/// Prefix every custom property name carries
pub const CUSTOM_PROPERTY_PREFIX: &str = "--";
/// Selector matching the document root
pub const ROOT_SELECTOR: &str = ":root";
/// Name of the variable substitution function
pub const VAR_FUNCTION: &str = "var";
/// Importance flag as written in source
pub const IMPORTANT_FLAG: &str = "!important";
