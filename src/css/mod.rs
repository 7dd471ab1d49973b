//! CSS stylesheet model
//!
//! Provides the tree the custom property engine operates on:
//! - tree-sitter-css for parsing stylesheet text
//! - a recovering reader for documents the grammar rejects
//! - an owned, mutable node tree
//! - a printer that serializes the tree back to CSS

pub mod constants;
pub mod parser;
pub mod printer;
pub mod recovery;
pub mod tree;
