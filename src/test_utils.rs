//! Test utilities shared across the codebase

use serde_json::Value;

use crate::css::parser::CssParser;
use crate::css::printer::print_stylesheet;
use crate::css::tree::Stylesheet;
use crate::custom_properties::{CustomProperties, Options, ProcessOutput};
use crate::error::ProcessResult;

/// Parse CSS that is known to be valid
pub fn parse_css(content: &str) -> Stylesheet {
    let mut parser = CssParser::new().expect("Failed to create CSS parser");
    parser
        .parse(content)
        .unwrap_or_else(|e| panic!("Failed to parse test CSS: {}\n{}", e, content))
}

/// Parse and process with options given as JSON
pub fn process_sheet(content: &str, options: Value) -> ProcessResult<(Stylesheet, ProcessOutput)> {
    let engine = CustomProperties::new(Options::from_value(options));
    let mut sheet = parse_css(content);
    let output = engine.process(&mut sheet)?;
    Ok((sheet, output))
}

/// Parse, process with options given as JSON, and print the result
pub fn process_css(content: &str, options: Value) -> ProcessResult<(String, ProcessOutput)> {
    let (sheet, output) = process_sheet(content, options)?;
    Ok((print_stylesheet(&sheet), output))
}
