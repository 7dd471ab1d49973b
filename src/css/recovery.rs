//! Recovering stylesheet reader
//!
//! Used when tree-sitter-css reports errors for a document. The grammar
//! rejects declaration values it cannot tokenize (`var(--a, )`, an empty
//! value, an unclosed `var(`), but the custom property engine wants the raw
//! text of such values so its own checks decide what is an error. This reader
//! only splits the document into statements, blocks and declarations; values
//! are kept verbatim.

use crate::css::constants::IMPORTANT_FLAG;
use crate::css::tree::{AtRule, Declaration, Node, Position, Rule, Stylesheet};
use crate::error::{ProcessError, ProcessResult};

/// Read a stylesheet, keeping declaration values as raw text
pub fn parse_stylesheet(content: &str) -> ProcessResult<Stylesheet> {
    let mut reader = Reader::new(content);
    let nodes = reader.parse_nodes(None)?;
    Ok(Stylesheet { nodes })
}

/// What ends the text of a prelude or value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    OpenBrace,
    Semicolon,
    CloseBrace,
    Eof,
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_to(&mut self, target: usize) {
        while self.pos < target && !self.is_eof() {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn error(&self, position: Position, message: impl Into<String>) -> ProcessError {
        ProcessError::Parse {
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }

    /// Read statements until the end of input, or until the `}` closing the
    /// block opened at `block_start`
    fn parse_nodes(&mut self, block_start: Option<Position>) -> ProcessResult<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.current() else {
                return match block_start {
                    Some(start) => Err(self.error(start, "unclosed block")),
                    None => Ok(nodes),
                };
            };

            match c {
                '}' => {
                    if block_start.is_none() {
                        return Err(self.error(self.position(), "unexpected '}'"));
                    }
                    self.advance();
                    return Ok(nodes);
                }
                ';' => self.advance(),
                '/' if self.starts_with("/*") => nodes.push(self.parse_comment()?),
                '@' => nodes.push(Node::AtRule(self.parse_at_rule()?)),
                _ => nodes.push(self.parse_rule_or_declaration()?),
            }
        }
    }

    fn parse_comment(&mut self) -> ProcessResult<Node> {
        let start = self.position();
        let begin = self.pos;
        let Some(offset) = self.input[begin + 2..].find("*/") else {
            return Err(self.error(start, "unterminated comment"));
        };
        let end = begin + 2 + offset + 2;
        self.advance_to(end);
        Ok(Node::Comment(self.input[begin..end].to_string()))
    }

    fn parse_at_rule(&mut self) -> ProcessResult<AtRule> {
        let start = self.position();
        self.advance(); // @
        let name_start = self.pos;
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let name = self.input[name_start..self.pos].to_string();
        if name.is_empty() {
            return Err(self.error(start, "at-rule without a name"));
        }

        let (end, stop) = scan(self.input, self.pos, true);
        let params = self.input[self.pos..end].trim().to_string();
        self.advance_to(end);

        let nodes = match stop {
            Stop::OpenBrace => {
                self.advance();
                Some(self.parse_nodes(Some(start))?)
            }
            Stop::Semicolon => {
                self.advance();
                None
            }
            Stop::CloseBrace | Stop::Eof => None,
        };

        Ok(AtRule {
            name,
            params,
            nodes,
            position: Some(start),
        })
    }

    fn parse_rule_or_declaration(&mut self) -> ProcessResult<Node> {
        let start = self.position();
        let (end, stop) = scan(self.input, self.pos, false);
        if stop != Stop::OpenBrace {
            return self.parse_declaration(start).map(Node::Declaration);
        }

        let selector = self.input[self.pos..end].trim().to_string();
        self.advance_to(end);
        self.advance(); // {
        let nodes = self.parse_nodes(Some(start))?;
        Ok(Node::Rule(Rule {
            selector,
            nodes,
            position: Some(start),
        }))
    }

    fn parse_declaration(&mut self, start: Position) -> ProcessResult<Declaration> {
        let (end, stop) = value_end(self.input, self.pos);
        let text = &self.input[self.pos..end];
        let Some(colon) = text.find(':') else {
            return Err(self.error(start, format!("expected ':' in '{}'", text.trim())));
        };

        let property = text[..colon].trim().to_string();
        if property.is_empty() {
            return Err(self.error(start, "declaration without a property name"));
        }
        let (value, important) = split_important(text[colon + 1..].trim());

        self.advance_to(end);
        if stop == Stop::Semicolon {
            self.advance();
        }

        Ok(Declaration {
            property,
            value: value.to_string(),
            important,
            position: Some(start),
        })
    }
}

/// Find the first `{`, `;` or `}` outside strings and comments
///
/// With `nested` set, punctuation inside parentheses is skipped too, as in
/// `@supports (display: grid)` or `url(data:a;b)`.
fn scan(input: &str, from: usize, nested: bool) -> (usize, Stop) {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    match input[i + 2..].find("*/") {
                        Some(offset) => i += offset + 3,
                        None => return (bytes.len(), Stop::Eof),
                    }
                }
                b'(' if nested => depth += 1,
                b')' if nested => depth = depth.saturating_sub(1),
                b'{' if depth == 0 => return (i, Stop::OpenBrace),
                b';' if depth == 0 => return (i, Stop::Semicolon),
                b'}' if depth == 0 => return (i, Stop::CloseBrace),
                _ => {}
            },
        }
        i += 1;
    }
    (bytes.len(), Stop::Eof)
}

/// End of a declaration starting at `from`
///
/// Parentheses are honored so `url(data:a;b)` stays whole. When they never
/// close before the enclosing block does, the value ends at the first `;` or
/// `}` instead and keeps its unclosed bracket for the engine to report.
fn value_end(input: &str, from: usize) -> (usize, Stop) {
    let (end, stop) = scan(input, from, true);
    if stop != Stop::Eof {
        return (end, stop);
    }
    match scan(input, from, false) {
        (end, Stop::OpenBrace) => (end, Stop::Eof),
        found => found,
    }
}

/// Strip a trailing `!important`, which may have space after the `!`
fn split_important(value: &str) -> (&str, bool) {
    let flag = &IMPORTANT_FLAG[1..];
    let Some(bang) = value.rfind('!') else {
        return (value, false);
    };
    if value[bang + 1..].trim().eq_ignore_ascii_case(flag) {
        (value[..bang].trim_end(), true)
    } else {
        (value, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_rules_declarations_and_at_rules() {
        let content = "/* c */\n:root {\n  --a: 1px;\n}\n@media print { .x { color: var(--a) !important } }\n@import \"a.css\";";
        let sheet = parse_stylesheet(content).unwrap();

        assert_eq!(sheet.nodes.len(), 4);
        assert_eq!(sheet.nodes[0], Node::Comment("/* c */".to_string()));
        let Node::Rule(root) = &sheet.nodes[1] else {
            panic!("expected a rule, got {:?}", sheet.nodes[1]);
        };
        assert_eq!(root.selector, ":root");
        assert_eq!(root.position, Some(Position::new(2, 1)));

        let declarations = sheet.declarations();
        assert_eq!(declarations[0].property, "--a");
        assert_eq!(declarations[0].position, Some(Position::new(3, 3)));
        assert_eq!(declarations[1].value, "var(--a)");
        assert!(declarations[1].important);

        let Node::AtRule(import) = &sheet.nodes[3] else {
            panic!("expected an at-rule, got {:?}", sheet.nodes[3]);
        };
        assert_eq!(import.name, "import");
        assert_eq!(import.params, "\"a.css\"");
        assert!(import.nodes.is_none());
    }

    #[test]
    fn test_values_are_kept_verbatim() {
        let sheet = parse_stylesheet(":root { --empty: ; --a: var(--b, ); --img: url(data:a;b) }").unwrap();
        assert_eq!(sheet.values_of("--empty"), vec![""]);
        assert_eq!(sheet.values_of("--a"), vec!["var(--b, )"]);
        assert_eq!(sheet.values_of("--img"), vec!["url(data:a;b)"]);
    }

    #[test]
    fn test_unclosed_function_ends_at_the_declaration() {
        let sheet = parse_stylesheet(".x { color: var(--a; width: 1px; }\n.y { top: 0 }").unwrap();
        assert_eq!(sheet.values_of("color"), vec!["var(--a"]);
        assert_eq!(sheet.values_of("width"), vec!["1px"]);
        assert_eq!(sheet.values_of("top"), vec!["0"]);

        let sheet = parse_stylesheet(".x { color: var(--a }").unwrap();
        assert_eq!(sheet.values_of("color"), vec!["var(--a"]);
    }

    #[test]
    fn test_structural_errors_are_reported() {
        for content in [".a { color: red; \n .b {", ".a { color: red; } }", ".a { color }", "/* open"] {
            let result = parse_stylesheet(content);
            assert!(
                matches!(result, Err(ProcessError::Parse { .. })),
                "content: {:?}, result: {:?}",
                content,
                result
            );
        }
    }

    #[test]
    fn test_split_important() {
        assert_eq!(split_important("red !important"), ("red", true));
        assert_eq!(split_important("red ! IMPORTANT"), ("red", true));
        assert_eq!(split_important("red"), ("red", false));
        assert_eq!(split_important("\"!\" red"), ("\"!\" red", false));
    }
}
