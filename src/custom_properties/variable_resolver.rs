//! Variable resolution for custom property values.
//!
//! Expands every `var(--name[, fallback])` reference in a value string against
//! a [`VariableTable`], recursively, until only literal text remains.
//!
//! - **Cycles**: the names currently being expanded live on a
//!   [`ResolutionContext`]. Meeting one of them again is a circular reference.
//!   The cycle is reported through the diagnostics policy and, when the run
//!   continues, resolves to the nearest fallback up the reference chain, or to
//!   the empty string when no reference in the chain has one.
//! - **Undefined variables**: the fallback is used when present; otherwise a
//!   `no-value` diagnostic is reported and the reference becomes empty.
//! - **Syntax errors**: an empty `var()`, an unclosed bracket, or an argument
//!   that is not a custom property name always abort the run.
//! - **Caching**: a variable whose expansion met no cycle resolves to the same
//!   literal wherever it is used, so the literal is kept for the rest of the
//!   run together with the diagnostics it raised. Each name is expanded at
//!   most once outside of cycles.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::trace;
use regex::Regex;

use crate::css::constants::VAR_FUNCTION;
use crate::custom_properties::policy::{Category, Diagnostics};
use crate::custom_properties::variable_table::{VariableName, VariableTable};
use crate::error::{ProcessError, ProcessResult, SourceLocation};

static CUSTOM_PROPERTY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--[\w-]+$").expect("custom property name pattern is valid")
});

/// Names currently being expanded, innermost last
#[derive(Debug, Default)]
pub struct ResolutionContext {
    stack: Vec<VariableName>,
    active: HashSet<VariableName>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a name; returns false (and leaves the context alone) if it is
    /// already being expanded
    pub fn push(&mut self, name: VariableName) -> bool {
        if self.active.contains(&name) {
            return false;
        }
        self.active.insert(name.clone());
        self.stack.push(name);
        true
    }

    pub fn pop(&mut self) -> Option<VariableName> {
        let name = self.stack.pop()?;
        self.active.remove(&name);
        Some(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.active.contains(name)
    }
}

/// Outcome of expanding a value
#[derive(Debug, Clone, PartialEq)]
enum Expansion {
    Literal(String),
    /// The value hit a cycle that no fallback on the way caught
    Cyclic,
}

/// A single parsed `var()` reference
#[derive(Debug, Clone, PartialEq)]
pub struct Reference<'v> {
    pub name: &'v str,
    pub fallback: Option<&'v str>,
}

/// A variable's literal together with the diagnostics its expansion raised
#[derive(Debug, Clone)]
struct CachedLiteral {
    literal: String,
    reports: Vec<(Category, String)>,
}

/// Literals of variables resolved so far in a run
#[derive(Debug, Default)]
pub struct ResolutionCache {
    literals: HashMap<VariableName, CachedLiteral>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// Expands `var()` references against a variable table
pub struct Resolver<'a> {
    table: &'a VariableTable,
    diagnostics: &'a mut Diagnostics,
    strict: bool,
    cache: ResolutionCache,
    /// Cycles detected so far; a variable is cached only if this did not move
    cycles: usize,
    /// Diagnostics raised during the current top-level call, in order
    raised: Vec<(Category, String)>,
    /// Diagnostics already forwarded during the current top-level call
    forwarded: HashSet<(Category, String)>,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a VariableTable, diagnostics: &'a mut Diagnostics, strict: bool) -> Self {
        Self::with_cache(table, diagnostics, strict, ResolutionCache::new())
    }

    /// Start from literals resolved earlier in the same run
    pub fn with_cache(
        table: &'a VariableTable,
        diagnostics: &'a mut Diagnostics,
        strict: bool,
        cache: ResolutionCache,
    ) -> Self {
        Self {
            table,
            diagnostics,
            strict,
            cache,
            cycles: 0,
            raised: Vec::new(),
            forwarded: HashSet::new(),
        }
    }

    pub fn table(&self) -> &'a VariableTable {
        self.table
    }

    /// Hand the cache back so a later pass of the same run can reuse it
    pub fn into_cache(self) -> ResolutionCache {
        self.cache
    }

    /// Resolve a value to literal text
    ///
    /// `context` names the variable whose own value is being resolved, so a
    /// declaration that refers to itself is caught immediately. Values with
    /// no reference are returned untouched.
    pub fn resolve(
        &mut self,
        value: &str,
        location: &SourceLocation,
        context: Option<&VariableName>,
    ) -> ProcessResult<String> {
        if !contains_reference(value) {
            return Ok(value.to_string());
        }

        self.begin();
        let mut resolution = ResolutionContext::new();
        if let Some(name) = context {
            resolution.push(name.clone());
        }

        let expansion = self.expand(value, location, &mut resolution)?;
        self.finish(value, expansion, location)
    }

    /// Resolve a variable of the table by name
    ///
    /// Same result as resolving its value with the name itself as context,
    /// but shares the run's cache. Undefined names resolve to the empty
    /// string without a diagnostic.
    pub fn resolve_variable(&mut self, name: &VariableName, location: &SourceLocation) -> ProcessResult<String> {
        let table = self.table;
        let Some(value) = table.get(name.as_str()) else {
            return Ok(String::new());
        };
        if !contains_reference(value.as_str()) {
            return Ok(value.as_str().to_string());
        }

        self.begin();
        let reference = Reference {
            name: name.as_str(),
            fallback: None,
        };
        let expansion = self.resolve_reference(&reference, location, &mut ResolutionContext::new())?;
        self.finish(value.as_str(), expansion, location)
    }

    fn begin(&mut self) {
        self.raised.clear();
        self.forwarded.clear();
    }

    fn finish(&mut self, value: &str, expansion: Expansion, location: &SourceLocation) -> ProcessResult<String> {
        let literal = match expansion {
            Expansion::Literal(text) => text.trim().to_string(),
            Expansion::Cyclic => String::new(),
        };

        if self.strict && !is_well_formed(&literal) {
            return Err(ProcessError::MalformedValue {
                value: literal,
                location: location.clone(),
            });
        }

        trace!("Resolved '{}' to '{}'", value, literal);
        Ok(literal)
    }

    /// Record a diagnostic; identical ones within one top-level call are
    /// forwarded to the policy once
    fn report(&mut self, category: Category, message: String, location: &SourceLocation) -> ProcessResult<()> {
        self.raised.push((category, message.clone()));
        if self.forwarded.insert((category, message.clone())) {
            self.diagnostics.report(category, message, location)?;
        }
        Ok(())
    }

    fn expand(
        &mut self,
        value: &str,
        location: &SourceLocation,
        context: &mut ResolutionContext,
    ) -> ProcessResult<Expansion> {
        let mut output = String::with_capacity(value.len());
        let mut cursor = 0;

        while let Some(start) = find_reference_start(value, cursor) {
            let open = start + VAR_FUNCTION.len();
            let close = find_closing_paren(value, open).ok_or_else(|| {
                ProcessError::UnclosedBracket {
                    value: value.to_string(),
                    location: location.clone(),
                }
            })?;
            let reference = parse_reference(&value[open + 1..close], location)?;

            output.push_str(&value[cursor..start]);
            match self.resolve_reference(&reference, location, context)? {
                Expansion::Literal(text) => output.push_str(&text),
                Expansion::Cyclic => return Ok(Expansion::Cyclic),
            }
            cursor = close + 1;
        }

        output.push_str(&value[cursor..]);
        Ok(Expansion::Literal(output))
    }

    fn resolve_reference(
        &mut self,
        reference: &Reference<'_>,
        location: &SourceLocation,
        context: &mut ResolutionContext,
    ) -> ProcessResult<Expansion> {
        if context.contains(reference.name) {
            self.cycles += 1;
            self.report(
                Category::CircularReference,
                format!("Circular variable reference: {}", reference.name),
                location,
            )?;
            return self.expand_fallback(reference, location, context);
        }

        if let Some(cached) = self.cache.literals.get(reference.name).cloned() {
            for (category, message) in cached.reports {
                self.report(category, message, location)?;
            }
            return Ok(Expansion::Literal(cached.literal));
        }

        let table = self.table;
        match table.get(reference.name) {
            Some(value) => match self.expand_variable(reference.name, value.as_str(), location, context)? {
                Expansion::Cyclic => self.expand_fallback(reference, location, context),
                literal => Ok(literal),
            },
            None => match reference.fallback {
                Some(fallback) => {
                    if self.diagnostics.policy().reports_fallbacks() {
                        self.report(
                            Category::NoValue,
                            format!("variable '{}' is undefined, using its fallback", reference.name),
                            location,
                        )?;
                    }
                    self.expand(fallback, location, context)
                }
                None => {
                    self.report(
                        Category::NoValue,
                        format!(
                            "variable '{}' is undefined and used without a fallback",
                            reference.name
                        ),
                        location,
                    )?;
                    Ok(Expansion::Literal(String::new()))
                }
            },
        }
    }

    /// Expand a defined variable's value with its name on the context
    fn expand_variable(
        &mut self,
        name: &str,
        value: &str,
        location: &SourceLocation,
        context: &mut ResolutionContext,
    ) -> ProcessResult<Expansion> {
        let cycles_before = self.cycles;
        let raised_before = self.raised.len();

        context.push(VariableName::new(name));
        let expansion = self.expand(value, location, context);
        context.pop();
        let expansion = expansion?;

        // A cycle anywhere below makes the literal depend on the reference chain
        if let Expansion::Literal(literal) = &expansion {
            if self.cycles == cycles_before {
                let mut reports: Vec<(Category, String)> = Vec::new();
                for report in &self.raised[raised_before..] {
                    if !reports.contains(report) {
                        reports.push(report.clone());
                    }
                }
                self.cache.literals.insert(
                    VariableName::new(name),
                    CachedLiteral {
                        literal: literal.clone(),
                        reports,
                    },
                );
            }
        }
        Ok(expansion)
    }

    fn expand_fallback(
        &mut self,
        reference: &Reference<'_>,
        location: &SourceLocation,
        context: &mut ResolutionContext,
    ) -> ProcessResult<Expansion> {
        match reference.fallback {
            Some(fallback) => self.expand(fallback, location, context),
            None => Ok(Expansion::Cyclic),
        }
    }
}

/// Whether a value contains at least one `var()` reference
pub fn contains_reference(value: &str) -> bool {
    find_reference_start(value, 0).is_some()
}

/// Split `--name, fallback` and validate the name
fn parse_reference<'v>(arguments: &'v str, location: &SourceLocation) -> ProcessResult<Reference<'v>> {
    if arguments.trim().is_empty() {
        return Err(ProcessError::EmptyReference {
            location: location.clone(),
        });
    }

    let (name, fallback) = split_arguments(arguments);
    let name = name.trim();
    if !CUSTOM_PROPERTY_NAME.is_match(name) {
        return Err(ProcessError::InvalidReference {
            argument: name.to_string(),
            location: location.clone(),
        });
    }

    Ok(Reference {
        name,
        fallback: fallback.map(str::trim),
    })
}

/// Split at the first comma outside nested parentheses and strings
fn split_arguments(arguments: &str) -> (&str, Option<&str>) {
    let bytes = arguments.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

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
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => return (&arguments[..i], Some(&arguments[i + 1..])),
                _ => {}
            },
        }
        i += 1;
    }
    (arguments, None)
}

/// Byte offset of the next `var(` at or after `from`, skipping strings
fn find_reference_start(value: &str, from: usize) -> Option<usize> {
    let bytes = value.as_bytes();
    let pattern = b"var(";
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
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if bytes[i..].len() >= pattern.len()
                    && bytes[i..i + pattern.len()].eq_ignore_ascii_case(pattern)
                    && (i == 0 || !is_ident_byte(bytes[i - 1]))
                {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Byte offset of the `)` matching the `(` at `open`
fn find_closing_paren(value: &str, open: usize) -> Option<usize> {
    let bytes = value.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;

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
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

/// Balanced brackets, closed strings, no block or statement punctuation
/// outside brackets and no leftover `var()`
///
/// The body of an unquoted `url(...)` is taken as is.
pub fn is_well_formed(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut brackets: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = 0;

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
                b'\\' => i += 1,
                b'(' => {
                    if let Some(close) = unquoted_url_end(bytes, i) {
                        i = close;
                    } else {
                        brackets.push(b')');
                    }
                }
                b'[' => brackets.push(b']'),
                b')' | b']' => {
                    if brackets.pop() != Some(b) {
                        return false;
                    }
                }
                b'{' | b'}' | b';' if brackets.is_empty() => return false,
                _ => {}
            },
        }
        i += 1;
    }

    quote.is_none() && brackets.is_empty() && !contains_reference(value)
}

/// For the `(` at `open`, the offset of the `)` closing an unquoted `url(`
fn unquoted_url_end(bytes: &[u8], open: usize) -> Option<usize> {
    let name = b"url";
    if open < name.len() || !bytes[open - name.len()..open].eq_ignore_ascii_case(name) {
        return None;
    }
    if open > name.len() && is_ident_byte(bytes[open - name.len() - 1]) {
        return None;
    }
    let body = &bytes[open + 1..];
    let first = body.iter().position(|b| !b.is_ascii_whitespace())?;
    if body[first] == b'"' || body[first] == b'\'' {
        return None;
    }
    body.iter().position(|&b| b == b')').map(|offset| open + 1 + offset)
}
