use crate::custom_properties::policy::{Category, DiagnosticEvent, Diagnostics, DiagnosticsPolicy, Severity};
use crate::custom_properties::variable_resolver::Resolver;
use crate::custom_properties::variable_table::{VariableName, VariableTable};
use crate::error::{ProcessError, ProcessResult, SourceLocation};

fn table(entries: &[(&str, &str)]) -> VariableTable {
    let mut table = VariableTable::new();
    table.seed(entries.iter().copied());
    table
}

fn location() -> SourceLocation {
    SourceLocation::new("color", None)
}

fn resolve_full(
    table: &VariableTable,
    policy: DiagnosticsPolicy,
    strict: bool,
    value: &str,
    context: Option<&VariableName>,
) -> (ProcessResult<String>, Vec<DiagnosticEvent>) {
    let mut diagnostics = Diagnostics::new(policy);
    let result = {
        let mut resolver = Resolver::new(table, &mut diagnostics, strict);
        resolver.resolve(value, &location(), context)
    };
    (result, diagnostics.into_events())
}

fn resolve_warn(table: &VariableTable, value: &str) -> (ProcessResult<String>, Vec<DiagnosticEvent>) {
    resolve_full(table, DiagnosticsPolicy::uniform(Severity::Warn), true, value, None)
}

#[test]
fn test_literal_values_are_unchanged() {
    let table = table(&[("--a", "1px")]);
    for value in ["1px solid red", "  spaced  ", "\"var(--a)\"", ""] {
        let (result, events) = resolve_warn(&table, value);
        assert_eq!(result.unwrap(), value);
        assert!(events.is_empty());
    }
}

#[test]
fn test_simple_substitution() {
    let table = table(&[("--a", "1px")]);
    let (result, events) = resolve_warn(&table, "var(--a) solid var(--a)");
    assert_eq!(result.unwrap(), "1px solid 1px");
    assert!(events.is_empty());
}

#[test]
fn test_chained_references() {
    let table = table(&[
        ("--test-one", "js-one"),
        ("--test-varception", "var(--test-one)"),
        ("--test-jsception", "var(--test-varception)"),
    ]);
    let (result, _) = resolve_warn(&table, "var(--test-jsception)");
    assert_eq!(result.unwrap(), "js-one");
}

#[test]
fn test_shared_dependency_is_not_a_cycle() {
    let table = table(&[
        ("--a", "var(--b) var(--c)"),
        ("--b", "var(--d)"),
        ("--c", "var(--d)"),
        ("--d", "x"),
    ]);
    let (result, events) = resolve_warn(&table, "var(--a)");
    assert_eq!(result.unwrap(), "x x");
    assert!(events.is_empty());
}

#[test]
fn test_fallback_for_undefined_variable() {
    let table = table(&[("--a", "1px")]);

    let (result, events) = resolve_warn(&table, "var(--missing, 2px)");
    assert_eq!(result.unwrap(), "2px");
    assert!(events.is_empty());

    let (result, _) = resolve_warn(&table, "var(--missing, var(--a))");
    assert_eq!(result.unwrap(), "1px");

    let (result, _) = resolve_warn(&table, "var(--missing, rgb(1, 2, 3))");
    assert_eq!(result.unwrap(), "rgb(1, 2, 3)");

    let (result, _) = resolve_warn(&table, "var(--missing,) 1px");
    assert_eq!(result.unwrap(), "1px");
}

#[test]
fn test_fallback_reports_when_enabled() {
    let table = VariableTable::new();
    let policy = DiagnosticsPolicy::uniform(Severity::Warn).with_fallback_reports(true);
    let (result, events) = resolve_full(&table, policy, true, "var(--missing, 2px)", None);
    assert_eq!(result.unwrap(), "2px");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, Category::NoValue);
    assert!(events[0].message.contains("--missing"));
}

#[test]
fn test_undefined_without_fallback_warns() {
    let table = VariableTable::new();
    let (result, events) = resolve_warn(&table, "1px var(--test)");
    assert_eq!(result.unwrap(), "1px");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, Category::NoValue);
    assert_eq!(
        events[0].message,
        "variable '--test' is undefined and used without a fallback"
    );
}

#[test]
fn test_undefined_without_fallback_silent() {
    let table = VariableTable::new();
    let (result, events) = resolve_full(&table, DiagnosticsPolicy::silent(), true, "var(--test)", None);
    assert_eq!(result.unwrap(), "");
    assert!(events.is_empty());
}

#[test]
fn test_undefined_without_fallback_error() {
    let table = VariableTable::new();
    let policy = DiagnosticsPolicy::silent().with_severity(Category::NoValue, Severity::Error);
    let (result, events) = resolve_full(&table, policy, true, "var(--test)", None);
    let error = result.unwrap_err();
    assert_eq!(error.category(), Some(Category::NoValue));
    assert!(error
        .to_string()
        .contains("variable '--test' is undefined and used without a fallback"));
    assert!(events.is_empty());
}

#[test]
fn test_self_reference_warns_and_terminates() {
    let table = table(&[("--bg-color", "var(--bg-color)")]);
    let (result, events) = resolve_warn(&table, "var(--bg-color)");
    assert_eq!(result.unwrap(), "");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].category, Category::CircularReference);
    assert_eq!(events[0].message, "Circular variable reference: --bg-color");
}

#[test]
fn test_self_reference_error() {
    let table = table(&[("--bg-color", "var(--bg-color)")]);
    let policy = DiagnosticsPolicy::silent().with_severity(Category::CircularReference, Severity::Error);
    let (result, _) = resolve_full(&table, policy, true, "var(--bg-color)", None);
    let error = result.unwrap_err();
    assert_eq!(error.category(), Some(Category::CircularReference));
    assert!(error.to_string().contains("Circular variable reference: --bg-color"));
}

#[test]
fn test_self_reference_uses_own_fallback() {
    let table = table(&[("--bg", "var(--bg, red)")]);
    let (result, events) = resolve_warn(&table, "var(--bg)");
    assert_eq!(result.unwrap(), "red");
    assert_eq!(events.len(), 1);
}

#[test]
fn test_cycle_uses_nearest_fallback_up_the_chain() {
    let table = table(&[("--a", "var(--b)"), ("--b", "var(--a)")]);
    let (result, events) = resolve_warn(&table, "var(--a, blue)");
    assert_eq!(result.unwrap(), "blue");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Circular variable reference: --a");
}

#[test]
fn test_cycle_invalidates_whole_value() {
    let table = table(&[("--a", "1px var(--a)")]);
    let (result, _) = resolve_warn(&table, "var(--a) 2px");
    assert_eq!(result.unwrap(), "");
}

#[test]
fn test_long_cycle_terminates_with_one_report() {
    let names: Vec<String> = (0..50).map(|i| format!("--v{}", i)).collect();
    let mut table = VariableTable::new();
    for (i, name) in names.iter().enumerate() {
        let next = &names[(i + 1) % names.len()];
        table.seed([(name.as_str(), format!("var({})", next))]);
    }

    let (result, events) = resolve_warn(&table, "var(--v0)");
    assert_eq!(result.unwrap(), "");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, "Circular variable reference: --v0");
}

#[test]
fn test_context_name_catches_self_reference() {
    let table = table(&[("--self", "var(--self, 3px)")]);
    let name = VariableName::new("--self");
    let (result, events) = resolve_full(
        &table,
        DiagnosticsPolicy::uniform(Severity::Warn),
        true,
        "var(--self, 3px)",
        Some(&name),
    );
    assert_eq!(result.unwrap(), "3px");
    assert_eq!(events.len(), 1);
}

#[test]
fn test_whitespace_around_reference_is_ignored() {
    let table = table(&[("--a", "1px")]);
    for value in ["var( --a )", "var(--a , 2px)", "var(--a)  "] {
        let (result, _) = resolve_warn(&table, value);
        assert_eq!(result.unwrap(), "1px", "value: {:?}", value);
    }
}

#[test]
fn test_function_name_is_case_insensitive() {
    let table = table(&[("--a", "1px")]);
    let (result, _) = resolve_warn(&table, "VAR(--a)");
    assert_eq!(result.unwrap(), "1px");
}

#[test]
fn test_references_inside_strings_are_kept() {
    let table = table(&[("--a", "1px")]);
    let (result, _) = resolve_warn(&table, "var(--a) \"var(--a)\"");
    assert_eq!(result.unwrap(), "1px \"var(--a)\"");
}

#[test]
fn test_empty_reference_is_fatal_regardless_of_policy() {
    let table = VariableTable::new();
    for value in ["var()", "1px var(   )"] {
        let (result, _) = resolve_full(&table, DiagnosticsPolicy::silent(), true, value, None);
        let error = result.unwrap_err();
        assert!(matches!(error, ProcessError::EmptyReference { .. }));
        assert!(error.to_string().contains("must contain a non-whitespace string"));
    }
}

#[test]
fn test_unclosed_bracket_is_fatal() {
    let table = table(&[("--a", "1px")]);
    let (result, _) = resolve_full(&table, DiagnosticsPolicy::silent(), true, "var(--a", None);
    let error = result.unwrap_err();
    assert!(matches!(error, ProcessError::UnclosedBracket { .. }));
    assert!(error.to_string().contains("Unclosed bracket"));

    let (result, _) = resolve_full(&table, DiagnosticsPolicy::silent(), true, "var(--missing, calc(1px)", None);
    assert!(matches!(result, Err(ProcessError::UnclosedBracket { .. })));
}

#[test]
fn test_invalid_reference_name_is_fatal() {
    let table = VariableTable::new();
    let (result, _) = resolve_full(&table, DiagnosticsPolicy::silent(), true, "var(color)", None);
    assert!(matches!(
        result,
        Err(ProcessError::InvalidReference { ref argument, .. }) if argument == "color"
    ));
}

#[test]
fn test_strict_rejects_malformed_output() {
    let table = table(&[("--broken", "calc(1px")]);

    let (result, _) = resolve_full(&table, DiagnosticsPolicy::silent(), true, "var(--broken)", None);
    assert!(matches!(result, Err(ProcessError::MalformedValue { .. })));

    let (result, _) = resolve_full(&table, DiagnosticsPolicy::silent(), false, "var(--broken)", None);
    assert_eq!(result.unwrap(), "calc(1px");
}

fn fan_out_table(depth: usize, base: Option<&str>) -> VariableTable {
    let mut table = VariableTable::new();
    if let Some(base) = base {
        table.seed([("--v0", base)]);
    }
    for i in 1..=depth {
        table.seed([(format!("--v{}", i), format!("var(--v{})var(--v{})", i - 1, i - 1))]);
    }
    table
}

#[test]
fn test_shared_references_resolve_in_linear_time() {
    // Without reuse this would expand 2^64 references
    let table = fan_out_table(64, Some(""));
    let (result, events) = resolve_warn(&table, "var(--v64, 0)");
    assert_eq!(result.unwrap(), "");
    assert!(events.is_empty());
}

#[test]
fn test_reused_variable_reports_its_diagnostics_once_per_value() {
    let table = fan_out_table(64, None);
    let (result, events) = resolve_warn(&table, "var(--v64)");
    assert_eq!(result.unwrap(), "");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].message,
        "variable '--v0' is undefined and used without a fallback"
    );
}

#[test]
fn test_reused_variable_reports_again_in_a_later_value() {
    let table = table(&[("--a", "var(--missing) 1px")]);
    let mut diagnostics = Diagnostics::new(DiagnosticsPolicy::uniform(Severity::Warn));
    {
        let mut resolver = Resolver::new(&table, &mut diagnostics, true);
        assert_eq!(resolver.resolve("var(--a)", &location(), None).unwrap(), "1px");
        assert_eq!(resolver.resolve("var(--a) 2px", &location(), None).unwrap(), "1px 2px");
        assert_eq!(resolver.into_cache().len(), 1);
    }
    assert_eq!(diagnostics.events().len(), 2);
}

#[test]
fn test_cycle_results_depend_on_where_the_cycle_is_entered() {
    let table = table(&[("--x", "var(--a, fx)"), ("--a", "var(--x, fa)")]);
    let (result, events) = resolve_warn(&table, "var(--x) var(--a)");
    assert_eq!(result.unwrap(), "fa fx");
    assert_eq!(events.len(), 2);
}

#[test]
fn test_resolve_variable_by_name() {
    let table = table(&[("--a", "1px"), ("--b", "var(--a) solid"), ("--self", "var(--self)")]);
    let mut diagnostics = Diagnostics::new(DiagnosticsPolicy::uniform(Severity::Warn));
    let mut resolver = Resolver::new(&table, &mut diagnostics, true);

    assert_eq!(resolver.resolve_variable(&VariableName::new("--a"), &location()).unwrap(), "1px");
    assert_eq!(
        resolver.resolve_variable(&VariableName::new("b"), &location()).unwrap(),
        "1px solid"
    );
    assert_eq!(resolver.resolve_variable(&VariableName::new("--self"), &location()).unwrap(), "");
    assert_eq!(resolver.resolve_variable(&VariableName::new("--none"), &location()).unwrap(), "");
}

#[test]
fn test_strict_accepts_data_urls() {
    let table = table(&[("--img", "url(data:image/png;base64,AAAA)")]);
    let (result, _) = resolve_warn(&table, "var(--img) no-repeat");
    assert_eq!(result.unwrap(), "url(data:image/png;base64,AAAA) no-repeat");
}
