mod logging;

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use css_custom_properties::css::parser::CssParser;
use css_custom_properties::css::printer::{print_outline, print_stylesheet};
use css_custom_properties::error::IoContext;
use css_custom_properties::{CustomProperties, Options, ProcessResult};
use log::{error, info};

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Invocation {
    input: PathBuf,
    options: Option<PathBuf>,
    outline: bool,
}

fn parse_args(args: &[String]) -> Option<Invocation> {
    let mut outline = false;
    let mut paths = Vec::new();
    for arg in args.iter().skip(1) {
        if arg == "--outline" {
            outline = true;
        } else {
            paths.push(PathBuf::from(arg));
        }
    }

    let mut paths = paths.into_iter();
    let input = paths.next()?;
    let options = paths.next();
    if paths.next().is_some() {
        return None;
    }
    Some(Invocation { input, options, outline })
}

fn run(invocation: &Invocation) -> ProcessResult<String> {
    let options = match &invocation.options {
        Some(path) => {
            let text = fs::read_to_string(path).with_path(path, "Failed to read options file")?;
            Options::from_json(&text)?
        }
        None => Options::default(),
    };

    let content =
        fs::read_to_string(&invocation.input).with_path(&invocation.input, "Failed to read stylesheet")?;
    let mut parser = CssParser::new()?;
    let mut stylesheet = parser.parse(&content)?;

    let engine = CustomProperties::new(options);
    let output = engine.process(&mut stylesheet)?;
    for event in &output.diagnostics {
        eprintln!("warning: {}", event);
    }

    if invocation.outline {
        Ok(print_outline(&stylesheet))
    } else {
        Ok(print_stylesheet(&stylesheet))
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let Some(invocation) = parse_args(&args) else {
        // Logger isn't initialized yet
        eprintln!("Usage: {} <input.css> [options.json] [--outline]", args[0]);
        eprintln!("  <input.css>:    stylesheet to process");
        eprintln!("  [options.json]: processing options (variables, preserve, appendVariables, strict, warnings)");
        eprintln!("  --outline:      print the processed tree instead of CSS");
        process::exit(1);
    };

    match logging::init_logger() {
        Ok(path) => info!("Logging to {}", path.display()),
        Err(e) => eprintln!("Failed to initialize logger: {}", e),
    }
    info!("Command line arguments: {:?}", args);

    match run(&invocation) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            error!("Processing {} failed: {}", invocation.input.display(), e);
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("css_custom_properties")
            .chain(values.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(&args(&[])), None);
        assert_eq!(
            parse_args(&args(&["a.css"])),
            Some(Invocation {
                input: PathBuf::from("a.css"),
                options: None,
                outline: false
            })
        );
        assert_eq!(
            parse_args(&args(&["--outline", "a.css", "o.json"])),
            Some(Invocation {
                input: PathBuf::from("a.css"),
                options: Some(PathBuf::from("o.json")),
                outline: true
            })
        );
        assert_eq!(parse_args(&args(&["a.css", "o.json", "extra"])), None);
    }

    #[test]
    fn test_run_with_options_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.css");
        let options = temp_dir.path().join("options.json");
        fs::write(&input, ":root { --a: 1px; }\n.x { width: var(--a); height: var(--b); }").unwrap();
        fs::write(&options, r#"{ "variables": { "b": "2px" }, "preserve": false }"#).unwrap();

        let invocation = Invocation {
            input,
            options: Some(options),
            outline: false,
        };
        let output = run(&invocation).unwrap();
        assert_eq!(output, ".x {\n  width: 1px;\n  height: 2px;\n}\n");
    }

    #[test]
    fn test_run_reports_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let invocation = Invocation {
            input: temp_dir.path().join("missing.css"),
            options: None,
            outline: false,
        };
        let error = run(&invocation).unwrap_err();
        assert!(error.to_string().contains("Failed to read stylesheet"));
    }

    #[test]
    fn test_run_rejects_invalid_options() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.css");
        let options = temp_dir.path().join("options.json");
        fs::write(&input, ".x { color: red; }").unwrap();
        fs::write(&options, "{ not json").unwrap();

        let invocation = Invocation {
            input,
            options: Some(options),
            outline: false,
        };
        assert!(run(&invocation).is_err());
    }
}
