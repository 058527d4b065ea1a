//! Fixture runner: decodes every case in `fixtures/*.json` and compares the
//! JSON descriptor (or the error code) with the expectation.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/*.json");

#[derive(Debug, Parser)]
#[command(about = "Run the type-string fixture suites")]
struct Args {
    /// Only run cases whose name matches this regex.
    #[arg(long)]
    filter: Option<Regex>,
    /// Fixture files; defaults to every suite under `fixtures/`.
    fixtures: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    input: String,
    #[serde(default)]
    expect: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

enum Outcome {
    Pass,
    Fail(String),
}

fn main() -> ExitCode {
    let Args { filter, mut fixtures } = Args::parse();
    if fixtures.is_empty() {
        match default_fixtures() {
            Ok(found) => fixtures = found,
            Err(error) => {
                eprintln!("failed to list fixtures: {error}");
                return ExitCode::from(2);
            }
        }
    }

    let (mut passed, mut failed) = (0usize, 0usize);
    for file in &fixtures {
        let cases = match load_cases(file) {
            Ok(cases) => cases,
            Err(error) => {
                eprintln!("❌ {}: {error}", file.display());
                failed += 1;
                continue;
            }
        };
        for case in cases {
            if filter.as_ref().is_some_and(|rx| !rx.is_match(&case.name)) {
                continue;
            }
            match run_case(&case) {
                Outcome::Pass => passed += 1,
                Outcome::Fail(why) => {
                    failed += 1;
                    eprintln!("❌ {} ({:?}): {why}", case.name, case.input);
                }
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn default_fixtures() -> Result<Vec<PathBuf>, String> {
    let paths = glob::glob(DEFAULT_FIXTURES).map_err(|e| e.to_string())?;
    let mut out = paths
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    out.sort();
    Ok(out)
}

fn load_cases(path: &Path) -> Result<Vec<Case>, String> {
    let src = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize::<_, Vec<Case>>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}

fn run_case(case: &Case) -> Outcome {
    match (dsdl_types::parse(&case.input), &case.expect, &case.error) {
        (Ok(desc), Some(expect), None) => {
            let got = match serde_json::to_value(&desc) {
                Ok(v) => v,
                Err(error) => return Outcome::Fail(format!("serialize: {error}")),
            };
            if &got != expect {
                return Outcome::Fail(format!("expected {expect}, got {got}"));
            }
            match dsdl_types::parse(&desc.to_string()) {
                Ok(again) if again == desc => Outcome::Pass,
                Ok(again) => Outcome::Fail(format!("canonical form {desc} re-parsed as {again:?}")),
                Err(error) => Outcome::Fail(format!("canonical form {desc} failed: {error}")),
            }
        }
        (Err(error), None, Some(code)) => {
            if error.kind.code() == code {
                Outcome::Pass
            } else {
                Outcome::Fail(format!("expected error {code}, got {}: {error}", error.kind.code()))
            }
        }
        (Ok(desc), None, Some(code)) => {
            Outcome::Fail(format!("expected error {code}, decoded {desc}"))
        }
        (Err(error), Some(_), None) => Outcome::Fail(format!("unexpected error: {error}")),
        _ => Outcome::Fail("case needs exactly one of `expect` or `error`".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn case(input: &str, expect: Option<Value>, error: Option<&str>) -> Case {
        Case {
            name: input.to_string(),
            input: input.to_string(),
            expect,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn args_take_filter_and_files() {
        let args = Args::try_parse_from(["dev-test-runner", "--filter", "^array", "a.json", "b.json"]).unwrap();
        assert!(args.filter.unwrap().is_match("array-capacity"));
        assert_eq!(args.fixtures, [PathBuf::from("a.json"), PathBuf::from("b.json")]);

        let args = Args::try_parse_from(["dev-test-runner"]).unwrap();
        assert!(args.filter.is_none());
        assert!(args.fixtures.is_empty());

        assert!(Args::try_parse_from(["dev-test-runner", "--filter", "("]).is_err());
    }

    #[test]
    fn default_fixtures_are_found() {
        let found = default_fixtures().unwrap();
        assert!(found.iter().any(|p| p.ends_with("type_strings.json")), "{found:?}");
        for path in &found {
            assert!(!load_cases(path).unwrap().is_empty());
        }
    }

    #[test]
    fn cases_pass_and_fail() {
        let ok = case("bool", Some(json!({ "primitiveKind": "bool", "bits": 1, "editorKind": "checkbox" })), None);
        assert!(matches!(run_case(&ok), Outcome::Pass));

        let code = case("uint", None, Some("missing-bit-width"));
        assert!(matches!(run_case(&code), Outcome::Pass));

        let wrong_code = case("uint", None, Some("trailing-input"));
        assert!(matches!(run_case(&wrong_code), Outcome::Fail(_)));

        let both = case("bool", Some(json!({})), Some("trailing-input"));
        assert!(matches!(run_case(&both), Outcome::Fail(_)));
    }
}
