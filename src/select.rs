//! jq selection of register lists inside larger backend payloads.
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

use crate::error::SelectError;

/// Run `filter_src` against `input` and collect every output as JSON.
pub fn run(filter_src: &str, input: &Value) -> Result<Vec<Value>, SelectError> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(describe_load_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(describe_undefined)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut selected = Vec::new();
    for item in outputs {
        let val = item.map_err(|e| SelectError::Runtime(format!("{e:?}")))?;
        // Val's Display is JSON text
        selected.push(serde_json::from_str::<Value>(&val.to_string())?);
    }
    Ok(selected)
}

fn describe_load_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> SelectError {
    let msg = errs
        .iter()
        .map(|(file, err)| format!("{err:?} in `{}`", file.code))
        .collect::<Vec<_>>()
        .join("; ");
    SelectError::Parse(msg)
}

fn describe_undefined(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> SelectError {
    let msg = errs
        .iter()
        .flat_map(|(file, list)| {
            list.iter()
                .map(move |(name, undef)| format!("undefined `{name}`: {undef:?} in `{}`", file.code))
        })
        .collect::<Vec<_>>()
        .join("; ");
    SelectError::Compile(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selects_nested_register_list() {
        let payload = json!({ "node": 42, "registers": [{ "name": "a", "type": "bool" }] });
        let out = run(".registers[]", &payload).unwrap();
        assert_eq!(out, vec![json!({ "name": "a", "type": "bool" })]);
    }

    #[test]
    fn parse_errors_are_reported() {
        let err = run(".registers[", &json!({})).unwrap_err();
        assert!(matches!(err, SelectError::Parse(_)));
    }

    #[test]
    fn undefined_functions_are_reported() {
        let err = run("frobnicate", &json!({})).unwrap_err();
        assert!(matches!(err, SelectError::Compile(_)));
    }
}
