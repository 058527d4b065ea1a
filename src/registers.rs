//! Register metadata as served by the registers endpoint, and the editor view
//! derived from it.
use chrono::Utc;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{Expiry, TypeInfoCache};
use crate::descriptor::{EditorKind, Limit, TypeDescriptor};
use crate::error::DecodeError;
use crate::value::{self, EditorValue};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Register {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub min: Option<Value>,
    #[serde(default)]
    pub max: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEditor {
    #[serde(rename = "type")]
    pub type_name: String,
    pub editor_kind: EditorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<TypeDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<EditorValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<EditorValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct Annotator {
    decoded: TypeInfoCache<Result<TypeDescriptor, DecodeError>>,
}

// ————————————————————————————————————————————————————————————————————————————
// DECODING
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize with the JSON path of the failing field in the error message.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> anyhow::Result<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        anyhow::anyhow!("at JSON path {path} → {}", err.into_inner())
    })
}

/// A document is either a list of registers or a single register.
pub fn decode_document(doc: Value) -> anyhow::Result<Vec<Register>> {
    match doc {
        Value::Array(_) => from_value_with_path(doc),
        other => Ok(vec![from_value_with_path(other)?]),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATION
// ————————————————————————————————————————————————————————————————————————————

impl Annotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor views keyed by register name, in input order. A later register
    /// with the same name replaces the earlier one in place.
    pub fn annotate(&mut self, registers: &[Register]) -> IndexMap<String, RegisterEditor> {
        self.prefetch(registers);
        registers
            .iter()
            .map(|reg| (reg.name.clone(), self.editor_for(reg)))
            .collect()
    }

    /// Decode every type string not yet cached, in parallel.
    fn prefetch(&mut self, registers: &[Register]) {
        let now = Utc::now();
        let mut pending: Vec<&str> = registers
            .iter()
            .map(|reg| reg.type_name.as_str())
            .filter(|name| !self.decoded.contains(name, now))
            .collect();
        pending.sort_unstable();
        pending.dedup();

        let decoded: Vec<_> = pending
            .par_iter()
            .map(|name| (*name, crate::parser::parse(name)))
            .collect();
        debug!(count = decoded.len(), "decoded type strings");

        for (name, result) in decoded {
            if let Err(error) = &result {
                warn!(type_name = name, %error, "falling back to text editor");
            }
            self.decoded.insert(name, result, Expiry::Never);
        }
    }

    fn editor_for(&self, reg: &Register) -> RegisterEditor {
        let decoded = self.decoded.get(&reg.type_name, Utc::now()).cloned().unwrap_or_else(|| {
            crate::parser::parse(&reg.type_name)
        });
        match decoded {
            Ok(desc) => {
                let desc = with_register_limits(desc, reg);
                let (value, value_error) = coerce_field(&desc, reg.value.as_ref());
                let (default, default_error) = coerce_field(&desc, reg.default.as_ref());
                RegisterEditor {
                    type_name: reg.type_name.clone(),
                    editor_kind: desc.editor,
                    descriptor: Some(desc),
                    decode_error: None,
                    value,
                    value_error,
                    default,
                    default_error,
                }
            }
            Err(error) => RegisterEditor {
                type_name: reg.type_name.clone(),
                editor_kind: EditorKind::Text,
                descriptor: None,
                decode_error: Some(error.to_string()),
                value: None,
                value_error: None,
                default: None,
                default_error: None,
            },
        }
    }

    pub fn cached_types(&self) -> usize {
        self.decoded.len()
    }
}

/// Narrow the descriptor's range to the register's own `min`/`max`.
/// Limits that leave no admissible value are ignored.
fn with_register_limits(mut desc: TypeDescriptor, reg: &Register) -> TypeDescriptor {
    let (Some(range), true) = (desc.range, reg.min.is_some() || reg.max.is_some()) else {
        return desc;
    };
    let lo = reg.min.as_ref().and_then(Limit::from_json);
    let hi = reg.max.as_ref().and_then(Limit::from_json);
    match range.narrow(lo, hi) {
        Some(narrowed) => desc.range = Some(narrowed),
        None => warn!(register = %reg.name, "ignoring inconsistent register limits"),
    }
    desc
}

fn coerce_field(desc: &TypeDescriptor, field: Option<&Value>) -> (Option<EditorValue>, Option<String>) {
    match field.map(|v| value::coerce(desc, v)) {
        Some(Ok(v)) => (Some(v), None),
        Some(Err(e)) => (None, Some(e.to_string())),
        None => (None, None),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Register> {
        decode_document(json!([
            { "name": "uart.on", "type": "bool", "value": "false", "default": "false" },
            { "name": "pub.period", "type": "saturated uint16", "value": 70000, "default": 0 },
            { "name": "pres.variance", "type": "float32", "value": 100.5 },
            { "name": "node.ids", "type": "uint8[<=4]", "value": "[1, 2]" },
            { "name": "advertise.as", "type": "string", "value": "bestnode" },
            { "name": "retries", "type": "uint8", "value": 999 },
            { "name": "alias", "type": "bool" }
        ]))
        .unwrap()
    }

    #[test]
    fn single_record_document() {
        let regs = decode_document(json!({ "name": "a", "type": "int8", "value": 3 })).unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].type_name, "int8");
        assert_eq!(regs[0].default, None);
    }

    #[test]
    fn decode_errors_name_the_path() {
        let err = decode_document(json!([{ "name": "a", "type": "bool" }, { "name": "b" }])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("at JSON path [1]"), "{msg}");
        assert!(msg.contains("type"), "{msg}");
    }

    #[test]
    fn annotates_in_input_order() {
        let regs = sample();
        let mut annotator = Annotator::new();
        let out = annotator.annotate(&regs);
        let names: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(names, ["uart.on", "pub.period", "pres.variance", "node.ids", "advertise.as", "retries", "alias"]);
        // "bool" appears twice but is decoded once
        assert_eq!(annotator.cached_types(), 6);
    }

    #[test]
    fn editor_views() {
        let out = Annotator::new().annotate(&sample());

        let uart = &out["uart.on"];
        assert_eq!(uart.editor_kind, EditorKind::Checkbox);
        assert_eq!(uart.value, Some(EditorValue::Bool(false)));

        let period = &out["pub.period"];
        assert_eq!(period.value, Some(EditorValue::Unsigned(65535)));

        let ids = &out["node.ids"];
        assert_eq!(ids.editor_kind, EditorKind::Text);
        assert_eq!(
            ids.value,
            Some(EditorValue::Array(vec![EditorValue::Unsigned(1), EditorValue::Unsigned(2)]))
        );

        let advertise = &out["advertise.as"];
        assert_eq!(advertise.editor_kind, EditorKind::Text);
        assert!(advertise.descriptor.is_none());
        assert_eq!(advertise.decode_error.as_deref(), Some("unrecognized primitive keyword in `string`"));

        let retries = &out["retries"];
        assert!(retries.value.is_none());
        assert_eq!(retries.value_error.as_deref(), Some("`999` is outside [0, 255]"));

        assert!(out["alias"].value.is_none());
    }

    #[test]
    fn register_limits_narrow_validation() {
        let regs = decode_document(json!([
            { "name": "pub.pres", "type": "uint16", "value": 20000, "default": 0, "min": 0, "max": 10000 },
            { "name": "trim", "type": "saturated int16", "value": -50, "default": 3, "min": -10, "max": 10 },
            { "name": "gain", "type": "float32", "value": 0.5, "default": 100.0, "min": 1.0, "max": 4000.59 },
            { "name": "bad.limits", "type": "uint8", "value": 200, "min": 9, "max": 3 }
        ]))
        .unwrap();
        let out = Annotator::new().annotate(&regs);

        let pres = &out["pub.pres"];
        assert_eq!(pres.value_error.as_deref(), Some("`20000` is outside [0, 10000]"));
        assert_eq!(pres.default, Some(EditorValue::Unsigned(0)));
        let pres_desc = pres.descriptor.as_ref().unwrap();
        assert_eq!(pres_desc.max(), Some(Limit::Unsigned(10000)));
        // the canonical type string is unaffected by register limits
        assert_eq!(pres_desc.to_string(), "uint16");

        let trim = &out["trim"];
        assert_eq!(trim.value, Some(EditorValue::Signed(-10)));
        assert_eq!(trim.default, Some(EditorValue::Signed(3)));

        let gain = &out["gain"];
        assert!(gain.value_error.is_some());
        assert_eq!(gain.default, Some(EditorValue::Float(100.0)));

        let bad = &out["bad.limits"];
        assert_eq!(bad.value, Some(EditorValue::Unsigned(200)));
        assert_eq!(bad.descriptor.as_ref().unwrap().max(), Some(Limit::Unsigned(255)));
    }

    #[test]
    fn invalid_default_is_reported() {
        let regs = decode_document(json!({ "name": "a", "type": "bool", "default": "maybe" })).unwrap();
        let out = Annotator::new().annotate(&regs);
        assert!(out["a"].default.is_none());
        assert_eq!(out["a"].default_error.as_deref(), Some("expected a boolean, found `maybe`"));
        let v = serde_json::to_value(&out["a"]).unwrap();
        assert!(v.get("default").is_none());
        assert!(v.get("defaultError").is_some());
    }

    #[test]
    fn editor_view_json_shape() {
        let out = Annotator::new().annotate(&sample());
        let v = serde_json::to_value(&out["pres.variance"]).unwrap();
        assert_eq!(v["type"], json!("float32"));
        assert_eq!(v["editorKind"], json!("number"));
        assert_eq!(v["descriptor"]["bits"], json!(32));
        assert_eq!(v["value"], json!(100.5));
        assert!(v.get("decodeError").is_none());
    }
}
