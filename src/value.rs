//! Editor input validation.
//!
//! Turns what an operator typed (or what the backend reported as the current
//! register value) into a typed value that fits the descriptor. Out-of-range
//! integers are clamped under `saturated`, wrapped under `truncated`, and
//! rejected when no cast mode was given.
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::descriptor::{CastMode, PrimitiveKind, TypeDescriptor};
use crate::error::ValueError;

static INTEGER_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("integer literal regex"));

static NUMBER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("number literal regex")
});

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum EditorValue {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Array(Vec<EditorValue>),
}

// ------------------------------- Front API -------------------------------- //

/// Coerce a JSON value (as delivered by the registers endpoint).
pub fn coerce(desc: &TypeDescriptor, input: &Value) -> Result<EditorValue, ValueError> {
    let Some(shape) = desc.array else {
        return coerce_scalar(desc, input);
    };
    let el = desc.element();
    match input {
        Value::Array(items) => {
            check_capacity(items.len(), shape.capacity)?;
            collect_elements(items.iter().map(|item| coerce_scalar(&el, item)))
        }
        Value::String(text) => coerce_text(desc, text),
        other => Err(ValueError::NotAnArray(other.to_string())),
    }
}

/// Coerce raw text from an editor control. Arrays accept `[1, 2]` or `1, 2`.
pub fn coerce_text(desc: &TypeDescriptor, text: &str) -> Result<EditorValue, ValueError> {
    let Some(shape) = desc.array else {
        return coerce_scalar_text(desc, text);
    };
    let el = desc.element();
    let items = split_array_literal(text)?;
    check_capacity(items.len(), shape.capacity)?;
    collect_elements(items.into_iter().map(|item| coerce_scalar_text(&el, item)))
}

// ------------------------------- Scalars ---------------------------------- //

fn coerce_scalar(el: &TypeDescriptor, input: &Value) -> Result<EditorValue, ValueError> {
    match input {
        Value::Bool(b) if el.kind == PrimitiveKind::Bool => Ok(EditorValue::Bool(*b)),
        Value::Number(n) => coerce_scalar_text(el, &n.to_string()),
        Value::String(s) => coerce_scalar_text(el, s),
        other => Err(mismatch(el.kind, other.to_string())),
    }
}

fn coerce_scalar_text(el: &TypeDescriptor, text: &str) -> Result<EditorValue, ValueError> {
    let text = text.trim();
    match el.kind {
        PrimitiveKind::Bool => match text {
            "true" | "1" => Ok(EditorValue::Bool(true)),
            "false" | "0" => Ok(EditorValue::Bool(false)),
            _ => Err(ValueError::NotABool(text.to_string())),
        },
        PrimitiveKind::Uint | PrimitiveKind::Int => {
            if !INTEGER_LITERAL.is_match(text) {
                return Err(ValueError::NotAnInteger(text.to_string()));
            }
            // beyond i128 only the sign matters for clamping; truncation rereads the digits
            let v = text.parse::<i128>().unwrap_or(if text.starts_with('-') {
                i128::MIN
            } else {
                i128::MAX
            });
            let v = fit_integer(el, v, text)?;
            Ok(match el.kind {
                PrimitiveKind::Uint => EditorValue::Unsigned(v as u64),
                _ => EditorValue::Signed(v as i64),
            })
        }
        PrimitiveKind::Float => {
            if !NUMBER_LITERAL.is_match(text) {
                return Err(ValueError::NotANumber(text.to_string()));
            }
            let v = text
                .parse::<f64>()
                .map_err(|_| ValueError::NotANumber(text.to_string()))?;
            fit_float(el, v, text).map(EditorValue::Float)
        }
    }
}

fn fit_integer(el: &TypeDescriptor, v: i128, text: &str) -> Result<i128, ValueError> {
    let (lo, hi) = el
        .range
        .and_then(|r| r.integer_bounds())
        .unwrap_or((i128::MIN, i128::MAX));
    if (lo..=hi).contains(&v) {
        return Ok(v);
    }
    match el.cast_mode {
        Some(CastMode::Saturated) => Ok(v.clamp(lo, hi)),
        Some(CastMode::Truncated) => {
            let wrapped = wrap_decimal(text, el.bits, el.kind == PrimitiveKind::Int);
            // register limits may be narrower than the bit width
            if (lo..=hi).contains(&wrapped) {
                Ok(wrapped)
            } else {
                Err(out_of_range(el, text))
            }
        }
        None => Err(out_of_range(el, text)),
    }
}

/// Keep the low `bits` bits of a decimal literal of any length,
/// sign-extending for signed kinds.
fn wrap_decimal(text: &str, bits: u32, signed: bool) -> i128 {
    let modulus = 1u128 << bits;
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    // modulus <= 2^64, so acc * 10 + 9 stays well inside u128
    let magnitude = digits
        .bytes()
        .fold(0u128, |acc, d| (acc * 10 + u128::from(d - b'0')) % modulus);
    let low = if negative { (modulus - magnitude) % modulus } else { magnitude };
    let low = low as i128;
    if signed && low >= (modulus >> 1) as i128 { low - modulus as i128 } else { low }
}

fn fit_float(el: &TypeDescriptor, v: f64, text: &str) -> Result<f64, ValueError> {
    let Some(range) = el.range else { return Ok(v) };
    let (lo, hi) = range.float_bounds();
    if (lo..=hi).contains(&v) {
        Ok(v)
    } else if el.is_saturated() {
        Ok(v.clamp(lo, hi))
    } else {
        Err(out_of_range(el, text))
    }
}

// ------------------------------- Arrays ----------------------------------- //

fn split_array_literal(text: &str) -> Result<Vec<&str>, ValueError> {
    let trimmed = text.trim();
    let inner = match (trimmed.strip_prefix('['), trimmed.ends_with(']')) {
        (Some(rest), true) => &rest[..rest.len() - 1],
        (None, false) => trimmed,
        _ => return Err(ValueError::NotAnArray(text.to_string())),
    };
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<&str> = inner.split(',').map(str::trim).collect();
    if items.iter().any(|s| s.is_empty()) {
        return Err(ValueError::NotAnArray(text.to_string()));
    }
    Ok(items)
}

fn check_capacity(len: usize, capacity: u64) -> Result<(), ValueError> {
    if len as u64 > capacity {
        Err(ValueError::TooManyElements { len, capacity })
    } else {
        Ok(())
    }
}

fn collect_elements<I>(items: I) -> Result<EditorValue, ValueError>
where
    I: Iterator<Item = Result<EditorValue, ValueError>>,
{
    items
        .enumerate()
        .map(|(index, r)| r.map_err(|e| ValueError::Element { index, source: Box::new(e) }))
        .collect::<Result<Vec<_>, _>>()
        .map(EditorValue::Array)
}

// ------------------------------- Utilities -------------------------------- //

fn mismatch(kind: PrimitiveKind, found: String) -> ValueError {
    match kind {
        PrimitiveKind::Bool => ValueError::NotABool(found),
        PrimitiveKind::Uint | PrimitiveKind::Int => ValueError::NotAnInteger(found),
        PrimitiveKind::Float => ValueError::NotANumber(found),
    }
}

fn out_of_range(el: &TypeDescriptor, text: &str) -> ValueError {
    ValueError::OutOfRange {
        value: text.to_string(),
        min: el.min().map(|l| l.to_string()).unwrap_or_default(),
        max: el.max().map(|l| l.to_string()).unwrap_or_default(),
    }
}

// ------------------------------- Tests ------------------------------------ //
