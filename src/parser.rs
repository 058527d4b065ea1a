//! Decoder for DSDL primitive type strings.
//!
//! ```text
//! typeString     := [ castMode ws+ ] primitiveToken ws* [ arrayBounds ]
//! castMode       := "saturated" | "truncated"
//! primitiveToken := "bool" | "int" N | "uint" N | "float" N
//! arrayBounds    := "[" ("<=" | "<") DIGITS "]"
//! ```
//!
//! Array bounds are normalized to an inclusive element count, so `[<4]` and
//! `[<=3]` decode to the same descriptor. Failures carry the offending
//! substring; a partially filled descriptor is never returned.
use std::str::FromStr;

use crate::descriptor::{
    editor_for, step_for, ArrayShape, CastMode, PrimitiveKind, Range, TypeDescriptor,
};
use crate::error::{DecodeError, DecodeErrorKind, DecodeResult};

const KEYWORDS: [PrimitiveKind; 4] = [
    PrimitiveKind::Bool,
    PrimitiveKind::Uint,
    PrimitiveKind::Int,
    PrimitiveKind::Float,
];

// ------------------------------- Front API -------------------------------- //

pub fn parse(type_string: &str) -> DecodeResult<TypeDescriptor> {
    let text = type_string.trim();
    let (cast_mode, token) = split_cast_mode(text);
    let (kind, after_keyword) = split_keyword(token)?;
    let (bits, rest) = split_bit_width(kind, token, after_keyword)?;

    let rest = rest.trim_start();
    let array = if rest.is_empty() {
        None
    } else if rest.starts_with('[') {
        Some(parse_array_bounds(rest)?)
    } else if rest.starts_with(']') {
        return Err(unbalanced(rest));
    } else {
        return Err(DecodeError::new(DecodeErrorKind::TrailingInput, rest));
    };

    let range = Range::for_kind(kind, bits);
    if let Some(range) = range {
        if !range.is_consistent() {
            return Err(DecodeError::new(DecodeErrorKind::InconsistentBounds, text));
        }
    }

    Ok(TypeDescriptor {
        cast_mode,
        kind,
        bits,
        array,
        range,
        editor: editor_for(kind, array.is_some()),
        step: step_for(kind, array.is_some()),
    })
}

impl FromStr for TypeDescriptor {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn split_cast_mode(text: &str) -> (Option<CastMode>, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, tail)) => match CastMode::from_keyword(head) {
            Some(mode) => (Some(mode), tail.trim_start()),
            None => (None, text),
        },
        None => (None, text),
    }
}

fn split_keyword(token: &str) -> DecodeResult<(PrimitiveKind, &str)> {
    KEYWORDS
        .iter()
        .find_map(|kind| token.strip_prefix(kind.keyword()).map(|rest| (*kind, rest)))
        .ok_or_else(|| DecodeError::new(DecodeErrorKind::MalformedKeyword, leading_word(token)))
}

/// Reads the digit run after the keyword. The run must end at whitespace, a
/// bracket, or the end of input.
fn split_bit_width<'a>(
    kind: PrimitiveKind,
    token: &'a str,
    after_keyword: &'a str,
) -> DecodeResult<(u32, &'a str)> {
    let end = after_keyword
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_keyword.len());
    let (digits, tail) = after_keyword.split_at(end);
    let word = leading_word(token);

    match tail.chars().next() {
        Some(']') => return Err(unbalanced(tail)),
        Some(c) if !c.is_whitespace() && c != '[' => {
            return Err(DecodeError::new(DecodeErrorKind::MalformedKeyword, word));
        }
        _ => {}
    }

    if !kind.needs_bit_width() {
        return if digits.is_empty() {
            Ok((1, tail))
        } else {
            Err(DecodeError::new(DecodeErrorKind::MalformedKeyword, word))
        };
    }
    if digits.is_empty() {
        return Err(DecodeError::new(DecodeErrorKind::MissingBitWidth { kind }, word));
    }

    // Overflowing digit runs are reported as an unsupported width.
    let bits = digits.parse::<u64>().unwrap_or(u64::MAX);
    if !kind.supports_bits(bits) {
        return Err(DecodeError::new(DecodeErrorKind::UnsupportedBitWidth { kind, bits }, word));
    }
    Ok((bits as u32, tail))
}

/// `rest` starts with `[`.
fn parse_array_bounds(rest: &str) -> DecodeResult<ArrayShape> {
    let malformed = |reason: &'static str, fragment: &str| {
        DecodeError::new(DecodeErrorKind::MalformedArrayBounds { reason }, fragment)
    };

    let close = rest.find(']').ok_or_else(|| unbalanced(rest))?;
    let region = &rest[..=close];
    let inner = rest[1..close].trim();
    if inner.contains('[') {
        return Err(unbalanced(region));
    }

    let trailing = rest[close + 1..].trim();
    if trailing.contains(']') {
        return Err(unbalanced(rest));
    }
    if !trailing.is_empty() {
        return Err(DecodeError::new(DecodeErrorKind::TrailingInput, trailing));
    }

    let (inclusive, digits) = if let Some(d) = inner.strip_prefix("<=") {
        (true, d.trim())
    } else if let Some(d) = inner.strip_prefix('<') {
        (false, d.trim())
    } else {
        return Err(malformed("bound operator not found", region));
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("bound is not a decimal integer", region));
    }
    let bound = digits
        .parse::<u64>()
        .map_err(|_| malformed("bound does not fit in 64 bits", region))?;

    let capacity = if inclusive {
        bound
    } else {
        bound
            .checked_sub(1)
            .ok_or_else(|| malformed("exclusive bound must be positive", region))?
    };
    Ok(ArrayShape { capacity })
}

fn unbalanced(fragment: &str) -> DecodeError {
    DecodeError::new(DecodeErrorKind::MalformedArrayBounds { reason: "unbalanced brackets" }, fragment)
}

fn leading_word(s: &str) -> &str {
    let end = s.find(|c: char| c.is_whitespace() || c == '[').unwrap_or(s.len());
    &s[..end]
}

// ------------------------------- Tests ------------------------------------ //
