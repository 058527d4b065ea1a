use thiserror::Error;

use crate::descriptor::PrimitiveKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("unrecognized primitive keyword")]
    MalformedKeyword,
    #[error("`{kind}` requires a bit width")]
    MissingBitWidth { kind: PrimitiveKind },
    #[error("unsupported bit width {bits} for `{kind}`")]
    UnsupportedBitWidth { kind: PrimitiveKind, bits: u64 },
    #[error("malformed array bounds: {reason}")]
    MalformedArrayBounds { reason: &'static str },
    #[error("computed bounds are inconsistent (min > max)")]
    InconsistentBounds,
    #[error("unexpected trailing input")]
    TrailingInput,
}

impl DecodeErrorKind {
    /// Stable identifier, used by fixture files and JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedKeyword => "malformed-keyword",
            Self::MissingBitWidth { .. } => "missing-bit-width",
            Self::UnsupportedBitWidth { .. } => "unsupported-bit-width",
            Self::MalformedArrayBounds { .. } => "malformed-array-bounds",
            Self::InconsistentBounds => "inconsistent-bounds",
            Self::TrailingInput => "trailing-input",
        }
    }
}

/// Failure to decode a type string. `fragment` is the offending substring.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} in `{fragment}`")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub fragment: String,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, fragment: impl Into<String>) -> Self {
        Self { kind, fragment: fragment.into() }
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected a boolean, found `{0}`")]
    NotABool(String),
    #[error("expected an integer, found `{0}`")]
    NotAnInteger(String),
    #[error("expected a finite number, found `{0}`")]
    NotANumber(String),
    #[error("`{value}` is outside [{min}, {max}]")]
    OutOfRange { value: String, min: String, max: String },
    #[error("{len} elements exceed capacity {capacity}")]
    TooManyElements { len: usize, capacity: u64 },
    #[error("expected an array literal, found `{0}`")]
    NotAnArray(String),
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ValueError>,
    },
}

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("jq parse error: {0}")]
    Parse(String),
    #[error("jq compile error: {0}")]
    Compile(String),
    #[error("jq runtime error: {0}")]
    Runtime(String),
    #[error("jq produced non-JSON output: {0}")]
    Output(#[from] serde_json::Error),
}
