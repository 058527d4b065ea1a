//! Structured view of a DSDL primitive type string.
//!
//! A `TypeDescriptor` is what register editors consume: scalar kind and width,
//! optional array capacity, value bounds and the input control to render.
//! Construct one with [`crate::parser::parse`]; `Display` prints the canonical
//! type string back.
pub mod range;

use std::fmt;
use serde::ser::{Serialize, SerializeStruct, Serializer};

pub use range::{Limit, Range};

// ------------------------------- Kinds ------------------------------------ //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    Int,
    Uint,
    Float,
}

impl PrimitiveKind {
    /// Keyword as written in type strings.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Uint => "uint",
            PrimitiveKind::Float => "float",
        }
    }

    pub fn needs_bit_width(self) -> bool {
        !matches!(self, PrimitiveKind::Bool)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, PrimitiveKind::Int | PrimitiveKind::Uint)
    }

    pub fn supports_bits(self, bits: u64) -> bool {
        match self {
            PrimitiveKind::Bool => bits == 1,
            PrimitiveKind::Int | PrimitiveKind::Uint => (1..=64).contains(&bits),
            PrimitiveKind::Float => matches!(bits, 16 | 32 | 64),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastMode {
    Saturated,
    Truncated,
}

impl CastMode {
    pub fn keyword(self) -> &'static str {
        match self {
            CastMode::Saturated => "saturated",
            CastMode::Truncated => "truncated",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "saturated" => Some(CastMode::Saturated),
            "truncated" => Some(CastMode::Truncated),
            _ => None,
        }
    }
}

/// Input control a register editor renders for the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Checkbox,
    Number,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayShape {
    /// Inclusive maximum element count.
    pub capacity: u64,
}

// ----------------------------- Descriptor --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub cast_mode: Option<CastMode>,
    pub kind: PrimitiveKind,
    pub bits: u32,
    pub array: Option<ArrayShape>,
    pub range: Option<Range>,
    pub editor: EditorKind,
    pub step: Option<u32>,
}

impl TypeDescriptor {
    pub fn is_saturated(&self) -> bool {
        self.cast_mode == Some(CastMode::Saturated)
    }

    pub fn is_unsigned(&self) -> bool {
        self.kind == PrimitiveKind::Uint
    }

    pub fn is_array(&self) -> bool {
        self.array.is_some()
    }

    pub fn capacity(&self) -> Option<u64> {
        self.array.map(|a| a.capacity)
    }

    pub fn min(&self) -> Option<Limit> {
        self.range.map(|r| r.min())
    }

    pub fn max(&self) -> Option<Limit> {
        self.range.map(|r| r.max())
    }

    /// The scalar descriptor of one array element (or a copy of `self` for scalars).
    pub fn element(&self) -> TypeDescriptor {
        let mut el = self.clone();
        el.array = None;
        el.editor = editor_for(el.kind, false);
        el.step = step_for(el.kind, false);
        el
    }
}

pub(crate) fn editor_for(kind: PrimitiveKind, array: bool) -> EditorKind {
    match (kind, array) {
        (_, true) => EditorKind::Text,
        (PrimitiveKind::Bool, false) => EditorKind::Checkbox,
        (_, false) => EditorKind::Number,
    }
}

pub(crate) fn step_for(kind: PrimitiveKind, array: bool) -> Option<u32> {
    if !array && kind.is_integer() { Some(1) } else { None }
}

/// Canonical type string: `[cast ]kind[bits][[<=capacity]]`.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(mode) = self.cast_mode {
            write!(f, "{} ", mode.keyword())?;
        }
        f.write_str(self.kind.keyword())?;
        if self.kind.needs_bit_width() {
            write!(f, "{}", self.bits)?;
        }
        if let Some(shape) = self.array {
            write!(f, "[<={}]", shape.capacity)?;
        }
        Ok(())
    }
}

// ------------------------------ JSON view --------------------------------- //

/// Flat camelCase view consumed by editor-selection code. Optional fields are
/// omitted rather than written as null.
impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("TypeDescriptor", 11)?;
        match self.cast_mode {
            Some(mode) => st.serialize_field("saturated", &(mode == CastMode::Saturated))?,
            None => st.skip_field("saturated")?,
        }
        if self.is_array() {
            st.serialize_field("array", &true)?;
        } else {
            st.skip_field("array")?;
        }
        st.serialize_field("primitiveKind", &self.kind)?;
        if self.is_unsigned() {
            st.serialize_field("unsigned", &true)?;
        } else {
            st.skip_field("unsigned")?;
        }
        st.serialize_field("bits", &self.bits)?;
        match self.capacity() {
            Some(capacity) => st.serialize_field("capacity", &capacity)?,
            None => st.skip_field("capacity")?,
        }
        match self.range {
            Some(range) => {
                st.serialize_field("min", &range.min())?;
                st.serialize_field("max", &range.max())?;
            }
            None => {
                st.skip_field("min")?;
                st.skip_field("max")?;
            }
        }
        st.serialize_field("editorKind", &self.editor)?;
        match self.step {
            Some(step) => st.serialize_field("step", &step)?,
            None => st.skip_field("step")?,
        }
        st.end()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uint8_array() -> TypeDescriptor {
        TypeDescriptor {
            cast_mode: Some(CastMode::Saturated),
            kind: PrimitiveKind::Uint,
            bits: 8,
            array: Some(ArrayShape { capacity: 4 }),
            range: Some(Range::unsigned(8)),
            editor: EditorKind::Text,
            step: None,
        }
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(uint8_array().to_string(), "saturated uint8[<=4]");
        let b = TypeDescriptor {
            cast_mode: None,
            kind: PrimitiveKind::Bool,
            bits: 1,
            array: None,
            range: None,
            editor: EditorKind::Checkbox,
            step: None,
        };
        assert_eq!(b.to_string(), "bool");
    }

    #[test]
    fn json_view_omits_absent_fields() {
        let v = serde_json::to_value(uint8_array()).unwrap();
        assert_eq!(v, json!({
            "saturated": true,
            "array": true,
            "primitiveKind": "uint",
            "unsigned": true,
            "bits": 8,
            "capacity": 4,
            "min": 0,
            "max": 255,
            "editorKind": "text"
        }));
    }

    #[test]
    fn element_drops_array_shape() {
        let el = uint8_array().element();
        assert!(!el.is_array());
        assert_eq!(el.editor, EditorKind::Number);
        assert_eq!(el.step, Some(1));
        assert_eq!(el.range, Some(Range::unsigned(8)));
    }
}
