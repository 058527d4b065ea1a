//! DSDL type-string decoding for register editors.
//!
//! [`parse`] turns a raw type string such as `"saturated uint8[<=4]"` into a
//! [`TypeDescriptor`]; [`value`] validates editor input against it and
//! [`registers`] applies both to register metadata payloads.
pub mod cache;
pub mod cli;
pub mod descriptor;
pub mod error;
pub mod parser;
pub mod registers;
pub mod select;
pub mod value;

pub use descriptor::{EditorKind, PrimitiveKind, TypeDescriptor};
pub use error::{DecodeError, DecodeErrorKind};
pub use parser::parse;
