//! Error types for schema compilation, decoding and encoding.
//!
//! Field identifiers carried by these errors are dotted paths from the schema
//! root (`Outer.inner.PRE`, `values[2]`).

use thiserror::Error;

/// Errors produced while building a record or converting a schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Field name is empty.
    #[error("field name must not be empty")]
    InvalidFieldName,
    /// The same field name was added twice to one record.
    #[error("duplicate field name `{0}`")]
    DuplicateFieldName(String),
    /// Array count is zero.
    #[error("array count must be at least 1")]
    InvalidArrayCount,
    /// Bit-field declared without any bit names.
    #[error("bit-field needs at least one bit name")]
    EmptyBitField,
    /// Text or byte buffer with zero capacity.
    #[error("text and byte buffers need a length of at least 1")]
    InvalidTextLength,
    /// Bit-field word width other than 8 or 16.
    #[error("bit-field word width must be 8 or 16, got {0}")]
    InvalidWordWidth(usize),
    /// Padding of zero bytes.
    #[error("padding length must be at least 1")]
    InvalidPaddingLength,
    /// Built-in type name not known.
    #[error("unknown built-in type `{0}`")]
    UnknownBuiltin(String),
    /// Byte size of a node or record does not fit in memory.
    #[error("layout is too large to address")]
    LayoutTooLarge,
    /// Schema document could not be parsed.
    #[error("invalid schema document: {0}")]
    InvalidDocument(String),
}

/// Errors produced when decoding a byte buffer (see [crate::schema::Schema::decode]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Input is shorter than the compiled layout.
    #[error("buffer too short: needed {needed} bytes, have {have}")]
    ShortBuffer { needed: usize, have: usize },
    /// Length prefix of a text field exceeds its payload capacity.
    #[error("`{field}`: length prefix {length} exceeds capacity {capacity}")]
    LengthOutOfRange {
        field: String,
        length: usize,
        capacity: usize,
    },
    /// Text bytes are not valid in the configured encoding.
    #[error("`{field}`: bytes are not valid text in the configured encoding")]
    InvalidText { field: String },
    /// Unpacked primitives do not line up with the node tree.
    #[error("`{field}`: primitive slots do not match the layout")]
    SlotMismatch { field: String },
}

/// Errors produced when encoding a value tree (see [crate::schema::Schema::encode]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// A required value is absent.
    #[error("missing value for `{0}`")]
    MissingField(String),
    /// Numeric value does not fit the field's slot.
    #[error("`{field}`: value out of range")]
    ValueOutOfRange { field: String },
    /// Encoded text or bytes are longer than the fixed capacity.
    #[error("`{field}`: {len} bytes exceed capacity {capacity}")]
    EncodingOverflow {
        field: String,
        len: usize,
        capacity: usize,
    },
    /// Value has the wrong shape for the field.
    #[error("`{field}`: expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },
    /// Array value has fewer elements than the declared count.
    #[error("`{field}`: expected {expected} elements, got {got}")]
    ArrayTooShort {
        field: String,
        expected: usize,
        got: usize,
    },
    /// Text contains a character the configured encoding cannot express.
    #[error("`{field}`: text not representable in the configured encoding")]
    Unrepresentable { field: String },
}
