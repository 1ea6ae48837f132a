//! Schema nodes: the building blocks a record layout is described with.
//!
//! Every [Node] knows its byte size, its alignment and the primitive slots it
//! contributes to a compiled layout. Records are shared through [Arc] so one
//! built record can be embedded in many others without copying.

use std::sync::Arc;

use crate::{
    bits::{self, WordWidth},
    compiled::align_padding,
    errors::CompileError,
    record::Record,
    slot::{ScalarKind, SlotKind},
    text::Encoding,
};

/// A schema element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// One fixed-width numeric slot.
    Scalar(ScalarKind),
    /// Raw bytes of a fixed length.
    Bytes(usize),
    /// Fixed-capacity text.
    Text(TextSpec),
    /// Spare bytes. Decodes to [crate::value::Value::Null].
    Padding(usize),
    /// Named boolean flags packed into words.
    Bits(BitField),
    /// Fixed-count repetition of one element node.
    Array(ArraySpec),
    /// Nested record.
    Record(Arc<Record>),
}

impl Node {
    pub fn array(element: impl Into<Node>, count: usize) -> Self {
        Node::Array(ArraySpec {
            element: Box::new(element.into()),
            count,
        })
    }

    /// Flags packed into 16-bit words.
    pub fn bits<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Node::Bits(BitField::new(names, WordWidth::W16))
    }

    /// Flags packed into 8-bit words, the way BOOL members are packed.
    pub fn bools<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Node::Bits(BitField::new(names, WordWidth::W8))
    }

    /// Byte size, including any internal and trailing padding.
    pub fn size(&self) -> usize {
        match self {
            Node::Scalar(kind) => kind.width(),
            Node::Bytes(len) | Node::Padding(len) => *len,
            Node::Text(text) => text.size(),
            Node::Bits(field) => field.word_count() * field.width.bytes(),
            Node::Array(array) => array.element.size() * array.count,
            Node::Record(record) => record.size(),
        }
    }

    /// Like [Node::size], but `None` when the size overflows or exceeds what
    /// a buffer can hold.
    pub fn checked_size(&self) -> Option<usize> {
        let size = match self {
            Node::Text(text) => text.checked_size()?,
            Node::Bits(field) => field.word_count().checked_mul(field.width.bytes())?,
            Node::Array(array) => array.element.checked_size()?.checked_mul(array.count)?,
            Node::Scalar(_) | Node::Bytes(_) | Node::Padding(_) | Node::Record(_) => self.size(),
        };
        fits_in_buffer(size)
    }

    /// Alignment in bytes: 1, 2, 4 or 8.
    pub fn alignment(&self) -> usize {
        match self {
            Node::Scalar(kind) => kind.width(),
            Node::Bytes(_) | Node::Padding(_) => 1,
            Node::Text(text) => text.alignment(),
            Node::Bits(field) => field.width.bytes(),
            Node::Array(array) => array.element.alignment(),
            Node::Record(record) => record.alignment(),
        }
    }

    /// Appends this node's primitive slots to `format`.
    pub fn append_format(&self, format: &mut Vec<SlotKind>) {
        match self {
            Node::Scalar(kind) => format.push(SlotKind::Scalar(*kind)),
            Node::Bytes(len) => format.push(SlotKind::Bytes(*len)),
            Node::Padding(len) => format.push(SlotKind::Pad(*len)),
            Node::Text(text) => text.append_format(format),
            Node::Bits(field) => {
                let word = SlotKind::Scalar(field.width.scalar_kind());
                format.extend(std::iter::repeat_n(word, field.word_count()));
            }
            Node::Array(array) => {
                for _ in 0..array.count {
                    array.element.append_format(format);
                }
            }
            Node::Record(record) => format.extend_from_slice(record.format()),
        }
    }

    /// Flattened primitive slot layout of this node.
    pub fn format(&self) -> Vec<SlotKind> {
        let mut format = Vec::new();
        self.append_format(&mut format);
        format
    }

    /// All-zero byte image of this node.
    pub fn zeroed(&self) -> Vec<u8> {
        vec![0u8; self.size()]
    }

    /// Checks lengths, counts and names. Records are checked when built.
    pub fn validate(&self) -> Result<(), CompileError> {
        let shape = match self {
            Node::Scalar(_) | Node::Record(_) => Ok(()),
            Node::Bytes(0) => Err(CompileError::InvalidTextLength),
            Node::Padding(0) => Err(CompileError::InvalidPaddingLength),
            Node::Bytes(_) | Node::Padding(_) => Ok(()),
            Node::Text(text) if text.capacity == 0 => Err(CompileError::InvalidTextLength),
            Node::Text(_) => Ok(()),
            Node::Bits(field) => field.validate(),
            Node::Array(array) if array.count == 0 => Err(CompileError::InvalidArrayCount),
            Node::Array(array) => array.element.validate(),
        };
        shape?;

        match self.checked_size() {
            Some(_) => Ok(()),
            None => Err(CompileError::LayoutTooLarge),
        }
    }
}

/// `size` if a `Vec<u8>` of that length can exist.
pub(crate) fn fits_in_buffer(size: usize) -> Option<usize> {
    (size <= isize::MAX as usize).then_some(size)
}

impl From<ScalarKind> for Node {
    fn from(kind: ScalarKind) -> Self {
        Node::Scalar(kind)
    }
}

impl From<TextSpec> for Node {
    fn from(text: TextSpec) -> Self {
        Node::Text(text)
    }
}

impl From<BitField> for Node {
    fn from(field: BitField) -> Self {
        Node::Bits(field)
    }
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Node::Record(Arc::new(record))
    }
}

impl From<Arc<Record>> for Node {
    fn from(record: Arc<Record>) -> Self {
        Node::Record(record)
    }
}

/// How a text field is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayout {
    /// A single byte buffer of `capacity` bytes.
    Fixed {
        /// Decoded text ends at the first zero byte. Without termination the
        /// whole buffer is decoded, zero fill included.
        null_terminated: bool,
    },
    /// A `u32` length followed by a byte buffer of `capacity` bytes.
    LengthPrefixed,
}

/// Text field parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpec {
    /// Payload capacity in bytes.
    pub capacity: usize,
    pub encoding: Encoding,
    pub layout: TextLayout,
}

impl TextSpec {
    /// Fixed buffer, null-terminated, Latin-1.
    pub fn fixed(capacity: usize) -> Self {
        TextSpec {
            capacity,
            encoding: Encoding::default(),
            layout: TextLayout::Fixed {
                null_terminated: true,
            },
        }
    }

    /// Length-prefixed buffer, Latin-1.
    pub fn length_prefixed(capacity: usize) -> Self {
        TextSpec {
            capacity,
            encoding: Encoding::default(),
            layout: TextLayout::LengthPrefixed,
        }
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Switches to a fixed layout with the given termination.
    ///
    /// With `false`, encoding a shorter string zero-fills the rest of the
    /// buffer and decoding returns all `capacity` bytes, so the decoded
    /// string ends in `'\0'` characters.
    pub fn null_terminated(mut self, null_terminated: bool) -> Self {
        self.layout = TextLayout::Fixed { null_terminated };
        self
    }

    pub fn alignment(&self) -> usize {
        match self.layout {
            TextLayout::Fixed { .. } => 1,
            TextLayout::LengthPrefixed => 4,
        }
    }

    pub fn size(&self) -> usize {
        match self.layout {
            TextLayout::Fixed { .. } => self.capacity,
            TextLayout::LengthPrefixed => {
                let used = 4 + self.capacity;
                used + align_padding(used, 4)
            }
        }
    }

    fn checked_size(&self) -> Option<usize> {
        match self.layout {
            TextLayout::Fixed { .. } => Some(self.capacity),
            TextLayout::LengthPrefixed => {
                let used = self.capacity.checked_add(4)?;
                used.checked_add(align_padding(used, 4))
            }
        }
    }

    fn append_format(&self, format: &mut Vec<SlotKind>) {
        match self.layout {
            TextLayout::Fixed { .. } => format.push(SlotKind::Bytes(self.capacity)),
            TextLayout::LengthPrefixed => {
                format.push(SlotKind::Scalar(ScalarKind::U32));
                format.push(SlotKind::Bytes(self.capacity));
                let tail = align_padding(4 + self.capacity, 4);
                if tail > 0 {
                    format.push(SlotKind::Pad(tail));
                }
            }
        }
    }
}

/// Ordered flag names packed one bit each into words of a fixed width.
///
/// An empty name reserves its bit position without producing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    pub names: Vec<String>,
    pub width: WordWidth,
}

impl BitField {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, width: WordWidth) -> Self {
        BitField {
            names: names.into_iter().map(Into::into).collect(),
            width,
        }
    }

    pub fn word_count(&self) -> usize {
        bits::word_count(self.names.len(), self.width)
    }

    /// Bit position of `name`, if it is one of the named bits.
    pub fn position(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.names.iter().position(|n| n == name)
    }

    fn validate(&self) -> Result<(), CompileError> {
        if self.names.is_empty() {
            return Err(CompileError::EmptyBitField);
        }
        for (i, name) in self.names.iter().enumerate() {
            if !name.is_empty() && self.names[..i].contains(name) {
                return Err(CompileError::DuplicateFieldName(name.clone()));
            }
        }
        Ok(())
    }
}

/// Fixed-count array parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySpec {
    pub element: Box<Node>,
    pub count: usize,
}
