//! Per-node conversion between primitive slots and values.
//!
//! `decode` reads the primitives a node owns starting at a cursor and reports
//! how many it consumed; `encode` appends them. Both walk the node tree in the
//! same order as [Node::append_format], so the primitive lists line up with the
//! compiled layout.

use std::fmt;

use crate::{
    bits,
    errors::{ReadError, WriteError},
    field::{BitField, Node, TextLayout, TextSpec},
    record::Record,
    slot::{Prim, ScalarKind},
    text::until_nul,
    value::{Value, ValueMap},
};

/// Location of a node inside the value tree, used for error messages.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldPath<'a> {
    Root,
    Field(&'a FieldPath<'a>, &'a str),
    Index(&'a FieldPath<'a>, usize),
}

impl FieldPath<'_> {
    fn render(&self) -> String {
        match self {
            FieldPath::Root => "<root>".to_string(),
            path => path.to_string(),
        }
    }
}

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Root => Ok(()),
            FieldPath::Field(FieldPath::Root, name) => write!(f, "{}", name),
            FieldPath::Field(parent, name) => write!(f, "{}.{}", parent, name),
            FieldPath::Index(parent, i) => write!(f, "{}[{}]", parent, i),
        }
    }
}

fn slot_mismatch(path: &FieldPath) -> ReadError {
    ReadError::SlotMismatch {
        field: path.render(),
    }
}

fn type_mismatch(path: &FieldPath, expected: &'static str) -> WriteError {
    WriteError::TypeMismatch {
        field: path.render(),
        expected,
    }
}

fn out_of_range(path: &FieldPath) -> WriteError {
    WriteError::ValueOutOfRange {
        field: path.render(),
    }
}

impl Node {
    /// Decodes this node from `prims[start..]`. Returns the value and the
    /// number of primitives consumed.
    pub(crate) fn decode(
        &self,
        prims: &[Prim],
        start: usize,
        path: &FieldPath,
    ) -> Result<(Value, usize), ReadError> {
        match self {
            Node::Scalar(_) => {
                let prim = prims.get(start).ok_or_else(|| slot_mismatch(path))?;
                Ok((prim_to_value(prim), 1))
            }
            Node::Bytes(_) => match prims.get(start) {
                Some(Prim::Bytes(bytes)) => Ok((Value::Bytes(bytes.clone()), 1)),
                _ => Err(slot_mismatch(path)),
            },
            Node::Padding(_) => Ok((Value::Null, 0)),
            Node::Text(text) => decode_text(text, prims, start, path),
            Node::Bits(field) => decode_bits(field, prims, start, path),
            Node::Array(array) => {
                let mut cursor = start;
                let mut items = Vec::with_capacity(array.count);
                for i in 0..array.count {
                    let (value, used) =
                        array.element.decode(prims, cursor, &FieldPath::Index(path, i))?;
                    cursor += used;
                    items.push(value);
                }
                Ok((Value::Array(items), cursor - start))
            }
            Node::Record(record) => decode_record(record, prims, start, path),
        }
    }

    /// Encodes `value` for this node, appending its primitives to `out`.
    /// `None` means the value is absent.
    pub(crate) fn encode(
        &self,
        value: Option<&Value>,
        path: &FieldPath,
        out: &mut Vec<Prim>,
    ) -> Result<(), WriteError> {
        match self {
            Node::Padding(_) => Ok(()),
            Node::Bits(field) => encode_bits(field, value, path, out),
            _ => {
                let value = value.ok_or_else(|| WriteError::MissingField(path.render()))?;
                self.encode_present(value, path, out)
            }
        }
    }

    fn encode_present(
        &self,
        value: &Value,
        path: &FieldPath,
        out: &mut Vec<Prim>,
    ) -> Result<(), WriteError> {
        match self {
            Node::Scalar(kind) => out.push(value_to_prim(*kind, value, path)?),
            Node::Bytes(capacity) => {
                let bytes = match value {
                    Value::Bytes(bytes) => bytes.clone(),
                    Value::Array(items) => bytes_of(items, path)?,
                    _ => return Err(type_mismatch(path, "bytes")),
                };
                if bytes.len() > *capacity {
                    return Err(WriteError::EncodingOverflow {
                        field: path.render(),
                        len: bytes.len(),
                        capacity: *capacity,
                    });
                }
                out.push(Prim::Bytes(bytes));
            }
            Node::Text(text) => encode_text(text, value, path, out)?,
            Node::Array(array) => {
                let Value::Array(items) = value else {
                    return Err(type_mismatch(path, "array"));
                };
                if items.len() < array.count {
                    return Err(WriteError::ArrayTooShort {
                        field: path.render(),
                        expected: array.count,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().take(array.count).enumerate() {
                    array
                        .element
                        .encode(Some(item), &FieldPath::Index(path, i), out)?;
                }
            }
            Node::Record(record) => {
                let Value::Map(map) = value else {
                    return Err(type_mismatch(path, "map"));
                };
                encode_record(record, map, path, out)?;
            }
            Node::Padding(_) | Node::Bits(_) => self.encode(Some(value), path, out)?,
        }
        Ok(())
    }
}

fn prim_to_value(prim: &Prim) -> Value {
    match prim {
        Prim::Bool(v) => Value::Bool(*v),
        Prim::I8(v) => Value::Int(i64::from(*v)),
        Prim::I16(v) => Value::Int(i64::from(*v)),
        Prim::I32(v) => Value::Int(i64::from(*v)),
        Prim::I64(v) => Value::Int(*v),
        Prim::U8(v) => Value::UInt(u64::from(*v)),
        Prim::U16(v) => Value::UInt(u64::from(*v)),
        Prim::U32(v) => Value::UInt(u64::from(*v)),
        Prim::U64(v) => Value::UInt(*v),
        Prim::F32(v) => Value::Float(f64::from(*v)),
        Prim::F64(v) => Value::Float(*v),
        Prim::Bytes(bytes) => Value::Bytes(bytes.clone()),
    }
}

fn integer_of(value: &Value, path: &FieldPath) -> Result<i128, WriteError> {
    match value {
        Value::Int(v) => Ok(i128::from(*v)),
        Value::UInt(v) => Ok(i128::from(*v)),
        Value::Bool(v) => Ok(i128::from(*v)),
        _ => Err(type_mismatch(path, "integer")),
    }
}

/// Byte buffer given as an array of integers, as JSON carries it.
fn bytes_of(items: &[Value], path: &FieldPath) -> Result<Vec<u8>, WriteError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = FieldPath::Index(path, i);
            u8::try_from(integer_of(item, &path)?).map_err(|_| out_of_range(&path))
        })
        .collect()
}

fn value_to_prim(kind: ScalarKind, value: &Value, path: &FieldPath) -> Result<Prim, WriteError> {
    macro_rules! int {
        ($variant:ident, $ty:ty) => {
            <$ty>::try_from(integer_of(value, path)?)
                .map(Prim::$variant)
                .map_err(|_| out_of_range(path))
        };
    }

    match kind {
        ScalarKind::Bool => match value {
            Value::Bool(v) => Ok(Prim::Bool(*v)),
            Value::Int(0) | Value::UInt(0) => Ok(Prim::Bool(false)),
            Value::Int(1) | Value::UInt(1) => Ok(Prim::Bool(true)),
            Value::Int(_) | Value::UInt(_) => Err(out_of_range(path)),
            _ => Err(type_mismatch(path, "bool")),
        },
        ScalarKind::I8 => int!(I8, i8),
        ScalarKind::U8 => int!(U8, u8),
        ScalarKind::I16 => int!(I16, i16),
        ScalarKind::U16 => int!(U16, u16),
        ScalarKind::I32 => int!(I32, i32),
        ScalarKind::U32 => int!(U32, u32),
        ScalarKind::I64 => int!(I64, i64),
        ScalarKind::U64 => int!(U64, u64),
        ScalarKind::F32 => {
            let v = value.as_f64().ok_or_else(|| type_mismatch(path, "number"))?;
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(out_of_range(path));
            }
            Ok(Prim::F32(v as f32))
        }
        ScalarKind::F64 => value
            .as_f64()
            .map(Prim::F64)
            .ok_or_else(|| type_mismatch(path, "number")),
    }
}

fn decode_text(
    text: &TextSpec,
    prims: &[Prim],
    start: usize,
    path: &FieldPath,
) -> Result<(Value, usize), ReadError> {
    let (payload, used) = match text.layout {
        TextLayout::Fixed { null_terminated } => {
            let Some(Prim::Bytes(bytes)) = prims.get(start) else {
                return Err(slot_mismatch(path));
            };
            let payload = if null_terminated {
                until_nul(bytes)
            } else {
                bytes.as_slice()
            };
            (payload, 1)
        }
        TextLayout::LengthPrefixed => {
            let (Some(Prim::U32(len)), Some(Prim::Bytes(bytes))) =
                (prims.get(start), prims.get(start + 1))
            else {
                return Err(slot_mismatch(path));
            };
            let len = *len as usize;
            if len > text.capacity {
                return Err(ReadError::LengthOutOfRange {
                    field: path.render(),
                    length: len,
                    capacity: text.capacity,
                });
            }
            (&bytes[..len], 2)
        }
    };

    let decoded = text.encoding.decode(payload).ok_or_else(|| ReadError::InvalidText {
        field: path.render(),
    })?;
    Ok((Value::String(decoded), used))
}

fn encode_text(
    text: &TextSpec,
    value: &Value,
    path: &FieldPath,
    out: &mut Vec<Prim>,
) -> Result<(), WriteError> {
    let Value::String(s) = value else {
        return Err(type_mismatch(path, "string"));
    };
    let bytes = text
        .encoding
        .encode(s)
        .ok_or_else(|| WriteError::Unrepresentable {
            field: path.render(),
        })?;
    if bytes.len() > text.capacity {
        return Err(WriteError::EncodingOverflow {
            field: path.render(),
            len: bytes.len(),
            capacity: text.capacity,
        });
    }

    if text.layout == TextLayout::LengthPrefixed {
        let len = u32::try_from(bytes.len()).map_err(|_| out_of_range(path))?;
        out.push(Prim::U32(len));
    }
    out.push(Prim::Bytes(bytes));
    Ok(())
}

fn word_of(prim: &Prim) -> Option<u16> {
    match prim {
        Prim::U8(w) => Some(u16::from(*w)),
        Prim::U16(w) => Some(*w),
        _ => None,
    }
}

fn decode_bits(
    field: &BitField,
    prims: &[Prim],
    start: usize,
    path: &FieldPath,
) -> Result<(Value, usize), ReadError> {
    let count = field.word_count();
    let words = prims
        .get(start..start + count)
        .and_then(|slice| slice.iter().map(word_of).collect::<Option<Vec<u16>>>())
        .ok_or_else(|| slot_mismatch(path))?;

    let mut flags = ValueMap::with_capacity(field.names.len());
    for (i, name) in field.names.iter().enumerate() {
        if !name.is_empty() {
            flags.insert(name.as_str(), bits::read_bit(&words, i, field.width));
        }
    }
    Ok((Value::Map(flags), count))
}

fn flag_is_set(value: &Value, path: &FieldPath) -> Result<bool, WriteError> {
    match value {
        Value::Null => Ok(false),
        Value::Bool(v) => Ok(*v),
        Value::Int(v) => Ok(*v != 0),
        Value::UInt(v) => Ok(*v != 0),
        _ => Err(type_mismatch(path, "bool")),
    }
}

fn encode_bits(
    field: &BitField,
    value: Option<&Value>,
    path: &FieldPath,
    out: &mut Vec<Prim>,
) -> Result<(), WriteError> {
    let mut words = vec![0u16; field.word_count()];

    match value {
        None | Some(Value::Null) => {}
        Some(Value::Map(flags)) => {
            for (i, name) in field.names.iter().enumerate() {
                let Some(flag) = flags.get(name).filter(|_| !name.is_empty()) else {
                    continue;
                };
                if flag_is_set(flag, &FieldPath::Field(path, name))? {
                    bits::set_bit(&mut words, i, field.width);
                }
            }
        }
        Some(_) => return Err(type_mismatch(path, "map of flags")),
    }

    out.extend(words.into_iter().map(|w| match field.width {
        bits::WordWidth::W8 => Prim::U8(w as u8),
        bits::WordWidth::W16 => Prim::U16(w),
    }));
    Ok(())
}

fn decode_record(
    record: &Record,
    prims: &[Prim],
    start: usize,
    path: &FieldPath,
) -> Result<(Value, usize), ReadError> {
    let mut map = ValueMap::with_capacity(record.fields().len());
    let mut cursor = start;

    for field in record.fields() {
        let (value, used) = field
            .node
            .decode(prims, cursor, &FieldPath::Field(path, &field.name))?;
        cursor += used;
        map.insert(field.name.as_str(), value);
    }

    Ok((Value::Map(map), cursor - start))
}

fn encode_record(
    record: &Record,
    map: &ValueMap,
    path: &FieldPath,
    out: &mut Vec<Prim>,
) -> Result<(), WriteError> {
    for field in record.fields() {
        field.node.encode(
            map.get(&field.name),
            &FieldPath::Field(path, &field.name),
            out,
        )?;
    }
    Ok(())
}
