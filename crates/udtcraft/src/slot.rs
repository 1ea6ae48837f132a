//! Primitive slots: the flat, fixed-width units a compiled layout is made of.
//!
//! A layout is a sequence of [SlotKind]s. Reading a buffer against it yields
//! one [Prim] per scalar or byte slot; padding slots occupy bytes but yield
//! nothing. Writing is the inverse.

use bytes::{Buf, BufMut};

use crate::errors::ReadError;

/// Byte order applied uniformly to every multi-byte slot of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Fixed-width numeric kinds a scalar slot can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// One byte, zero is false.
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    /// Width in bytes; also the natural alignment.
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::Bool | ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
        }
    }

    /// All-zero primitive of this kind.
    pub(crate) fn zero(self) -> Prim {
        match self {
            ScalarKind::Bool => Prim::Bool(false),
            ScalarKind::I8 => Prim::I8(0),
            ScalarKind::U8 => Prim::U8(0),
            ScalarKind::I16 => Prim::I16(0),
            ScalarKind::U16 => Prim::U16(0),
            ScalarKind::I32 => Prim::I32(0),
            ScalarKind::U32 => Prim::U32(0),
            ScalarKind::I64 => Prim::I64(0),
            ScalarKind::U64 => Prim::U64(0),
            ScalarKind::F32 => Prim::F32(0.0),
            ScalarKind::F64 => Prim::F64(0.0),
        }
    }
}

/// One element of a compiled layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Scalar(ScalarKind),
    /// Raw bytes of a fixed length.
    Bytes(usize),
    /// Filler bytes with no value.
    Pad(usize),
}

impl SlotKind {
    pub const fn width(self) -> usize {
        match self {
            SlotKind::Scalar(kind) => kind.width(),
            SlotKind::Bytes(len) | SlotKind::Pad(len) => len,
        }
    }

    /// Whether this slot produces a [Prim] when read.
    pub const fn carries_value(self) -> bool {
        !matches!(self, SlotKind::Pad(_))
    }
}

/// A primitive value read from (or to be written to) one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Prim {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
}

/// Total byte size of a layout.
pub fn format_size(format: &[SlotKind]) -> usize {
    format.iter().map(|slot| slot.width()).sum()
}

/// Number of value-carrying slots in a layout.
pub fn value_slot_count(format: &[SlotKind]) -> usize {
    format.iter().filter(|slot| slot.carries_value()).count()
}

macro_rules! get_ordered {
    ($buf:expr, $order:expr, $le:ident, $be:ident) => {
        match $order {
            ByteOrder::Little => $buf.$le(),
            ByteOrder::Big => $buf.$be(),
        }
    };
}

macro_rules! put_ordered {
    ($buf:expr, $order:expr, $le:ident, $be:ident, $v:expr) => {
        match $order {
            ByteOrder::Little => $buf.$le($v),
            ByteOrder::Big => $buf.$be($v),
        }
    };
}

fn read_scalar<B: Buf>(buf: &mut B, kind: ScalarKind, order: ByteOrder) -> Prim {
    match kind {
        ScalarKind::Bool => Prim::Bool(buf.get_u8() != 0),
        ScalarKind::I8 => Prim::I8(buf.get_i8()),
        ScalarKind::U8 => Prim::U8(buf.get_u8()),
        ScalarKind::I16 => Prim::I16(get_ordered!(buf, order, get_i16_le, get_i16)),
        ScalarKind::U16 => Prim::U16(get_ordered!(buf, order, get_u16_le, get_u16)),
        ScalarKind::I32 => Prim::I32(get_ordered!(buf, order, get_i32_le, get_i32)),
        ScalarKind::U32 => Prim::U32(get_ordered!(buf, order, get_u32_le, get_u32)),
        ScalarKind::I64 => Prim::I64(get_ordered!(buf, order, get_i64_le, get_i64)),
        ScalarKind::U64 => Prim::U64(get_ordered!(buf, order, get_u64_le, get_u64)),
        ScalarKind::F32 => Prim::F32(get_ordered!(buf, order, get_f32_le, get_f32)),
        ScalarKind::F64 => Prim::F64(get_ordered!(buf, order, get_f64_le, get_f64)),
    }
}

/// Reads `data` according to `format`. Fails if `data` is shorter than the layout.
pub fn unpack(format: &[SlotKind], data: &[u8], order: ByteOrder) -> Result<Vec<Prim>, ReadError> {
    let needed = format_size(format);
    if data.len() < needed {
        return Err(ReadError::ShortBuffer {
            needed,
            have: data.len(),
        });
    }

    let mut buf = data;
    let mut prims = Vec::with_capacity(value_slot_count(format));

    for slot in format {
        match *slot {
            SlotKind::Scalar(kind) => prims.push(read_scalar(&mut buf, kind, order)),
            SlotKind::Bytes(len) => {
                let mut bytes = vec![0u8; len];
                buf.copy_to_slice(&mut bytes);
                prims.push(Prim::Bytes(bytes));
            }
            SlotKind::Pad(len) => buf.advance(len),
        }
    }

    Ok(prims)
}

fn write_prim<B: BufMut>(buf: &mut B, prim: &Prim, width: usize, order: ByteOrder) {
    match prim {
        Prim::Bool(v) => buf.put_u8(u8::from(*v)),
        Prim::I8(v) => buf.put_i8(*v),
        Prim::U8(v) => buf.put_u8(*v),
        Prim::I16(v) => put_ordered!(buf, order, put_i16_le, put_i16, *v),
        Prim::U16(v) => put_ordered!(buf, order, put_u16_le, put_u16, *v),
        Prim::I32(v) => put_ordered!(buf, order, put_i32_le, put_i32, *v),
        Prim::U32(v) => put_ordered!(buf, order, put_u32_le, put_u32, *v),
        Prim::I64(v) => put_ordered!(buf, order, put_i64_le, put_i64, *v),
        Prim::U64(v) => put_ordered!(buf, order, put_u64_le, put_u64, *v),
        Prim::F32(v) => put_ordered!(buf, order, put_f32_le, put_f32, *v),
        Prim::F64(v) => put_ordered!(buf, order, put_f64_le, put_f64, *v),
        Prim::Bytes(bytes) => {
            let len = bytes.len().min(width);
            buf.put_slice(&bytes[..len]);
            buf.put_bytes(0, width - len);
        }
    }
}

/// Writes `prims` according to `format`, zero-filling padding and the unused
/// tail of byte slots. The output is always exactly [format_size] bytes long.
pub fn pack(format: &[SlotKind], prims: &[Prim], order: ByteOrder) -> Vec<u8> {
    let size = format_size(format);
    let mut out: Vec<u8> = Vec::with_capacity(size);
    let mut prims = prims.iter();

    for slot in format {
        match *slot {
            SlotKind::Pad(len) => out.put_bytes(0, len),
            slot => match prims.next() {
                Some(prim) => write_prim(&mut out, prim, slot.width(), order),
                None => out.put_bytes(0, slot.width()),
            },
        }
    }

    debug_assert_eq!(out.len(), size, "primitive list does not match layout");
    out
}
