//! Controller built-in data types.
//!
//! Scalar aliases follow the controller's type names. `TIMER` and `COUNTER`
//! keep their status bits in the upper 16 bits of a 32-bit word; the lower
//! half is exposed as a 2-byte `Padding` field.

use std::sync::{Arc, LazyLock};

use crate::{
    field::{Node, TextSpec},
    record::{Record, RecordBuilder},
    slot::ScalarKind,
};

pub const SINT: Node = Node::Scalar(ScalarKind::I8);
pub const USINT: Node = Node::Scalar(ScalarKind::U8);
pub const BOOL: Node = Node::Scalar(ScalarKind::Bool);
pub const INT: Node = Node::Scalar(ScalarKind::I16);
pub const UINT: Node = Node::Scalar(ScalarKind::U16);
pub const DINT: Node = Node::Scalar(ScalarKind::I32);
pub const UDINT: Node = Node::Scalar(ScalarKind::U32);
pub const LINT: Node = Node::Scalar(ScalarKind::I64);
pub const ULINT: Node = Node::Scalar(ScalarKind::U64);
pub const REAL: Node = Node::Scalar(ScalarKind::F32);
pub const LREAL: Node = Node::Scalar(ScalarKind::F64);

/// Capacity of the default `STRING` type.
pub const STRING_CAPACITY: usize = 82;

/// Status bit names preceded by `unused` reserved positions.
fn status_bits(unused: usize, names: &[&str]) -> Node {
    Node::bits(std::iter::repeat_n("", unused).chain(names.iter().copied()))
}

static TIMER: LazyLock<Arc<Record>> = LazyLock::new(|| {
    Arc::new(
        RecordBuilder::new()
            .field("Padding", Node::Padding(2))
            .field("StatusBits", status_bits(13, &["DN", "TT", "EN"]))
            .field("PRE", DINT)
            .field("ACC", DINT)
            .build_unchecked(),
    )
});

static COUNTER: LazyLock<Arc<Record>> = LazyLock::new(|| {
    Arc::new(
        RecordBuilder::new()
            .field("Padding", Node::Padding(2))
            .field("StatusBits", status_bits(11, &["UN", "OV", "DN", "CD", "CU"]))
            .field("PRE", DINT)
            .field("ACC", DINT)
            .build_unchecked(),
    )
});

/// `TIMER`: `StatusBits {DN, TT, EN}`, `PRE`, `ACC`. 12 bytes.
pub fn timer() -> Node {
    Node::Record(Arc::clone(&TIMER))
}

/// `COUNTER`: `StatusBits {UN, OV, DN, CD, CU}`, `PRE`, `ACC`. 12 bytes.
pub fn counter() -> Node {
    Node::Record(Arc::clone(&COUNTER))
}

/// `STRING`: length-prefixed text with 82 bytes of capacity. 88 bytes.
pub fn string() -> Node {
    string_of(STRING_CAPACITY)
}

/// A user-defined string type with the given capacity.
pub fn string_of(capacity: usize) -> Node {
    TextSpec::length_prefixed(capacity).into()
}

/// Resolves a built-in type by name, case-insensitively.
pub fn lookup(name: &str) -> Option<Node> {
    let node = match name.to_ascii_uppercase().as_str() {
        "SINT" => SINT,
        "USINT" => USINT,
        "BOOL" => BOOL,
        "INT" => INT,
        "UINT" => UINT,
        "DINT" => DINT,
        "UDINT" => UDINT,
        "LINT" => LINT,
        "ULINT" => ULINT,
        "REAL" => REAL,
        "LREAL" => LREAL,
        "STRING" => string(),
        "TIMER" => timer(),
        "COUNTER" => counter(),
        _ => return None,
    };
    Some(node)
}
