//! JSON‑deserializable schema description and value (de)serialization.
//!
//! A [SchemaDef] describes a record the same way the builder API does: an
//! ordered list of named fields, each with a type. It compiles into a
//! [Schema] with `TryFrom` or [Schema::from_json].
//!
//! ```json
//! {
//!   "config": { "byte_order": "Little" },
//!   "fields": [
//!     { "name": "Flags", "type": "Bits", "names": ["Run", "Fault"], "word_bits": 8 },
//!     { "name": "Speed", "type": "Scalar", "kind": "REAL" },
//!     { "name": "Label", "type": "Text", "len": 20 },
//!     { "name": "Delay", "type": "Builtin", "type_name": "TIMER" }
//!   ]
//! }
//! ```

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap, SerializeSeq},
};

use crate::{
    bits::WordWidth,
    builtins,
    errors::CompileError,
    field::{BitField, Node, TextSpec},
    record::RecordBuilder,
    schema::Schema,
    slot::{ByteOrder, ScalarKind},
    text::Encoding,
    value::{Value, ValueMap},
};

/// Codec options applied to the whole schema.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ConfigDef {
    #[serde(default)]
    pub byte_order: ByteOrder,
}

/// Top‑level schema definition: the fields of the root record.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub config: Option<ConfigDef>,
}

/// A named field; the remaining keys describe its type.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Becomes the key in the decoded map.
    pub name: String,
    #[serde(flatten)]
    pub node: NodeDef,
}

/// Scalar type names as the controller spells them.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScalarDef {
    Sint,
    Usint,
    Bool,
    Int,
    Uint,
    Dint,
    Udint,
    Lint,
    Ulint,
    Real,
    Lreal,
}

impl From<ScalarDef> for ScalarKind {
    fn from(value: ScalarDef) -> Self {
        match value {
            ScalarDef::Sint => ScalarKind::I8,
            ScalarDef::Usint => ScalarKind::U8,
            ScalarDef::Bool => ScalarKind::Bool,
            ScalarDef::Int => ScalarKind::I16,
            ScalarDef::Uint => ScalarKind::U16,
            ScalarDef::Dint => ScalarKind::I32,
            ScalarDef::Udint => ScalarKind::U32,
            ScalarDef::Lint => ScalarKind::I64,
            ScalarDef::Ulint => ScalarKind::U64,
            ScalarDef::Real => ScalarKind::F32,
            ScalarDef::Lreal => ScalarKind::F64,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Type of a field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum NodeDef {
    Scalar {
        kind: ScalarDef,
    },
    Bytes {
        len: usize,
    },
    Text {
        len: usize,
        #[serde(default)]
        encoding: Encoding,
        #[serde(default = "default_true")]
        null_terminated: bool,
        #[serde(default)]
        length_prefixed: bool,
    },
    Padding {
        len: usize,
    },
    Bits {
        names: Vec<String>,
        /// 8 or 16; defaults to 16.
        #[serde(default)]
        word_bits: Option<usize>,
    },
    Array {
        element: Box<NodeDef>,
        count: usize,
    },
    Record {
        fields: Vec<FieldDef>,
    },
    /// One of the names known to [builtins::lookup].
    Builtin {
        type_name: String,
    },
}

impl TryFrom<NodeDef> for Node {
    type Error = CompileError;

    fn try_from(value: NodeDef) -> Result<Self, Self::Error> {
        let node = match value {
            NodeDef::Scalar { kind } => Node::Scalar(kind.into()),
            NodeDef::Bytes { len } => Node::Bytes(len),
            NodeDef::Text {
                len,
                encoding,
                null_terminated,
                length_prefixed,
            } => {
                let spec = if length_prefixed {
                    TextSpec::length_prefixed(len)
                } else {
                    TextSpec::fixed(len).null_terminated(null_terminated)
                };
                spec.encoding(encoding).into()
            }
            NodeDef::Padding { len } => Node::Padding(len),
            NodeDef::Bits { names, word_bits } => {
                let width = match word_bits {
                    None | Some(16) => WordWidth::W16,
                    Some(8) => WordWidth::W8,
                    Some(other) => return Err(CompileError::InvalidWordWidth(other)),
                };
                Node::Bits(BitField::new(names, width))
            }
            NodeDef::Array { element, count } => Node::array(Node::try_from(*element)?, count),
            NodeDef::Record { fields } => record_from_defs(fields)?,
            NodeDef::Builtin { type_name } => {
                builtins::lookup(&type_name).ok_or(CompileError::UnknownBuiltin(type_name))?
            }
        };
        node.validate()?;
        Ok(node)
    }
}

fn record_from_defs(fields: Vec<FieldDef>) -> Result<Node, CompileError> {
    let mut builder = RecordBuilder::new();
    for field in fields {
        builder.define(field.name, Node::try_from(field.node)?);
    }
    Ok(builder.build()?.into())
}

impl TryFrom<SchemaDef> for Schema {
    type Error = CompileError;

    fn try_from(value: SchemaDef) -> Result<Self, Self::Error> {
        let byte_order = value.config.unwrap_or_default().byte_order;
        Ok(Schema::new(record_from_defs(value.fields)?)?.with_byte_order(byte_order))
    }
}

impl Schema {
    /// Compiles a schema from a JSON [SchemaDef] document.
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let def: SchemaDef = serde_json::from_str(json)
            .map_err(|e| CompileError::InvalidDocument(e.to_string()))?;
        def.try_into()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bytes(v) => serializer.serialize_bytes(v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a value tree")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Value, A::Error> {
        ValueMapVisitor.visit_map(access).map(Value::Map)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueMapVisitor;

impl<'de> Visitor<'de> for ValueMapVisitor {
    type Value = ValueMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of field values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ValueMap, A::Error> {
        let mut map = ValueMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for ValueMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ValueMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMER_DOC: &str = r#"{
        "fields": [
            { "name": "Padding", "type": "Padding", "len": 2 },
            { "name": "StatusBits", "type": "Bits",
              "names": ["", "", "", "", "", "", "", "", "", "", "", "", "", "DN", "TT", "EN"] },
            { "name": "PRE", "type": "Scalar", "kind": "DINT" },
            { "name": "ACC", "type": "Scalar", "kind": "DINT" }
        ]
    }"#;

    #[test]
    fn test_schema_from_json_matches_builtin() {
        let schema = Schema::from_json(TIMER_DOC).unwrap();
        assert_eq!(schema.root(), &builtins::timer());
        assert_eq!(schema.byte_order(), ByteOrder::Little);
    }

    #[test]
    fn test_nested_definitions() {
        let json = r#"{
            "config": { "byte_order": "Big" },
            "fields": [
                { "name": "Flags", "type": "Bits", "names": ["a", "b"], "word_bits": 8 },
                { "name": "Delay", "type": "Builtin", "type_name": "TIMER" },
                { "name": "Samples", "type": "Array", "count": 4,
                  "element": { "type": "Scalar", "kind": "LREAL" } },
                { "name": "Label", "type": "Text", "len": 10, "encoding": "Ascii" },
                { "name": "Inner", "type": "Record",
                  "fields": [{ "name": "x", "type": "Scalar", "kind": "SINT" }] }
            ]
        }"#;
        let schema = Schema::from_json(json).unwrap();
        assert_eq!(schema.byte_order(), ByteOrder::Big);
        assert_eq!(schema.alignment(), 8);
        // Flags 0..1, Delay 4..16, Samples 16..48, Label 48..58, Inner 58..59, tail to 64
        assert_eq!(schema.size(), 64);
    }

    #[test]
    fn test_invalid_definitions() {
        let json = r#"{ "fields": [{ "name": "x", "type": "Bits", "names": ["a"], "word_bits": 32 }] }"#;
        assert_eq!(
            Schema::from_json(json).unwrap_err(),
            CompileError::InvalidWordWidth(32)
        );

        let json = r#"{ "fields": [{ "name": "x", "type": "Builtin", "type_name": "MOTOR" }] }"#;
        assert_eq!(
            Schema::from_json(json).unwrap_err(),
            CompileError::UnknownBuiltin("MOTOR".to_string())
        );

        assert!(matches!(
            Schema::from_json("{"),
            Err(CompileError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_oversized_definitions() {
        let json = r#"{ "fields": [{ "name": "x", "type": "Text",
            "len": 18446744073709551615, "length_prefixed": true }] }"#;
        assert_eq!(
            Schema::from_json(json).unwrap_err(),
            CompileError::LayoutTooLarge
        );

        let json = r#"{ "fields": [{ "name": "x", "type": "Array", "count": 3,
            "element": { "type": "Bytes", "len": 9223372036854775807 } }] }"#;
        assert_eq!(
            Schema::from_json(json).unwrap_err(),
            CompileError::LayoutTooLarge
        );
    }

    #[test]
    fn test_bytes_survive_json() {
        let schema = Schema::from_json(
            r#"{ "fields": [{ "name": "raw", "type": "Bytes", "len": 3 }] }"#,
        )
        .unwrap();
        let decoded = schema.decode(&[1, 2, 3]).unwrap();
        let json = serde_json::to_string(&decoded).unwrap();
        assert_eq!(json, r#"{"raw":[1,2,3]}"#);

        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(schema.encode(&parsed).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_value_json_keeps_field_order() {
        let schema = Schema::from_json(TIMER_DOC).unwrap();
        let decoded = schema
            .decode(&[0, 0, 0, 0x80, 5, 0, 0, 0, 2, 0, 0, 0])
            .unwrap();
        assert_eq!(
            serde_json::to_string(&decoded).unwrap(),
            r#"{"Padding":null,"StatusBits":{"DN":false,"TT":false,"EN":true},"PRE":5,"ACC":2}"#
        );
    }

    #[test]
    fn test_value_from_json_encodes() {
        let schema = Schema::from_json(TIMER_DOC).unwrap();
        let value: Value =
            serde_json::from_str(r#"{"StatusBits":{"DN":true},"PRE":1000,"ACC":-1}"#).unwrap();
        assert_eq!(
            schema.encode(&value).unwrap(),
            vec![0, 0, 0x00, 0x20, 0xe8, 0x03, 0, 0, 0xff, 0xff, 0xff, 0xff]
        );
    }
}
