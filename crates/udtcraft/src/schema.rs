//! Schema: a root node plus a byte order, used to decode and encode buffers.

use tracing::{debug, trace};

use crate::{
    codec::FieldPath,
    errors::{CompileError, ReadError, WriteError},
    field::Node,
    slot::{self, ByteOrder, SlotKind},
    value::Value,
};

/// A compiled schema. Build a [crate::record::Record] (or any other [Node]),
/// wrap it with [Schema::new], then [Schema::decode] and [Schema::encode] as
/// often as needed. A schema holds no per-call state and can be shared
/// between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: Node,
    format: Vec<SlotKind>,
    byte_order: ByteOrder,
}

impl Schema {
    /// Creates a little-endian schema. Fails if `root` is invalid.
    pub fn new(root: impl Into<Node>) -> Result<Self, CompileError> {
        let root = root.into();
        root.validate()?;
        let format = root.format();
        debug!(
            size = root.size(),
            alignment = root.alignment(),
            slots = format.len(),
            "created schema"
        );

        Ok(Schema {
            root,
            format,
            byte_order: ByteOrder::default(),
        })
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Compiled byte size; every encoded buffer has exactly this length.
    pub fn size(&self) -> usize {
        self.root.size()
    }

    pub fn alignment(&self) -> usize {
        self.root.alignment()
    }

    /// Flat primitive slot layout.
    pub fn format(&self) -> &[SlotKind] {
        &self.format
    }

    /// All-zero buffer of [Schema::size] bytes.
    pub fn zeroed(&self) -> Vec<u8> {
        self.root.zeroed()
    }

    /// Decodes `data` from its start. Trailing bytes are ignored.
    pub fn decode(&self, data: &[u8]) -> Result<Value, ReadError> {
        self.decode_with_order(data, 0, self.byte_order)
    }

    /// Decodes the layout found at `offset` bytes into `data`.
    pub fn decode_at(&self, data: &[u8], offset: usize) -> Result<Value, ReadError> {
        self.decode_with_order(data, offset, self.byte_order)
    }

    /// Decodes at `offset` using `byte_order` instead of the schema's own.
    pub fn decode_with_order(
        &self,
        data: &[u8],
        offset: usize,
        byte_order: ByteOrder,
    ) -> Result<Value, ReadError> {
        let data = data.get(offset..).unwrap_or_default();
        let prims = slot::unpack(&self.format, data, byte_order)?;
        let (value, used) = self.root.decode(&prims, 0, &FieldPath::Root)?;
        trace!(bytes = self.size(), offset, slots = used, "decoded buffer");
        Ok(value)
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, WriteError> {
        self.encode_with_order(value, self.byte_order)
    }

    /// Encodes using `byte_order` instead of the schema's own.
    pub fn encode_with_order(
        &self,
        value: &Value,
        byte_order: ByteOrder,
    ) -> Result<Vec<u8>, WriteError> {
        let mut prims = Vec::with_capacity(slot::value_slot_count(&self.format));
        self.root.encode(Some(value), &FieldPath::Root, &mut prims)?;
        let bytes = slot::pack(&self.format, &prims, byte_order);
        trace!(bytes = bytes.len(), slots = prims.len(), "encoded value");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        record::Record,
        slot::ScalarKind,
        value::ValueMap,
    };

    use super::*;

    fn schema() -> Schema {
        let record = Record::builder()
            .field("id", ScalarKind::U16)
            .field("level", ScalarKind::I32)
            .build()
            .unwrap();
        Schema::new(record).unwrap()
    }

    fn value(id: u16, level: i32) -> Value {
        let map: ValueMap = [("id", Value::from(id)), ("level", Value::from(level))]
            .into_iter()
            .collect();
        Value::Map(map)
    }

    #[test]
    fn test_decode() {
        let data = [0x01, 0x02, 0xaa, 0xbb, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(schema().decode(&data).unwrap(), value(0x0201, -1));
    }

    #[test]
    fn test_decode_at_offset() {
        let data = [0xee, 0xee, 0x05, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00];
        assert_eq!(schema().decode_at(&data, 2).unwrap(), value(5, 7));
    }

    #[test]
    fn test_decode_short_buffer() {
        assert_eq!(
            schema().decode(&[0u8; 7]).unwrap_err(),
            ReadError::ShortBuffer { needed: 8, have: 7 }
        );
        assert_eq!(
            schema().decode_at(&[0u8; 8], 10).unwrap_err(),
            ReadError::ShortBuffer { needed: 8, have: 0 }
        );
    }

    #[test]
    fn test_encode_zero_fills_padding() {
        let bytes = schema().encode(&value(1, 2)).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn test_big_endian() {
        let schema = schema().with_byte_order(ByteOrder::Big);
        let bytes = schema.encode(&value(1, 2)).unwrap();
        assert_eq!(bytes, vec![0, 1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(schema.decode(&bytes).unwrap(), value(1, 2));
        assert_eq!(
            schema.decode_with_order(&bytes, 0, ByteOrder::Little).unwrap(),
            value(0x0100, 0x0200_0000)
        );
    }

    #[test]
    fn test_array_root() {
        let schema = Schema::new(Node::array(ScalarKind::I16, 3)).unwrap();
        let value = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let bytes = schema.encode(&value).unwrap();
        assert_eq!(bytes, vec![1, 0, 2, 0, 3, 0]);
        assert_eq!(schema.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_invalid_root() {
        assert_eq!(
            Schema::new(Node::Padding(0)).unwrap_err(),
            CompileError::InvalidPaddingLength
        );
    }

    #[test]
    fn test_zeroed_decodes() {
        let schema = schema();
        assert_eq!(schema.zeroed().len(), schema.size());
        assert_eq!(schema.decode(&schema.zeroed()).unwrap(), value(0, 0));
    }
}
