use proptest::prelude::*;
use udtcraft::{
    bits::WordWidth,
    field::{BitField, Node, TextSpec},
    record::{Record, RecordBuilder},
    schema::Schema,
    slot::{ByteOrder, ScalarKind},
    value::{Value, ValueMap},
};

const SCALARS: [ScalarKind; 11] = [
    ScalarKind::Bool,
    ScalarKind::I8,
    ScalarKind::U8,
    ScalarKind::I16,
    ScalarKind::U16,
    ScalarKind::I32,
    ScalarKind::U32,
    ScalarKind::I64,
    ScalarKind::U64,
    ScalarKind::F32,
    ScalarKind::F64,
];

fn flag_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| if i % 3 == 2 { String::new() } else { format!("b{}", i) })
        .collect()
}

fn record_of(nodes: Vec<Node>) -> Node {
    let mut builder = RecordBuilder::new();
    for (i, node) in nodes.into_iter().enumerate() {
        builder.define(format!("f{}", i), node);
    }
    builder.build().unwrap().into()
}

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        prop::sample::select(SCALARS.to_vec()).prop_map(Node::Scalar),
        (1usize..6).prop_map(Node::Bytes),
        (1usize..12).prop_map(|n| TextSpec::fixed(n).into()),
        (1usize..12).prop_map(|n| TextSpec::length_prefixed(n).into()),
        (1usize..4).prop_map(Node::Padding),
        (1usize..40, any::<bool>()).prop_map(|(n, wide)| {
            let width = if wide { WordWidth::W16 } else { WordWidth::W8 };
            Node::Bits(BitField::new(flag_names(n), width))
        }),
    ]
}

fn node() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            (inner.clone(), 1usize..4).prop_map(|(element, count)| Node::array(element, count)),
            prop::collection::vec(inner, 1..6).prop_map(record_of),
        ]
    })
}

fn record() -> impl Strategy<Value = Node> {
    prop::collection::vec(node(), 1..8).prop_map(record_of)
}

fn scalar_value(kind: ScalarKind) -> BoxedStrategy<Value> {
    match kind {
        ScalarKind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        ScalarKind::I8 => any::<i8>().prop_map(Value::from).boxed(),
        ScalarKind::U8 => any::<u8>().prop_map(Value::from).boxed(),
        ScalarKind::I16 => any::<i16>().prop_map(Value::from).boxed(),
        ScalarKind::U16 => any::<u16>().prop_map(Value::from).boxed(),
        ScalarKind::I32 => any::<i32>().prop_map(Value::from).boxed(),
        ScalarKind::U32 => any::<u32>().prop_map(Value::from).boxed(),
        ScalarKind::I64 => any::<i64>().prop_map(Value::from).boxed(),
        ScalarKind::U64 => any::<u64>().prop_map(Value::from).boxed(),
        ScalarKind::F32 => (-1.0e6f32..1.0e6f32).prop_map(Value::from).boxed(),
        ScalarKind::F64 => (-1.0e12f64..1.0e12f64).prop_map(Value::Float).boxed(),
    }
}

/// Values in the form decoding produces them.
fn value_for(node: &Node) -> BoxedStrategy<Value> {
    match node {
        Node::Scalar(kind) => scalar_value(*kind),
        Node::Bytes(len) => prop::collection::vec(any::<u8>(), *len)
            .prop_map(Value::Bytes)
            .boxed(),
        Node::Text(text) => {
            proptest::string::string_regex(&format!("[a-zA-Z0-9 ]{{0,{}}}", text.capacity))
                .unwrap()
                .prop_map(Value::String)
                .boxed()
        }
        Node::Padding(_) => Just(Value::Null).boxed(),
        Node::Bits(field) => {
            let names = field.names.clone();
            prop::collection::vec(any::<bool>(), names.len())
                .prop_map(move |flags| {
                    let map: ValueMap = names
                        .iter()
                        .zip(flags)
                        .filter(|(name, _)| !name.is_empty())
                        .map(|(name, flag)| (name.clone(), flag))
                        .collect();
                    Value::Map(map)
                })
                .boxed()
        }
        Node::Array(array) => prop::collection::vec(value_for(&array.element), array.count)
            .prop_map(Value::Array)
            .boxed(),
        Node::Record(record) => {
            let names: Vec<String> = record.fields().iter().map(|f| f.name.clone()).collect();
            let values: Vec<BoxedStrategy<Value>> =
                record.fields().iter().map(|f| value_for(&f.node)).collect();
            values
                .prop_map(move |values| {
                    let map: ValueMap = names.iter().cloned().zip(values).collect();
                    Value::Map(map)
                })
                .boxed()
        }
    }
}

fn schema_and_value() -> impl Strategy<Value = (Node, Value)> {
    record().prop_flat_map(|node| {
        let values = value_for(&node);
        (Just(node), values)
    })
}

fn contains_eight_byte_leaf(node: &Node) -> bool {
    match node {
        Node::Scalar(kind) => kind.width() == 8,
        Node::Array(array) => contains_eight_byte_leaf(&array.element),
        Node::Record(record) => record.fields().iter().any(|f| contains_eight_byte_leaf(&f.node)),
        _ => false,
    }
}

fn check_alignment(record: &Record) {
    let mut max = 1;
    for field in record.fields() {
        let alignment = field.node.alignment();
        assert_eq!(field.offset % alignment, 0, "field {} misaligned", field.name);
        max = max.max(alignment);
        if let Node::Record(inner) = &field.node {
            check_alignment(inner);
        }
    }
    assert_eq!(record.alignment(), max);
    assert_eq!(record.size() % record.alignment(), 0);
}

proptest! {
    #[test]
    fn round_trip((node, value) in schema_and_value(), big in any::<bool>()) {
        let order = if big { ByteOrder::Big } else { ByteOrder::Little };
        let schema = Schema::new(node).unwrap().with_byte_order(order);
        let bytes = schema.encode(&value).unwrap();
        prop_assert_eq!(bytes.len(), schema.size());
        prop_assert_eq!(schema.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn re_encoding_decoded_bytes_is_stable((node, value) in schema_and_value()) {
        let schema = Schema::new(node).unwrap();
        let bytes = schema.encode(&value).unwrap();
        let again = schema.encode(&schema.decode(&bytes).unwrap()).unwrap();
        prop_assert_eq!(again, bytes);
    }

    #[test]
    fn fields_are_aligned(node in record()) {
        let Node::Record(record) = &node else { unreachable!() };
        check_alignment(record);
        prop_assert_eq!(record.alignment() == 8, contains_eight_byte_leaf(&node));
    }

    #[test]
    fn short_buffer_rejected(node in record()) {
        let schema = Schema::new(node).unwrap();
        prop_assume!(schema.size() > 0);
        let data = vec![0u8; schema.size() - 1];
        prop_assert!(schema.decode(&data).is_err());
    }

    #[test]
    fn bit_packing(flags in prop::collection::vec(any::<bool>(), 1..64), wide in any::<bool>()) {
        let width = if wide { WordWidth::W16 } else { WordWidth::W8 };
        let names: Vec<String> = (0..flags.len()).map(|i| format!("b{}", i)).collect();
        let field = BitField::new(names.clone(), width);
        let words = field.word_count();
        prop_assert_eq!(words, flags.len().div_ceil(width.bits()));

        let schema = Schema::new(Node::Bits(field)).unwrap();
        let value: ValueMap = names.iter().cloned().zip(flags.iter().copied()).collect();
        let bytes = schema.encode(&Value::Map(value)).unwrap();
        prop_assert_eq!(bytes.len(), words * width.bytes());

        for (i, flag) in flags.iter().enumerate() {
            let word = i / width.bits();
            let bit = i % width.bits();
            let raw = match width {
                WordWidth::W8 => u16::from(bytes[word]),
                WordWidth::W16 => u16::from_le_bytes([bytes[2 * word], bytes[2 * word + 1]]),
            };
            prop_assert_eq!((raw >> bit) & 1 == 1, *flag);
        }
    }
}
