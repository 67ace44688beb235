use proptest::prelude::*;
use protosol::{decode_to_json, ByteBufferMut, DecodeError, Decoder, GeneratorOptions, Value, WireType};
use protosol_compiler::{
    compile_schemas,
    types::{EnumSchema, FieldSchema, FieldType, FileSchema, MessageSchema, ScalarKind},
};

fn decoder_with(options: &GeneratorOptions) -> Decoder {
    let mut file = FileSchema::new("test.proto");
    file.enums.push(EnumSchema::new("Color", &["RED", "GREEN", "BLUE"]));
    file.messages.push(MessageSchema::new(
        "Single",
        vec![FieldSchema::new("value", 1, FieldType::Scalar(ScalarKind::Int32))],
    ));
    file.messages.push(MessageSchema::new(
        "Paint",
        vec![FieldSchema::new("color", 1, FieldType::Enum("Color".into()))],
    ));
    file.messages.push(MessageSchema::new(
        "Point",
        vec![
            FieldSchema::new("x", 1, FieldType::Scalar(ScalarKind::Sint64)),
            FieldSchema::new("y", 2, FieldType::Scalar(ScalarKind::Sint64)),
        ],
    ));
    file.messages.push(MessageSchema::new(
        "Shape",
        vec![
            FieldSchema::new("name", 1, FieldType::Scalar(ScalarKind::String)),
            FieldSchema::new("values", 2, FieldType::Scalar(ScalarKind::Uint32)).repeated(true),
            FieldSchema::new("points", 3, FieldType::Message("Point".into())).repeated(false),
            FieldSchema::new("colors", 4, FieldType::Enum("Color".into())).repeated(true),
            FieldSchema::new("hash", 5, FieldType::Scalar(ScalarKind::Fixed64)),
        ],
    ));

    let compilation = compile_schemas(&[file], &[], options).unwrap();
    Decoder::from_compilation(&compilation)
}

fn decoder() -> Decoder {
    decoder_with(&GeneratorOptions::default())
}

fn point(x: i64, y: i64) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    if x != 0 {
        bb.write_key(1, WireType::Varint);
        bb.write_sint64(x);
    }
    if y != 0 {
        bb.write_key(2, WireType::Varint);
        bb.write_sint64(y);
    }
    bb.data()
}

fn packed_uint32(values: &[u32]) -> Vec<u8> {
    let mut payload = ByteBufferMut::new();
    for value in values {
        payload.write_varint(*value as u64);
    }
    payload.data()
}

#[test]
fn test_single_int32() {
    let value = decoder().decode("Single", &[0x08, 0x96, 0x01]).unwrap();
    assert_eq!(value.get("value"), Some(&Value::Int32(150)));
}

#[test]
fn test_enum_out_of_range() {
    let decoder = decoder();
    assert_eq!(
        decoder.decode("Paint", &[0x08, 0x02]).unwrap().get("color"),
        Some(&Value::Enum("Color".into(), 2))
    );
    assert_eq!(
        decoder.decode("Paint", &[0x08, 0x05]),
        Err(DecodeError::EnumOutOfRange {
            enum_name:   "Color".into(),
            value:       5,
            max_ordinal: 2,
        })
    );
    // Negative ordinals are ten-byte varints and out of range too
    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::Varint);
    bb.write_int32(-1);
    assert!(matches!(
        decoder.decode("Paint", &bb.data()),
        Err(DecodeError::EnumOutOfRange { value: -1, .. })
    ));
}

#[test]
fn test_packed_uint32() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(2, WireType::LengthDelimited);
    bb.write_length_delimited(&packed_uint32(&[3, 270, 86942]));
    let value = decoder().decode("Shape", &bb.data()).unwrap();

    let values = value.get("values").unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0], Value::UInt32(3));
    assert_eq!(values[1], Value::UInt32(270));
    assert_eq!(values[2], Value::UInt32(86942));
}

#[test]
fn test_packed_payload_must_be_filled_exactly() {
    // The wrapper claims two bytes but its varint spans three
    let mut bb = ByteBufferMut::new();
    bb.write_key(2, WireType::LengthDelimited);
    bb.write_varint(2);
    bb.write_bytes(&[0x9e, 0xa7, 0x05]);
    assert!(decoder().decode("Shape", &bb.data()).is_err());
}

#[test]
fn test_repeated_field_number() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::Varint);
    bb.write_sint64(4);
    bb.write_key(1, WireType::Varint);
    bb.write_sint64(5);
    assert_eq!(
        decoder().decode("Point", &bb.data()),
        Err(DecodeError::NonMonotonicField { field_number: 1, previous: 1 })
    );
}

#[test]
fn test_out_of_order_fields() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(2, WireType::Varint);
    bb.write_sint64(4);
    bb.write_key(1, WireType::Varint);
    bb.write_sint64(5);
    assert_eq!(
        decoder().decode("Point", &bb.data()),
        Err(DecodeError::NonMonotonicField { field_number: 1, previous: 2 })
    );
}

#[test]
fn test_truncated_buffer() {
    let bytes = [0x08, 0x96, 0x01];
    let decoder = decoder();
    assert!(decoder.decode_at("Single", &bytes[..2], 0, 3).is_err());

    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::LengthDelimited);
    bb.write_length_delimited(b"square");
    let bytes = bb.data();
    assert_eq!(
        decoder.decode_at("Shape", &bytes[..bytes.len() - 1], 0, bytes.len() as u64),
        Err(DecodeError::Truncated { pos: 1 })
    );
}

#[test]
fn test_trailing_bytes_are_rejected() {
    assert_eq!(
        decoder().decode_at("Single", &[0x08, 0x96, 0x01, 0x00], 0, 2),
        Err(DecodeError::LengthMismatch { expected: 2, found: 3 })
    );
}

#[test]
fn test_field_number_out_of_bounds() {
    assert_eq!(
        decoder().decode("Point", &[0x18, 0x02]),
        Err(DecodeError::FieldNumberOutOfBounds {
            message:      "Point".into(),
            field_number: 3,
            count:        2,
        })
    );
}

#[test]
fn test_wire_type_mismatch() {
    // fixed64 field sent as a varint
    assert_eq!(
        decoder().decode("Shape", &[0x28, 0x01]),
        Err(DecodeError::WireTypeMismatch {
            field_number: 5,
            expected:     WireType::Bits64,
            found:        WireType::Varint,
        })
    );
}

#[test]
fn test_unpacked_messages() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::LengthDelimited);
    bb.write_length_delimited(b"line");
    for (x, y) in [(1, 2), (0, 0), (-3, 4)] {
        bb.write_key(3, WireType::LengthDelimited);
        bb.write_length_delimited(&point(x, y));
    }
    bb.write_key(4, WireType::LengthDelimited);
    bb.write_length_delimited(&packed_uint32(&[1, 2]));

    let value = decoder().decode("Shape", &bb.data()).unwrap();
    assert_eq!(value.get("name").unwrap().as_string(), "line");
    assert_eq!(
        format!("{:?}", value.get("points").unwrap()),
        "[Point {x: 1, y: 2}, Point {x: 0, y: 0}, Point {x: -3, y: 4}]"
    );
    assert_eq!(
        value.get("colors"),
        Some(&Value::Array(vec![
            Value::Enum("Color".into(), 1),
            Value::Enum("Color".into(), 2),
        ]))
    );
    assert_eq!(value.get("values"), Some(&Value::Array(vec![])));
}

#[test]
fn test_unpacked_element_with_wrong_wire_type() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(3, WireType::LengthDelimited);
    bb.write_length_delimited(&point(1, 1));
    bb.write_key(3, WireType::Varint);
    bb.write_varint(1);
    assert!(matches!(
        decoder().decode("Shape", &bb.data()),
        Err(DecodeError::WireTypeMismatch { field_number: 3, .. })
    ));
}

#[test]
fn test_nested_failure_fails_the_parent() {
    let mut inner = ByteBufferMut::new();
    inner.write_key(2, WireType::Varint);
    inner.write_sint64(1);
    inner.write_key(1, WireType::Varint);
    inner.write_sint64(1);

    let mut bb = ByteBufferMut::new();
    bb.write_key(3, WireType::LengthDelimited);
    bb.write_length_delimited(&inner.data());
    assert!(matches!(
        decoder().decode("Shape", &bb.data()),
        Err(DecodeError::NonMonotonicField { .. })
    ));
}

#[test]
fn test_default_values() {
    let zero = [0x08, 0x00];
    let mut empty_packed = ByteBufferMut::new();
    empty_packed.write_key(2, WireType::LengthDelimited);
    empty_packed.write_length_delimited(&[]);
    let empty_packed = empty_packed.data();

    let strict = decoder();
    assert_eq!(
        strict.decode("Single", &zero),
        Err(DecodeError::DefaultValueEncoded { field: "value".into() })
    );
    assert_eq!(
        strict.decode("Shape", &empty_packed),
        Err(DecodeError::DefaultValueEncoded { field: "values".into() })
    );
    // An embedded message with every field at its default is still present
    assert!(strict.decode("Shape", &[0x1a, 0x00]).is_ok());

    let lenient = decoder_with(&GeneratorOptions { reject_default_values: false, ..Default::default() });
    assert_eq!(
        lenient.decode("Single", &zero).unwrap().get("value"),
        Some(&Value::Int32(0))
    );
    assert_eq!(
        lenient.decode("Shape", &empty_packed).unwrap().get("values"),
        Some(&Value::Array(vec![]))
    );
}

#[test]
fn test_decode_to_json() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::Varint);
    bb.write_sint64(-2);
    let json = decode_to_json(&decoder(), "Point", &bb.data()).unwrap();
    assert_eq!(json, "{\n  \"x\": -2,\n  \"y\": 0\n}");
}

fn all_features_decoder() -> Decoder {
    let scalars = [
        ("int32", ScalarKind::Int32),
        ("int64", ScalarKind::Int64),
        ("uint32", ScalarKind::Uint32),
        ("uint64", ScalarKind::Uint64),
        ("sint32", ScalarKind::Sint32),
        ("sint64", ScalarKind::Sint64),
        ("fixed32", ScalarKind::Fixed32),
        ("fixed64", ScalarKind::Fixed64),
        ("sfixed32", ScalarKind::Sfixed32),
        ("sfixed64", ScalarKind::Sfixed64),
        ("bool", ScalarKind::Bool),
    ];

    let mut fields = Vec::new();
    for (name, kind) in scalars {
        fields.push(FieldSchema::new(&format!("optional_{}", name), fields.len() as i32 + 1, FieldType::Scalar(kind)));
    }
    fields.push(FieldSchema::new("optional_string", 12, FieldType::Scalar(ScalarKind::String)));
    fields.push(FieldSchema::new("optional_bytes", 13, FieldType::Scalar(ScalarKind::Bytes)));
    fields.push(FieldSchema::new("optional_enum", 14, FieldType::Enum("Color".into())));
    fields.push(FieldSchema::new("optional_message", 15, FieldType::Message("OtherMessage".into())));
    for (name, kind) in scalars {
        let number = fields.len() as i32 + 1;
        fields.push(FieldSchema::new(&format!("repeated_{}", name), number, FieldType::Scalar(kind)).repeated(true));
    }
    fields.push(FieldSchema::new("repeated_enum", 27, FieldType::Enum("Color".into())).repeated(true));
    fields.push(FieldSchema::new("repeated_message", 28, FieldType::Message("OtherMessage".into())).repeated(false));

    let mut file = FileSchema::new("all_features.proto");
    file.enums.push(EnumSchema::new("Color", &["RED", "GREEN", "BLUE"]));
    file.messages.push(MessageSchema::new(
        "OtherMessage",
        vec![FieldSchema::new("other_field", 1, FieldType::Scalar(ScalarKind::Uint64))],
    ));
    file.messages.push(MessageSchema::new("Message", fields));

    let compilation = compile_schemas(&[file], &[], &GeneratorOptions::default()).unwrap();
    Decoder::from_compilation(&compilation)
}

fn write_packed(bb: &mut ByteBufferMut, field_number: u64, write: impl FnOnce(&mut ByteBufferMut)) {
    let mut payload = ByteBufferMut::new();
    write(&mut payload);
    bb.write_key(field_number, WireType::LengthDelimited);
    bb.write_length_delimited(&payload.data());
}

fn other_message(other_field: u64) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::Varint);
    bb.write_varint(other_field);
    bb.data()
}

#[test]
fn test_all_features() {
    let mut bb = ByteBufferMut::new();
    bb.write_key(1, WireType::Varint);
    bb.write_int32(-42);
    bb.write_key(2, WireType::Varint);
    bb.write_int64(-420);
    bb.write_key(3, WireType::Varint);
    bb.write_varint(42);
    bb.write_key(4, WireType::Varint);
    bb.write_varint(420);
    bb.write_key(5, WireType::Varint);
    bb.write_sint32(-69);
    bb.write_key(6, WireType::Varint);
    bb.write_sint64(-690);
    bb.write_key(7, WireType::Bits32);
    bb.write_fixed32(900);
    bb.write_key(8, WireType::Bits64);
    bb.write_fixed64(9000);
    bb.write_key(9, WireType::Bits32);
    bb.write_fixed32(-900i32 as u32);
    bb.write_key(10, WireType::Bits64);
    bb.write_fixed64(-9000i64 as u64);
    bb.write_key(11, WireType::Varint);
    bb.write_bool(true);
    bb.write_key(12, WireType::LengthDelimited);
    bb.write_length_delimited(b"foorbar");
    bb.write_key(13, WireType::LengthDelimited);
    bb.write_length_delimited(&[0xde, 0xad, 0xbe, 0xef]);
    bb.write_key(14, WireType::Varint);
    bb.write_int32(1);
    bb.write_key(15, WireType::LengthDelimited);
    bb.write_length_delimited(&other_message(3));

    write_packed(&mut bb, 16, |p| [-42, -41].into_iter().for_each(|v| p.write_int32(v)));
    write_packed(&mut bb, 17, |p| [-420, -421].into_iter().for_each(|v| p.write_int64(v)));
    write_packed(&mut bb, 18, |p| [42, 41].into_iter().for_each(|v| p.write_varint(v)));
    write_packed(&mut bb, 19, |p| [420, 419].into_iter().for_each(|v| p.write_varint(v)));
    write_packed(&mut bb, 20, |p| [-69, -68].into_iter().for_each(|v| p.write_sint32(v)));
    write_packed(&mut bb, 21, |p| [-690, -689].into_iter().for_each(|v| p.write_sint64(v)));
    write_packed(&mut bb, 22, |p| [900, 899].into_iter().for_each(|v| p.write_fixed32(v)));
    write_packed(&mut bb, 23, |p| [9000, 8999].into_iter().for_each(|v| p.write_fixed64(v)));
    write_packed(&mut bb, 24, |p| [-900i32, -899].into_iter().for_each(|v| p.write_fixed32(v as u32)));
    write_packed(&mut bb, 25, |p| [-9000i64, -8999].into_iter().for_each(|v| p.write_fixed64(v as u64)));
    write_packed(&mut bb, 26, |p| [true, false].into_iter().for_each(|v| p.write_bool(v)));
    write_packed(&mut bb, 27, |p| [1, 2].into_iter().for_each(|v| p.write_int32(v)));
    for _ in 0..2 {
        bb.write_key(28, WireType::LengthDelimited);
        bb.write_length_delimited(&other_message(3));
    }

    let value = all_features_decoder().decode("Message", &bb.data()).unwrap();
    let field = |name: &str| value.get(name).unwrap().clone();

    assert_eq!(field("optional_int32"), Value::Int32(-42));
    assert_eq!(field("optional_int64"), Value::Int64(-420));
    assert_eq!(field("optional_uint32"), Value::UInt32(42));
    assert_eq!(field("optional_uint64"), Value::UInt64(420));
    assert_eq!(field("optional_sint32"), Value::Int32(-69));
    assert_eq!(field("optional_sint64"), Value::Int64(-690));
    assert_eq!(field("optional_fixed32"), Value::UInt32(900));
    assert_eq!(field("optional_fixed64"), Value::UInt64(9000));
    assert_eq!(field("optional_sfixed32"), Value::Int32(-900));
    assert_eq!(field("optional_sfixed64"), Value::Int64(-9000));
    assert_eq!(field("optional_bool"), Value::Bool(true));
    assert_eq!(field("optional_string"), Value::String("foorbar".into()));
    assert_eq!(field("optional_bytes"), Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
    assert_eq!(field("optional_enum"), Value::Enum("Color".into(), 1));
    assert_eq!(field("optional_message").get("other_field"), Some(&Value::UInt64(3)));

    assert_eq!(field("repeated_int32"), Value::Array(vec![Value::Int32(-42), Value::Int32(-41)]));
    assert_eq!(field("repeated_int64"), Value::Array(vec![Value::Int64(-420), Value::Int64(-421)]));
    assert_eq!(field("repeated_uint32"), Value::Array(vec![Value::UInt32(42), Value::UInt32(41)]));
    assert_eq!(field("repeated_uint64"), Value::Array(vec![Value::UInt64(420), Value::UInt64(419)]));
    assert_eq!(field("repeated_sint32"), Value::Array(vec![Value::Int32(-69), Value::Int32(-68)]));
    assert_eq!(field("repeated_sint64"), Value::Array(vec![Value::Int64(-690), Value::Int64(-689)]));
    assert_eq!(field("repeated_fixed32"), Value::Array(vec![Value::UInt32(900), Value::UInt32(899)]));
    assert_eq!(field("repeated_fixed64"), Value::Array(vec![Value::UInt64(9000), Value::UInt64(8999)]));
    assert_eq!(field("repeated_sfixed32"), Value::Array(vec![Value::Int32(-900), Value::Int32(-899)]));
    assert_eq!(field("repeated_sfixed64"), Value::Array(vec![Value::Int64(-9000), Value::Int64(-8999)]));
    assert_eq!(field("repeated_bool"), Value::Array(vec![Value::Bool(true), Value::Bool(false)]));
    assert_eq!(
        field("repeated_enum"),
        Value::Array(vec![Value::Enum("Color".into(), 1), Value::Enum("Color".into(), 2)])
    );
    let messages = field("repeated_message");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].get("other_field"), Some(&Value::UInt64(3)));
    assert_eq!(messages[1].get("other_field"), Some(&Value::UInt64(3)));
}

#[test]
fn test_first_field_after_one() {
    let decoder = all_features_decoder();
    let bytes = hex::decode("20a403").unwrap();
    let value = decoder.decode("Message", &bytes).unwrap();
    assert_eq!(value.get("optional_uint64"), Some(&Value::UInt64(420)));
    assert_eq!(value.get("optional_uint32"), Some(&Value::UInt32(0)));
    assert_eq!(value.get("repeated_message"), Some(&Value::Array(vec![])));

    // Keys follow declaration order, not alphabetical order
    let json = decode_to_json(&decoder, "Message", &bytes).unwrap();
    let uint64 = json.find("\"optional_uint64\"").unwrap();
    let boolean = json.find("\"optional_bool\"").unwrap();
    assert!(uint64 < boolean);
}

#[test]
fn test_trailing_garbage_in_buffer() {
    let decoder = all_features_decoder();
    let bytes = hex::decode("18012001").unwrap();
    assert!(decoder.decode("Message", &bytes).is_ok());

    let bytes = hex::decode("18012001deadbeef").unwrap();
    assert_eq!(
        decoder.decode("Message", &bytes),
        Err(DecodeError::MalformedKey { pos: 4 })
    );
}

proptest! {
    #[test]
    fn packed_arrays_keep_length_and_order(values in proptest::collection::vec(any::<u32>(), 1..16)) {
        let mut bb = ByteBufferMut::new();
        bb.write_key(2, WireType::LengthDelimited);
        bb.write_length_delimited(&packed_uint32(&values));
        let value = decoder().decode("Shape", &bb.data()).unwrap();

        let expected: Vec<Value> = values.iter().map(|v| Value::UInt32(*v)).collect();
        prop_assert_eq!(value.get("values"), Some(&Value::Array(expected)));
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let decoder = decoder();
        for message in ["Single", "Paint", "Point", "Shape"] {
            let _ = decoder.decode(message, &bytes);
        }
    }

    #[test]
    fn truncation_is_always_rejected(x in 1i64.., y in 1i64..) {
        let bytes = point(x, y);
        for cut in 0..bytes.len() {
            let result = decoder().decode_at("Point", &bytes[..cut], 0, bytes.len() as u64);
            prop_assert!(result.is_err());
        }
    }
}
