//! Protobuf type → Solidity type and wire type.
//!
//! Enum and message references are resolved by name elsewhere and never go
//! through the scalar table; asking this module for them is an error.

use protosol_wire::WireType;

use crate::{
    error::SchemaError,
    types::{FieldSchema, FieldType, ProtoType, ScalarKind},
};

/// Narrow a descriptor type tag to a supported scalar kind.
pub fn scalar_kind(proto_type: ProtoType) -> Result<ScalarKind, SchemaError> {
    let kind = match proto_type {
        ProtoType::Int32    => ScalarKind::Int32,
        ProtoType::Int64    => ScalarKind::Int64,
        ProtoType::Uint32   => ScalarKind::Uint32,
        ProtoType::Uint64   => ScalarKind::Uint64,
        ProtoType::Sint32   => ScalarKind::Sint32,
        ProtoType::Sint64   => ScalarKind::Sint64,
        ProtoType::Fixed32  => ScalarKind::Fixed32,
        ProtoType::Fixed64  => ScalarKind::Fixed64,
        ProtoType::Sfixed32 => ScalarKind::Sfixed32,
        ProtoType::Sfixed64 => ScalarKind::Sfixed64,
        ProtoType::Bool     => ScalarKind::Bool,
        ProtoType::String   => ScalarKind::String,
        ProtoType::Bytes    => ScalarKind::Bytes,
        ProtoType::Double
        | ProtoType::Float
        | ProtoType::Group
        | ProtoType::Message
        | ProtoType::Enum => {
            return Err(SchemaError::UnsupportedFieldTypeError {
                proto_type: proto_type.name().to_string(),
                context:    String::new(),
            })
        }
    };
    Ok(kind)
}

/// The Solidity type for a protobuf scalar type.
pub fn type_to_native(proto_type: ProtoType) -> Result<&'static str, SchemaError> {
    scalar_kind(proto_type).map(native_name)
}

pub fn native_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Int32    => "int32",
        ScalarKind::Int64    => "int64",
        ScalarKind::Uint32   => "uint32",
        ScalarKind::Uint64   => "uint64",
        ScalarKind::Sint32   => "int32",
        ScalarKind::Sint64   => "int64",
        ScalarKind::Fixed32  => "uint32",
        ScalarKind::Fixed64  => "uint64",
        ScalarKind::Sfixed32 => "int32",
        ScalarKind::Sfixed64 => "int64",
        ScalarKind::Bool     => "bool",
        ScalarKind::String   => "string",
        ScalarKind::Bytes    => "bytes",
    }
}

/// Name of the `ProtobufLib` primitive that decodes one value of this kind.
/// String and bytes only have their length prefix decoded by the library.
pub fn decoder_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Int32    => "decode_int32",
        ScalarKind::Int64    => "decode_int64",
        ScalarKind::Uint32   => "decode_uint32",
        ScalarKind::Uint64   => "decode_uint64",
        ScalarKind::Sint32   => "decode_sint32",
        ScalarKind::Sint64   => "decode_sint64",
        ScalarKind::Fixed32  => "decode_fixed32",
        ScalarKind::Fixed64  => "decode_fixed64",
        ScalarKind::Sfixed32 => "decode_sfixed32",
        ScalarKind::Sfixed64 => "decode_sfixed64",
        ScalarKind::Bool     => "decode_bool",
        ScalarKind::String   => "decode_length_delimited",
        ScalarKind::Bytes    => "decode_length_delimited",
    }
}

pub fn scalar_wire_type(kind: ScalarKind) -> WireType {
    match kind {
        ScalarKind::Fixed32 | ScalarKind::Sfixed32 => WireType::Bits32,
        ScalarKind::Fixed64 | ScalarKind::Sfixed64 => WireType::Bits64,
        ScalarKind::String | ScalarKind::Bytes => WireType::LengthDelimited,
        _ => WireType::Varint,
    }
}

/// The wire type a key for this field must carry. Repeated fields are always
/// length-delimited: packed ones as a single wrapper, unpacked messages per
/// element.
pub fn wire_type_of(field: &FieldSchema) -> WireType {
    if field.repeated {
        return WireType::LengthDelimited;
    }
    match &field.ty {
        FieldType::Scalar(kind) => scalar_wire_type(*kind),
        FieldType::Enum(_) => WireType::Varint,
        FieldType::Message(_) => WireType::LengthDelimited,
    }
}

/// The element type of a field as a Solidity type name, without array marker.
pub fn element_type_of(field: &FieldSchema) -> &str {
    match &field.ty {
        FieldType::Scalar(kind) => native_name(*kind),
        FieldType::Enum(name) | FieldType::Message(name) => name,
    }
}

/// The struct member type, `[]`-suffixed when repeated.
pub fn member_type_of(field: &FieldSchema) -> String {
    let element = element_type_of(field);
    if field.repeated {
        format!("{}[]", element)
    } else {
        element.to_string()
    }
}
