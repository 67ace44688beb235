//! Projection of `protoc` descriptors onto the schema model.

use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
};

use crate::{
    error::SchemaError,
    type_map::scalar_kind,
    types::{EnumSchema, EnumValue, FieldSchema, FieldType, FileSchema, MessageSchema, ProtoType},
    verifier::{verify_package, verify_syntax},
};

impl From<Type> for ProtoType {
    fn from(ty: Type) -> ProtoType {
        match ty {
            Type::Double   => ProtoType::Double,
            Type::Float    => ProtoType::Float,
            Type::Int64    => ProtoType::Int64,
            Type::Uint64   => ProtoType::Uint64,
            Type::Int32    => ProtoType::Int32,
            Type::Fixed64  => ProtoType::Fixed64,
            Type::Fixed32  => ProtoType::Fixed32,
            Type::Bool     => ProtoType::Bool,
            Type::String   => ProtoType::String,
            Type::Group    => ProtoType::Group,
            Type::Message  => ProtoType::Message,
            Type::Bytes    => ProtoType::Bytes,
            Type::Uint32   => ProtoType::Uint32,
            Type::Enum     => ProtoType::Enum,
            Type::Sfixed32 => ProtoType::Sfixed32,
            Type::Sfixed64 => ProtoType::Sfixed64,
            Type::Sint32   => ProtoType::Sint32,
            Type::Sint64   => ProtoType::Sint64,
        }
    }
}

/// Projects one file descriptor.
///
/// The syntax and package are checked before anything else is looked at, so
/// a proto2 file reports its syntax rather than, say, a `float` field.
pub fn project_file(file: &FileDescriptorProto) -> Result<FileSchema, SchemaError> {
    let name = file.name();
    verify_syntax(name, file.syntax())?;
    verify_package(name, file.package())?;

    let mut schema = FileSchema::new(name);
    schema.syntax = file.syntax().to_string();
    schema.package = file.package().to_string();
    schema.dependencies = file.dependency.clone();
    schema.enums = file.enum_type.iter().map(project_enum).collect();
    schema.messages = file
        .message_type
        .iter()
        .map(project_message)
        .collect::<Result<_, _>>()?;
    Ok(schema)
}

pub fn project_enum(def: &EnumDescriptorProto) -> EnumSchema {
    EnumSchema {
        name:   def.name().to_string(),
        values: def
            .value
            .iter()
            .map(|value| EnumValue {
                name:   value.name().to_string(),
                number: value.number(),
            })
            .collect(),
    }
}

pub fn project_message(message: &DescriptorProto) -> Result<MessageSchema, SchemaError> {
    let fields = message
        .field
        .iter()
        .map(project_field)
        .collect::<Result<_, _>>()?;

    let mut schema = MessageSchema::new(message.name(), fields);
    // Map fields show up here as their synthetic `*Entry` messages
    schema.nested_types = message
        .nested_type
        .iter()
        .map(|nested| nested.name().to_string())
        .chain(message.enum_type.iter().map(|nested| nested.name().to_string()))
        .collect();
    schema.oneofs = message
        .oneof_decl
        .iter()
        .map(|oneof| oneof.name().to_string())
        .collect();
    Ok(schema)
}

pub fn project_field(field: &FieldDescriptorProto) -> Result<FieldSchema, SchemaError> {
    let proto_type = ProtoType::from(field.r#type());
    let ty = match proto_type {
        ProtoType::Enum => FieldType::Enum(type_reference(field.type_name())),
        ProtoType::Message => FieldType::Message(type_reference(field.type_name())),
        other => FieldType::Scalar(scalar_kind(other).map_err(|err| match err {
            SchemaError::UnsupportedFieldTypeError { proto_type, .. } => {
                SchemaError::UnsupportedFieldTypeError {
                    proto_type,
                    context: format!(" (field {:?})", field.name()),
                }
            }
            err => err,
        })?),
    };

    Ok(FieldSchema {
        name:     field.name().to_string(),
        number:   field.number(),
        ty,
        repeated: field.label() == Label::Repeated,
        packed:   field.options.as_ref().map_or(false, |options| options.packed()),
        in_oneof: field.oneof_index.is_some() || field.proto3_optional(),
    })
}

/// `.Color` refers to the top-level `Color`. Anything still dotted after
/// that lives in a package or another message and will not resolve.
fn type_reference(type_name: &str) -> String {
    type_name.strip_prefix('.').unwrap_or(type_name).to_string()
}
