use serde::Serialize;
use std::fmt;

/// The protobuf field type tag as it appears in a descriptor, before any
/// decision about whether this generator supports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProtoType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl ProtoType {
    pub fn name(self) -> &'static str {
        match self {
            ProtoType::Double   => "double",
            ProtoType::Float    => "float",
            ProtoType::Int64    => "int64",
            ProtoType::Uint64   => "uint64",
            ProtoType::Int32    => "int32",
            ProtoType::Fixed64  => "fixed64",
            ProtoType::Fixed32  => "fixed32",
            ProtoType::Bool     => "bool",
            ProtoType::String   => "string",
            ProtoType::Group    => "group",
            ProtoType::Message  => "message",
            ProtoType::Bytes    => "bytes",
            ProtoType::Uint32   => "uint32",
            ProtoType::Enum     => "enum",
            ProtoType::Sfixed32 => "sfixed32",
            ProtoType::Sfixed64 => "sfixed64",
            ProtoType::Sint32   => "sint32",
            ProtoType::Sint64   => "sint64",
        }
    }
}

impl fmt::Display for ProtoType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The proto3 scalar kinds this generator can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 13] = [
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Sint32,
        ScalarKind::Sint64,
        ScalarKind::Fixed32,
        ScalarKind::Fixed64,
        ScalarKind::Sfixed32,
        ScalarKind::Sfixed64,
        ScalarKind::Bool,
        ScalarKind::String,
        ScalarKind::Bytes,
    ];

    pub fn proto_type(self) -> ProtoType {
        match self {
            ScalarKind::Int32    => ProtoType::Int32,
            ScalarKind::Int64    => ProtoType::Int64,
            ScalarKind::Uint32   => ProtoType::Uint32,
            ScalarKind::Uint64   => ProtoType::Uint64,
            ScalarKind::Sint32   => ProtoType::Sint32,
            ScalarKind::Sint64   => ProtoType::Sint64,
            ScalarKind::Fixed32  => ProtoType::Fixed32,
            ScalarKind::Fixed64  => ProtoType::Fixed64,
            ScalarKind::Sfixed32 => ProtoType::Sfixed32,
            ScalarKind::Sfixed64 => ProtoType::Sfixed64,
            ScalarKind::Bool     => ProtoType::Bool,
            ScalarKind::String   => ProtoType::String,
            ScalarKind::Bytes    => ProtoType::Bytes,
        }
    }

    /// Variable-length kinds cannot be packed and are decoded by copying bytes.
    pub fn is_length_delimited(self) -> bool {
        matches!(self, ScalarKind::String | ScalarKind::Bytes)
    }
}

/// What a field holds. Enum and message references carry the referenced
/// type's name with the descriptor's leading `.` removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Scalar(ScalarKind),
    Enum(String),
    Message(String),
}

impl FieldType {
    /// The protobuf spelling, as written in a `.proto` file.
    pub fn proto_name(&self) -> &str {
        match self {
            FieldType::Scalar(kind) => kind.proto_type().name(),
            FieldType::Enum(name) | FieldType::Message(name) => name,
        }
    }

    /// Numeric scalars and enums are the only kinds that may be packed.
    pub fn is_packable(&self) -> bool {
        match self {
            FieldType::Scalar(kind) => !kind.is_length_delimited(),
            FieldType::Enum(_) => true,
            FieldType::Message(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name:     String,
    pub number:   i32,
    pub ty:       FieldType,
    pub repeated: bool,
    pub packed:   bool,
    pub in_oneof: bool,
}

impl FieldSchema {
    /// A singular field, the shape most tests and fixtures start from.
    pub fn new(name: &str, number: i32, ty: FieldType) -> FieldSchema {
        FieldSchema {
            name:     name.to_string(),
            number,
            ty,
            repeated: false,
            packed:   false,
            in_oneof: false,
        }
    }

    pub fn repeated(mut self, packed: bool) -> FieldSchema {
        self.repeated = true;
        self.packed = packed;
        self
    }

    /// `repeated uint32 values = 4 [packed = true]`
    pub fn declaration(&self) -> String {
        let mut text = String::new();
        if self.repeated {
            text.push_str("repeated ");
        }
        text.push_str(&format!("{} {} = {}", self.ty.proto_name(), self.name, self.number));
        if self.packed {
            text.push_str(" [packed = true]");
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSchema {
    pub name:         String,
    pub fields:       Vec<FieldSchema>,
    /// Names of nested message and enum declarations (including map entries).
    pub nested_types: Vec<String>,
    /// Names of oneof declarations, synthetic ones for proto3 `optional` included.
    pub oneofs:       Vec<String>,
}

impl MessageSchema {
    pub fn new(name: &str, fields: Vec<FieldSchema>) -> MessageSchema {
        MessageSchema {
            name:         name.to_string(),
            fields,
            nested_types: Vec::new(),
            oneofs:       Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumValue {
    pub name:   String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumSchema {
    pub name:   String,
    pub values: Vec<EnumValue>,
}

impl EnumSchema {
    pub fn new(name: &str, values: &[&str]) -> EnumSchema {
        EnumSchema {
            name:   name.to_string(),
            values: values
                .iter()
                .enumerate()
                .map(|(i, value)| EnumValue { name: value.to_string(), number: i as i32 })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSchema {
    pub name:         String,
    pub syntax:       String,
    pub package:      String,
    pub dependencies: Vec<String>,
    pub enums:        Vec<EnumSchema>,
    pub messages:     Vec<MessageSchema>,
}

impl FileSchema {
    pub fn new(name: &str) -> FileSchema {
        FileSchema {
            name:         name.to_string(),
            syntax:       "proto3".to_string(),
            package:      String::new(),
            dependencies: Vec::new(),
            enums:        Vec::new(),
            messages:     Vec::new(),
        }
    }

    /// `foo/bar.proto` becomes `foo/bar.sol`.
    pub fn output_name(&self) -> String {
        output_name_for(&self.name)
    }
}

pub fn output_name_for(proto_name: &str) -> String {
    let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
    format!("{}.sol", stem)
}
