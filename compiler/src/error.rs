use thiserror::Error;

/// Compile-time schema violations. Any one of them aborts the whole request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("File {file:?}: syntax {found:?} is not supported, only \"proto3\" is")]
    SyntaxVersionError {
        file:  String,
        found: String,
    },

    #[error("File {file:?}: package {package:?} is not allowed, packages are not supported")]
    PackageForbiddenError {
        file:    String,
        package: String,
    },

    #[error("Message {message:?}: nested type {nested:?} is not allowed, declare it at file level")]
    NestedTypeForbiddenError {
        message: String,
        nested:  String,
    },

    #[error("Identifier {identifier:?} collides with a reserved name")]
    KeywordCollisionError {
        identifier: String,
    },

    #[error("Message {message:?}: field {field:?} must be numbered {expected} but is numbered {found}")]
    FieldNumberingError {
        message:  String,
        field:    String,
        expected: i32,
        found:    i32,
    },

    #[error("Message {message:?} must declare at least one field")]
    EmptyMessageError {
        message: String,
    },

    #[error("Message {message:?}: repeated numeric or enum field {field:?} must be declared [packed = true]")]
    PackingRequiredError {
        message: String,
        field:   String,
    },

    #[error("Message {message:?}: repeated field {field:?} cannot be packed, only numeric and enum fields can")]
    PackingForbiddenError {
        message: String,
        field:   String,
    },

    #[error("Message {message:?}: repeated field {field:?} of type {type_name:?} is not supported")]
    UnsupportedRepeatedTypeError {
        message:   String,
        field:     String,
        type_name: String,
    },

    #[error("Field type {proto_type:?} is not supported{context}")]
    UnsupportedFieldTypeError {
        proto_type: String,
        context:    String,
    },

    #[error("Enum {enum_name:?}: value {value:?} must have ordinal {expected} but has {found}")]
    EnumOrdinalSequenceError {
        enum_name: String,
        value:     String,
        expected:  i32,
        found:     i32,
    },

    #[error("Enum {enum_name:?} declares {count} values, at most 256 are supported")]
    EnumTooLargeError {
        enum_name: String,
        count:     usize,
    },

    #[error("Message {message:?}: oneof {oneof:?} is not supported")]
    OneofForbiddenError {
        message: String,
        oneof:   String,
    },

    #[error("Message {message:?}: type {type_name:?} of field {field:?} is not defined")]
    UnresolvedTypeError {
        message:   String,
        field:     String,
        type_name: String,
    },

    #[error("Recursive nesting of {message:?} is not allowed")]
    CyclicReferenceError {
        message: String,
    },
}

/// Problems with the generator parameter string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Unknown parameter {0:?}")]
    UnknownParameter(String),

    #[error("Parameter {key:?} has invalid value {value:?}")]
    InvalidValue {
        key:   String,
        value: String,
    },
}
