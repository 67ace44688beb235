use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::SchemaError,
    symbols::SymbolTable,
    types::{FieldType, FileSchema, MessageSchema, ScalarKind},
};

pub const REQUIRED_SYNTAX: &str = "proto3";

/// Names the generated code itself introduces at file scope.
pub const RESERVED_NAMES: [&str; 1] = ["ProtobufLib"];

/// Parameters and locals of the generated codec functions. A struct or enum
/// with one of these names would be shadowed inside its own codec.
pub const CODEC_LOCALS: [&str; 16] = [
    "pos", "buf", "len", "initial_pos", "instance", "success", "field_number",
    "wire_type", "previous_field_number", "v", "v_len", "next_pos", "cnt", "i", "j",
    "end",
];

/// Suffix of the codec library generated next to every message struct.
pub const CODEC_SUFFIX: &str = "Codec";

const SOLIDITY_KEYWORDS: &[&str] = &[
    "abi", "abstract", "address", "after", "alias", "anonymous", "apply", "assembly",
    "assert", "auto", "block", "bool", "break", "byte", "bytes", "calldata", "case",
    "catch", "constant", "constructor", "continue", "contract", "copyof", "days",
    "default", "define", "delete", "do", "else", "emit", "enum", "error", "ether",
    "event", "external", "fallback", "false", "final", "finney", "fixed", "for",
    "function", "gasleft", "gwei", "hex", "hours", "if", "immutable", "implements",
    "import", "in", "indexed", "inline", "int", "interface", "internal", "is",
    "keccak256", "let", "library", "macro", "mapping", "match", "memory", "minutes",
    "modifier", "msg", "mutable", "new", "now", "null", "of", "override", "partial",
    "payable", "pragma", "private", "promise", "public", "pure", "receive",
    "reference", "relocatable", "require", "return", "returns", "revert", "sealed",
    "seconds", "selfdestruct", "sizeof", "static", "storage", "string", "struct",
    "super", "supports", "switch", "szabo", "this", "throw", "true", "try", "tx",
    "type", "typedef", "typeof", "ufixed", "uint", "unchecked", "unicode", "using",
    "var", "view", "virtual", "wei", "weeks", "while", "years", "yul",
];

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();

    /// Solidity keywords, reserved words, global names and every sized
    /// elementary type (`int8`..`int256`, `uint8`..`uint256`, `bytes1`..`bytes32`).
    pub static ref RESERVED_IDENTIFIERS: BTreeSet<String> = {
        let mut words: BTreeSet<String> = SOLIDITY_KEYWORDS
            .iter()
            .map(|s| s.to_string())
            .collect();
        for bits in (8..=256).step_by(8) {
            words.insert(format!("int{}", bits));
            words.insert(format!("uint{}", bits));
        }
        for width in 1..=32 {
            words.insert(format!("bytes{}", width));
        }
        words
    };
}

pub fn verify_syntax(file: &str, syntax: &str) -> Result<(), SchemaError> {
    if syntax != REQUIRED_SYNTAX {
        // An absent syntax statement means proto2
        let found = if syntax.is_empty() { "proto2" } else { syntax };
        return Err(SchemaError::SyntaxVersionError {
            file:  file.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

pub fn verify_package(file: &str, package: &str) -> Result<(), SchemaError> {
    if !package.is_empty() {
        return Err(SchemaError::PackageForbiddenError {
            file:    file.to_string(),
            package: package.to_string(),
        });
    }
    Ok(())
}

/// An identifier must be a plain Solidity identifier that is neither a
/// reserved word nor a name the generator emits itself.
pub fn verify_identifier(name: &str) -> Result<(), SchemaError> {
    if !IDENTIFIER.is_match(name)
        || RESERVED_IDENTIFIERS.contains(name)
        || RESERVED_NAMES.contains(&name)
    {
        return Err(SchemaError::KeywordCollisionError {
            identifier: name.to_string(),
        });
    }
    Ok(())
}

/// Enum and message names become Solidity types, so on top of
/// [`verify_identifier`] they must not clash with the codec's own locals.
/// Field names are always read through `instance.` and skip this check.
pub fn verify_type_name(name: &str) -> Result<(), SchemaError> {
    verify_identifier(name)?;
    if CODEC_LOCALS.contains(&name) {
        return Err(SchemaError::KeywordCollisionError {
            identifier: name.to_string(),
        });
    }
    Ok(())
}

/// File-local structural checks, in a fixed order. The first violation wins.
pub fn verify_schema(file: &FileSchema) -> Result<(), SchemaError> {
    // 1) Syntax and 2) package
    verify_syntax(&file.name, &file.syntax)?;
    verify_package(&file.name, &file.package)?;

    // 3) No nested declarations
    for message in &file.messages {
        if let Some(nested) = message.nested_types.first() {
            return Err(SchemaError::NestedTypeForbiddenError {
                message: message.name.clone(),
                nested:  nested.clone(),
            });
        }
    }

    // 4) Identifiers
    for def in &file.enums {
        verify_type_name(&def.name)?;
        for value in &def.values {
            verify_identifier(&value.name)?;
        }
    }
    for message in &file.messages {
        verify_type_name(&message.name)?;
        for field in &message.fields {
            verify_identifier(&field.name)?;
        }
    }

    // 5) Field numbers are exactly 1..N in declaration order
    for message in &file.messages {
        verify_field_numbers(message)?;
    }

    // 6) Packing rules for repeated fields
    for message in &file.messages {
        verify_packing(message)?;
    }

    // 7) Oneofs, including the synthetic ones behind proto3 `optional`
    for message in &file.messages {
        if let Some(oneof) = message.oneofs.first() {
            return Err(SchemaError::OneofForbiddenError {
                message: message.name.clone(),
                oneof:   oneof.clone(),
            });
        }
        if let Some(field) = message.fields.iter().find(|f| f.in_oneof) {
            return Err(SchemaError::OneofForbiddenError {
                message: message.name.clone(),
                oneof:   field.name.clone(),
            });
        }
    }

    Ok(())
}

pub fn verify_field_numbers(message: &MessageSchema) -> Result<(), SchemaError> {
    if message.fields.is_empty() {
        return Err(SchemaError::EmptyMessageError {
            message: message.name.clone(),
        });
    }
    for (i, field) in message.fields.iter().enumerate() {
        let expected = i as i32 + 1;
        if field.number != expected {
            return Err(SchemaError::FieldNumberingError {
                message:  message.name.clone(),
                field:    field.name.clone(),
                expected,
                found:    field.number,
            });
        }
    }
    Ok(())
}

pub fn verify_packing(message: &MessageSchema) -> Result<(), SchemaError> {
    for field in message.fields.iter().filter(|f| f.repeated) {
        if field.ty.is_packable() {
            if !field.packed {
                return Err(SchemaError::PackingRequiredError {
                    message: message.name.clone(),
                    field:   field.name.clone(),
                });
            }
            continue;
        }

        if field.packed {
            return Err(SchemaError::PackingForbiddenError {
                message: message.name.clone(),
                field:   field.name.clone(),
            });
        }

        if let FieldType::Scalar(kind @ (ScalarKind::String | ScalarKind::Bytes)) = &field.ty {
            return Err(SchemaError::UnsupportedRepeatedTypeError {
                message:   message.name.clone(),
                field:     field.name.clone(),
                type_name: kind.proto_type().name().to_string(),
            });
        }
    }
    Ok(())
}

/// Request-wide checks that need every declaration: references resolve,
/// codec library names stay free, and messages do not contain themselves.
pub fn verify_references(files: &[FileSchema], symbols: &SymbolTable) -> Result<(), SchemaError> {
    let mut definitions_map: BTreeMap<&str, &MessageSchema> = BTreeMap::new();
    for message in files.iter().flat_map(|f| f.messages.iter()) {
        definitions_map.insert(message.name.as_str(), message);
    }

    for message in definitions_map.values() {
        let codec = format!("{}{}", message.name, CODEC_SUFFIX);
        if symbols.has_type(&codec) {
            return Err(SchemaError::KeywordCollisionError { identifier: codec });
        }

        for field in &message.fields {
            let resolved = match &field.ty {
                FieldType::Scalar(_) => true,
                FieldType::Enum(name) => symbols.has_enum(name),
                FieldType::Message(name) => symbols.has_message(name),
            };
            if !resolved {
                return Err(SchemaError::UnresolvedTypeError {
                    message:   message.name.clone(),
                    field:     field.name.clone(),
                    type_name: field.ty.proto_name().to_string(),
                });
            }
        }
    }

    // 1 = on the current path, 2 = fully explored
    let mut state: BTreeMap<String, u8> = BTreeMap::new();
    fn check_recursion(
        name: &str,
        definitions_map: &BTreeMap<&str, &MessageSchema>,
        state: &mut BTreeMap<String, u8>,
    ) -> Result<(), SchemaError> {
        let definition = match definitions_map.get(name) {
            Some(def) => def,
            None => return Ok(()),
        };
        match state.get(name).copied() {
            Some(1) => {
                return Err(SchemaError::CyclicReferenceError {
                    message: name.to_string(),
                })
            }
            Some(2) => return Ok(()),
            _ => {}
        }
        state.insert(name.to_string(), 1);
        for field in &definition.fields {
            if let FieldType::Message(ref ty) = field.ty {
                check_recursion(ty, definitions_map, state)?;
            }
        }
        state.insert(name.to_string(), 2);
        Ok(())
    }

    for file in files {
        for message in &file.messages {
            check_recursion(&message.name, &definitions_map, &mut state)?;
        }
    }

    Ok(())
}
