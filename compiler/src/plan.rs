//! Decoder plans.
//!
//! A plan is the generated decoder expressed as data: which key each field
//! number must carry and how each field's payload is consumed. The Solidity
//! renderer in [`gen_message`](crate::gen_message) turns a plan into code,
//! and the reference decoder in the `protosol` crate executes the very same
//! plan, so both agree on what a valid buffer is.

use protosol_wire::WireType;
use serde::{Serialize, Serializer};
use tracing::trace;

use crate::{
    error::SchemaError,
    options::GeneratorOptions,
    symbols::SymbolTable,
    type_map::{member_type_of, native_name, wire_type_of},
    types::{FieldType, MessageSchema, ScalarKind},
    verifier::CODEC_SUFFIX,
};

/// How one element (or the single value of a singular field) is decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElementDecode {
    /// One primitive call. String and bytes copy the length-prefixed payload.
    Scalar(ScalarKind),
    /// A signed varint range-checked against `0..=max_ordinal`.
    Enum { name: String, max_ordinal: u32 },
    /// An embedded message header followed by the nested codec's `decode`.
    Message { name: String },
}

impl ElementDecode {
    /// The Solidity type of the decoded element.
    pub fn type_name(&self) -> &str {
        match self {
            ElementDecode::Scalar(kind) => native_name(*kind),
            ElementDecode::Enum { name, .. } | ElementDecode::Message { name } => name,
        }
    }
}

/// How the elements of a repeated field are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Framing {
    /// One length-delimited wrapper holding concatenated values.
    Packed,
    /// One key per element, all with the field's number, back to back.
    Unpacked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldDecode {
    Single {
        element:        ElementDecode,
        /// Fail on the proto3 default value (`0`, `false`, empty payload).
        reject_default: bool,
    },
    Repeated {
        element:      ElementDecode,
        framing:      Framing,
        /// Fail on an empty packed wrapper.
        reject_empty: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPlan {
    pub number:      u64,
    pub name:        String,
    /// The field as written in the `.proto` file, for comments.
    pub declaration: String,
    /// Struct member type, `[]`-suffixed when repeated.
    pub member_type: String,
    #[serde(serialize_with = "serialize_wire_type")]
    pub wire_type:   WireType,
    pub decode:      FieldDecode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagePlan {
    pub name:   String,
    pub codec:  String,
    /// Indexed by field number minus one.
    pub fields: Vec<FieldPlan>,
}

impl MessagePlan {
    /// The highest valid field number.
    pub fn field_count(&self) -> u64 {
        self.fields.len() as u64
    }

    pub fn field(&self, number: u64) -> Option<&FieldPlan> {
        if number == 0 {
            return None;
        }
        self.fields.get(number as usize - 1)
    }

    /// What `check_key` accepts for a field number.
    pub fn expected_wire_type(&self, number: u64) -> Option<WireType> {
        self.field(number).map(|field| field.wire_type)
    }
}

fn serialize_wire_type<S: Serializer>(wire_type: &WireType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(wire_type.name())
}

/// Builds the decoder plan of a validated message. Every enum the message
/// references must already be in the symbol table.
pub fn build_plan(
    message: &MessageSchema,
    symbols: &SymbolTable,
    options: &GeneratorOptions,
) -> Result<MessagePlan, SchemaError> {
    let mut fields = Vec::with_capacity(message.fields.len());

    for field in &message.fields {
        let unresolved = || SchemaError::UnresolvedTypeError {
            message:   message.name.clone(),
            field:     field.name.clone(),
            type_name: field.ty.proto_name().to_string(),
        };

        let element = match &field.ty {
            FieldType::Scalar(kind) => ElementDecode::Scalar(*kind),
            FieldType::Enum(name) => ElementDecode::Enum {
                name:        name.clone(),
                max_ordinal: symbols.enum_max(name).ok_or_else(unresolved)?,
            },
            FieldType::Message(name) => {
                if !symbols.has_message(name) {
                    return Err(unresolved());
                }
                ElementDecode::Message { name: name.clone() }
            }
        };

        let decode = if field.repeated {
            let framing = if field.packed { Framing::Packed } else { Framing::Unpacked };
            FieldDecode::Repeated {
                element,
                framing,
                reject_empty: framing == Framing::Packed && options.reject_default_values,
            }
        } else {
            // An embedded message is present even when all its fields are default
            let reject_default = options.reject_default_values
                && !matches!(element, ElementDecode::Message { .. });
            FieldDecode::Single { element, reject_default }
        };

        let plan = FieldPlan {
            number: field.number as u64,
            name: field.name.clone(),
            declaration: field.declaration(),
            member_type: member_type_of(field),
            wire_type: wire_type_of(field),
            decode,
        };
        trace!(owner = %message.name, field = %plan.name, wire_type = %plan.wire_type, "planned field");
        fields.push(plan);
    }

    Ok(MessagePlan {
        name: message.name.clone(),
        codec: format!("{}{}", message.name, CODEC_SUFFIX),
        fields,
    })
}
