//! The reference decoder.
//!
//! [`Decoder`] executes the same [`MessagePlan`]s the Solidity renderer turns
//! into codec libraries, step for step: key, bounds, monotonicity and wire
//! type checks in the message loop, the count, allocate, refill shape for
//! repeated fields, and the final consumed-length check. A buffer is accepted
//! here exactly when the generated `decode` returns `true` for it.

use std::collections::BTreeMap;

use prost_types::FileDescriptorSet;
use protosol_compiler::{
    compile_request, Compilation, ElementDecode, FieldDecode, FieldPlan, Framing, GeneratorOptions,
    MessagePlan, SchemaError,
};
use protosol_compiler::types::ScalarKind;
use protosol_wire::{ByteBuffer, Value};
use tracing::{debug, trace};

use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq)]
pub struct Decoder {
    plans: BTreeMap<String, MessagePlan>,
}

impl Decoder {
    pub fn new(plans: BTreeMap<String, MessagePlan>) -> Decoder {
        Decoder { plans }
    }

    pub fn from_compilation(compilation: &Compilation) -> Decoder {
        Decoder::new(compilation.plans.clone())
    }

    /// Validates and plans every file of a `FileDescriptorSet`, the format
    /// `protoc --descriptor_set_out` writes. No Solidity is rendered.
    pub fn from_descriptor_set(
        set: &FileDescriptorSet,
        options: &GeneratorOptions,
    ) -> Result<Decoder, SchemaError> {
        let compilation = compile_request(&set.file, &[], options)?;
        Ok(Decoder::new(compilation.plans))
    }

    pub fn plan(&self, message: &str) -> Option<&MessagePlan> {
        self.plans.get(message)
    }

    /// Message names in sorted order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    /// Decodes `bytes` as one `message` spanning the whole buffer.
    pub fn decode(&self, message: &str, bytes: &[u8]) -> Result<Value, DecodeError> {
        let (value, _) = self.decode_at(message, bytes, 0, bytes.len() as u64)?;
        Ok(value)
    }

    /// Decodes the `len` bytes starting at `initial_pos`, like a codec's
    /// `decode(initial_pos, buf, len)`. Returns the instance and the position
    /// after it.
    pub fn decode_at(
        &self,
        message: &str,
        bytes: &[u8],
        initial_pos: usize,
        len: u64,
    ) -> Result<(Value, usize), DecodeError> {
        let plan = self.lookup(message)?;
        let mut bb = ByteBuffer::new(bytes);
        bb.set_index(initial_pos);
        let value = self.decode_message(plan, &mut bb, len)?;
        debug!(name = message, consumed = bb.index() - initial_pos, "decoded message");
        Ok((value, bb.index()))
    }

    /// The instance a codec starts from: every member at its zero value,
    /// nested messages included.
    pub fn zero_value(&self, message: &str) -> Result<Value, DecodeError> {
        let plan = self.lookup(message)?;
        let mut fields = Vec::with_capacity(plan.fields.len());
        for field in &plan.fields {
            let value = match &field.decode {
                FieldDecode::Repeated { .. } => Value::Array(Vec::new()),
                FieldDecode::Single { element, .. } => self.zero_element(element)?,
            };
            fields.push((field.name.clone(), value));
        }
        Ok(Value::Message(plan.name.clone(), fields))
    }

    fn lookup(&self, message: &str) -> Result<&MessagePlan, DecodeError> {
        self.plans.get(message).ok_or_else(|| DecodeError::UnknownMessage {
            message: message.to_string(),
        })
    }

    fn zero_element(&self, element: &ElementDecode) -> Result<Value, DecodeError> {
        Ok(match element {
            ElementDecode::Scalar(kind) => zero_scalar(*kind),
            ElementDecode::Enum { name, .. } => Value::Enum(name.clone(), 0),
            ElementDecode::Message { name } => self.zero_value(name)?,
        })
    }

    fn decode_message(
        &self,
        plan: &MessagePlan,
        bb: &mut ByteBuffer,
        len: u64,
    ) -> Result<Value, DecodeError> {
        let initial_pos = bb.index();
        let end = (initial_pos as u64)
            .checked_add(len)
            .and_then(|end| usize::try_from(end).ok())
            .ok_or(DecodeError::LengthOverflow { pos: initial_pos, len })?;

        let mut instance = self.zero_value(&plan.name)?;
        let mut previous_field_number = 0;

        while bb.index() < end {
            let pos = bb.index();
            let (field_number, wire_type) =
                bb.decode_key().map_err(|_| DecodeError::MalformedKey { pos })?;

            let expected = plan
                .expected_wire_type(field_number)
                .ok_or_else(|| DecodeError::FieldNumberOutOfBounds {
                    message: plan.name.clone(),
                    field_number,
                    count: plan.field_count(),
                })?;

            if field_number <= previous_field_number {
                return Err(DecodeError::NonMonotonicField {
                    field_number,
                    previous: previous_field_number,
                });
            }

            // Same rule as the generated check_key
            if wire_type != expected {
                return Err(DecodeError::WireTypeMismatch {
                    field_number,
                    expected,
                    found: wire_type,
                });
            }

            // In bounds, checked above
            let field = &plan.fields[field_number as usize - 1];

            trace!(owner = %plan.name, field = %field.name, pos, "decoding field");
            let value = self.decode_field(field, bb, end)?;
            instance.set(&field.name, value);
            previous_field_number = field_number;
        }

        if bb.index() != end {
            return Err(DecodeError::LengthMismatch { expected: end, found: bb.index() });
        }
        Ok(instance)
    }

    /// `end` is the end of the enclosing message; only unpacked repeated
    /// fields look at it.
    fn decode_field(
        &self,
        field: &FieldPlan,
        bb: &mut ByteBuffer,
        end: usize,
    ) -> Result<Value, DecodeError> {
        match &field.decode {
            FieldDecode::Single { element, reject_default } => {
                let value = self.decode_element(element, bb)?;
                if *reject_default && is_default(&value) {
                    return Err(DecodeError::DefaultValueEncoded { field: field.name.clone() });
                }
                Ok(value)
            }
            FieldDecode::Repeated { element, framing: Framing::Packed, reject_empty } => {
                self.decode_packed(field, element, *reject_empty, bb)
            }
            FieldDecode::Repeated { element, framing: Framing::Unpacked, .. } => {
                self.decode_unpacked(field, element, bb, end)
            }
        }
    }

    fn decode_packed(
        &self,
        field: &FieldPlan,
        element: &ElementDecode,
        reject_empty: bool,
        bb: &mut ByteBuffer,
    ) -> Result<Value, DecodeError> {
        let pos = bb.index();
        let len = bb
            .decode_packed_repeated()
            .map_err(|_| DecodeError::Truncated { pos })?;
        if reject_empty && len == 0 {
            return Err(DecodeError::DefaultValueEncoded { field: field.name.clone() });
        }
        let initial_pos = bb.index();
        // The wrapper was checked to fit inside the buffer
        let end = initial_pos + len as usize;

        // Pass 1: count the elements
        let mut count = 0;
        while bb.index() < end {
            self.decode_element(element, bb)?;
            count += 1;
        }
        if bb.index() != end {
            return Err(DecodeError::LengthMismatch { expected: end, found: bb.index() });
        }

        // Pass 2: decode the elements
        bb.set_index(initial_pos);
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.decode_element(element, bb)?);
        }
        Ok(Value::Array(values))
    }

    fn decode_unpacked(
        &self,
        field: &FieldPlan,
        element: &ElementDecode,
        bb: &mut ByteBuffer,
        end: usize,
    ) -> Result<Value, DecodeError> {
        let initial_pos = bb.index();

        // Pass 1: count the elements. The first key was consumed by the
        // message loop; later ones are peeked and only consumed when they
        // belong to this field.
        let mut count = 0;
        loop {
            self.decode_element(element, bb)?;
            count += 1;

            if bb.index() >= end {
                break;
            }

            let pos = bb.index();
            let (field_number, wire_type) =
                bb.decode_key().map_err(|_| DecodeError::MalformedKey { pos })?;
            if field_number != field.number {
                bb.set_index(pos);
                break;
            }
            if wire_type != field.wire_type {
                return Err(DecodeError::WireTypeMismatch {
                    field_number,
                    expected: field.wire_type,
                    found: wire_type,
                });
            }
        }

        // Pass 2: decode the elements
        bb.set_index(initial_pos);
        let mut values = Vec::with_capacity(count);
        for i in 0..count {
            if i > 0 {
                let pos = bb.index();
                let (field_number, wire_type) =
                    bb.decode_key().map_err(|_| DecodeError::MalformedKey { pos })?;
                if field_number != field.number || wire_type != field.wire_type {
                    return Err(DecodeError::ElementCountMismatch { field: field.name.clone() });
                }
            }
            values.push(self.decode_element(element, bb)?);
        }
        Ok(Value::Array(values))
    }

    fn decode_element(&self, element: &ElementDecode, bb: &mut ByteBuffer) -> Result<Value, DecodeError> {
        let pos = bb.index();
        match element {
            ElementDecode::Scalar(kind) => decode_scalar(*kind, bb),
            ElementDecode::Enum { name, max_ordinal } => {
                let value = bb
                    .decode_enum()
                    .map_err(|_| DecodeError::MalformedValue { kind: "enum", pos })?;
                if value < 0 || value as u32 > *max_ordinal {
                    return Err(DecodeError::EnumOutOfRange {
                        enum_name: name.clone(),
                        value,
                        max_ordinal: *max_ordinal,
                    });
                }
                Ok(Value::Enum(name.clone(), value))
            }
            ElementDecode::Message { name } => {
                let len = bb
                    .decode_embedded_message()
                    .map_err(|_| DecodeError::Truncated { pos })?;
                let plan = self.lookup(name)?;
                self.decode_message(plan, bb, len)
            }
        }
    }
}

fn zero_scalar(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => Value::Int32(0),
        ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => Value::Int64(0),
        ScalarKind::Uint32 | ScalarKind::Fixed32 => Value::UInt32(0),
        ScalarKind::Uint64 | ScalarKind::Fixed64 => Value::UInt64(0),
        ScalarKind::Bool => Value::Bool(false),
        ScalarKind::String => Value::String(String::new()),
        ScalarKind::Bytes => Value::Bytes(Vec::new()),
    }
}

fn decode_scalar(kind: ScalarKind, bb: &mut ByteBuffer) -> Result<Value, DecodeError> {
    let pos = bb.index();
    let malformed = |_| DecodeError::MalformedValue { kind: kind.proto_type().name(), pos };

    let value = match kind {
        ScalarKind::Int32 => Value::Int32(bb.decode_int32().map_err(malformed)?),
        ScalarKind::Int64 => Value::Int64(bb.decode_int64().map_err(malformed)?),
        ScalarKind::Uint32 => Value::UInt32(bb.decode_uint32().map_err(malformed)?),
        ScalarKind::Uint64 => Value::UInt64(bb.decode_uint64().map_err(malformed)?),
        ScalarKind::Sint32 => Value::Int32(bb.decode_sint32().map_err(malformed)?),
        ScalarKind::Sint64 => Value::Int64(bb.decode_sint64().map_err(malformed)?),
        ScalarKind::Fixed32 => Value::UInt32(bb.decode_fixed32().map_err(malformed)?),
        ScalarKind::Fixed64 => Value::UInt64(bb.decode_fixed64().map_err(malformed)?),
        ScalarKind::Sfixed32 => Value::Int32(bb.decode_sfixed32().map_err(malformed)?),
        ScalarKind::Sfixed64 => Value::Int64(bb.decode_sfixed64().map_err(malformed)?),
        ScalarKind::Bool => Value::Bool(bb.decode_bool().map_err(malformed)?),
        ScalarKind::String | ScalarKind::Bytes => {
            let len = bb
                .decode_length_delimited()
                .map_err(|_| DecodeError::Truncated { pos })?;
            // The prefix was checked to fit inside the buffer
            let bytes = bb
                .read_bytes(len as usize)
                .map_err(|_| DecodeError::Truncated { pos })?;
            if kind == ScalarKind::String {
                // Solidity's `string(v)` does not validate UTF-8 either
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            } else {
                Value::Bytes(bytes.to_vec())
            }
        }
    };
    Ok(value)
}

/// Whether a singular value is its proto3 default.
fn is_default(value: &Value) -> bool {
    match value {
        Value::Bool(value) => !value,
        Value::String(value) => value.is_empty(),
        Value::Bytes(value) => value.is_empty(),
        Value::Message(..) => false,
        other => other.as_integer() == 0,
    }
}
