//! Solidity rendering of message structs and their codec libraries.
//!
//! Every decode step threads `(bool success, uint64 pos)` back to its caller
//! instead of reverting, so a failure inside a nested message stays a plain
//! value for the enclosing decoder to act on.

use tracing::debug;

use crate::{
    emitter::CodeEmitter,
    error::SchemaError,
    options::GeneratorOptions,
    plan::{build_plan, ElementDecode, FieldDecode, FieldPlan, Framing, MessagePlan},
    symbols::SymbolTable,
    type_map::{decoder_name, member_type_of},
    types::{MessageSchema, ScalarKind},
    verifier::CODEC_SUFFIX,
};

const WIRE_TYPE: &str = "ProtobufLib.WireType";

/// Renders the struct and the codec library of one message and returns the
/// plan the codec was rendered from.
pub fn generate_message(
    message: &MessageSchema,
    symbols: &SymbolTable,
    options: &GeneratorOptions,
    out: &mut CodeEmitter,
) -> Result<MessagePlan, SchemaError> {
    let plan = build_plan(message, symbols, options)?;
    debug!(name = %message.name, fields = message.fields.len(), "generating message");

    generate_struct(message, out);
    out.blank();
    generate_codec(&plan, out);
    Ok(plan)
}

/// One member per field, in declaration order.
pub fn generate_struct(message: &MessageSchema, out: &mut CodeEmitter) {
    out.open(format!("struct {}", message.name));
    for field in &message.fields {
        out.line(format!("{} {};", member_type_of(field), field.name));
    }
    out.close();
}

pub fn generate_codec(plan: &MessagePlan, out: &mut CodeEmitter) {
    out.open(format!("library {}", plan.codec));
    generate_decode(plan, out);
    out.blank();
    generate_check_key(plan, out);
    out.blank();
    generate_decode_field(plan, out);
    for field in &plan.fields {
        out.blank();
        generate_field_decoder(plan, field, out);
    }
    out.blank();
    generate_encode(plan, out);
    out.close();
}

fn fail_unless_success(out: &mut CodeEmitter, result: &str) {
    fail_if(out, "!success", result);
}

fn fail_if(out: &mut CodeEmitter, condition: &str, result: &str) {
    out.open(format!("if ({})", condition));
    out.line(format!("return ({});", result));
    out.close();
}

fn generate_decode(plan: &MessagePlan, out: &mut CodeEmitter) {
    let failed = "false, pos, instance";

    out.open(format!(
        "function decode(uint64 initial_pos, bytes memory buf, uint64 len) internal pure returns (bool, uint64, {} memory)",
        plan.name
    ));
    out.line("// Message instance");
    out.line(format!("{} memory instance;", plan.name));
    out.line("// Previous field number");
    out.line("uint64 previous_field_number = 0;");
    out.line("// Current position in the buffer");
    out.line("uint64 pos = initial_pos;");
    out.blank();
    out.line("// Sanity check: initial_pos + len must not overflow");
    fail_if(out, "len > 0xFFFFFFFFFFFFFFFF - pos", failed);
    out.blank();

    out.open("while (pos - initial_pos < len)");
    out.line("// Decode the key (field number and wire type)");
    out.line("bool success;");
    out.line("uint64 field_number;");
    out.line(format!("{} wire_type;", WIRE_TYPE));
    out.line("(success, pos, field_number, wire_type) = ProtobufLib.decode_key(pos, buf);");
    fail_unless_success(out, failed);
    out.blank();
    out.line("// Check that the field number is within bounds");
    fail_if(out, &format!("field_number > {}", plan.field_count()), failed);
    out.blank();
    out.line("// Check that the field number is monotonically increasing");
    fail_if(out, "field_number <= previous_field_number", failed);
    out.blank();
    out.line("// Check that the wire type is correct");
    out.line("success = check_key(field_number, wire_type);");
    fail_unless_success(out, failed);
    out.blank();
    out.line("// Actually decode the field");
    out.line("(success, pos) = decode_field(pos, buf, initial_pos + len, field_number, instance);");
    fail_unless_success(out, failed);
    out.blank();
    out.line("previous_field_number = field_number;");
    out.close();
    out.blank();

    out.line("// Decoding must have consumed len bytes");
    fail_if(out, "pos != initial_pos + len", failed);
    out.blank();
    out.line("return (true, pos, instance);");
    out.close();
}

fn generate_check_key(plan: &MessagePlan, out: &mut CodeEmitter) {
    out.open(format!(
        "function check_key(uint64 field_number, {} wire_type) internal pure returns (bool)",
        WIRE_TYPE
    ));
    for field in &plan.fields {
        out.open(format!("if (field_number == {})", field.number));
        out.line(format!("return wire_type == {}.{};", WIRE_TYPE, field.wire_type));
        out.close();
        out.blank();
    }
    out.line("return false;");
    out.close();
}

fn takes_end(field: &FieldPlan) -> bool {
    matches!(
        field.decode,
        FieldDecode::Repeated { framing: Framing::Unpacked, .. }
    )
}

fn generate_decode_field(plan: &MessagePlan, out: &mut CodeEmitter) {
    // Only unpacked repeated fields look ahead to the end of the message
    let end = if plan.fields.iter().any(takes_end) { "uint64 end" } else { "uint64 /* end */" };
    out.open(format!(
        "function decode_field(uint64 pos, bytes memory buf, {}, uint64 field_number, {} memory instance) internal pure returns (bool, uint64)",
        end, plan.name
    ));
    for field in &plan.fields {
        out.open(format!("if (field_number == {})", field.number));
        if takes_end(field) {
            out.line(format!("return decode_{}(pos, buf, end, instance);", field.number));
        } else {
            out.line(format!("return decode_{}(pos, buf, instance);", field.number));
        }
        out.close();
        out.blank();
    }
    out.line("return (false, pos);");
    out.close();
}

fn generate_field_decoder(plan: &MessagePlan, field: &FieldPlan, out: &mut CodeEmitter) {
    let end = if takes_end(field) { "uint64 end, " } else { "" };
    out.line(format!("// {}", field.declaration));
    out.open(format!(
        "function decode_{}(uint64 pos, bytes memory buf, {}{} memory instance) internal pure returns (bool, uint64)",
        field.number, end, plan.name
    ));
    out.line("bool success;");
    out.blank();

    match &field.decode {
        FieldDecode::Single { element, reject_default } => {
            generate_element(element, out);
            out.blank();
            if *reject_default {
                if let Some(condition) = default_condition(element) {
                    out.line("// Default value must be omitted");
                    fail_if(out, &condition, "false, pos");
                    out.blank();
                }
            }
            out.line(format!("instance.{} = {};", field.name, element_value(element)));
        }
        FieldDecode::Repeated { element, framing, reject_empty } => {
            generate_repeated(field, element, *framing, *reject_empty, out);
        }
    }

    out.blank();
    out.line("return (true, pos);");
    out.close();
}

/// The count, allocate, refill shape shared by both repeated framings. Only
/// the way the next element is located differs; the element decode step is
/// the same one singular fields use.
fn generate_repeated(
    field: &FieldPlan,
    element: &ElementDecode,
    framing: Framing,
    reject_empty: bool,
    out: &mut CodeEmitter,
) {
    let failed = "false, pos";

    if framing == Framing::Packed {
        out.line("uint64 len;");
        out.line("(success, pos, len) = ProtobufLib.decode_length_delimited(pos, buf);");
        fail_unless_success(out, failed);
        out.blank();
        if reject_empty {
            out.line("// Empty packed array must be omitted");
            fail_if(out, "len == 0", failed);
            out.blank();
        }
    }
    out.line("uint64 initial_pos = pos;");
    out.blank();

    out.line("// Pass 1: count the elements");
    out.line("uint64 cnt = 0;");
    match framing {
        Framing::Packed => {
            out.open("while (pos - initial_pos < len)");
            generate_element(element, out);
            out.line("cnt += 1;");
            out.close();
            out.blank();
            out.line("// Elements must exactly fill the packed payload");
            fail_if(out, "pos != initial_pos + len", failed);
        }
        Framing::Unpacked => {
            out.open("while (true)");
            generate_element(element, out);
            out.line("cnt += 1;");
            out.blank();
            out.line("// Stop at the end of the enclosing message");
            out.open("if (pos >= end)");
            out.line("break;");
            out.close();
            out.blank();
            out.line("// Consecutive elements share this field's key");
            out.line("uint64 next_pos;");
            out.line("uint64 field_number;");
            out.line(format!("{} wire_type;", WIRE_TYPE));
            out.line("(success, next_pos, field_number, wire_type) = ProtobufLib.decode_key(pos, buf);");
            fail_unless_success(out, failed);
            out.open(format!("if (field_number != {})", field.number));
            out.line("break;");
            out.close();
            fail_if(out, &format!("wire_type != {}.{}", WIRE_TYPE, field.wire_type), failed);
            out.line("pos = next_pos;");
            out.close();
        }
    }
    out.blank();

    out.line("// Allocate memory");
    out.line(format!("instance.{} = new {}[](cnt);", field.name, element.type_name()));
    out.blank();

    out.line("// Pass 2: decode the elements");
    out.line("pos = initial_pos;");
    out.open("for (uint64 i = 0; i < cnt; i++)");
    if framing == Framing::Unpacked {
        out.open("if (i > 0)");
        out.line("uint64 field_number;");
        out.line(format!("{} wire_type;", WIRE_TYPE));
        out.line("(success, pos, field_number, wire_type) = ProtobufLib.decode_key(pos, buf);");
        fail_unless_success(out, failed);
        fail_if(
            out,
            &format!(
                "field_number != {} || wire_type != {}.{}",
                field.number, WIRE_TYPE, field.wire_type
            ),
            failed,
        );
        out.close();
    }
    generate_element(element, out);
    out.line(format!("instance.{}[i] = {};", field.name, element_value(element)));
    out.close();
}

/// Decodes one value into the local `v`, returning `(false, pos)` on failure.
fn generate_element(element: &ElementDecode, out: &mut CodeEmitter) {
    let failed = "false, pos";
    match element {
        ElementDecode::Scalar(kind) if kind.is_length_delimited() => {
            out.line("uint64 v_len;");
            out.line(format!("(success, pos, v_len) = ProtobufLib.{}(pos, buf);", decoder_name(*kind)));
            fail_unless_success(out, failed);
            out.line("bytes memory v = new bytes(v_len);");
            out.open("for (uint64 j = 0; j < v_len; j++)");
            out.line("v[j] = buf[pos + j];");
            out.close();
            out.line("pos = pos + v_len;");
        }
        ElementDecode::Scalar(kind) => {
            out.line(format!("{} v;", element.type_name()));
            out.line(format!("(success, pos, v) = ProtobufLib.{}(pos, buf);", decoder_name(*kind)));
            fail_unless_success(out, failed);
        }
        ElementDecode::Enum { max_ordinal, .. } => {
            out.line("int32 v;");
            out.line(format!(
                "(success, pos, v) = ProtobufLib.{}(pos, buf);",
                decoder_name(ScalarKind::Int32)
            ));
            fail_unless_success(out, failed);
            out.line("// Enum value must be within range");
            fail_if(out, &format!("v < 0 || v > {}", max_ordinal), failed);
        }
        ElementDecode::Message { name } => {
            out.line("uint64 v_len;");
            out.line("(success, pos, v_len) = ProtobufLib.decode_embedded_message(pos, buf);");
            fail_unless_success(out, failed);
            out.line(format!("{} memory v;", name));
            out.line(format!(
                "(success, pos, v) = {}.decode(pos, buf, v_len);",
                codec_name(name)
            ));
            fail_unless_success(out, failed);
        }
    }
}

/// The expression stored into the struct member for a decoded `v`.
fn element_value(element: &ElementDecode) -> String {
    match element {
        ElementDecode::Scalar(ScalarKind::String) => "string(v)".to_string(),
        ElementDecode::Enum { name, .. } => format!("{}(uint8(uint32(v)))", name),
        _ => "v".to_string(),
    }
}

/// The condition under which `v` holds the proto3 default. Messages have none.
fn default_condition(element: &ElementDecode) -> Option<String> {
    let condition = match element {
        ElementDecode::Scalar(ScalarKind::Bool) => "!v",
        ElementDecode::Scalar(kind) if kind.is_length_delimited() => "v.length == 0",
        ElementDecode::Scalar(_) | ElementDecode::Enum { .. } => "v == 0",
        ElementDecode::Message { .. } => return None,
    };
    Some(condition.to_string())
}

fn codec_name(message: &str) -> String {
    format!("{}{}", message, CODEC_SUFFIX)
}

fn generate_encode(plan: &MessagePlan, out: &mut CodeEmitter) {
    out.open(format!(
        "function encode({} memory /* instance */) internal pure returns (bytes memory)",
        plan.name
    ));
    out.line("revert(\"encoding not yet supported\");");
    out.close();
}
