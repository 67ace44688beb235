use protosol_wire::WireType;
use thiserror::Error;

/// Why a buffer was rejected by a generated decoder. The Solidity code only
/// reports `false`; the reference decoder also says which check failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Message {message:?} is not part of the compiled schemas")]
    UnknownMessage {
        message: String,
    },

    #[error("Position {pos} plus length {len} overflows")]
    LengthOverflow {
        pos: usize,
        len: u64,
    },

    #[error("Malformed key at position {pos}")]
    MalformedKey {
        pos: usize,
    },

    #[error("Field number {field_number} exceeds the {count} fields of {message:?}")]
    FieldNumberOutOfBounds {
        message:      String,
        field_number: u64,
        count:        u64,
    },

    #[error("Field number {field_number} follows field number {previous}, fields must be strictly increasing")]
    NonMonotonicField {
        field_number: u64,
        previous:     u64,
    },

    #[error("Field number {field_number} expects wire type {expected} but got {found}")]
    WireTypeMismatch {
        field_number: u64,
        expected:     WireType,
        found:        WireType,
    },

    #[error("Length-delimited value at position {pos} runs past the end of the buffer")]
    Truncated {
        pos: usize,
    },

    #[error("Decoding stopped at position {found} instead of {expected}")]
    LengthMismatch {
        expected: usize,
        found:    usize,
    },

    #[error("Malformed {kind} value at position {pos}")]
    MalformedValue {
        kind: &'static str,
        pos:  usize,
    },

    #[error("Enum {enum_name:?} value {value} is outside 0..={max_ordinal}")]
    EnumOutOfRange {
        enum_name:   String,
        value:       i32,
        max_ordinal: u32,
    },

    #[error("Field {field:?}: the refill pass found a different element than the counting pass")]
    ElementCountMismatch {
        field: String,
    },

    #[error("Field {field:?} carries its default value, which must be omitted")]
    DefaultValueEncoded {
        field: String,
    },
}
