//! protosol
//!
//! Runtime support for data decoded by protosol-generated Solidity codecs.
//!
//! - `Decoder`, a reference decoder that accepts exactly the buffers the generated `decode` accepts
//! - `DecodeError`, naming the check a rejected buffer failed
//! - JSON rendering of decoded instances

pub mod decoder;
pub mod error;
pub mod json;

pub use decoder::Decoder;
pub use error::DecodeError;
pub use json::value_to_json;
pub use protosol_compiler::{Compilation, GeneratorOptions, MessagePlan, SchemaError};
pub use protosol_wire::{ByteBuffer, ByteBufferMut, Value, WireType};

/// Decode `bytes` as `message` into a pretty-printed JSON string.
pub fn decode_to_json(decoder: &Decoder, message: &str, bytes: &[u8]) -> Result<String, DecodeError> {
    let value = decoder.decode(message, bytes)?;
    let json = value_to_json(&value);
    // A `serde_json::Value` always serializes
    Ok(serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()))
}

pub mod wire {
    pub use protosol_wire::*;
}

pub mod compiler {
    pub use protosol_compiler::*;
}
