//! protosol-compiler
//!
//! This crate implements:
//!  1) Projection of `protoc` descriptors onto a small schema model,
//!  2) A schema verifier (proto3 only, no packages or nested types, dense field numbers, packing rules, reserved names, cycles),
//!  3) A two-phase compiler: every enum and message is registered before any message is emitted,
//!  4) Decoder plans and their rendering to Solidity struct + codec library pairs,
//!  5) Error types (`SchemaError`, `ParameterError`) and generator options.

pub mod error;
pub mod types;
pub mod type_map;
pub mod symbols;
pub mod verifier;
pub mod descriptor;
pub mod options;
pub mod emitter;
pub mod plan;
pub mod gen_enum;
pub mod gen_message;
pub mod gen_solidity;
pub mod compiler;

pub use compiler::{compile_request, compile_schemas, Compilation};
pub use error::{ParameterError, SchemaError};
pub use gen_solidity::GeneratedFile;
pub use options::GeneratorOptions;
pub use plan::{ElementDecode, FieldDecode, FieldPlan, Framing, MessagePlan};
