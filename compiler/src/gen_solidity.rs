use serde::Serialize;
use tracing::info;

use crate::{
    emitter::CodeEmitter,
    error::SchemaError,
    gen_enum::generate_enum,
    gen_message::generate_message,
    options::{GeneratorOptions, SOLIDITY_VERSION_RANGE},
    plan::MessagePlan,
    symbols::SymbolTable,
    types::{output_name_for, FileSchema},
};

/// One generated `.sol` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedFile {
    pub name:    String,
    pub content: String,
}

pub fn generate_header(file: &FileSchema, options: &GeneratorOptions, out: &mut CodeEmitter) {
    out.line(format!("// SPDX-License-Identifier: {}", options.license));
    out.line(format!("pragma solidity {};", SOLIDITY_VERSION_RANGE));
    out.line("pragma experimental ABIEncoderV2;");
    out.blank();
    out.line(format!("import \"{}\";", options.protobuf_lib));
    for dependency in &file.dependencies {
        out.line(format!("import \"{}\";", output_name_for(dependency)));
    }
}

/// Renders a validated file. Every enum and message of the request must
/// already be registered in `symbols`.
pub fn compile_file_to_solidity(
    file: &FileSchema,
    symbols: &SymbolTable,
    options: &GeneratorOptions,
) -> Result<(GeneratedFile, Vec<MessagePlan>), SchemaError> {
    info!(file = %file.name, enums = file.enums.len(), messages = file.messages.len(), "generating file");

    let mut out = CodeEmitter::new();
    generate_header(file, options, &mut out);

    for def in &file.enums {
        out.blank();
        generate_enum(def, &mut out);
    }

    let mut plans = Vec::with_capacity(file.messages.len());
    for message in &file.messages {
        out.blank();
        plans.push(generate_message(message, symbols, options, &mut out)?);
    }

    let generated = GeneratedFile {
        name:    file.output_name(),
        content: out.into_string(),
    };
    Ok((generated, plans))
}
