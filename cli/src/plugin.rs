//! The `protoc` plugin transport.
//!
//! `protoc` writes a `CodeGeneratorRequest` to the plugin's stdin and reads a
//! `CodeGeneratorResponse` from its stdout. Generation failures travel inside
//! the response as its `error` string, so the plugin itself always exits
//! cleanly and `protoc` reports the message.

use anyhow::{Context, Result};
use prost::Message;
use prost_types::compiler::{code_generator_response::File, CodeGeneratorRequest, CodeGeneratorResponse};
use protosol_compiler::{compile_request, GeneratorOptions};
use tracing::{error, info};

/// Turns raw request bytes into raw response bytes. Only a failure to encode
/// the response is an error; everything else becomes the response's `error`.
pub fn run(input: &[u8]) -> Result<Vec<u8>> {
    let response = match CodeGeneratorRequest::decode(input) {
        Ok(request) => generate_response(&request),
        Err(e) => error_response(format!(
            "Failed to decode CodeGeneratorRequest, make sure this runs as a protoc plugin: {e}"
        )),
    };

    let mut output = Vec::with_capacity(response.encoded_len());
    response
        .encode(&mut output)
        .context("Failed to encode CodeGeneratorResponse")?;
    Ok(output)
}

pub fn generate_response(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    match generate_files(request) {
        Ok(file) => CodeGeneratorResponse { file, ..Default::default() },
        Err(e) => error_response(format!("{e:#}")),
    }
}

fn error_response(message: String) -> CodeGeneratorResponse {
    error!(reason = %message, "generation aborted");
    CodeGeneratorResponse {
        error: Some(message),
        ..Default::default()
    }
}

/// All or nothing: the first schema error discards every file.
pub fn generate_files(request: &CodeGeneratorRequest) -> Result<Vec<File>> {
    let options = GeneratorOptions::from_parameter(request.parameter())
        .with_context(|| format!("Invalid plugin parameter {:?}", request.parameter()))?;

    let compilation = compile_request(&request.proto_file, &request.file_to_generate, &options)?;
    info!(files = compilation.files.len(), "generated solidity");

    Ok(compilation
        .files
        .into_iter()
        .map(|file| File {
            name: Some(file.name),
            content: Some(file.content),
            ..Default::default()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{
        field_descriptor_proto::{Label, Type},
        DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    };

    fn request(parameter: Option<&str>, package: Option<&str>) -> CodeGeneratorRequest {
        let file = FileDescriptorProto {
            name: Some("counter.proto".to_string()),
            syntax: Some("proto3".to_string()),
            package: package.map(str::to_string),
            message_type: vec![DescriptorProto {
                name: Some("Counter".to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("count".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Uint64 as i32),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        CodeGeneratorRequest {
            file_to_generate: vec!["counter.proto".to_string()],
            parameter: parameter.map(str::to_string),
            proto_file: vec![file],
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_response() {
        let response = generate_response(&request(Some("license=MIT"), None));
        assert_eq!(response.error, None);
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name(), "counter.sol");
        assert!(response.file[0].content().starts_with("// SPDX-License-Identifier: MIT\n"));
        assert!(response.file[0].content().contains("library CounterCodec {"));
    }

    #[test]
    fn test_schema_error_aborts_all_files() {
        let response = generate_response(&request(None, Some("counters")));
        assert!(response.file.is_empty());
        assert!(response.error().contains("package \"counters\" is not allowed"));
    }

    #[test]
    fn test_bad_parameter() {
        let response = generate_response(&request(Some("solc=0.8"), None));
        assert!(response.file.is_empty());
        assert!(response.error().starts_with("Invalid plugin parameter \"solc=0.8\""));
    }

    #[test]
    fn test_run_round_trip() {
        let input = request(None, None).encode_to_vec();
        let output = run(&input).unwrap();
        let response = CodeGeneratorResponse::decode(output.as_slice()).unwrap();
        assert_eq!(response.file.len(), 1);
    }

    #[test]
    fn test_run_with_garbage_still_answers() {
        let output = run(&[0xff, 0xff, 0xff]).unwrap();
        let response = CodeGeneratorResponse::decode(output.as_slice()).unwrap();
        assert!(response.error().starts_with("Failed to decode CodeGeneratorRequest"));
    }
}
