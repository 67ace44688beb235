use std::collections::BTreeMap;

use prost_types::FileDescriptorProto;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    descriptor::project_file,
    error::SchemaError,
    gen_enum::register_enum,
    gen_solidity::{compile_file_to_solidity, GeneratedFile},
    options::GeneratorOptions,
    plan::{build_plan, MessagePlan},
    symbols::SymbolTable,
    types::FileSchema,
    verifier::{verify_references, verify_schema},
};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compilation {
    /// Output files, in request order.
    pub files:   Vec<GeneratedFile>,
    /// Decoder plans of every message in the request, generated or not.
    pub plans:   BTreeMap<String, MessagePlan>,
    pub symbols: SymbolTable,
}

impl Compilation {
    pub fn plan(&self, message: &str) -> Option<&MessagePlan> {
        self.plans.get(message)
    }
}

/// Compiles the files of a `CodeGeneratorRequest`.
///
/// Every descriptor takes part in validation and symbol resolution; only the
/// ones named in `files_to_generate` produce output.
pub fn compile_request(
    proto_files: &[FileDescriptorProto],
    files_to_generate: &[String],
    options: &GeneratorOptions,
) -> Result<Compilation, SchemaError> {
    // Each file is verified before the next one is projected, so errors
    // surface in request order
    let mut schemas = Vec::with_capacity(proto_files.len());
    for proto in proto_files {
        let schema = project_file(proto)?;
        verify_schema(&schema)?;
        schemas.push(schema);
    }
    compile_verified(&schemas, files_to_generate, options)
}

/// Collects every enum maximum and message name of the request. Message
/// emission only starts once this has succeeded for all files.
pub fn collect_symbols(files: &[FileSchema]) -> Result<SymbolTable, SchemaError> {
    let mut symbols = SymbolTable::new();
    for file in files {
        for def in &file.enums {
            register_enum(def, &mut symbols)?;
        }
        for message in &file.messages {
            symbols.register_message(&message.name);
        }
    }
    Ok(symbols)
}

/// Two-phase compilation of already projected schemas.
pub fn compile_schemas(
    files: &[FileSchema],
    files_to_generate: &[String],
    options: &GeneratorOptions,
) -> Result<Compilation, SchemaError> {
    for file in files {
        verify_schema(file)?;
    }
    compile_verified(files, files_to_generate, options)
}

fn compile_verified(
    files: &[FileSchema],
    files_to_generate: &[String],
    options: &GeneratorOptions,
) -> Result<Compilation, SchemaError> {
    // Phase 1: the symbol table is complete before any message is looked at
    let symbols = collect_symbols(files)?;
    verify_references(files, &symbols)?;
    debug!(files = files.len(), "collected symbols");

    // Phase 2: emission only reads the table
    let mut generated = Vec::new();
    let mut plans = BTreeMap::new();
    for file in files {
        let file_plans = if files_to_generate.contains(&file.name) {
            let (output, file_plans) = compile_file_to_solidity(file, &symbols, options)?;
            generated.push(output);
            file_plans
        } else {
            file.messages
                .iter()
                .map(|message| build_plan(message, &symbols, options))
                .collect::<Result<Vec<_>, _>>()?
        };
        for plan in file_plans {
            plans.insert(plan.name.clone(), plan);
        }
    }

    info!(generated = generated.len(), messages = plans.len(), "compilation finished");
    Ok(Compilation {
        files: generated,
        plans,
        symbols,
    })
}
