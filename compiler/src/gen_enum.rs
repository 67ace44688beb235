use tracing::debug;

use crate::{emitter::CodeEmitter, error::SchemaError, symbols::SymbolTable, types::EnumSchema};

/// Solidity stores enums in a `uint8`.
pub const MAX_ENUM_VALUES: usize = 256;

/// Checks that ordinals run 0, 1, 2, … in declaration order and returns the
/// largest one.
pub fn verify_enum_ordinals(def: &EnumSchema) -> Result<u32, SchemaError> {
    if def.values.len() > MAX_ENUM_VALUES {
        return Err(SchemaError::EnumTooLargeError {
            enum_name: def.name.clone(),
            count:     def.values.len(),
        });
    }
    if def.values.is_empty() {
        return Err(SchemaError::EnumOrdinalSequenceError {
            enum_name: def.name.clone(),
            value:     String::new(),
            expected:  0,
            found:     -1,
        });
    }
    for (i, value) in def.values.iter().enumerate() {
        let expected = i as i32;
        if value.number != expected {
            return Err(SchemaError::EnumOrdinalSequenceError {
                enum_name: def.name.clone(),
                value:     value.name.clone(),
                expected,
                found:     value.number,
            });
        }
    }
    Ok(def.values.len() as u32 - 1)
}

/// Phase one: validate the enum and record its maximum ordinal.
pub fn register_enum(def: &EnumSchema, symbols: &mut SymbolTable) -> Result<u32, SchemaError> {
    let max_ordinal = verify_enum_ordinals(def)?;
    debug!(name = %def.name, max_ordinal, "registered enum");
    symbols.register_enum(&def.name, max_ordinal);
    Ok(max_ordinal)
}

/// Phase two: render the declaration.
pub fn generate_enum(def: &EnumSchema, out: &mut CodeEmitter) {
    out.open(format!("enum {}", def.name));
    let last = def.values.len().saturating_sub(1);
    for (i, value) in def.values.iter().enumerate() {
        if i == last {
            out.line(&value.name);
        } else {
            out.line(format!("{},", value.name));
        }
    }
    out.close();
}

/// Validates, registers and renders in one go.
pub fn emit_enum(def: &EnumSchema, symbols: &mut SymbolTable) -> Result<String, SchemaError> {
    register_enum(def, symbols)?;
    let mut out = CodeEmitter::new();
    generate_enum(def, &mut out);
    Ok(out.into_string())
}
