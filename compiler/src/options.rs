use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::ParameterError;

pub const DEFAULT_LICENSE: &str = "CC0";

/// Every generated file is pinned to this compiler range.
pub const SOLIDITY_VERSION_RANGE: &str = ">=0.6.8 <0.9.0";

pub const DEFAULT_PROTOBUF_LIB: &str =
    "@lazyledger/protobuf3-solidity-lib/contracts/ProtobufLib.sol";

lazy_static! {
    /// SPDX license expression: ids joined by AND / OR / WITH.
    static ref LICENSE: Regex =
        Regex::new(r"^[A-Za-z0-9.+\-]+( (AND|OR|WITH) [A-Za-z0-9.+\-]+)*$").unwrap();

    /// Anything that can sit inside a Solidity string literal on one line.
    static ref IMPORT_PATH: Regex = Regex::new(r#"^[^"\\\r\n]+$"#).unwrap();
}

/// Knobs accepted through the plugin parameter string, e.g.
/// `--sol_opt=license=MIT,reject_default_values=false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorOptions {
    /// SPDX identifier written in the header comment.
    pub license:               String,
    /// Import path of `ProtobufLib`.
    pub protobuf_lib:          String,
    /// Fail decoding when a singular field carries its proto3 default value,
    /// which a canonical encoder never writes.
    pub reject_default_values: bool,
}

impl Default for GeneratorOptions {
    fn default() -> GeneratorOptions {
        GeneratorOptions {
            license:               DEFAULT_LICENSE.to_string(),
            protobuf_lib:          DEFAULT_PROTOBUF_LIB.to_string(),
            reject_default_values: true,
        }
    }
}

impl GeneratorOptions {
    /// Parses a comma separated `key=value` list. An empty string yields the
    /// defaults.
    pub fn from_parameter(parameter: &str) -> Result<GeneratorOptions, ParameterError> {
        let mut options = GeneratorOptions::default();
        for entry in split_escaped(parameter, ',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = match entry.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (entry, ""),
            };
            options.set(key, value)?;
        }
        Ok(options)
    }

    /// Applies one option after validating its value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ParameterError> {
        let invalid = || ParameterError::InvalidValue {
            key:   key.to_string(),
            value: value.to_string(),
        };
        match key {
            "license" => {
                if !LICENSE.is_match(value) {
                    return Err(invalid());
                }
                self.license = value.to_string();
            }
            "protobuf_lib" => {
                if !IMPORT_PATH.is_match(value) {
                    return Err(invalid());
                }
                self.protobuf_lib = value.to_string();
            }
            "reject_default_values" => {
                self.reject_default_values = match value {
                    "" | "true" => true,
                    "false" => false,
                    _ => return Err(invalid()),
                };
            }
            _ => return Err(ParameterError::UnknownParameter(key.to_string())),
        }
        Ok(())
    }
}

/// Splits on `separator` unless it is escaped with a backslash. The escape
/// itself is dropped.
pub fn split_escaped(text: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next == separator => current.push(next),
                Some(next) => {
                    current.push(c);
                    current.push(next);
                }
                None => current.push(c),
            }
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() || !parts.is_empty() {
        parts.push(current);
    }
    parts
}
