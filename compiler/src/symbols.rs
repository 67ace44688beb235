use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-run knowledge about the types declared across a request.
///
/// Phase one of a run fills the table (every enum's maximum ordinal and every
/// message name); phase two only reads it while emitting messages. Ordered
/// containers keep anything derived from it deterministic.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SymbolTable {
    enums:    BTreeMap<String, u32>,
    messages: BTreeSet<String>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn register_enum(&mut self, name: &str, max_ordinal: u32) {
        self.enums.insert(name.to_string(), max_ordinal);
    }

    pub fn register_message(&mut self, name: &str) {
        self.messages.insert(name.to_string());
    }

    /// Maximum valid ordinal of a registered enum.
    pub fn enum_max(&self, name: &str) -> Option<u32> {
        self.enums.get(name).copied()
    }

    pub fn has_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn has_message(&self, name: &str) -> bool {
        self.messages.contains(name)
    }

    /// Any declared type, enum or message.
    pub fn has_type(&self, name: &str) -> bool {
        self.has_enum(name) || self.has_message(name)
    }
}
