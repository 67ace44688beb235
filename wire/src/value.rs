use std::fmt;
use std::ops::Index;

/// A decoded protobuf instance, shaped like the Solidity struct the generated
/// codec fills in.
///
/// Messages keep their fields in declaration order, and every declared field
/// is present: fields absent from the wire hold their zero value, exactly as
/// an uninitialised Solidity `memory` struct would.
#[derive(Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    String(String),
    Bytes(Vec<u8>),
    Enum(String, i32),
    Array(Vec<Value>),
    Message(String, Vec<(String, Value)>),
}

impl Value {
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(value) => value,
            _ => false,
        }
    }

    /// Widens every integer kind (and enum ordinals) to `i128`.
    /// Returns `0` for other value kinds.
    pub fn as_integer(&self) -> i128 {
        match *self {
            Value::Int32(value) => value as i128,
            Value::Int64(value) => value as i128,
            Value::UInt32(value) => value as i128,
            Value::UInt64(value) => value as i128,
            Value::Enum(_, ordinal) => ordinal as i128,
            _ => 0,
        }
    }

    /// Returns `""` for other value kinds.
    pub fn as_string(&self) -> &str {
        match *self {
            Value::String(ref value) => value.as_str(),
            _ => "",
        }
    }

    /// Returns an empty slice for other value kinds.
    pub fn as_bytes(&self) -> &[u8] {
        match *self {
            Value::Bytes(ref value) => value.as_slice(),
            Value::String(ref value) => value.as_bytes(),
            _ => &[],
        }
    }

    /// Returns an empty slice for other value kinds.
    pub fn as_array(&self) -> &[Value] {
        match *self {
            Value::Array(ref values) => values.as_slice(),
            _ => &[],
        }
    }

    /// The number of array elements or message fields. Returns `0` otherwise.
    pub fn len(&self) -> usize {
        match *self {
            Value::Array(ref values) => values.len(),
            Value::Message(_, ref fields) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a message field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match *self {
            Value::Message(_, ref fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Overwrites a declared message field. Unknown names are ignored, since a
    /// Solidity struct cannot grow members at runtime.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Value::Message(_, ref mut fields) = *self {
            if let Some(slot) = fields.iter_mut().find(|(field, _)| field == name) {
                slot.1 = value;
            }
        }
    }

    /// Appends to an [Array](#variant.Array). Does nothing for other kinds.
    pub fn push(&mut self, value: Value) {
        if let Value::Array(ref mut values) = *self {
            values.push(value);
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    /// Panics if this value isn't an [Array](#variant.Array) or if the index
    /// is out of bounds.
    fn index(&self, index: usize) -> &Value {
        match *self {
            Value::Array(ref values) => &values[index],
            _ => panic!("indexing a non-array value"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match *self {
            Value::Bool(value) => value.fmt(f),
            Value::Int32(value) => value.fmt(f),
            Value::Int64(value) => value.fmt(f),
            Value::UInt32(value) => value.fmt(f),
            Value::UInt64(value) => value.fmt(f),
            Value::String(ref value) => value.fmt(f),
            Value::Bytes(ref value) => {
                write!(f, "0x")?;
                for byte in value {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Array(ref values) => values.fmt(f),
            Value::Enum(ref name, ordinal) => write!(f, "{}({})", name, ordinal),

            Value::Message(ref name, ref fields) => {
                write!(f, "{} {{", name)?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {:?}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
