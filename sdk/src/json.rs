use protosol_wire::Value;
use serde_json::{Map, Number, Value as Json};

/// Renders a decoded instance as JSON. Bytes become `0x`-prefixed hex and
/// enums their ordinal, matching what the Solidity struct would hold.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Bool(value) => Json::Bool(*value),
        Value::Int32(value) => Json::Number(Number::from(*value)),
        Value::Int64(value) => Json::Number(Number::from(*value)),
        Value::UInt32(value) => Json::Number(Number::from(*value)),
        Value::UInt64(value) => Json::Number(Number::from(*value)),
        Value::String(value) => Json::String(value.clone()),
        Value::Bytes(value) => Json::String(format!("0x{}", hex::encode(value))),
        Value::Enum(_, ordinal) => Json::Number(Number::from(*ordinal)),
        Value::Array(values) => Json::Array(values.iter().map(value_to_json).collect()),
        Value::Message(_, fields) => {
            let mut object = Map::new();
            for (name, value) in fields {
                object.insert(name.clone(), value_to_json(value));
            }
            Json::Object(object)
        }
    }
}
