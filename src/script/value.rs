use itertools::Itertools;
use std::collections::HashMap;

/// Objects scripts can call methods on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// The request
    Request,
    /// Request headers
    HeadersIn,
    /// Response headers
    HeadersOut,
    /// Variable table
    Var,
}

impl ObjectRef {
    /// Class name shown to scripts
    pub fn class_name(self) -> &'static str {
        match self {
            ObjectRef::Request => "Nginx::Request",
            ObjectRef::HeadersIn => "Nginx::Headers_in",
            ObjectRef::HeadersOut => "Nginx::Headers_out",
            ObjectRef::Var => "Nginx::Var",
        }
    }
}

/// Value passed between scripts and the request
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Byte string
    Str(Vec<u8>),
    /// String to string map
    Hash(HashMap<Vec<u8>, Vec<u8>>),
    /// Object reference
    Object(ObjectRef),
}

impl Value {
    /// If the value is nil
    pub fn is_nil(&self) -> bool {
        *self == Value::Nil
    }

    /// The bytes of a string value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Hash(_) => "Hash",
            Value::Object(object) => object.class_name(),
        }
    }

    /// String conversion of any value, as scripts see it. Strings convert to themselves.
    pub fn to_s(&self) -> Vec<u8> {
        match self {
            Value::Nil => Vec::new(),
            Value::Bool(b) => b.to_string().into_bytes(),
            Value::Int(i) => i.to_string().into_bytes(),
            Value::Float(f) => format!("{:?}", f).into_bytes(),
            Value::Str(bytes) => bytes.clone(),
            Value::Hash(map) => format!(
                "{{{}}}",
                map.iter()
                    .sorted()
                    .map(|(k, v)| format!(
                        "{:?}=>{:?}",
                        String::from_utf8_lossy(k),
                        String::from_utf8_lossy(v)
                    ))
                    .join(", ")
            )
            .into_bytes(),
            Value::Object(object) => format!("#<{}>", object.class_name()).into_bytes(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Str(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Str(bytes)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    /// Arrays and nested objects become their JSON text
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::Str(s.into_bytes()),
            other => Value::Str(other.to_string().into_bytes()),
        }
    }
}
