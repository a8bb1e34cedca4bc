//! Loosely-typed values as they arrive from device services.
//!
//! Device services answer with property-list records whose value types are not
//! guaranteed; the same key can be a boolean on one firmware and a string on
//! another. Adapters translate their native representation into [`WireValue`]
//! and the domain decodes from there explicitly.

use std::collections::BTreeMap;

/// One per-record property map (e.g. one installed app as reported by the
/// installation-listing service).
pub type WireRecord = BTreeMap<String, WireValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Data(Vec<u8>),
    Date(chrono::DateTime<chrono::Utc>),
    Array(Vec<WireValue>),
    Dict(WireRecord),
}

impl WireValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            WireValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&WireRecord> {
        match self {
            WireValue::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Short type name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Bool(_) => "bool",
            WireValue::Integer(_) => "integer",
            WireValue::Real(_) => "real",
            WireValue::String(_) => "string",
            WireValue::Data(_) => "data",
            WireValue::Date(_) => "date",
            WireValue::Array(_) => "array",
            WireValue::Dict(_) => "dict",
        }
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::String(value.to_string())
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Integer(value)
    }
}

/// Non-empty string value of `key`, if present.
pub fn non_empty_str<'a>(record: &'a WireRecord, key: &str) -> Option<&'a str> {
    record
        .get(key)
        .and_then(WireValue::as_str)
        .filter(|s| !s.trim().is_empty())
}
