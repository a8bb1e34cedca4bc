//! Translation between property-list values and [`WireValue`].

use std::io::Cursor;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use ds_core::ports::DeviceError;
use ds_core::wire::{WireRecord, WireValue};
use plist::{Dictionary, Value};

pub fn encode_xml(value: &Value) -> Result<Vec<u8>, DeviceError> {
    let mut buf = Vec::new();
    value
        .to_writer_xml(&mut buf)
        .map_err(|e| DeviceError::Codec(format!("plist encode: {e}")))?;
    Ok(buf)
}

/// Decode an XML or binary property list.
pub fn decode(bytes: &[u8]) -> Result<Value, DeviceError> {
    Value::from_reader(Cursor::new(bytes)).map_err(|e| DeviceError::Codec(format!("plist decode: {e}")))
}

pub fn decode_dict(bytes: &[u8]) -> Result<Dictionary, DeviceError> {
    match decode(bytes)? {
        Value::Dictionary(dict) => Ok(dict),
        _ => Err(DeviceError::Codec("expected a dictionary".into())),
    }
}

pub fn to_wire(value: &Value) -> WireValue {
    match value {
        Value::Boolean(b) => WireValue::Bool(*b),
        Value::Integer(i) => WireValue::Integer(
            i.as_signed()
                .or_else(|| i.as_unsigned().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
                .unwrap_or_default(),
        ),
        Value::Real(r) => WireValue::Real(*r),
        Value::String(s) => WireValue::String(s.clone()),
        Value::Data(d) => WireValue::Data(d.clone()),
        Value::Date(d) => WireValue::Date(DateTime::<Utc>::from(SystemTime::from(d.clone()))),
        Value::Array(items) => WireValue::Array(items.iter().map(to_wire).collect()),
        Value::Dictionary(dict) => WireValue::Dict(record_from(dict)),
        // UIDs only appear in keyed archives
        other => WireValue::String(format!("{other:?}")),
    }
}

pub fn record_from(dict: &Dictionary) -> WireRecord {
    dict.iter().map(|(k, v)| (k.clone(), to_wire(v))).collect()
}

/// The `Error` string a service puts in a failed reply.
pub fn reply_error(reply: &Dictionary) -> Option<&str> {
    reply.get("Error").and_then(Value::as_string)
}

pub fn string_at<'a>(reply: &'a Dictionary, key: &str) -> Option<&'a str> {
    reply.get(key).and_then(Value::as_string)
}

pub fn dict(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Dictionary {
    let mut dict = Dictionary::new();
    for (key, value) in entries {
        dict.insert(key.to_string(), value);
    }
    dict
}
