//! Schema-less wrapper around one JSON object returned by the API.
//!
//! Toggl adds fields without notice, so nothing here is validated: every key the server sent
//! is kept, in the order it was sent, and read back through loosely-typed getters.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wraps a decoded JSON value. Only objects are accepted.
    pub fn from_value(value: Value) -> ApiResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ApiError::invalid(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String field. `None` if absent, null or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Field names in the order the server sent them
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_map(&self) -> Map<String, Value> {
        self.fields.clone()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    pub fn to_json(&self) -> ApiResult<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// One `"<Kind>.field = value"` line per field, angle brackets included
    pub fn dump(&self, kind: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, value) in &self.fields {
            match value {
                Value::String(text) => writeln!(f, "<{}>.{} = {}", kind, field, text)?,
                other => writeln!(f, "<{}>.{} = {}", kind, field, other)?,
            }
        }
        Ok(())
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump("Record", f)
    }
}

/// A `Record` with a name and a documented set of usual fields.
pub trait ValueObject: Sized {
    /// Type name used in the text dump
    const KIND: &'static str;

    /// The fields the API usually returns for this kind of object. Documentation only.
    const DEFAULT_FIELDS: &'static [&'static str];

    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    /// Documented defaults for `DEFAULT_FIELDS`. Built fresh on every call.
    fn defaults() -> Map<String, Value> {
        Map::new()
    }

    fn from_value(value: Value) -> ApiResult<Self> {
        Record::from_value(value).map(Self::from_record)
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.record().get(field)
    }

    /// The field as sent, or its documented default when the server left it out
    fn field_or_default(&self, field: &str) -> Option<Value> {
        self.record()
            .get(field)
            .cloned()
            .or_else(|| Self::defaults().remove(field))
    }

    fn to_map(&self) -> Map<String, Value> {
        self.record().to_map()
    }

    fn to_json(&self) -> ApiResult<String> {
        self.record().to_json()
    }
}

/// Declares a newtype over `Record` implementing `ValueObject`, `Display` and serde.
macro_rules! value_object {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, [$($field:literal => $default:expr),* $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq)]
        #[serde(transparent)]
        pub struct $name(crate::record::Record);

        impl crate::record::ValueObject for $name {
            const KIND: &'static str = $kind;
            const DEFAULT_FIELDS: &'static [&'static str] = &[$($field),*];

            fn from_record(record: crate::record::Record) -> Self {
                Self(record)
            }

            fn record(&self) -> &crate::record::Record {
                &self.0
            }

            #[allow(unused_mut)]
            fn defaults() -> serde_json::Map<String, serde_json::Value> {
                let mut map = serde_json::Map::new();
                $(map.insert($field.to_string(), $default);)*
                map
            }
        }

        impl From<crate::record::Record> for $name {
            fn from(record: crate::record::Record) -> Self {
                Self(record)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.dump($kind, f)
            }
        }
    };
}

pub(crate) use value_object;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn acme() -> Record {
        Record::from_value(json!({"name": "Acme", "id": 7})).unwrap()
    }

    #[test]
    fn round_trip_to_map() {
        let original = json!({"name": "Acme", "id": 7});
        let record = Record::from_value(original.clone()).unwrap();
        assert_eq!(Value::Object(record.to_map()), original);
        assert_eq!(Value::Object(record.into_map()), original);
    }

    #[test]
    fn typed_getters() {
        let record = Record::from_value(json!({
            "name": "Acme", "id": 7, "rate": 12.5, "premium": true, "logo_url": null
        }))
        .unwrap();
        assert_eq!(record.get_str("name"), Some("Acme"));
        assert_eq!(record.get_i64("id"), Some(7));
        assert_eq!(record.get_f64("rate"), Some(12.5));
        assert_eq!(record.get_bool("premium"), Some(true));
        assert_eq!(record.get("logo_url"), Some(&Value::Null));
        assert_eq!(record.get_str("logo_url"), None);
        assert_eq!(record.get("missing"), None);
        assert!(record.contains("logo_url"));
    }

    #[test]
    fn dump_keeps_server_order() {
        let record = acme();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["name", "id"]);
        assert_eq!(record.to_string(), "<Record>.name = Acme\n<Record>.id = 7\n");
    }

    #[test]
    fn json_string() {
        assert_eq!(acme().to_json().unwrap(), r#"{"name":"Acme","id":7}"#);
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(matches!(
            Record::from_value(json!([1, 2])),
            Err(ApiError::InvalidArgument(_))
        ));
    }
}
