//! Typed document values
//!
//! Mirrors the REST encoding of Firestore values, where every field is an
//! object with a single key naming its type:
//!
//! ```json
//! { "ok": { "booleanValue": true }, "ts": { "timestampValue": "2026-10-18T09:30:00.123456Z" } }
//! ```
//!
//! 64-bit integers travel as decimal strings; non-finite doubles as
//! `"NaN"`, `"Infinity"` or `"-Infinity"`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Document body: field name to value, ordered by name.
pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "int64_string")] i64),
    DoubleValue(#[serde(with = "double_repr")] f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    /// Base64-encoded, as sent on the wire.
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

impl FieldValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::TimestampValue(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::NullValue(()) => write!(f, "null"),
            FieldValue::BooleanValue(b) => write!(f, "{}", b),
            FieldValue::IntegerValue(i) => write!(f, "{}", i),
            FieldValue::DoubleValue(d) => write!(f, "{}", d),
            FieldValue::TimestampValue(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::StringValue(s) => write!(f, "{:?}", s),
            FieldValue::BytesValue(b) => write!(f, "<bytes {}>", b),
            FieldValue::ReferenceValue(r) => write!(f, "{}", r),
            FieldValue::GeoPointValue(p) => write!(f, "({}, {})", p.latitude, p.longitude),
            FieldValue::ArrayValue(a) => {
                write!(f, "[")?;
                for (i, v) in a.values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            FieldValue::MapValue(m) => write!(f, "{}", render_fields(&m.fields)),
        }
    }
}

/// Render a document body as `{ name: value, ... }`.
pub fn render_fields(fields: &Fields) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let body: Vec<String> = fields.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("{{ {} }}", body.join(", "))
}

mod int64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Str(String),
        Num(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Str(s) => s.parse().map_err(de::Error::custom),
            Repr::Num(n) => Ok(n),
        }
    }
}

mod double_repr {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Str(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Num(n) => Ok(n),
            Repr::Str(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("invalid double {:?}", other))),
            },
        }
    }
}
