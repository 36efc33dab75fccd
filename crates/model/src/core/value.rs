use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};
use uuid::Uuid;

/// A single value read from a source row, already lifted out of the
/// driver's own type system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    StringArray(Vec<String>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Decimal(v) => v.to_f64(),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Uint(v) => i64::try_from(*v).ok(),
            Value::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Value::Decimal(v) => v.to_i64(),
            Value::String(v) => {
                let trimmed = v.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
            }
            Value::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::Uint(v) => Some(*v != 0),
            Value::String(v) => match v.trim().to_lowercase().as_str() {
                "true" | "t" | "1" => Some(true),
                "false" | "f" | "0" => Some(false),
                _ => None,
            },
            Value::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    /// Plain text rendering of the value; `None` for SQL/BSON null.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(v) => Some(v.clone()),
            Value::Bytes(v) => Some(String::from_utf8_lossy(v).into_owned()),
            Value::Json(serde_json::Value::String(s)) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Int(v) => Json::from(*v),
            Value::Uint(v) => Json::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Decimal(v) => Json::String(v.to_string()),
            Value::String(v) => Json::String(v.clone()),
            Value::Boolean(v) => Json::Bool(*v),
            Value::Json(v) => v.clone(),
            Value::Uuid(v) => Json::String(v.to_string()),
            Value::Bytes(v) => Json::String(String::from_utf8_lossy(v).into_owned()),
            Value::Date(v) => Json::String(v.to_string()),
            Value::Timestamp(v) => Json::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::StringArray(v) => Json::Array(v.iter().cloned().map(Json::String).collect()),
            Value::Null => Json::Null,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Boolean(_) => "bool",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::StringArray(_) => "string[]",
            Value::Null => "null",
        }
    }

    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Uint(a), Uint(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            Value::Date(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::StringArray(v) => write!(f, "{}", v.join(",")),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// A named column of a row. `raw_type` is the source's own name for the
/// column type (`int8`, `timestamptz`, `ObjectId`, ...), when known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_type: Option<String>,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        FieldValue {
            name: name.into(),
            value,
            raw_type: None,
        }
    }

    pub fn with_raw_type(mut self, raw_type: impl Into<String>) -> Self {
        self.raw_type = Some(raw_type.into());
        self
    }
}
