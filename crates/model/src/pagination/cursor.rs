use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of kinds a watermark value is normalized into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum CursorKind {
    Int,
    Float,
    Datetime,
    Bool,
    #[default]
    String,
}

impl CursorKind {
    /// Maps free-form type names onto a kind. Unknown names fall back to
    /// `String`, which compares lexically.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "long" | "int64" | "bigint" => CursorKind::Int,
            "float" | "double" | "decimal" | "number" | "float64" => CursorKind::Float,
            "datetime" | "time" | "timestamp" | "date" => CursorKind::Datetime,
            "bool" | "boolean" => CursorKind::Bool,
            _ => CursorKind::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CursorKind::Int => "int",
            CursorKind::Float => "float",
            CursorKind::Datetime => "datetime",
            CursorKind::Bool => "bool",
            CursorKind::String => "string",
        }
    }
}

impl From<String> for CursorKind {
    fn from(value: String) -> Self {
        CursorKind::from_hint(&value)
    }
}

impl From<CursorKind> for String {
    fn from(kind: CursorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CursorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native form of a watermark component, one width per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorValue {
    Int(i64),
    Float(f64),
    Datetime(DateTime<Utc>),
    Bool(bool),
    String(String),
}

impl CursorValue {
    pub fn kind(&self) -> CursorKind {
        match self {
            CursorValue::Int(_) => CursorKind::Int,
            CursorValue::Float(_) => CursorKind::Float,
            CursorValue::Datetime(_) => CursorKind::Datetime,
            CursorValue::Bool(_) => CursorKind::Bool,
            CursorValue::String(_) => CursorKind::String,
        }
    }
}

/// Canonical text: RFC 3339 UTC for datetimes, shortest round-tripping
/// decimal for numbers, `true`/`false` for booleans.
impl fmt::Display for CursorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorValue::Int(v) => write!(f, "{v}"),
            CursorValue::Float(v) => write!(f, "{v}"),
            CursorValue::Datetime(v) => {
                f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            CursorValue::Bool(v) => write!(f, "{v}"),
            CursorValue::String(v) => f.write_str(v),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredCursorValue {
    #[serde(rename = "type")]
    pub kind: CursorKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_type: Option<String>,
}

/// The durable watermark: the property value and, when configured, the
/// tie-breaker value of the last row seen.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoredCursor {
    pub property: StoredCursorValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie: Option<StoredCursorValue>,
}

impl fmt::Display for StoredCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{}", self.property.kind, self.property.value)?;
        if let Some(tie) = &self.tie {
            write!(f, ", {}:{}", tie.kind, tie.value)?;
        }
        f.write_str(")")
    }
}
