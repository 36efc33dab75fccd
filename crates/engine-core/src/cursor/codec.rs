use crate::error::CursorError;
use bigdecimal::ToPrimitive;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use model::{
    core::value::Value,
    pagination::cursor::{CursorKind, CursorValue, StoredCursorValue},
};

/// Normalizes a raw source value into its stored and native forms.
///
/// Values that already carry a type (integers, floats, timestamps,
/// booleans) keep their kind, except that numbers hinted as `Datetime` are
/// read as epoch timestamps: integers as milliseconds, floats as seconds
/// with a fraction. Text is interpreted through the hint; without one it
/// stays a string.
pub fn normalize(
    raw: &Value,
    hint: Option<CursorKind>,
) -> Result<(StoredCursorValue, CursorValue), CursorError> {
    let native = native_value(raw, hint)?;
    Ok((store(&native), native))
}

/// Turns a stored value back into its native form, reading it as
/// `kind_override` when given instead of the stored type tag.
pub fn decode(
    stored: &StoredCursorValue,
    kind_override: Option<CursorKind>,
) -> Result<CursorValue, CursorError> {
    let kind = kind_override.unwrap_or(stored.kind);
    let value = stored.value.as_str();
    match kind {
        CursorKind::Int => value
            .parse::<i64>()
            .map(CursorValue::Int)
            .map_err(|_| unparsable(value, kind)),
        CursorKind::Float => value
            .parse::<f64>()
            .map_err(|_| unparsable(value, kind))
            .and_then(finite)
            .map(CursorValue::Float),
        CursorKind::Datetime => DateTime::parse_from_rfc3339(value)
            .map(|dt| CursorValue::Datetime(dt.with_timezone(&Utc)))
            .map_err(|_| unparsable(value, kind)),
        CursorKind::Bool => parse_bool(value)
            .map(CursorValue::Bool)
            .ok_or_else(|| unparsable(value, kind)),
        CursorKind::String => Ok(CursorValue::String(value.to_string())),
    }
}

/// Stored form of a native value.
pub fn store(native: &CursorValue) -> StoredCursorValue {
    StoredCursorValue {
        kind: native.kind(),
        value: native.to_string(),
        raw_type: None,
    }
}

/// Parses a human-written timestamp. Layouts are tried in order and the
/// first match wins; values without an offset are taken as UTC.
pub fn parse_time(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // `2006-01-02 15:04:05.999 -0700 MST`, the trailing zone name is informational.
    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() == 4 {
        let with_offset = tokens[..3].join(" ");
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, "%Y-%m-%d %H:%M:%S%.f %z") {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f %z") {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(midnight_utc)
}

fn native_value(raw: &Value, hint: Option<CursorKind>) -> Result<CursorValue, CursorError> {
    match raw {
        Value::Null => Err(CursorError::Null),
        Value::Timestamp(ts) => Ok(CursorValue::Datetime(*ts)),
        Value::Date(date) => Ok(CursorValue::Datetime(midnight_utc(*date))),
        Value::Boolean(b) => Ok(CursorValue::Bool(*b)),
        Value::Int(i) => from_int(*i, hint),
        Value::Uint(u) => i64::try_from(*u)
            .map_err(|_| CursorError::OutOfRange(u.to_string()))
            .and_then(|i| from_int(i, hint)),
        Value::Float(f) => from_float(*f, hint),
        Value::Decimal(d) => d
            .to_f64()
            .ok_or_else(|| CursorError::OutOfRange(d.to_string()))
            .and_then(|f| from_float(f, hint)),
        Value::Json(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => from_int(i, hint),
            None => n
                .as_f64()
                .ok_or_else(|| CursorError::OutOfRange(n.to_string()))
                .and_then(|f| from_float(f, hint)),
        },
        Value::Json(serde_json::Value::Bool(b)) => Ok(CursorValue::Bool(*b)),
        Value::Json(serde_json::Value::Null) => Err(CursorError::Null),
        other => {
            let text = other.as_string().ok_or(CursorError::Null)?;
            from_text(text, hint)
        }
    }
}

fn from_int(i: i64, hint: Option<CursorKind>) -> Result<CursorValue, CursorError> {
    if hint == Some(CursorKind::Datetime) {
        return DateTime::from_timestamp_millis(i)
            .map(CursorValue::Datetime)
            .ok_or_else(|| CursorError::OutOfRange(i.to_string()));
    }
    Ok(CursorValue::Int(i))
}

fn from_float(f: f64, hint: Option<CursorKind>) -> Result<CursorValue, CursorError> {
    let f = finite(f)?;
    if hint == Some(CursorKind::Datetime) {
        let secs = f.trunc();
        let nanos = ((f - secs) * 1e9).round() as i64;
        return DateTime::from_timestamp(secs as i64, 0)
            .and_then(|dt| dt.checked_add_signed(chrono::Duration::nanoseconds(nanos)))
            .map(CursorValue::Datetime)
            .ok_or(CursorError::OutOfRange(f.to_string()));
    }
    Ok(CursorValue::Float(f))
}

fn from_text(text: String, hint: Option<CursorKind>) -> Result<CursorValue, CursorError> {
    let trimmed = text.trim();
    match hint {
        Some(CursorKind::Int) => trimmed
            .parse::<i64>()
            .map(CursorValue::Int)
            .map_err(|_| unparsable(trimmed, CursorKind::Int)),
        Some(CursorKind::Float) => trimmed
            .parse::<f64>()
            .map_err(|_| unparsable(trimmed, CursorKind::Float))
            .and_then(finite)
            .map(CursorValue::Float),
        Some(CursorKind::Datetime) => {
            if let Ok(millis) = trimmed.parse::<i64>() {
                return from_int(millis, hint);
            }
            parse_time(trimmed)
                .map(CursorValue::Datetime)
                .ok_or_else(|| unparsable(trimmed, CursorKind::Datetime))
        }
        Some(CursorKind::Bool) => parse_bool(trimmed)
            .map(CursorValue::Bool)
            .ok_or_else(|| unparsable(trimmed, CursorKind::Bool)),
        Some(CursorKind::String) | None => Ok(CursorValue::String(text)),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "TRUE" | "True" | "t" | "T" | "1" => Some(true),
        "false" | "FALSE" | "False" | "f" | "F" | "0" => Some(false),
        _ => None,
    }
}

fn finite(f: f64) -> Result<f64, CursorError> {
    if f.is_finite() {
        Ok(f)
    } else {
        Err(CursorError::NonFinite(f))
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn unparsable(value: &str, kind: CursorKind) -> CursorError {
    CursorError::Unparsable {
        value: value.to_string(),
        kind: kind.as_str(),
    }
}
