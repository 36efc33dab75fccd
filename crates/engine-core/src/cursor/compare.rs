use super::watermark::CursorWatermark;
use model::pagination::cursor::{CursorKind, CursorValue};
use std::cmp::Ordering;

/// Orders two watermarks. An absent watermark sorts before any present one.
///
/// Properties are compared with the semantics of `property_kind` (falling
/// back to the kind stored in `a`); equal properties are ordered by their
/// tie-breakers.
pub fn compare(
    a: Option<&CursorWatermark>,
    b: Option<&CursorWatermark>,
    property_kind: Option<CursorKind>,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let kind = property_kind.unwrap_or(a.stored().property.kind);
            compare_values(a.property(), b.property(), kind)
                .then_with(|| compare_ties(a.tie(), b.tie()))
        }
    }
}

/// Compares two property values as `kind`, coercing mismatched natives.
pub fn compare_values(a: &CursorValue, b: &CursorValue, kind: CursorKind) -> Ordering {
    match kind {
        CursorKind::Int => match (as_i64(a), as_i64(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => compare_dynamic(a, b),
        },
        CursorKind::Float => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => compare_dynamic(a, b),
        },
        CursorKind::Bool => match (a, b) {
            (CursorValue::Bool(x), CursorValue::Bool(y)) => x.cmp(y),
            _ => compare_dynamic(a, b),
        },
        CursorKind::Datetime | CursorKind::String => compare_dynamic(a, b),
    }
}

/// Tie-breakers compare by their own type; mixed types compare numerically
/// when both are numbers and by canonical text otherwise.
pub fn compare_ties(a: Option<&CursorValue>, b: Option<&CursorValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_dynamic(a, b),
    }
}

fn compare_dynamic(a: &CursorValue, b: &CursorValue) -> Ordering {
    use CursorValue::*;
    match (a, b) {
        (String(x), String(y)) => x.cmp(y),
        (Int(x), Int(y)) => x.cmp(y),
        (Float(x), Float(y)) => x.total_cmp(y),
        (Int(x), Float(y)) => (*x as f64).total_cmp(y),
        (Float(x), Int(y)) => x.total_cmp(&(*y as f64)),
        (Datetime(x), Datetime(y)) => x.cmp(y),
        (Bool(x), Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn as_i64(v: &CursorValue) -> Option<i64> {
    match v {
        CursorValue::Int(i) => Some(*i),
        CursorValue::Float(f) => Some(f.trunc() as i64),
        CursorValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(v: &CursorValue) -> Option<f64> {
    match v {
        CursorValue::Int(i) => Some(*i as f64),
        CursorValue::Float(f) => Some(*f),
        CursorValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
