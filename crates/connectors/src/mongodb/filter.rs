use crate::error::SourceError;
use engine_core::scan::CursorRange;
use model::pagination::cursor::{CursorValue, StoredCursorValue};
use mongodb::bson::{Bson, DateTime as BsonDateTime, Document, doc, oid::ObjectId};

/// Parses the configured extended-JSON filter.
pub fn base_filter(filter: Option<&serde_json::Value>) -> Result<Document, SourceError> {
    let Some(filter) = filter else {
        return Ok(Document::new());
    };
    match Bson::try_from(filter.clone()) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(SourceError::InvalidFilter(format!(
            "expected an object, got {:?}",
            other.element_type()
        ))),
        Err(err) => Err(SourceError::InvalidFilter(err.to_string())),
    }
}

/// Restricts `base` to documents after the range's watermark:
/// `property > v OR (property = v AND tie > t)`.
pub fn cursor_filter(base: &Document, range: &CursorRange<'_>) -> Document {
    let Some(after) = range.after else {
        return base.clone();
    };
    let (property, tie) = (range.property, range.tie_breaker);
    let (stored, native) = after.property_param();
    let value = to_bson(stored, native);

    let predicate = match after.tie_param() {
        Some((tie_stored, tie_native)) => doc! {
            "$or": [
                { property: { "$gt": value.clone() } },
                { property: value, tie: { "$gt": to_bson(tie_stored, tie_native) } },
            ]
        },
        None => doc! { property: { "$gt": value } },
    };

    if base.is_empty() {
        predicate
    } else {
        doc! { "$and": [base.clone(), predicate] }
    }
}

pub fn cursor_sort(range: &CursorRange<'_>) -> Document {
    let (property, tie) = (range.property, range.tie_breaker);
    doc! { property: 1, tie: 1 }
}

/// Rebuilds the BSON value a watermark was read from, so the server
/// compares it in the field's own type.
pub(crate) fn to_bson(stored: &StoredCursorValue, native: &CursorValue) -> Bson {
    match (stored.raw_type.as_deref(), native) {
        (Some("ObjectId"), _) => {
            if let Ok(oid) = ObjectId::parse_str(&stored.value) {
                return Bson::ObjectId(oid);
            }
        }
        (Some("Int32"), CursorValue::Int(v)) => {
            if let Ok(v) = i32::try_from(*v) {
                return Bson::Int32(v);
            }
        }
        _ => {}
    }
    match native {
        CursorValue::Int(v) => Bson::Int64(*v),
        CursorValue::Float(v) => Bson::Double(*v),
        CursorValue::Datetime(v) => Bson::DateTime(BsonDateTime::from_millis(v.timestamp_millis())),
        CursorValue::Bool(v) => Bson::Boolean(*v),
        CursorValue::String(v) => Bson::String(v.clone()),
    }
}
