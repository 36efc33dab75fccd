use chrono::DateTime;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mongodb::bson::{Bson, Document};

/// Flattens a document's top-level fields into a row. Each field keeps its
/// BSON type name so watermarks can be rebuilt in the same type.
pub fn document_to_row(document: Document, entity: &str) -> RowData {
    let fields = document
        .into_iter()
        .map(|(name, value)| {
            let (value, raw_type) = bson_to_value(value);
            FieldValue::new(name, value).with_raw_type(raw_type)
        })
        .collect();
    RowData::new(entity, fields)
}

fn bson_to_value(value: Bson) -> (Value, &'static str) {
    match value {
        Bson::ObjectId(oid) => (Value::String(oid.to_hex()), "ObjectId"),
        Bson::DateTime(dt) => (
            DateTime::from_timestamp_millis(dt.timestamp_millis())
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            "DateTime",
        ),
        Bson::Int32(v) => (Value::Int(v.into()), "Int32"),
        Bson::Int64(v) => (Value::Int(v), "Int64"),
        Bson::Double(v) => (Value::Float(v), "Double"),
        Bson::String(v) => (Value::String(v), "String"),
        Bson::Boolean(v) => (Value::Boolean(v), "Boolean"),
        Bson::Null | Bson::Undefined => (Value::Null, "Null"),
        Bson::Timestamp(ts) => (
            DateTime::from_timestamp(ts.time.into(), 0)
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            "Timestamp",
        ),
        Bson::Binary(bin) => (Value::Bytes(bin.bytes), "Binary"),
        Bson::Decimal128(d) => {
            let json = Bson::Decimal128(d).into_relaxed_extjson();
            let text = json
                .get("$numberDecimal")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| json.to_string());
            (Value::String(text), "Decimal128")
        }
        Bson::Array(items) if items.iter().all(|i| matches!(i, Bson::String(_))) => {
            let strings = items
                .into_iter()
                .filter_map(|i| match i {
                    Bson::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            (Value::StringArray(strings), "Array")
        }
        Bson::Array(items) => (Value::Json(Bson::Array(items).into_relaxed_extjson()), "Array"),
        other => (Value::Json(other.into_relaxed_extjson()), "Document"),
    }
}
