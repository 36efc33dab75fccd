use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::{Row, types::Type};
use tracing::debug;
use uuid::Uuid;

pub fn to_row_data(row: &Row, entity: &str) -> Result<RowData, tokio_postgres::Error> {
    let mut fields = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let value = column_value(row, idx, column.type_())?;
        fields.push(
            FieldValue::new(column.name(), value).with_raw_type(column.type_().name()),
        );
    }
    Ok(RowData::new(entity, fields))
}

fn column_value(row: &Row, idx: usize, ty: &Type) -> Result<Value, tokio_postgres::Error> {
    let value = match ty.name() {
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)?
            .map(|v| Value::Int(v.into())),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)?
            .map(|v| Value::Int(v.into())),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        "oid" => row
            .try_get::<_, Option<u32>>(idx)?
            .map(|v| Value::Uint(v.into())),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(v.into())),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        "numeric" => row
            .try_get::<_, Option<Decimal>>(idx)?
            .map(|d| match BigDecimal::from_str(&d.to_string()) {
                Ok(v) => Value::Decimal(v),
                Err(_) => Value::String(d.to_string()),
            }),
        "text" | "varchar" | "bpchar" | "name" | "citext" => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::String)
        }
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(Value::Timestamp),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|v| Value::Timestamp(v.and_utc())),
        "date" => row.try_get::<_, Option<NaiveDate>>(idx)?.map(Value::Date),
        "uuid" => row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid),
        "json" | "jsonb" => row
            .try_get::<_, Option<serde_json::Value>>(idx)?
            .map(Value::Json),
        "bytea" => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        "_text" | "_varchar" => row
            .try_get::<_, Option<Vec<String>>>(idx)?
            .map(Value::StringArray),
        other => {
            debug!(column = idx, pg_type = other, "Unsupported column type, reading as null");
            None
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
