use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mysql_async::{Column, Row, Value as MySqlValue, consts::ColumnType};
use std::str::FromStr;

/// Character set id MySQL reports for binary columns.
const BINARY_CHARSET: u16 = 63;

pub fn to_row_data(row: &Row, entity: &str) -> RowData {
    let fields = row
        .columns_ref()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value = row
                .as_ref(idx)
                .map(|v| convert(v, column))
                .unwrap_or(Value::Null);
            FieldValue::new(column.name_str(), value)
                .with_raw_type(type_name(column.column_type()))
        })
        .collect();
    RowData::new(entity, fields)
}

fn convert(value: &MySqlValue, column: &Column) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Int(*i),
        MySqlValue::UInt(u) => Value::Uint(*u),
        MySqlValue::Float(f) => Value::Float((*f).into()),
        MySqlValue::Double(d) => Value::Float(*d),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let Some(date) = NaiveDate::from_ymd_opt((*year).into(), (*month).into(), (*day).into())
            else {
                // zero dates
                return Value::Null;
            };
            if column.column_type() == ColumnType::MYSQL_TYPE_DATE {
                return Value::Date(date);
            }
            date.and_hms_micro_opt((*hour).into(), (*minute).into(), (*second).into(), *micros)
                .map(|dt| Value::Timestamp(dt.and_utc()))
                .unwrap_or(Value::Null)
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            Value::String(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}"))
        }
        MySqlValue::Bytes(bytes) => match column.column_type() {
            ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                let text = String::from_utf8_lossy(bytes);
                BigDecimal::from_str(&text)
                    .map(Value::Decimal)
                    .unwrap_or_else(|_| Value::String(text.into_owned()))
            }
            ColumnType::MYSQL_TYPE_JSON => serde_json::from_slice(bytes)
                .map(Value::Json)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
            _ if column.character_set() == BINARY_CHARSET => Value::Bytes(bytes.clone()),
            _ => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

fn type_name(column_type: ColumnType) -> String {
    format!("{column_type:?}")
        .trim_start_matches("MYSQL_TYPE_")
        .to_ascii_lowercase()
}
