use crate::sql::dialect::CursorParam;
use chrono::{Datelike, Timelike};
use model::pagination::cursor::CursorValue;
use mysql_async::Value as MySqlValue;
use mysql_common::params::Params;

pub struct MySqlParam(MySqlValue);

impl MySqlParam {
    pub fn from_cursor(value: &CursorValue) -> Self {
        match value {
            CursorValue::Int(i) => MySqlParam(MySqlValue::Int(*i)),
            CursorValue::Float(f) => MySqlParam(MySqlValue::Double(*f)),
            CursorValue::Bool(b) => MySqlParam(MySqlValue::Int(i64::from(*b))),
            CursorValue::String(s) => MySqlParam(MySqlValue::Bytes(s.clone().into_bytes())),
            CursorValue::Datetime(ts) => {
                let naive = ts.naive_utc();
                MySqlParam(MySqlValue::Date(
                    naive.year() as u16,
                    naive.month() as u8,
                    naive.day() as u8,
                    naive.hour() as u8,
                    naive.minute() as u8,
                    naive.second() as u8,
                    ts.timestamp_subsec_micros(),
                ))
            }
        }
    }
}

pub struct MySqlParamStore {
    params: Vec<MySqlParam>,
}

impl MySqlParamStore {
    pub fn from_params(params: &[CursorParam]) -> Self {
        Self {
            params: params
                .iter()
                .map(|p| MySqlParam::from_cursor(&p.native))
                .collect(),
        }
    }

    pub fn params(&self) -> Params {
        if self.params.is_empty() {
            return Params::Empty;
        }
        Params::Positional(self.params.iter().map(|p| p.0.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn datetimes_bind_as_utc_parts() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap()
            + chrono::Duration::microseconds(1500);
        let MySqlParam(value) = MySqlParam::from_cursor(&CursorValue::Datetime(ts));
        assert_eq!(value, MySqlValue::Date(2024, 2, 29, 23, 59, 58, 1500));
    }

    #[test]
    fn empty_store_binds_nothing() {
        assert_eq!(MySqlParamStore::from_params(&[]).params(), Params::Empty);
    }
}
