#![allow(dead_code)]

use engine_config::datasource::DatasourceConfig;
use engine_core::{
    collect::Collector,
    scan::ScanContext,
    state::SyncStateStore,
};
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod integration;
pub mod utils;

pub const CONNECTOR: &str = "conn-1";
pub const DATASOURCE: &str = "items";

/// A datasource reading `seq` with `id` as tie-breaker, `page_size` rows a
/// page. `overrides` is merged over the defaults.
pub fn incremental_datasource(page_size: usize, overrides: serde_json::Value) -> DatasourceConfig {
    let mut base = json!({
        "connector_id": CONNECTOR,
        "id": DATASOURCE,
        "name": "Items",
        "source": { "type": "postgres", "connection_uri": "memory://", "sql": "SELECT * FROM items" },
        "pagination": { "enabled": true, "page_size": page_size },
        "incremental": {
            "enabled": true,
            "property": "seq",
            "property_type": "int",
            "tie_breaker": "id"
        }
    });
    merge(&mut base, overrides);
    serde_json::from_value(base).expect("datasource config")
}

pub fn full_datasource(page_size: usize) -> DatasourceConfig {
    incremental_datasource(page_size, json!({ "incremental": { "enabled": false } }))
}

fn merge(base: &mut serde_json::Value, overrides: serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Row with an integer `seq`, a string `id` and a title.
pub fn item(seq: Option<i64>, id: &str) -> RowData {
    RowData::new(
        "query",
        vec![
            FieldValue::new("seq", seq.map(Value::Int).unwrap_or(Value::Null)).with_raw_type("int8"),
            FieldValue::new("id", Value::String(id.to_string())).with_raw_type("text"),
            FieldValue::new("title", Value::String(format!("Item {id}"))).with_raw_type("text"),
        ],
    )
}

pub fn context(
    store: Arc<dyn SyncStateStore>,
    collector: Arc<dyn Collector>,
    cancel: CancellationToken,
) -> ScanContext {
    ScanContext {
        store,
        collector,
        cancel,
    }
}
