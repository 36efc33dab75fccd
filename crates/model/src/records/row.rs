use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// One record fetched from a source: the entity it came from (table,
/// collection, query label) and its columns in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    /// Case-insensitive column lookup, matching how SQL identifiers resolve.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name == field)
            .or_else(|| {
                self.field_values
                    .iter()
                    .find(|f| f.name.eq_ignore_ascii_case(field))
            })
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        let idx = self
            .field_values
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(field))?;
        Some(self.field_values.remove(idx))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_values.iter().map(|f| f.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.field_values.is_empty()
    }
}
