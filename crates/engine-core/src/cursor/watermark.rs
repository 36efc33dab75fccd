use super::codec;
use crate::error::CursorError;
use model::{
    core::value::{FieldValue, Value},
    pagination::cursor::{CursorKind, CursorValue, StoredCursor, StoredCursorValue},
    records::row::RowData,
};

/// A position in a source's ordering, held both in its durable form and
/// as native values for comparison. Only [`CursorSerializer`] builds one,
/// so both halves always describe the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorWatermark {
    stored: StoredCursor,
    property: CursorValue,
    tie: Option<CursorValue>,
}

impl CursorWatermark {
    pub fn stored(&self) -> &StoredCursor {
        &self.stored
    }

    pub fn property(&self) -> &CursorValue {
        &self.property
    }

    pub fn tie(&self) -> Option<&CursorValue> {
        self.tie.as_ref()
    }

    /// The property half paired with its stored form.
    pub fn property_param(&self) -> (&StoredCursorValue, &CursorValue) {
        (&self.stored.property, &self.property)
    }

    pub fn tie_param(&self) -> Option<(&StoredCursorValue, &CursorValue)> {
        self.stored.tie.as_ref().zip(self.tie.as_ref())
    }
}

/// Builds watermarks for one configured property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSerializer {
    property_kind: CursorKind,
}

impl CursorSerializer {
    pub fn new(property_kind: CursorKind) -> Self {
        Self { property_kind }
    }

    pub fn property_kind(&self) -> CursorKind {
        self.property_kind
    }

    pub fn from_values(
        &self,
        property: &Value,
        tie: Option<&Value>,
    ) -> Result<CursorWatermark, CursorError> {
        let (stored_property, property) = codec::normalize(property, Some(self.property_kind))?;
        let (stored_tie, tie) = match tie {
            Some(raw) => {
                let (stored, native) = codec::normalize(raw, None)?;
                (Some(stored), Some(native))
            }
            None => (None, None),
        };
        Ok(CursorWatermark {
            stored: StoredCursor {
                property: stored_property,
                tie: stored_tie,
            },
            property,
            tie,
        })
    }

    /// Like [`Self::from_values`], keeping each column's source type as the
    /// stored `raw_type`.
    pub fn from_fields(
        &self,
        property: &FieldValue,
        tie: Option<&FieldValue>,
    ) -> Result<CursorWatermark, CursorError> {
        let mut watermark = self.from_values(&property.value, tie.map(|t| &t.value))?;
        watermark.stored.property.raw_type = property.raw_type.clone();
        if let (Some(stored), Some(field)) = (watermark.stored.tie.as_mut(), tie) {
            stored.raw_type = field.raw_type.clone();
        }
        Ok(watermark)
    }

    /// Reads the watermark a row would move the cursor to.
    pub fn from_row(
        &self,
        row: &RowData,
        property: &str,
        tie_breaker: Option<&str>,
    ) -> Result<CursorWatermark, CursorError> {
        let property_field = present(row, property)?;
        let tie_field = match tie_breaker {
            Some(name) => Some(present(row, name)?),
            None => None,
        };
        self.from_fields(property_field, tie_field)
    }

    /// Restores a persisted watermark. Typed values decode by their stored
    /// tag so they compare exactly as they did when saved; only untyped text
    /// is read as the configured property type.
    pub fn from_stored(&self, stored: StoredCursor) -> Result<CursorWatermark, CursorError> {
        let kind = match stored.property.kind {
            CursorKind::String => self.property_kind,
            typed => typed,
        };
        let property = codec::decode(&stored.property, Some(kind))?;
        let tie = match &stored.tie {
            Some(tie) => Some(codec::decode(tie, None)?),
            None => None,
        };
        Ok(CursorWatermark {
            stored,
            property,
            tie,
        })
    }

    /// Parses an operator-supplied starting point. It has no tie, so the
    /// first fetch starts strictly after the resume value.
    pub fn from_resume(&self, raw: &str) -> Result<Option<CursorWatermark>, CursorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        self.from_values(&Value::String(trimmed.to_string()), None)
            .map(Some)
    }
}

fn present<'a>(row: &'a RowData, name: &str) -> Result<&'a FieldValue, CursorError> {
    match row.get(name) {
        Some(field) if !field.value.is_null() => Ok(field),
        _ => Err(CursorError::MissingField(name.to_string())),
    }
}
