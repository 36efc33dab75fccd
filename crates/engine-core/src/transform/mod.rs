use crate::{cursor::codec::parse_time, error::TransformError};
use chrono::{DateTime, NaiveTime, Utc};
use model::{
    core::value::Value,
    records::{
        document::{DataSourceRef, Document, EditorInfo, UserInfo},
        row::RowData,
    },
    transform::mapping::{FieldMappingConfig, Mapping, UserMapping},
};
use std::collections::HashSet;
use tracing::warn;

/// Turns source rows into documents for one datasource.
#[derive(Debug, Clone)]
pub struct Transformer {
    source: DataSourceRef,
    field_mapping: FieldMappingConfig,
}

impl Transformer {
    pub fn new(source: DataSourceRef, field_mapping: FieldMappingConfig) -> Self {
        Self {
            source,
            field_mapping,
        }
    }

    /// Builds the document for `row`. Columns no binding consumed are
    /// copied into the payload unchanged.
    pub fn transform(&self, row: &RowData) -> Result<Document, TransformError> {
        let mut doc = Document::new(self.source.clone());
        let mut reader = RowReader::new(row);

        if let Some(mapping) = self.field_mapping.active() {
            self.apply(&mut doc, &mut reader, mapping)?;
        }

        for field in &row.field_values {
            if !reader.visited(&field.name) {
                doc.payload
                    .entry(field.name.clone())
                    .or_insert_with(|| field.value.to_json());
            }
        }

        Ok(doc)
    }

    fn apply(
        &self,
        doc: &mut Document,
        reader: &mut RowReader<'_>,
        m: &Mapping,
    ) -> Result<(), TransformError> {
        let id = reader.string(&m.id);
        if !m.id.is_empty() && id.is_empty() {
            return Err(TransformError::MissingId(m.id.clone()));
        }
        if !id.is_empty() {
            doc.id = scoped_id(&self.source.id, &id, m.hashed);
        }

        doc.title = reader.string(&m.title);
        doc.url = reader.string(&m.url);
        doc.summary = reader.string(&m.summary);
        doc.content = reader.string(&m.content);
        doc.icon = reader.string(&m.icon);
        doc.category = reader.string(&m.category);
        doc.subcategory = reader.string(&m.subcategory);
        doc.created = reader.time(&m.created);
        doc.updated = reader.time(&m.updated);
        doc.cover = reader.string(&m.cover);
        doc.doc_type = reader.string(&m.doc_type);
        doc.lang = reader.string(&m.lang);
        doc.thumbnail = reader.string(&m.thumbnail);
        doc.tags = reader.tags(&m.tags);
        doc.size = reader.int(&m.size);
        doc.owner = reader.user(&m.owner);

        for kv in &m.metadata {
            if kv.name.is_empty() {
                continue;
            }
            if let Some(value) = reader.raw(kv.column()) {
                doc.metadata.insert(kv.name.clone(), value);
            }
        }
        for kv in &m.payload {
            if kv.name.is_empty() {
                continue;
            }
            if let Some(value) = reader.raw(kv.column()) {
                doc.payload.insert(kv.name.clone(), value);
            }
        }

        let editor = EditorInfo {
            user: reader.user(&m.last_updated_by.user),
            timestamp: reader.time(&m.last_updated_by.timestamp),
        };
        if editor.user.is_some() || editor.timestamp.is_some() {
            doc.last_updated_by = Some(editor);
        }

        Ok(())
    }
}

/// `<datasource>-<id>`, optionally MD5-hashed into a fixed-width key.
pub fn scoped_id(datasource_id: &str, id: &str, hashed: bool) -> String {
    let scoped = format!("{datasource_id}-{id}");
    if hashed {
        format!("{:x}", md5::compute(scoped.as_bytes()))
    } else {
        scoped
    }
}

/// Reads columns by name and remembers which ones were consumed.
struct RowReader<'a> {
    row: &'a RowData,
    visited: HashSet<&'a str>,
}

impl<'a> RowReader<'a> {
    fn new(row: &'a RowData) -> Self {
        Self {
            row,
            visited: HashSet::new(),
        }
    }

    fn visited(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    fn lookup(&self, column: &str) -> Option<(&'a str, &'a Value)> {
        if column.is_empty() {
            return None;
        }
        self.row
            .get(column)
            .filter(|f| !f.value.is_null())
            .map(|f| (f.name.as_str(), &f.value))
    }

    fn mark(&mut self, name: &'a str) {
        self.visited.insert(name);
    }

    fn string(&mut self, column: &str) -> String {
        let Some((name, value)) = self.lookup(column) else {
            return String::new();
        };
        self.mark(name);
        value.as_string().unwrap_or_default()
    }

    fn int(&mut self, column: &str) -> i64 {
        let Some((name, value)) = self.lookup(column) else {
            return 0;
        };
        match value.as_i64() {
            Some(v) => {
                self.mark(name);
                v
            }
            None => {
                warn!(column = %name, value = %value, "Cannot read value as an integer");
                0
            }
        }
    }

    fn time(&mut self, column: &str) -> Option<DateTime<Utc>> {
        let (name, value) = self.lookup(column)?;
        let parsed = match value {
            Value::Timestamp(ts) => Some(*ts),
            Value::Date(date) => Some(date.and_time(NaiveTime::MIN).and_utc()),
            Value::Int(millis) => DateTime::from_timestamp_millis(*millis),
            other => other.as_string().as_deref().and_then(parse_time),
        };
        match parsed {
            Some(ts) => {
                self.mark(name);
                Some(ts)
            }
            None => {
                warn!(column = %name, value = %value, "Cannot read value as a timestamp");
                None
            }
        }
    }

    fn tags(&mut self, column: &str) -> Vec<String> {
        let Some((name, value)) = self.lookup(column) else {
            return Vec::new();
        };
        self.mark(name);
        match value {
            Value::StringArray(items) => items.clone(),
            Value::Json(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            other => other
                .as_string()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn raw(&mut self, column: &str) -> Option<serde_json::Value> {
        let (name, value) = self.lookup(column)?;
        self.mark(name);
        Some(value.to_json())
    }

    fn user(&mut self, m: &UserMapping) -> Option<UserInfo> {
        let user = UserInfo {
            avatar: self.string(&m.avatar),
            username: self.string(&m.username),
            userid: self.string(&m.userid),
        };
        (!user.is_empty()).then_some(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use model::{core::value::FieldValue, transform::mapping::KvMapping};
    use serde_json::json;

    fn source() -> DataSourceRef {
        DataSourceRef::connector("ds-1", "Blog")
    }

    fn enabled(mapping: Mapping) -> FieldMappingConfig {
        FieldMappingConfig {
            enabled: true,
            mapping: Some(mapping),
        }
    }

    fn row(fields: Vec<(&str, Value)>) -> RowData {
        RowData::new(
            "posts",
            fields
                .into_iter()
                .map(|(name, value)| FieldValue::new(name, value))
                .collect(),
        )
    }

    #[test]
    fn unmapped_columns_pass_through() {
        let transformer = Transformer::new(
            source(),
            enabled(Mapping {
                title: "title".into(),
                ..Default::default()
            }),
        );
        let doc = transformer
            .transform(&row(vec![
                ("title", Value::String("t".into())),
                ("extra", Value::String("x".into())),
            ]))
            .unwrap();

        assert_eq!(doc.title, "t");
        assert_eq!(doc.payload.get("extra"), Some(&json!("x")));
        assert!(!doc.payload.contains_key("title"));
    }

    #[test]
    fn disabled_mapping_keeps_whole_row_in_payload() {
        let transformer = Transformer::new(source(), FieldMappingConfig::default());
        let doc = transformer
            .transform(&row(vec![("id", Value::Int(5)), ("body", Value::String("b".into()))]))
            .unwrap();

        assert!(doc.id.is_empty());
        assert_eq!(doc.source, source());
        assert_eq!(doc.payload.get("id"), Some(&json!(5)));
        assert_eq!(doc.payload.get("body"), Some(&json!("b")));
    }

    #[test]
    fn ids_are_scoped_and_optionally_hashed() {
        let input = row(vec![("pk", Value::Int(42))]);
        let mapping = Mapping {
            id: "pk".into(),
            ..Default::default()
        };

        let plain = Transformer::new(source(), enabled(mapping.clone()))
            .transform(&input)
            .unwrap();
        assert_eq!(plain.id, "ds-1-42");

        let hashed = Transformer::new(
            source(),
            enabled(Mapping {
                hashed: true,
                ..mapping
            }),
        )
        .transform(&input)
        .unwrap();
        assert_eq!(hashed.id, format!("{:x}", md5::compute("ds-1-42")));
        assert_eq!(hashed.id.len(), 32);
    }

    #[test]
    fn empty_mapped_id_fails_the_row() {
        let transformer = Transformer::new(
            source(),
            enabled(Mapping {
                id: "pk".into(),
                ..Default::default()
            }),
        );
        let err = transformer
            .transform(&row(vec![("pk", Value::Null), ("title", Value::String("t".into()))]))
            .unwrap_err();
        assert_eq!(err, TransformError::MissingId("pk".into()));
    }

    #[test]
    fn mistyped_fields_fall_back_to_zero_values() {
        let transformer = Transformer::new(
            source(),
            enabled(Mapping {
                size: "size".into(),
                created: "created".into(),
                ..Default::default()
            }),
        );
        let doc = transformer
            .transform(&row(vec![
                ("size", Value::String("large".into())),
                ("created", Value::String("not a date".into())),
            ]))
            .unwrap();

        assert_eq!(doc.size, 0);
        assert_eq!(doc.created, None);
        // Values that could not be read are kept rather than dropped.
        assert_eq!(doc.payload.get("size"), Some(&json!("large")));
        assert_eq!(doc.payload.get("created"), Some(&json!("not a date")));
    }

    #[test]
    fn maps_the_full_binding_set() {
        let mapping = Mapping {
            id: "id".into(),
            title: "title".into(),
            content: "body".into(),
            tags: "labels".into(),
            size: "bytes".into(),
            created: "created_at".into(),
            updated: "updated_at".into(),
            doc_type: "kind".into(),
            owner: UserMapping {
                username: "author".into(),
                ..Default::default()
            },
            metadata: vec![KvMapping {
                name: "views".into(),
                value: Some("view_count".into()),
            }],
            payload: vec![KvMapping {
                name: "slug".into(),
                value: None,
            }],
            last_updated_by: model::transform::mapping::EditorMapping {
                user: UserMapping {
                    userid: "editor_id".into(),
                    ..Default::default()
                },
                timestamp: "edited_at".into(),
            },
            ..Default::default()
        };
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let doc = Transformer::new(source(), enabled(mapping))
            .transform(&row(vec![
                ("id", Value::String("p-1".into())),
                ("title", Value::String("Hello".into())),
                ("body", Value::Bytes(b"text".to_vec())),
                ("labels", Value::String("rust, sync,,".into())),
                ("bytes", Value::Float(1024.9)),
                ("created_at", Value::Timestamp(created)),
                ("updated_at", Value::String("2024-01-02 10:00:00".into())),
                ("kind", Value::String("post".into())),
                ("author", Value::String("ann".into())),
                ("view_count", Value::Int(7)),
                ("slug", Value::String("hello".into())),
                ("editor_id", Value::Int(9)),
                ("edited_at", Value::Int(1_704_067_200_000)),
            ]))
            .unwrap();

        assert_eq!(doc.id, "ds-1-p-1");
        assert_eq!(doc.title, "Hello");
        assert_eq!(doc.content, "text");
        assert_eq!(doc.tags, vec!["rust", "sync"]);
        assert_eq!(doc.size, 1024);
        assert_eq!(doc.created, Some(created));
        assert_eq!(
            doc.updated,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
        );
        assert_eq!(doc.doc_type, "post");
        assert_eq!(doc.owner.as_ref().map(|o| o.username.as_str()), Some("ann"));
        assert_eq!(doc.metadata.get("views"), Some(&json!(7)));
        assert_eq!(doc.payload.get("slug"), Some(&json!("hello")));
        let editor = doc.last_updated_by.unwrap();
        assert_eq!(editor.user.unwrap().userid, "9");
        assert_eq!(editor.timestamp, Some(created));
        assert!(doc.payload.keys().all(|k| k == "slug"));
    }

    #[test]
    fn no_owner_when_owner_columns_are_empty() {
        let doc = Transformer::new(
            source(),
            enabled(Mapping {
                owner: UserMapping {
                    username: "author".into(),
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
        .transform(&row(vec![("author", Value::Null)]))
        .unwrap();
        assert!(doc.owner.is_none());
        assert!(doc.last_updated_by.is_none());
    }
}
