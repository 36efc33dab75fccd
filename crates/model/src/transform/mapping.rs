use serde::{Deserialize, Serialize};

/// Names the source columns that feed each document field. Every binding
/// is optional; an empty name leaves the field at its zero value.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Mapping {
    pub id: String,
    pub hashed: bool,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub content: String,
    pub icon: String,
    pub category: String,
    pub subcategory: String,
    pub created: String,
    pub updated: String,
    pub cover: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub lang: String,
    pub thumbnail: String,
    pub tags: String,
    pub size: String,
    pub owner: UserMapping,
    pub metadata: Vec<KvMapping>,
    pub payload: Vec<KvMapping>,
    pub last_updated_by: EditorMapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UserMapping {
    pub avatar: String,
    pub username: String,
    pub userid: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EditorMapping {
    pub user: UserMapping,
    pub timestamp: String,
}

/// A document key and the column it is read from. Without an explicit
/// `value` the column shares the key's name.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct KvMapping {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl KvMapping {
    pub fn column(&self) -> &str {
        match self.value.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => &self.name,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FieldMappingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mapping: Option<Mapping>,
}

impl FieldMappingConfig {
    /// The active mapping, if mapping is switched on.
    pub fn active(&self) -> Option<&Mapping> {
        if self.enabled {
            self.mapping.as_ref()
        } else {
            None
        }
    }

    /// Column holding the record's primary key, when one is mapped.
    pub fn primary_key(&self) -> Option<&str> {
        self.active()
            .map(|m| m.id.as_str())
            .filter(|id| !id.is_empty())
    }
}
