use serde::{Deserialize, Serialize};

/// Where and how a datasource's records are read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Postgres(SqlSourceConfig),
    Mysql(SqlSourceConfig),
    Mongodb(MongoSourceConfig),
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Postgres(_) => "postgres",
            SourceConfig::Mysql(_) => "mysql",
            SourceConfig::Mongodb(_) => "mongodb",
        }
    }

    pub fn connection_uri(&self) -> &str {
        match self {
            SourceConfig::Postgres(cfg) | SourceConfig::Mysql(cfg) => &cfg.connection_uri,
            SourceConfig::Mongodb(cfg) => &cfg.connection_uri,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SqlSourceConfig {
    pub connection_uri: String,
    /// Base query; paging and cursor clauses are wrapped around it.
    pub sql: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MongoSourceConfig {
    pub connection_uri: String,
    pub database: String,
    pub collection: String,
    /// Extended-JSON filter applied to every fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    /// Fields to fetch; empty fetches whole documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projection: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
}
