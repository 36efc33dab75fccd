use crate::{
    error::SourceError,
    mongodb::MongoBackend,
    sql::backend::{MySqlBackend, PostgresBackend},
};
use engine_config::{datasource::DatasourceConfig, source::SourceConfig};
use engine_core::{
    error::ScanError,
    scan::{ScanContext, ScanOutcome, Scanner, SourceBackend, SourceSchema},
};
use tracing::info;

/// The backend a datasource's source config selects.
pub enum Adapter {
    Postgres(PostgresBackend),
    MySql(MySqlBackend),
    Mongo(MongoBackend),
}

impl Adapter {
    pub fn from_config(source: &SourceConfig) -> Result<Self, SourceError> {
        Ok(match source {
            SourceConfig::Postgres(cfg) => Adapter::Postgres(PostgresBackend::postgres(cfg.clone())),
            SourceConfig::Mysql(cfg) => Adapter::MySql(MySqlBackend::mysql(cfg.clone())),
            SourceConfig::Mongodb(cfg) => Adapter::Mongo(MongoBackend::new(cfg.clone())?),
        })
    }

    /// Runs one scan of `config` with the backend its source selects.
    pub async fn scan(self, config: DatasourceConfig, ctx: ScanContext) -> Result<ScanOutcome, ScanError> {
        match self {
            Adapter::Postgres(backend) => Scanner::new(backend, config, ctx)?.run().await,
            Adapter::MySql(backend) => Scanner::new(backend, config, ctx)?.run().await,
            Adapter::Mongo(backend) => Scanner::new(backend, config, ctx)?.run().await,
        }
    }

    /// Connects, describes the configured fetch and disconnects.
    pub async fn probe(self) -> Result<Option<SourceSchema>, SourceError> {
        match self {
            Adapter::Postgres(backend) => probe(backend).await,
            Adapter::MySql(backend) => probe(backend).await,
            Adapter::Mongo(backend) => probe(backend).await,
        }
    }
}

pub async fn scan_datasource(config: DatasourceConfig, ctx: ScanContext) -> Result<ScanOutcome, ScanError> {
    let adapter = Adapter::from_config(&config.source).map_err(ScanError::source)?;
    adapter.scan(config, ctx).await
}

async fn probe<B>(mut backend: B) -> Result<Option<SourceSchema>, SourceError>
where
    B: SourceBackend<Error = SourceError>,
{
    backend.connect().await?;
    let schema = backend.describe_schema().await;
    backend.disconnect().await?;
    if let Ok(Some(schema)) = &schema {
        info!(backend = backend.name(), fields = schema.fields.len(), "Source reachable");
    }
    schema
}
