use thiserror::Error;

/// Failures talking to a source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Source is not connected")]
    NotConnected,
}
