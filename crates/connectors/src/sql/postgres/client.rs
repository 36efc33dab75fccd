use super::{params::PgParamStore, row::to_row_data};
use crate::{
    error::SourceError,
    sql::{backend::SqlClient, dialect::SqlStatement},
};
use async_trait::async_trait;
use model::records::row::RowData;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

pub struct PgClient {
    client: Client,
}

#[async_trait]
impl SqlClient for PgClient {
    async fn connect(url: &str) -> Result<Self, SourceError> {
        let client = connect_client(url).await?;
        Ok(Self { client })
    }

    async fn columns(&mut self, sql: &str) -> Result<Vec<String>, SourceError> {
        let statement = self.client.prepare(sql).await?;
        Ok(statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    async fn query(
        &mut self,
        statement: &SqlStatement,
        entity: &str,
    ) -> Result<Vec<RowData>, SourceError> {
        let params = PgParamStore::from_params(&statement.params);
        let rows = self
            .client
            .query(statement.sql.as_str(), &params.as_refs())
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(to_row_data(row, entity)?);
        }
        Ok(out)
    }

    async fn close(self) -> Result<(), SourceError> {
        drop(self.client);
        Ok(())
    }
}

pub(crate) async fn connect_client(url: &str) -> Result<Client, SourceError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

    match config.get_ssl_mode() {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

async fn connect_with_tls(config: Config) -> Result<Client, SourceError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_without_tls(config: Config) -> Result<Client, SourceError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}
