use super::{
    dialect::{Dialect, SqlStatement, trim_query},
    mysql::{MySqlClient, MySqlDialect},
    postgres::{PgClient, PostgresDialect},
};
use crate::error::SourceError;
use async_trait::async_trait;
use engine_config::source::SqlSourceConfig;
use engine_core::scan::{PageRequest, SourceBackend, SourceSchema};
use model::records::row::RowData;
use std::sync::Arc;

/// Entity name given to rows read from a configured query.
pub const QUERY_ENTITY: &str = "query";

/// A live connection to one SQL database.
#[async_trait]
pub trait SqlClient: Send + Sized {
    async fn connect(url: &str) -> Result<Self, SourceError>;

    /// Result columns of `sql`, read by preparing it.
    async fn columns(&mut self, sql: &str) -> Result<Vec<String>, SourceError>;

    async fn query(
        &mut self,
        statement: &SqlStatement,
        entity: &str,
    ) -> Result<Vec<RowData>, SourceError>;

    async fn close(self) -> Result<(), SourceError>;
}

/// Scans a SQL query. The dialect supplies the SQL text; the client runs it.
pub struct SqlBackend<C: SqlClient> {
    config: SqlSourceConfig,
    dialect: Arc<dyn Dialect>,
    client: Option<C>,
}

pub type PostgresBackend = SqlBackend<PgClient>;
pub type MySqlBackend = SqlBackend<MySqlClient>;

impl<C: SqlClient> SqlBackend<C> {
    pub fn new(config: SqlSourceConfig, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            config,
            dialect,
            client: None,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn client(&mut self) -> Result<&mut C, SourceError> {
        self.client.as_mut().ok_or(SourceError::NotConnected)
    }
}

impl PostgresBackend {
    pub fn postgres(config: SqlSourceConfig) -> Self {
        Self::new(config, Arc::new(PostgresDialect))
    }
}

impl MySqlBackend {
    pub fn mysql(config: SqlSourceConfig) -> Self {
        Self::new(config, Arc::new(MySqlDialect))
    }
}

/// Renders the statement for one page of `base_query`.
pub fn build_statement(
    dialect: &dyn Dialect,
    base_query: &str,
    request: &PageRequest<'_>,
) -> SqlStatement {
    let mut statement = match &request.cursor {
        Some(range) => dialect.render_incremental_predicate(base_query, range),
        None => SqlStatement::new(trim_query(base_query)),
    };
    if let Some(size) = request.page_size {
        statement.sql = dialect.render_page_predicate(&statement.sql, size, request.offset);
    }
    statement
}

#[async_trait]
impl<C: SqlClient> SourceBackend for SqlBackend<C> {
    type Fetch = SqlStatement;
    type Error = SourceError;

    fn name(&self) -> &str {
        self.dialect.name()
    }

    async fn connect(&mut self) -> Result<(), SourceError> {
        if self.client.is_none() {
            self.client = Some(C::connect(&self.config.connection_uri).await?);
        }
        Ok(())
    }

    async fn describe_schema(&mut self) -> Result<Option<SourceSchema>, SourceError> {
        let sql = trim_query(&self.config.sql).to_string();
        let fields = self.client()?.columns(&sql).await?;
        Ok(Some(SourceSchema::new(QUERY_ENTITY, fields)))
    }

    fn build_fetch(&self, request: &PageRequest<'_>) -> Result<SqlStatement, SourceError> {
        Ok(build_statement(self.dialect.as_ref(), &self.config.sql, request))
    }

    async fn execute(&mut self, fetch: SqlStatement) -> Result<Vec<RowData>, SourceError> {
        self.client()?.query(&fetch, QUERY_ENTITY).await
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        match self.client.take() {
            Some(client) => client.close().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{cursor::CursorSerializer, scan::CursorRange};
    use model::{core::value::Value, pagination::cursor::CursorKind};

    #[test]
    fn full_pages_offset_the_base_query() {
        let request = PageRequest {
            page: 3,
            page_size: Some(100),
            offset: 200,
            cursor: None,
        };
        let statement = build_statement(&PostgresDialect, "SELECT * FROM t;", &request);
        assert_eq!(statement.sql, "SELECT * FROM t LIMIT 100 OFFSET 200");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn unpaged_full_fetch_is_the_base_query() {
        let request = PageRequest {
            page: 1,
            page_size: None,
            offset: 0,
            cursor: None,
        };
        assert_eq!(
            build_statement(&MySqlDialect, "SELECT * FROM t", &request).sql,
            "SELECT * FROM t"
        );
    }

    #[test]
    fn incremental_pages_are_limited_from_zero() {
        let watermark = CursorSerializer::new(CursorKind::Int)
            .from_values(&Value::Int(2), Some(&Value::Int(9)))
            .unwrap();
        let request = PageRequest {
            page: 2,
            page_size: Some(10),
            offset: 0,
            cursor: Some(CursorRange {
                property: "seq",
                tie_breaker: "id",
                property_kind: CursorKind::Int,
                after: Some(&watermark),
            }),
        };
        let statement = build_statement(&MySqlDialect, "SELECT * FROM t", &request);
        assert!(statement.sql.ends_with("ORDER BY `seq` ASC, `id` ASC LIMIT 0, 10"));
        assert_eq!(statement.params.len(), 3);
    }
}
