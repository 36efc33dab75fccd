use super::{params::MySqlParamStore, row::to_row_data};
use crate::{
    error::SourceError,
    sql::{backend::SqlClient, dialect::SqlStatement},
};
use async_trait::async_trait;
use model::records::row::RowData;
use mysql_async::{Conn, Opts, Pool, Row, prelude::Queryable};

pub struct MySqlClient {
    pool: Pool,
    conn: Conn,
}

#[async_trait]
impl SqlClient for MySqlClient {
    async fn connect(url: &str) -> Result<Self, SourceError> {
        let opts = Opts::from_url(url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
        let pool = Pool::new(opts);
        let conn = pool.get_conn().await?;
        Ok(Self { pool, conn })
    }

    async fn columns(&mut self, sql: &str) -> Result<Vec<String>, SourceError> {
        let statement = self.conn.prep(sql).await?;
        let columns = statement
            .columns()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect();
        self.conn.close(statement).await?;
        Ok(columns)
    }

    async fn query(
        &mut self,
        statement: &SqlStatement,
        entity: &str,
    ) -> Result<Vec<RowData>, SourceError> {
        let params = MySqlParamStore::from_params(&statement.params);
        let rows: Vec<Row> = self.conn.exec(statement.sql.as_str(), params.params()).await?;
        Ok(rows.iter().map(|row| to_row_data(row, entity)).collect())
    }

    async fn close(self) -> Result<(), SourceError> {
        drop(self.conn);
        self.pool.disconnect().await?;
        Ok(())
    }
}
