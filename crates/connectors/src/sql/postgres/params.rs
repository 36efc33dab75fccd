use crate::sql::dialect::CursorParam;
use tokio_postgres::types::ToSql;

/// Cursor parameters in their canonical text form. The statement casts each
/// one to its column type.
pub struct PgParamStore {
    params: Vec<String>,
}

impl PgParamStore {
    pub fn from_params(params: &[CursorParam]) -> Self {
        Self {
            params: params.iter().map(|p| p.stored.value.clone()).collect(),
        }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect()
    }
}
