use engine_core::scan::CursorRange;
use model::pagination::cursor::{CursorValue, StoredCursorValue};

/// Alias of the wrapped base query in incremental statements.
pub const SUBQUERY_ALIAS: &str = "sync_page";

/// A cursor value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorParam {
    pub stored: StoredCursorValue,
    pub native: CursorValue,
}

impl CursorParam {
    pub fn new(stored: &StoredCursorValue, native: &CursorValue) -> Self {
        Self {
            stored: stored.clone(),
            native: native.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<CursorParam>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// The parts of SQL that differ between databases. The scan logic is the
/// same for every dialect.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, ident: &str) -> String;

    /// Bind marker for the zero-based `index`th parameter, which holds `value`.
    fn placeholder(&self, index: usize, value: &StoredCursorValue) -> String;

    /// Limits `query` to one page.
    fn render_page_predicate(&self, query: &str, page_size: usize, offset: usize) -> String;

    /// Wraps `base_query` so it returns rows after `range.after` in
    /// `(property, tie_breaker)` order.
    fn render_incremental_predicate(&self, base_query: &str, range: &CursorRange<'_>) -> SqlStatement {
        let property = self.quote_identifier(range.property);
        let tie = self.quote_identifier(range.tie_breaker);
        let mut sql = format!(
            "SELECT * FROM ({}) AS {SUBQUERY_ALIAS}",
            trim_query(base_query)
        );
        let mut params = Vec::new();

        if let Some(after) = range.after {
            let (stored, native) = after.property_param();
            let first = self.placeholder(0, stored);
            params.push(CursorParam::new(stored, native));

            match after.tie_param() {
                Some((tie_stored, tie_native)) => {
                    let second = self.placeholder(1, stored);
                    let third = self.placeholder(2, tie_stored);
                    sql.push_str(&format!(
                        " WHERE {property} > {first} OR ({property} = {second} AND {tie} > {third})"
                    ));
                    params.push(CursorParam::new(stored, native));
                    params.push(CursorParam::new(tie_stored, tie_native));
                }
                None => sql.push_str(&format!(" WHERE {property} > {first}")),
            }
        }

        sql.push_str(&format!(" ORDER BY {property} ASC, {tie} ASC"));
        SqlStatement { sql, params }
    }
}

/// Strips surrounding whitespace and trailing statement terminators.
pub fn trim_query(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}

pub(crate) fn quote_with(ident: &str, quote: char) -> String {
    let escaped = ident.replace(quote, &format!("{quote}{quote}"));
    format!("{quote}{escaped}{quote}")
}
