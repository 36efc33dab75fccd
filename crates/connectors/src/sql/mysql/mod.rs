use crate::sql::dialect::{Dialect, quote_with};
use model::pagination::cursor::StoredCursorValue;

pub mod client;
pub mod params;
pub mod row;

pub use client::MySqlClient;

/// MySQL binds typed values against `?` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '`')
    }

    fn placeholder(&self, _index: usize, _value: &StoredCursorValue) -> String {
        "?".to_string()
    }

    fn render_page_predicate(&self, query: &str, page_size: usize, offset: usize) -> String {
        format!("{query} LIMIT {offset}, {page_size}")
    }
}
