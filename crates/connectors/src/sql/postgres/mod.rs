use crate::sql::dialect::{Dialect, quote_with};
use model::pagination::cursor::{CursorKind, StoredCursorValue};

pub mod client;
pub mod params;
pub mod row;

pub use client::PgClient;

/// PostgreSQL placeholders are `$n`. Every cursor parameter is bound as text
/// and cast server-side to the column's own type, so comparisons run in the
/// column's ordering rather than as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    fn cast_target(value: &StoredCursorValue) -> String {
        match value.raw_type.as_deref().filter(|t| is_type_name(t)) {
            Some(raw) => raw.to_string(),
            None => match value.kind {
                CursorKind::Int => "bigint",
                CursorKind::Float => "double precision",
                CursorKind::Datetime => "timestamptz",
                CursorKind::Bool => "boolean",
                CursorKind::String => "text",
            }
            .to_string(),
        }
    }
}

/// Only plain scalar names are trusted in a cast; array types (`_text`) and
/// anything quoted fall back to the kind's type.
fn is_type_name(raw: &str) -> bool {
    !raw.is_empty()
        && !raw.starts_with('_')
        && raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        quote_with(ident, '"')
    }

    fn placeholder(&self, index: usize, value: &StoredCursorValue) -> String {
        format!("${}::text::{}", index + 1, Self::cast_target(value))
    }

    fn render_page_predicate(&self, query: &str, page_size: usize, offset: usize) -> String {
        format!("{query} LIMIT {page_size} OFFSET {offset}")
    }
}
