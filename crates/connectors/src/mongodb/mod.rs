mod backend;
mod convert;
mod filter;

pub use backend::{MongoBackend, MongoFind};
pub use convert::document_to_row;
pub use filter::{base_filter, cursor_filter, cursor_sort};
