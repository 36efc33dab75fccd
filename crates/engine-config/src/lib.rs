pub mod datasource;
pub mod error;
pub mod incremental;
pub mod source;
pub mod sync;
