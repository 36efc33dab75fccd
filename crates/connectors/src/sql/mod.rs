pub mod backend;
pub mod dialect;
pub mod mysql;
pub mod postgres;

pub use backend::{SqlBackend, SqlClient};
pub use dialect::{CursorParam, Dialect, SqlStatement};
