pub mod adapter;
pub mod error;
pub mod mongodb;
pub mod sql;
