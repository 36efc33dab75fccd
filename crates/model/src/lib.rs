pub mod core;
pub mod pagination;
pub mod records;
pub mod state;
pub mod transform;
