pub mod collect;
pub mod cursor;
pub mod error;
pub mod metrics;
pub mod scan;
pub mod state;
pub mod transform;
