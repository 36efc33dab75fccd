pub mod backend;
pub mod outcome;
pub mod scanner;

pub use backend::{CursorRange, PageRequest, SourceBackend, SourceSchema};
pub use outcome::{ScanOutcome, ScanStatus};
pub use scanner::{ScanContext, Scanner};
