//! Watermark values: the codec between source values and their durable
//! form, and the single ordering every scanner uses.

pub mod codec;
pub mod compare;
pub mod watermark;

pub use compare::compare;
pub use watermark::{CursorSerializer, CursorWatermark};
