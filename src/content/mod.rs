//! Content module - post models, normalization and reading time

pub mod normalize;
mod post;
pub mod reading_time;

pub use normalize::parse_timestamp;
pub use post::{ContentBlock, Navigation, PostDetail, PostSummary, RichTextSpan};
