//! Helper functions for templates

mod date;

pub use date::*;
