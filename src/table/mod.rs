//! Pipe-table editing on raw markdown text.
//!
//! Tables are never stored: each action re-detects the block around the
//! cursor, rewrites it and realigns every column.

mod block;
mod transform;

pub use block::{TableBlock, locate};
pub use transform::{TableAction, apply, realign, transform};
