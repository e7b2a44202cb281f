//! IO module for format-specific reading and writing operations.
//!
//! # Format Modules
//!
//! - `nested` - plain nested sequences, the in-memory interchange form
//! - `arrow` - Arrow list columns, the function argument and result form
//! - `json` - JSON files of nested multipolygons, used by the CLI
//! - `fs` - atomic file output

pub mod arrow;
pub mod fs;
pub mod json;
pub mod nested;
