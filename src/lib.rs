//! HTML conversion for source code, Markdown documents and Jupyter notebooks,
//! exposed to Rust callers, the `htmlconvert` binary and C hosts alike.

pub mod application;
pub mod config;
pub mod ffi;
pub mod infra;
