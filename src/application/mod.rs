//! Conversion services.

pub mod render;
