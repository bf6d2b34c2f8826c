//! Conversion pipelines for source code, Markdown and Jupyter notebooks.
//!
//! Every pipeline is pure: it accepts text, produces deterministic HTML, and
//! surfaces structured errors. Collapsing errors into the `"error: "` string
//! convention happens in the FFI layer, not here.

mod service;
mod types;

pub use service::{
    CLASS_PREFIX, DEFAULT_THEME, HtmlConverter, RenderConfigError, RenderPipelineConfig,
    configure_render_service, converter, strip_front_matter,
};
pub use types::{CodeRequest, ConvertError, ConvertService, DocumentKind};
