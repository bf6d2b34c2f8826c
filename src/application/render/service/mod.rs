mod config;
mod front_matter;
mod highlight;
mod lexer;
mod markdown;
mod notebook;

use std::sync::Arc;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use once_cell::sync::{Lazy, OnceCell};
use syntect::{
    dumps::from_uncompressed_data,
    highlighting::{Theme, ThemeSet},
    html::{ClassStyle, css_for_theme_with_class_style},
    parsing::SyntaxSet,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::render::types::{CodeRequest, ConvertError, ConvertService};

use config::{build_markdown_sanitizer, build_output_sanitizer, default_options};
use lexer::{CODE_CHAIN, LexerQuery, Resolver, resolve_syntax};
use markdown::{RewriteOutcome, rewrite_ast};

pub use front_matter::strip_front_matter;

/// Light theme the stylesheet is generated from unless configured otherwise.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Prefix applied to every highlighting class.
pub const CLASS_PREFIX: &str = "syntax-";

/// Comrak + Syntect + Ammonia conversion pipelines. All fields are read-only
/// after construction, so one instance serves any number of concurrent calls.
pub struct HtmlConverter {
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    markdown_sanitizer: ammonia::Builder<'static>,
    output_sanitizer: ammonia::Builder<'static>,
    theme_name: String,
    theme: Option<Theme>,
}

impl HtmlConverter {
    /// Construct a converter from `config`, with GFM extensions enabled and
    /// highlighting emitting `syntax-` prefixed CSS classes.
    pub fn with_config(config: &RenderPipelineConfig) -> Self {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        let syntax_set: SyntaxSet =
            from_uncompressed_data(syntax_bytes).expect("syntax pack must be valid");
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(&config.theme);
        if theme.is_none() {
            warn!(
                target = "application::render",
                theme = %config.theme,
                "highlight theme not bundled; stylesheet generation will fail"
            );
        }

        Self {
            options: default_options(),
            syntax_set,
            class_style: ClassStyle::SpacedPrefixed {
                prefix: CLASS_PREFIX,
            },
            markdown_sanitizer: build_markdown_sanitizer(),
            output_sanitizer: build_output_sanitizer(),
            theme_name: config.theme.clone(),
            theme,
        }
    }

    fn new() -> Self {
        Self::with_config(&active_render_config())
    }

    /// Name of the theme the stylesheet is generated from.
    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// CSS for the configured theme, matching the classes emitted by every pipeline.
    pub fn stylesheet(&self) -> Result<String, ConvertError> {
        let theme = self.theme.as_ref().ok_or_else(|| ConvertError::Theme {
            theme: self.theme_name.clone(),
            message: "theme is not bundled".to_string(),
        })?;

        css_for_theme_with_class_style(theme, self.class_style).map_err(|err| {
            ConvertError::Theme {
                theme: self.theme_name.clone(),
                message: err.to_string(),
            }
        })
    }

    /// Resolve a syntax through `chain` and highlight `source` with it.
    pub(crate) fn highlight(
        &self,
        source: &str,
        hint: Option<&str>,
        chain: &[Resolver],
    ) -> Result<String, ConvertError> {
        let query = LexerQuery { hint, source };
        let (syntax, resolution) = resolve_syntax(chain, &query, &self.syntax_set);
        debug!(
            target = "application::render::code",
            hint = hint.unwrap_or(""),
            syntax = %syntax.name,
            resolution = ?resolution,
            "resolved lexer"
        );

        highlight::highlight_code(syntax, None, source, &self.syntax_set, &self.class_style)
    }

    pub(crate) fn sanitize_output(&self, html: &str) -> String {
        self.output_sanitizer.clean(html).to_string()
    }
}

static CONVERTER: Lazy<Arc<HtmlConverter>> = Lazy::new(|| Arc::new(HtmlConverter::new()));

/// Access the shared converter instance, initialised on first use.
pub fn converter() -> Arc<HtmlConverter> {
    Arc::clone(&CONVERTER)
}

impl Default for HtmlConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertService for HtmlConverter {
    fn convert_code(&self, request: &CodeRequest) -> Result<String, ConvertError> {
        self.highlight(&request.source, request.lexer_hint.as_deref(), CODE_CHAIN)
    }

    fn convert_markdown(&self, source: &str) -> Result<String, ConvertError> {
        let stripped = strip_front_matter(source);

        let arena = Arena::new();
        let root = parse_document(&arena, stripped, &self.options);

        let outcome = rewrite_stage(root, &self.syntax_set, &self.class_style)?;
        debug!(
            target = "application::render::markdown",
            code_blocks = outcome.code_blocks,
            raw_html_dropped = outcome.raw_html_dropped,
            "rewrote markdown document"
        );

        let rendered_html = render_html_stage(root, &self.options)?;
        Ok(sanitize_stage(&rendered_html, &self.markdown_sanitizer))
    }

    fn convert_notebook(&self, source: &str) -> Result<String, ConvertError> {
        notebook::render_notebook(self, source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPipelineConfig {
    pub theme: String,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            theme: settings.theme.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

/// Install the process-wide pipeline configuration. Takes effect only when called
/// before the first conversion.
pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}

fn rewrite_stage<'a>(
    root: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<RewriteOutcome, ConvertError> {
    rewrite_ast(root, syntax_set, class_style)
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, ConvertError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(ConvertError::markdown)?;
    Ok(html)
}

fn sanitize_stage(html: &str, sanitizer: &ammonia::Builder<'static>) -> String {
    sanitizer.clean(html).to_string()
}
