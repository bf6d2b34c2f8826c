use std::path::Path;

use thiserror::Error;

/// Source code conversion request. The hint is optional; an empty or unknown
/// hint falls through to content detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRequest {
    /// Raw source text, no encoding or length assumptions.
    pub source: String,
    /// Language identifier supplied by the caller (token, name, extension or file name).
    pub lexer_hint: Option<String>,
}

impl CodeRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lexer_hint: None,
        }
    }

    pub fn with_lexer_hint(mut self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        let trimmed = hint.trim();
        self.lexer_hint = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

/// Which pipeline a document is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Code { lexer_hint: Option<String> },
    Markdown,
    Notebook,
}

const MARKDOWN_EXTENSIONS: [&str; 7] = ["md", "markdown", "mdown", "mkdn", "mkd", "rmd", "qmd"];

impl DocumentKind {
    /// Pick a pipeline from a file name. Anything that is neither Markdown nor a
    /// notebook is treated as source code, with the extension used as lexer hint.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some(ext) if MARKDOWN_EXTENSIONS.contains(&ext) => DocumentKind::Markdown,
            Some("ipynb") => DocumentKind::Notebook,
            Some(ext) => DocumentKind::Code {
                lexer_hint: Some(ext.to_string()),
            },
            None => DocumentKind::Code {
                lexer_hint: path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string),
            },
        }
    }
}

/// Failures surfaced by the conversion pipelines. The boundary adapter collapses
/// these into `"error: "`-prefixed strings; everything inside the crate keeps the
/// typed value for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Could not render source code (tokenization error): {language}: {message}")]
    Tokenization { language: String, message: String },
    #[error("Could not render source code (formatting error): {language}: {message}")]
    Formatting { language: String, message: String },
    #[error("Could not convert Markdown to HTML: {message}")]
    Markdown { message: String },
    #[error("Could not convert Notebook to HTML: {message}")]
    Notebook { message: String },
    #[error("Could not generate stylesheet for theme `{theme}`: {message}")]
    Theme { theme: String, message: String },
    #[error("Conversion aborted unexpectedly in {operation}: {message}")]
    Panic {
        operation: &'static str,
        message: String,
    },
}

impl ConvertError {
    pub fn tokenization(language: impl Into<String>, message: impl ToString) -> Self {
        Self::Tokenization {
            language: language.into(),
            message: message.to_string(),
        }
    }

    pub fn formatting(language: impl Into<String>, message: impl ToString) -> Self {
        Self::Formatting {
            language: language.into(),
            message: message.to_string(),
        }
    }

    pub fn markdown(message: impl ToString) -> Self {
        Self::Markdown {
            message: message.to_string(),
        }
    }

    pub fn notebook(message: impl ToString) -> Self {
        Self::Notebook {
            message: message.to_string(),
        }
    }

    /// Short, stable identifier for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::Tokenization { .. } => "tokenization",
            ConvertError::Formatting { .. } => "formatting",
            ConvertError::Markdown { .. } => "markdown",
            ConvertError::Notebook { .. } => "notebook",
            ConvertError::Theme { .. } => "theme",
            ConvertError::Panic { .. } => "panic",
        }
    }
}

/// Conversion operations offered by the crate. Implementations must be pure:
/// the same input yields the same output or error, and no state survives a call.
pub trait ConvertService: Send + Sync {
    fn convert_code(&self, request: &CodeRequest) -> Result<String, ConvertError>;

    fn convert_markdown(&self, source: &str) -> Result<String, ConvertError>;

    fn convert_notebook(&self, source: &str) -> Result<String, ConvertError>;

    /// Route a document to the pipeline named by `kind`.
    fn convert(&self, kind: &DocumentKind, source: &str) -> Result<String, ConvertError> {
        match kind {
            DocumentKind::Code { lexer_hint } => {
                let mut request = CodeRequest::new(source);
                if let Some(hint) = lexer_hint {
                    request = request.with_lexer_hint(hint.as_str());
                }
                self.convert_code(&request)
            }
            DocumentKind::Markdown => self.convert_markdown(source),
            DocumentKind::Notebook => self.convert_notebook(source),
        }
    }
}
