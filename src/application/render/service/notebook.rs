//! Jupyter notebook (nbformat 4) model and HTML rendering.
//!
//! Markdown cells go through the Markdown pipeline, code cells through the code
//! pipeline with the notebook language as hint. Rich outputs are sanitised with
//! the output sanitizer; text outputs are escaped.

use std::{borrow::Cow, collections::BTreeMap};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::render::types::{ConvertError, ConvertService};

use ammonia::clean_text;

use super::{HtmlConverter, lexer::CODE_CHAIN};

const MIN_SUPPORTED_NBFORMAT: u32 = 4;

const MIME_PREFERENCE: [&str; 9] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/svg+xml",
    "text/html",
    "text/markdown",
    "text/latex",
    "application/json",
    "text/plain",
];

/// CSI and OSC escape sequences as emitted by IPython tracebacks.
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\))")
        .expect("ansi escape pattern must compile")
});

#[derive(Debug, Deserialize)]
pub(crate) struct Notebook {
    pub(crate) nbformat: u32,
    #[serde(default)]
    pub(crate) nbformat_minor: u32,
    #[serde(default)]
    pub(crate) metadata: NotebookMetadata,
    #[serde(default)]
    pub(crate) cells: Vec<Cell>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NotebookMetadata {
    #[serde(default)]
    pub(crate) kernelspec: Option<KernelSpec>,
    #[serde(default)]
    pub(crate) language_info: Option<LanguageInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct KernelSpec {
    #[serde(default)]
    pub(crate) language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LanguageInfo {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) file_extension: Option<String>,
}

/// nbformat stores text either as one string or as a list of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MultilineString {
    Single(String),
    Lines(Vec<String>),
}

impl Default for MultilineString {
    fn default() -> Self {
        MultilineString::Single(String::new())
    }
}

impl MultilineString {
    pub(crate) fn text(&self) -> Cow<'_, str> {
        match self {
            MultilineString::Single(text) => Cow::Borrowed(text.as_str()),
            MultilineString::Lines(lines) => Cow::Owned(lines.concat()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub(crate) enum Cell {
    Markdown {
        #[serde(default)]
        source: MultilineString,
    },
    Code {
        #[serde(default)]
        source: MultilineString,
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Raw {
        #[serde(default)]
        source: MultilineString,
    },
    #[serde(other)]
    Unknown,
}

type MimeBundle = BTreeMap<String, Value>;

#[derive(Debug, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub(crate) enum Output {
    Stream {
        #[serde(default)]
        name: String,
        #[serde(default)]
        text: MultilineString,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        data: MimeBundle,
    },
    DisplayData {
        #[serde(default)]
        data: MimeBundle,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
    #[serde(other)]
    Unknown,
}

impl Notebook {
    pub(crate) fn parse(source: &str) -> Result<Self, ConvertError> {
        let notebook: Notebook = serde_json::from_str(source)
            .map_err(|err| ConvertError::notebook(format!("invalid notebook JSON: {err}")))?;

        if notebook.nbformat < MIN_SUPPORTED_NBFORMAT {
            return Err(ConvertError::notebook(format!(
                "unsupported notebook format version {}.{} (expected {MIN_SUPPORTED_NBFORMAT}.x)",
                notebook.nbformat, notebook.nbformat_minor
            )));
        }

        Ok(notebook)
    }

    /// Language used to highlight code cells, if the notebook declares one.
    pub(crate) fn language(&self) -> Option<&str> {
        let language_info = self.metadata.language_info.as_ref();
        language_info
            .and_then(|info| info.name.as_deref())
            .or_else(|| {
                self.metadata
                    .kernelspec
                    .as_ref()
                    .and_then(|spec| spec.language.as_deref())
            })
            .or_else(|| {
                language_info
                    .and_then(|info| info.file_extension.as_deref())
                    .map(|ext| ext.trim_start_matches('.'))
            })
            .filter(|language| !language.trim().is_empty())
    }
}

pub(crate) fn render_notebook(
    converter: &HtmlConverter,
    source: &str,
) -> Result<String, ConvertError> {
    let notebook = Notebook::parse(source)?;
    let language = notebook.language();
    debug!(
        target = "application::render::notebook",
        cells = notebook.cells.len(),
        language = language.unwrap_or("-"),
        "rendering notebook"
    );

    let mut html = String::from("<div class=\"notebook\">\n");
    for (index, cell) in notebook.cells.iter().enumerate() {
        let cell_html = render_cell(converter, cell, language).map_err(|err| {
            ConvertError::notebook(format!("cell {}: {err}", index + 1))
        })?;
        html.push_str(&cell_html);
    }
    html.push_str("</div>\n");

    Ok(html)
}

fn render_cell(
    converter: &HtmlConverter,
    cell: &Cell,
    language: Option<&str>,
) -> Result<String, ConvertError> {
    match cell {
        Cell::Markdown { source } => {
            let body = converter.convert_markdown(&source.text())?;
            Ok(format!("<div class=\"cell cell-markdown\">\n{body}</div>\n"))
        }
        Cell::Code {
            source,
            execution_count,
            outputs,
        } => {
            let code = converter.highlight(&source.text(), language, CODE_CHAIN)?;
            let mut html = format!(
                "<div class=\"cell cell-code\">\n<div class=\"cell-input\"><div class=\"prompt input-prompt\">In [{}]:</div><div class=\"input-area\">{code}</div></div>\n",
                prompt_number(*execution_count)
            );

            let rendered: Vec<String> = outputs
                .iter()
                .map(|output| render_output(converter, output))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect();
            if !rendered.is_empty() {
                html.push_str("<div class=\"cell-outputs\">\n");
                for output in rendered {
                    html.push_str(&output);
                }
                html.push_str("</div>\n");
            }

            html.push_str("</div>\n");
            Ok(html)
        }
        Cell::Raw { source } => Ok(format!(
            "<div class=\"cell cell-raw\"><pre>{}</pre></div>\n",
            clean_text(&source.text())
        )),
        Cell::Unknown => Ok(String::new()),
    }
}

fn render_output(
    converter: &HtmlConverter,
    output: &Output,
) -> Result<Option<String>, ConvertError> {
    match output {
        Output::Stream { name, text } => {
            let stream = if name == "stderr" { "stderr" } else { "stdout" };
            Ok(Some(format!(
                "<div class=\"output output-stream output-{stream}\"><pre>{}</pre></div>\n",
                clean_text(&strip_ansi(&text.text()))
            )))
        }
        Output::ExecuteResult {
            execution_count,
            data,
        } => Ok(render_mime_bundle(converter, data)?.map(|body| {
            format!(
                "<div class=\"output output-result\"><div class=\"prompt output-prompt\">Out[{}]:</div><div class=\"output-area\">{body}</div></div>\n",
                prompt_number(*execution_count)
            )
        })),
        Output::DisplayData { data } => Ok(render_mime_bundle(converter, data)?.map(|body| {
            format!(
                "<div class=\"output output-display\"><div class=\"output-area\">{body}</div></div>\n"
            )
        })),
        Output::Error {
            ename,
            evalue,
            traceback,
        } => {
            let text = if traceback.is_empty() {
                format!("{ename}: {evalue}")
            } else {
                traceback.join("\n")
            };
            Ok(Some(format!(
                "<div class=\"output output-error\"><pre>{}</pre></div>\n",
                clean_text(&strip_ansi(&text))
            )))
        }
        Output::Unknown => Ok(None),
    }
}

/// Render the richest representation available in `data`, or `None` when no
/// supported MIME type is present.
fn render_mime_bundle(
    converter: &HtmlConverter,
    data: &MimeBundle,
) -> Result<Option<String>, ConvertError> {
    for mime in MIME_PREFERENCE {
        let Some(value) = data.get(mime) else {
            continue;
        };
        let text = mime_text(value);

        let html = match mime {
            "image/png" | "image/jpeg" | "image/gif" => {
                let payload: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                if let Err(err) = STANDARD.decode(payload.as_bytes()) {
                    warn!(
                        target = "application::render::notebook",
                        mime,
                        error = %err,
                        "skipping image output with invalid base64 payload"
                    );
                    continue;
                }
                format!("<img class=\"output-image\" src=\"data:{mime};base64,{payload}\" alt=\"output\">")
            }
            "image/svg+xml" => format!(
                "<div class=\"output-svg\">{}</div>",
                converter.sanitize_output(&text)
            ),
            "text/html" => format!(
                "<div class=\"output-html\">{}</div>",
                converter.sanitize_output(&text)
            ),
            "text/markdown" => format!(
                "<div class=\"output-markdown\">{}</div>",
                converter.convert_markdown(&text)?
            ),
            "text/latex" => format!("<pre class=\"output-latex\">{}</pre>", clean_text(&text)),
            "application/json" => converter.highlight(&text, Some("json"), CODE_CHAIN)?,
            _ => format!(
                "<pre class=\"output-text\">{}</pre>",
                clean_text(&strip_ansi(&text))
            ),
        };

        return Ok(Some(html));
    }

    Ok(None)
}

fn mime_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => {
            items.iter().filter_map(Value::as_str).collect()
        }
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn prompt_number(execution_count: Option<u64>) -> String {
    execution_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| " ".to_string())
}

pub(crate) fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}
