use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
    process,
};

use htmlconverter::{
    application::render::{
        CodeRequest, ConvertError, ConvertService, DocumentKind, RenderPipelineConfig,
        configure_render_service, converter,
    },
    config::{self, Command, InputArgs},
    infra::{error::InfraError, telemetry},
};
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to configure renderer: {0}")]
    Render(String),
    #[error("failed to read `{path}`: {source}")]
    Input { path: String, source: io::Error },
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

fn main() {
    if let Err(error) = run() {
        report_error(&error);
        process::exit(1);
    }
}

fn report_error(error: &CliError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "htmlconvert failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "htmlconvert failed");
    });
}

fn run() -> Result<(), CliError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    configure_render_service(RenderPipelineConfig::from(&settings.render))
        .map_err(|err| CliError::Render(err.to_string()))?;

    let output = match cli_args.command {
        Command::Code(args) => {
            let source = read_input(&args.input.path)?;
            let mut request = CodeRequest::new(source);
            if let Some(lexer) = args.lexer {
                request = request.with_lexer_hint(lexer);
            }
            let html = converter().convert_code(&request)?;
            finish(&args.input, html)?
        }
        Command::Markdown(args) => convert_input(&args, &DocumentKind::Markdown)?,
        Command::Notebook(args) => convert_input(&args, &DocumentKind::Notebook)?,
        Command::Auto(args) => {
            let kind = DocumentKind::from_path(&args.path);
            info!(target = "htmlconvert", path = %args.path.display(), kind = ?kind, "dispatching by extension");
            convert_input(&args, &kind)?
        }
        Command::Css => converter().stylesheet()?,
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .map_err(InfraError::from)?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n").map_err(InfraError::from)?;
    }
    Ok(())
}

fn convert_input(args: &InputArgs, kind: &DocumentKind) -> Result<String, CliError> {
    let source = read_input(&args.path)?;
    let html = converter().convert(kind, &source)?;
    finish(args, html)
}

fn finish(args: &InputArgs, html: String) -> Result<String, CliError> {
    if !args.standalone {
        return Ok(html);
    }
    let css = converter().stylesheet()?;
    let title = args
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| *name != "-")
        .unwrap_or("htmlconvert");
    Ok(standalone_page(title, &css, &html))
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let to_error = |source| CliError::Input {
        path: path.display().to_string(),
        source,
    };

    if path == Path::new("-") {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).map_err(to_error)?;
        return Ok(String::from_utf8_lossy(&buffer).into_owned());
    }

    let bytes = fs::read(path).map_err(to_error)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn standalone_page(title: &str, css: &str, body: &str) -> String {
    let title = ammonia::clean_text(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{css}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
