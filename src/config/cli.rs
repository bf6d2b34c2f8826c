use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the `htmlconvert` binary.
#[derive(Debug, Parser)]
#[command(
    name = "htmlconvert",
    version,
    about = "Convert source code, Markdown and Jupyter notebooks to HTML"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "HTMLCONVERTER_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Highlight a source file.
    Code(CodeArgs),
    /// Render a Markdown document.
    Markdown(InputArgs),
    /// Render a Jupyter notebook.
    Notebook(InputArgs),
    /// Pick the pipeline from the file extension.
    Auto(InputArgs),
    /// Print the stylesheet for the configured highlight theme.
    Css,
}

#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// File to convert; `-` reads standard input.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub path: PathBuf,

    /// Wrap the fragment in a complete HTML page with the theme stylesheet inlined.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub standalone: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CodeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Language identifier: name, alias, extension or file name.
    #[arg(long = "lexer", value_name = "LANGUAGE")]
    pub lexer: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the highlight theme used for the stylesheet.
    #[arg(long = "theme", value_name = "NAME", global = true)]
    pub theme: Option<String>,
}
