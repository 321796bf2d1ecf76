//! Command-line surface for `postsmith-cli`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use postsmith_preview::Theme;

#[derive(Parser, Debug)]
#[command(name = "postsmith-cli", version, about = "Fill post templates and preview forum markup", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render markup from a file (or stdin) to HTML
    Render(RenderArgs),
    /// Fill a template with field values and print the post text
    Fill(FillArgs),
    /// List the placeholders used by a template body
    Placeholders {
        /// Template body file
        file: PathBuf,
    },
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Markup file; stdin when omitted
    pub input: Option<PathBuf>,

    /// Print the HTML fragment instead of a full preview page
    #[arg(long)]
    pub raw: bool,

    /// Pass the output through the allow-list sanitizer
    #[arg(long)]
    pub sanitized: bool,

    #[arg(long, value_enum, default_value_t = ThemeArg::Auto, env = "POSTSMITH_THEME")]
    pub theme: ThemeArg,

    /// Report diagnostics on stderr
    #[arg(long, value_enum)]
    pub diagnostics: Option<DiagnosticsMode>,
}

#[derive(Parser, Debug)]
pub struct FillArgs {
    /// JSON file holding `{ "template": {...}, "fields": [...] }`
    #[arg(long)]
    pub template: PathBuf,

    /// Operator input for a field (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub inputs: Vec<(String, String)>,

    /// Auto-filled value that bypasses field transforms (repeatable)
    #[arg(long = "provide", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub provided: Vec<(String, String)>,

    /// Print the rendered HTML fragment instead of the markup
    #[arg(long)]
    pub preview: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Auto,
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DiagnosticsMode {
    Json,
    Pretty,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
