//! postsmith-cli: fill post templates and preview forum markup from the shell.

mod args;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use postsmith_core::{
    Diagnostic, FieldDefinition, FieldIssue, RenderOptions, Template, UnresolvedPlaceholders,
    ValueMap, extract_placeholders, generate, lint_template, render, render_markup,
    validate_inputs,
};
use postsmith_preview::PreviewPage;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands, DiagnosticsMode, FillArgs, RenderArgs};

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
    #[error("invalid template file {path}: {source}")]
    TemplateFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode diagnostics: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("missing placeholders: {}", .0.keys.join(", "))]
    Missing(#[from] UnresolvedPlaceholders),
}

/// On-disk shape consumed by `fill`.
#[derive(Debug, Deserialize)]
struct TemplateFile {
    template: Template,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Fill(args) => run_fill(args),
        Commands::Placeholders { file } => run_placeholders(&file),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("POSTSMITH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_render(args: RenderArgs) -> Result<ExitCode, CliError> {
    let source = match &args.input {
        Some(path) => read_file(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Stdin)?;
            buffer
        }
    };

    let mut rendered = render(&source, &RenderOptions::default());
    if args.sanitized {
        rendered = rendered.sanitized();
    }

    if let Some(mode) = args.diagnostics {
        emit_diagnostics(&rendered.diagnostics, mode)?;
    }

    if args.raw {
        print!("{}", rendered.html);
    } else {
        let page = PreviewPage::new(args.theme.into());
        print!("{}", page.embed_html(&rendered.html, true));
    }

    Ok(if rendered.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn run_fill(args: FillArgs) -> Result<ExitCode, CliError> {
    let raw = read_file(&args.template)?;
    let file: TemplateFile =
        serde_json::from_str(&raw).map_err(|source| CliError::TemplateFile {
            path: args.template.clone(),
            source,
        })?;

    let inputs: ValueMap = args.inputs.into_iter().collect();
    let provided: ValueMap = args.provided.into_iter().collect();
    debug!(
        template = %file.template.id,
        inputs = inputs.len(),
        provided = provided.len(),
        "filling template"
    );

    for issue in lint_template(&file.template.body, &file.fields) {
        report_issue(&issue);
    }
    for issue in validate_inputs(&file.fields, &inputs, &provided) {
        report_issue(&issue);
    }

    let text = generate(&file.template.body, &file.fields, &inputs, &provided)?;
    if args.preview {
        print!("{}", render_markup(&text));
    } else {
        print!("{}", text);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_placeholders(path: &Path) -> Result<ExitCode, CliError> {
    let body = read_file(path)?;
    for key in extract_placeholders(&body) {
        println!("{}", key);
    }
    Ok(ExitCode::SUCCESS)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn report_issue(issue: &FieldIssue) {
    eprintln!(
        "warning: {} {}: {}",
        issue.code, issue.field_key, issue.message
    );
}

fn emit_diagnostics(diagnostics: &[Diagnostic], mode: DiagnosticsMode) -> Result<(), CliError> {
    match mode {
        DiagnosticsMode::Json => {
            eprintln!("{}", serde_json::to_string_pretty(diagnostics)?);
        }
        DiagnosticsMode::Pretty => {
            for diagnostic in diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
    Ok(())
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    format!(
        "{}:{} {} {} {}",
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1,
        diagnostic.severity.as_str(),
        diagnostic.code,
        diagnostic.message
    )
}
