use tracing::warn;

use crate::diagnostic::{Diagnostic, DiagnosticSeverity, E_NESTING_DEPTH};
use crate::emit::{RenderOptions, emit_html, emit_plain_text, sanitize};
use crate::error::MarkupError;
use crate::escape::push_escaped_text;
use crate::parser::{ParseResult, parse_markup_with_depth};
use crate::source_map::SourceMap;

/// HTML for one markup source plus the issues found while parsing it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Rendered {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Same result with the HTML passed through the allow-list sanitizer.
    pub fn sanitized(self) -> Self {
        Self {
            html: sanitize(&self.html),
            diagnostics: self.diagnostics,
        }
    }
}

/// Renders markup to HTML, never failing: input the parser rejects comes back
/// as escaped text with `<br>` line breaks and an error diagnostic.
pub fn render(source: &str, options: &RenderOptions) -> Rendered {
    match parse_markup_with_depth(source, options.max_depth) {
        Ok(ParseResult {
            markup,
            diagnostics,
            ..
        }) => Rendered {
            html: emit_html(&markup, options),
            diagnostics,
        },
        Err(err) => {
            warn!(error = %err, "markup rendering fell back to escaped text");
            Rendered {
                html: plain_html(source),
                diagnostics: vec![fallback_diagnostic(source, &err)],
            }
        }
    }
}

pub fn render_markup(source: &str) -> String {
    render(source, &RenderOptions::default()).html
}

pub fn render_markup_with_options(source: &str, options: &RenderOptions) -> String {
    render(source, options).html
}

/// [`render_markup`] followed by an allow-list sanitizer pass, for callers
/// that cannot display the result in a sandboxed frame.
pub fn render_markup_sanitized(source: &str) -> String {
    sanitize(&render_markup(source))
}

/// Text content of the markup with every recognised tag removed.
pub fn strip_markup(source: &str) -> String {
    match parse_markup_with_depth(source, RenderOptions::default().max_depth) {
        Ok(parsed) => emit_plain_text(&parsed.markup),
        Err(_) => source.trim().to_string(),
    }
}

fn plain_html(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    push_escaped_text(&mut out, source);
    out
}

fn fallback_diagnostic(source: &str, err: &MarkupError) -> Diagnostic {
    let source_map = SourceMap::new(source);
    let code = match err {
        MarkupError::NestingTooDeep { .. } => E_NESTING_DEPTH,
    };
    Diagnostic::new(
        source_map.range(err.span()),
        DiagnosticSeverity::Error,
        code,
        err.to_string(),
    )
}
