mod ast;
mod diagnostic;
mod emit;
mod error;
mod escape;
mod parser;
mod placeholder;
mod render;
mod source_map;
mod span;
mod template;
mod validate;

pub use ast::{Align, Element, Markup, Node, Tag};
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, E_FIELD_OPTION, E_FIELD_REQUIRED, E_NESTING_DEPTH, FieldIssue,
    W_ATTR_INVALID, W_FIELD_DUPLICATE, W_FIELD_UNUSED, W_TAG_UNCLOSED, W_TAG_UNMATCHED,
    W_URL_REJECTED,
};
pub use emit::{RenderOptions, emit_html, emit_html_sanitized, emit_plain_text};
pub use error::{MarkupError, UnresolvedPlaceholders};
pub use escape::is_allowed_url;
pub use parser::{DEFAULT_MAX_DEPTH, ParseResult, parse_markup, parse_markup_with_depth};
pub use placeholder::{
    ValueMap, apply_transform, build_value_map, coerce_input, coerce_values,
    compute_missing_fields, extract_placeholders, fill_template, generate,
};
pub use render::{
    Rendered, render, render_markup, render_markup_sanitized, render_markup_with_options,
    strip_markup,
};
pub use source_map::{Position, Range, SourceMap};
pub use span::Span;
pub use template::{FieldDefinition, FieldType, Template, Transform, sorted_fields};
pub use validate::{lint_template, validate_inputs};
