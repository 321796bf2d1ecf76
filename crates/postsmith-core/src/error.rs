use thiserror::Error;

use crate::span::Span;

/// Generation was refused because some placeholders resolve to neither a
/// field definition nor a provided value.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unresolved placeholders: {}", .keys.join(", "))]
pub struct UnresolvedPlaceholders {
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MarkupError {
    #[error("markup nesting exceeds {max_depth} levels at byte {}", .span.start)]
    NestingTooDeep { max_depth: usize, span: Span },
}

impl MarkupError {
    pub fn span(&self) -> Span {
        match self {
            MarkupError::NestingTooDeep { span, .. } => *span,
        }
    }
}
