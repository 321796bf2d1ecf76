use serde::Serialize;

use crate::span::Span;

/// Zero-based line and character (Unicode scalar) column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Bytes between character-count checkpoints.
const CHECKPOINT_STRIDE: usize = 64;

/// Maps byte offsets of a markup source to line/column positions.
///
/// Columns come from per-stride character counts, so a lookup never walks
/// more than one stride of text however long the line is.
#[derive(Clone, Debug)]
pub struct SourceMap {
    source: String,
    line_starts: Vec<usize>,
    /// `char_checkpoints[k]` is the character count of `source[..k * CHECKPOINT_STRIDE]`.
    char_checkpoints: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        let mut char_checkpoints = Vec::with_capacity(source.len() / CHECKPOINT_STRIDE + 1);
        let mut chars = 0;
        char_checkpoints.push(0);
        for chunk in source.as_bytes().chunks(CHECKPOINT_STRIDE) {
            chars += count_char_starts(chunk);
            char_checkpoints.push(chars);
        }
        Self {
            source: source.to_string(),
            line_starts,
            char_checkpoints,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        Position {
            line,
            character: self.chars_before(offset) - self.chars_before(line_start),
        }
    }

    /// Characters in `source[..offset]`; `offset` must be a char boundary.
    fn chars_before(&self, offset: usize) -> usize {
        let index = offset / CHECKPOINT_STRIDE;
        let base = index * CHECKPOINT_STRIDE;
        self.char_checkpoints[index] + count_char_starts(&self.source.as_bytes()[base..offset])
    }

    pub fn range(&self, span: Span) -> Range {
        Range {
            start: self.position(span.start),
            end: self.position(span.end),
        }
    }
}

fn count_char_starts(bytes: &[u8]) -> usize {
    bytes.iter().filter(|byte| (**byte & 0xC0) != 0x80).count()
}
