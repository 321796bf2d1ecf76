use crate::ast::{Align, Element, Markup, Node, Tag};
use crate::diagnostic::{
    Diagnostic, DiagnosticSeverity, W_ATTR_INVALID, W_TAG_UNCLOSED, W_TAG_UNMATCHED,
    W_URL_REJECTED,
};
use crate::error::MarkupError;
use crate::escape::is_allowed_url;
use crate::source_map::SourceMap;
use crate::span::Span;

pub const DEFAULT_MAX_DEPTH: usize = 64;

pub struct ParseResult {
    pub markup: Markup,
    pub diagnostics: Vec<Diagnostic>,
    pub source_map: SourceMap,
}

pub fn parse_markup(source: &str) -> Result<ParseResult, MarkupError> {
    parse_markup_with_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parses markup into a tag tree.
///
/// Unbalanced input never fails: unmatched and unclosed tags degrade to
/// literal text and are reported as diagnostics. Only nesting deeper than
/// `max_depth` is an error.
pub fn parse_markup_with_depth(
    source: &str,
    max_depth: usize,
) -> Result<ParseResult, MarkupError> {
    let mut parser = Parser::new(source, max_depth);
    parser.run()?;
    let markup = parser.finish();
    Ok(ParseResult {
        markup,
        diagnostics: parser.diagnostics,
        source_map: parser.source_map,
    })
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TagName {
    B,
    I,
    U,
    Center,
    Left,
    Right,
    Indent,
    Color,
    Size,
    Quote,
    Url,
    Img,
    Table,
    Tr,
    Td,
    List,
}

/// What may follow the tag name inside the brackets.
#[derive(Clone, Copy)]
enum AttrRule {
    Forbidden,
    Optional,
    Required,
    /// Accepted in `=value` or `key=value ...` form and thrown away.
    Ignored,
}

const TAG_NAMES: [(&str, TagName); 16] = [
    ("b", TagName::B),
    ("i", TagName::I),
    ("u", TagName::U),
    ("center", TagName::Center),
    ("left", TagName::Left),
    ("right", TagName::Right),
    ("indent", TagName::Indent),
    ("color", TagName::Color),
    ("size", TagName::Size),
    ("quote", TagName::Quote),
    ("url", TagName::Url),
    ("img", TagName::Img),
    ("table", TagName::Table),
    ("tr", TagName::Tr),
    ("td", TagName::Td),
    ("list", TagName::List),
];

impl TagName {
    fn parse(name: &str) -> Option<Self> {
        TAG_NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, tag)| *tag)
    }

    fn as_str(self) -> &'static str {
        TAG_NAMES
            .iter()
            .find(|(_, tag)| *tag == self)
            .map(|(name, _)| *name)
            .unwrap_or("")
    }

    fn attr_rule(self) -> AttrRule {
        match self {
            TagName::Color | TagName::Size => AttrRule::Required,
            TagName::Url | TagName::Quote => AttrRule::Optional,
            TagName::Table | TagName::Tr | TagName::Td => AttrRule::Ignored,
            _ => AttrRule::Forbidden,
        }
    }
}

enum TokenKind<'a> {
    Open {
        name: TagName,
        attr: Option<&'a str>,
    },
    Close(TagName),
    Item,
}

struct Token<'a> {
    kind: TokenKind<'a>,
    span: Span,
}

/// Recognises an allow-listed tag token starting at the `[` at `start`.
fn scan_token(source: &str, start: usize) -> Option<Token<'_>> {
    let rest = source.get(start + 1..)?;
    let len = rest.find(|ch: char| ch == ']' || ch == '[' || ch == '\n')?;
    if rest.as_bytes()[len] != b']' {
        return None;
    }
    let inner = &rest[..len];
    let span = Span::new(start, start + len + 2);

    if inner == "*" {
        return Some(Token {
            kind: TokenKind::Item,
            span,
        });
    }
    if let Some(name) = inner.strip_prefix('/') {
        let name = TagName::parse(name.trim())?;
        return Some(Token {
            kind: TokenKind::Close(name),
            span,
        });
    }

    let name_len = inner
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .unwrap_or(inner.len());
    let name = TagName::parse(&inner[..name_len])?;
    let tail = &inner[name_len..];
    let assigned = tail.strip_prefix('=').map(|value| unquote(value.trim()));
    let spaced = tail.starts_with(char::is_whitespace);

    let attr = match (name.attr_rule(), tail.is_empty()) {
        (_, true) => None,
        (AttrRule::Forbidden, false) => return None,
        (AttrRule::Optional | AttrRule::Required, false) => Some(assigned?),
        (AttrRule::Ignored, false) if assigned.is_some() || spaced => None,
        (AttrRule::Ignored, false) => return None,
    };
    if matches!(name.attr_rule(), AttrRule::Required) && attr.is_none() {
        return None;
    }
    Some(Token {
        kind: TokenKind::Open { name, attr },
        span,
    })
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn is_valid_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (3..=8).contains(&hex.len()) && hex.chars().all(|ch| ch.is_ascii_hexdigit()),
        None => (1..=32).contains(&value.len()) && value.chars().all(|ch| ch.is_ascii_alphabetic()),
    }
}

/// `size=n` maps to `clamp(10, n * 4 + 8, 32)` pixels.
fn font_size_px(value: &str) -> Option<u32> {
    let n: i64 = value.trim().parse().ok()?;
    let px = n.saturating_mul(4).saturating_add(8).clamp(10, 32);
    u32::try_from(px).ok()
}

/// Finds `[/name]` (case-insensitive) at or after `from`.
fn find_closing(source: &str, from: usize, name: &str) -> Option<Span> {
    let mut idx = from;
    while let Some(offset) = source.get(idx..)?.find("[/") {
        let start = idx + offset;
        let end = start + name.len() + 3;
        let matches = source
            .get(start + 2..end - 1)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
            && source.as_bytes().get(end - 1) == Some(&b']');
        if matches {
            return Some(Span::new(start, end));
        }
        idx = start + 2;
    }
    None
}

struct Frame {
    tag: Tag,
    /// Span of the opening token.
    span: Span,
    children: Vec<Node>,
}

struct Parser<'a> {
    source: &'a str,
    source_map: SourceMap,
    diagnostics: Vec<Diagnostic>,
    max_depth: usize,
    root: Vec<Node>,
    stack: Vec<Frame>,
    /// Per raw tag (`url`, `img`): an offset from which a search for the
    /// closing tag already failed.
    no_close_after: [Option<usize>; 2],
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, max_depth: usize) -> Self {
        Self {
            source,
            source_map: SourceMap::new(source),
            diagnostics: Vec::new(),
            max_depth,
            root: Vec::new(),
            stack: Vec::new(),
            no_close_after: [None, None],
        }
    }

    fn run(&mut self) -> Result<(), MarkupError> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut pos = 0;
        let mut text_start = 0;
        while pos < bytes.len() {
            if bytes[pos] != b'[' {
                pos += 1;
                continue;
            }
            let Some(token) = scan_token(source, pos) else {
                pos += 1;
                continue;
            };
            self.push_text(&source[text_start..pos]);
            pos = self.apply(token)?;
            text_start = pos;
        }
        self.push_text(&source[text_start..]);
        Ok(())
    }

    /// Applies one token and returns the offset where scanning resumes.
    fn apply(&mut self, token: Token<'_>) -> Result<usize, MarkupError> {
        match token.kind {
            TokenKind::Open { name, attr } => self.open(name, attr, token.span),
            TokenKind::Close(name) => {
                self.close(name, token.span);
                Ok(token.span.end)
            }
            TokenKind::Item => {
                self.item(token.span)?;
                Ok(token.span.end)
            }
        }
    }

    fn open(
        &mut self,
        name: TagName,
        attr: Option<&str>,
        span: Span,
    ) -> Result<usize, MarkupError> {
        let tag = match name {
            TagName::B => Tag::Bold,
            TagName::I => Tag::Italic,
            TagName::U => Tag::Underline,
            TagName::Center => Tag::Align(Align::Center),
            TagName::Left => Tag::Align(Align::Left),
            TagName::Right => Tag::Align(Align::Right),
            TagName::Indent => Tag::Indent,
            TagName::Quote => Tag::Quote,
            TagName::Table => Tag::Table,
            TagName::Tr => Tag::Row,
            TagName::Td => Tag::Cell,
            TagName::List => Tag::List,
            TagName::Color => match attr.filter(|value| is_valid_color(value)) {
                Some(value) => Tag::Color(value.to_string()),
                None => {
                    self.reject_attr(name, attr.unwrap_or_default(), span);
                    return Ok(span.end);
                }
            },
            TagName::Size => match attr.and_then(font_size_px) {
                Some(px) => Tag::Size(px),
                None => {
                    self.reject_attr(name, attr.unwrap_or_default(), span);
                    return Ok(span.end);
                }
            },
            TagName::Url => match attr {
                Some(href) => {
                    self.check_url(href, span);
                    Tag::Link {
                        href: href.to_string(),
                    }
                }
                None => return Ok(self.raw_content(name, span)),
            },
            TagName::Img => return Ok(self.raw_content(name, span)),
        };
        self.push_frame(tag, span)?;
        Ok(span.end)
    }

    /// `[url]target[/url]` and `[img]src[/img]` take their content verbatim.
    fn raw_content(&mut self, name: TagName, open: Span) -> usize {
        let source = self.source;
        let Some(close) = self.find_raw_closing(name, open.end) else {
            self.warn(
                open,
                W_TAG_UNCLOSED,
                format!("[{}] is never closed", name.as_str()),
            );
            self.push_literal(open);
            return open.end;
        };
        let span = open.cover(close);
        let target = source[open.end..close.start].trim();
        self.check_url(target, span);
        let element = match name {
            TagName::Img => Element {
                span,
                tag: Tag::Image {
                    src: target.to_string(),
                },
                children: Vec::new(),
            },
            _ => Element {
                span,
                tag: Tag::Link {
                    href: target.to_string(),
                },
                children: vec![Node::Text(target.to_string())],
            },
        };
        self.push_node(Node::Element(element));
        close.end
    }

    fn find_raw_closing(&mut self, name: TagName, from: usize) -> Option<Span> {
        let slot = usize::from(name == TagName::Img);
        if self.no_close_after[slot].is_some_and(|failed| failed <= from) {
            return None;
        }
        let found = find_closing(self.source, from, name.as_str());
        if found.is_none() {
            self.no_close_after[slot] = Some(from);
        }
        found
    }

    fn close(&mut self, name: TagName, span: Span) {
        let Some(index) = self
            .stack
            .iter()
            .rposition(|frame| frame.tag.name() == name.as_str())
        else {
            self.warn(
                span,
                W_TAG_UNMATCHED,
                format!("[/{}] has no matching opening tag", name.as_str()),
            );
            self.push_literal(span);
            return;
        };
        self.unwind_to(index + 1, span.start);
        if let Some(frame) = self.stack.pop() {
            self.close_frame(frame, span.end);
        }
    }

    fn item(&mut self, span: Span) -> Result<(), MarkupError> {
        let Some(index) = self.stack.iter().rposition(|frame| frame.tag == Tag::List) else {
            self.push_literal(span);
            return Ok(());
        };
        self.unwind_to(index + 1, span.start);
        self.push_frame(Tag::ListItem, span)
    }

    /// Pops frames above `len`. List items close implicitly at `at`; any other
    /// tag left open is demoted to text.
    fn unwind_to(&mut self, len: usize, at: usize) {
        while self.stack.len() > len {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            if frame.tag == Tag::ListItem {
                self.close_frame(frame, at);
            } else {
                self.demote(frame);
            }
        }
    }

    fn finish(&mut self) -> Markup {
        let end = self.source.len();
        while let Some(frame) = self.stack.pop() {
            if frame.tag == Tag::ListItem {
                self.close_frame(frame, end);
            } else {
                self.demote(frame);
            }
        }
        Markup {
            nodes: std::mem::take(&mut self.root),
        }
    }

    fn push_frame(&mut self, tag: Tag, span: Span) -> Result<(), MarkupError> {
        if self.stack.len() >= self.max_depth {
            return Err(MarkupError::NestingTooDeep {
                max_depth: self.max_depth,
                span,
            });
        }
        self.stack.push(Frame {
            tag,
            span,
            children: Vec::new(),
        });
        Ok(())
    }

    fn close_frame(&mut self, frame: Frame, end: usize) {
        let element = Element {
            span: Span::new(frame.span.start, end.max(frame.span.end)),
            tag: frame.tag,
            children: frame.children,
        };
        self.push_node(Node::Element(element));
    }

    /// Turns an unclosed frame back into its literal opening token followed
    /// by its children. Items of a demoted list get their `[*]` back.
    fn demote(&mut self, frame: Frame) {
        self.warn(
            frame.span,
            W_TAG_UNCLOSED,
            format!("[{}] is never closed", frame.tag.name()),
        );
        self.push_literal(frame.span);
        let restore_items = frame.tag == Tag::List;
        for child in frame.children {
            match child {
                Node::Element(Element {
                    tag: Tag::ListItem,
                    children,
                    ..
                }) if restore_items => {
                    self.push_node(Node::Text("[*]".to_string()));
                    for grandchild in children {
                        self.push_node(grandchild);
                    }
                }
                other => self.push_node(other),
            }
        }
    }

    fn push_literal(&mut self, span: Span) {
        let source = self.source;
        self.push_text(span.slice(source));
    }

    fn push_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.push_node(Node::Text(text.to_string()));
        }
    }

    fn push_node(&mut self, node: Node) {
        let nodes = match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        };
        match (nodes.last_mut(), node) {
            (Some(Node::Text(last)), Node::Text(text)) => last.push_str(&text),
            (_, node) => nodes.push(node),
        }
    }

    fn check_url(&mut self, target: &str, span: Span) {
        if !is_allowed_url(target) {
            self.warn(
                span,
                W_URL_REJECTED,
                format!("'{}' is not an absolute http(s) URL", target),
            );
        }
    }

    fn reject_attr(&mut self, name: TagName, value: &str, span: Span) {
        self.warn(
            span,
            W_ATTR_INVALID,
            format!("invalid {} value '{}'", name.as_str(), value),
        );
        self.push_literal(span);
    }

    fn warn(&mut self, span: Span, code: &'static str, message: String) {
        let range = self.source_map.range(span);
        self.diagnostics.push(Diagnostic::new(
            range,
            DiagnosticSeverity::Warning,
            code,
            message,
        ));
    }
}
