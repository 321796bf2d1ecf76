use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};
use tracing::debug;

use crate::ast::{Element, Markup, Node, Tag};
use crate::escape::{escape_html, escape_url_attr, is_allowed_url, push_escaped_text};
use crate::parser::DEFAULT_MAX_DEPTH;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderOptions {
    /// Deepest tag nesting accepted before rendering falls back to plain text.
    pub max_depth: usize,
    /// Open links in a new browsing context.
    pub link_new_tab: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            link_new_tab: true,
        }
    }
}

/// Emits HTML for parsed markup. Text is escaped; only the renderer's own
/// elements appear unescaped.
pub fn emit_html(markup: &Markup, options: &RenderOptions) -> String {
    let mut writer = HtmlWriter {
        out: String::new(),
        options,
    };
    writer.nodes(&markup.nodes, None);
    writer.out
}

/// Emits HTML and passes it through an allow-list sanitizer matching the
/// emitter's own element set.
pub fn emit_html_sanitized(markup: &Markup, options: &RenderOptions) -> String {
    sanitize(&emit_html(markup, options))
}

pub(crate) fn sanitize(html: &str) -> String {
    let tags: HashSet<&'static str> = [
        "a",
        "blockquote",
        "br",
        "div",
        "em",
        "img",
        "li",
        "span",
        "strong",
        "table",
        "td",
        "tr",
        "u",
        "ul",
    ]
    .iter()
    .copied()
    .collect();

    let mut tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "target"].iter().copied().collect());
    tag_attributes.insert("img", ["src", "alt"].iter().copied().collect());
    tag_attributes.insert("div", ["style"].iter().copied().collect());
    tag_attributes.insert("span", ["style"].iter().copied().collect());

    let url_schemes: HashSet<&'static str> = ["http", "https"].iter().copied().collect();

    Builder::new()
        .tags(tags)
        .generic_attributes(HashSet::new())
        .tag_attributes(tag_attributes)
        .url_schemes(url_schemes)
        .url_relative(UrlRelative::Deny)
        .clean(html)
        .to_string()
}

/// Plain-text rendering: tags dropped, link text kept, images dropped, list
/// items on their own lines.
pub fn emit_plain_text(markup: &Markup) -> String {
    let mut out = String::new();
    plain_nodes(&mut out, &markup.nodes);
    out.trim().to_string()
}

struct HtmlWriter<'o> {
    out: String,
    options: &'o RenderOptions,
}

impl HtmlWriter<'_> {
    fn nodes(&mut self, nodes: &[Node], parent: Option<&Tag>) {
        for (idx, node) in nodes.iter().enumerate() {
            match node {
                Node::Text(text) => {
                    let prev = idx.checked_sub(1).and_then(|prev| nodes.get(prev));
                    let next = nodes.get(idx + 1);
                    let text = shape_text(text, parent, prev, next);
                    push_escaped_text(&mut self.out, text);
                }
                Node::Element(element) => self.element(element),
            }
        }
    }

    fn element(&mut self, element: &Element) {
        let close = match &element.tag {
            Tag::Bold => self.open("<strong>", "</strong>"),
            Tag::Italic => self.open("<em>", "</em>"),
            Tag::Underline => self.open("<u>", "</u>"),
            Tag::Align(align) => {
                self.out.push_str("<div style=\"text-align:");
                self.out.push_str(align.as_str());
                self.out.push_str("\">");
                "</div>"
            }
            Tag::Indent => self.open("<div style=\"padding-left:2em\">", "</div>"),
            Tag::Color(color) => {
                self.out.push_str("<span style=\"color:");
                self.out.push_str(&escape_html(color));
                self.out.push_str("\">");
                "</span>"
            }
            Tag::Size(px) => {
                self.out
                    .push_str(&format!("<span style=\"font-size:{}px\">", px));
                "</span>"
            }
            Tag::Quote => self.open("<blockquote>", "</blockquote>"),
            Tag::Link { href } => {
                if is_allowed_url(href) {
                    self.out.push_str("<a href=\"");
                    self.out.push_str(&escape_url_attr(href.trim()));
                    self.out.push('"');
                    if self.options.link_new_tab {
                        self.out
                            .push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
                    }
                    self.out.push('>');
                    "</a>"
                } else {
                    debug!(href = %href, "dropping link target outside the allow-list");
                    self.open("<span>", "</span>")
                }
            }
            Tag::Image { src } => {
                if is_allowed_url(src) {
                    self.out.push_str("<img src=\"");
                    self.out.push_str(&escape_url_attr(src.trim()));
                    self.out.push_str("\" alt=\"\">");
                } else {
                    debug!(src = %src, "dropping image outside the allow-list");
                }
                return;
            }
            Tag::Table => self.open("<table>", "</table>"),
            Tag::Row => self.open("<tr>", "</tr>"),
            Tag::Cell => self.open("<td>", "</td>"),
            Tag::List => {
                // Text before the first item has no place inside `<ul>`.
                let first_item = element
                    .children
                    .iter()
                    .position(|child| child.as_element().is_some_and(|el| el.tag == Tag::ListItem))
                    .unwrap_or(element.children.len());
                let (intro, items) = element.children.split_at(first_item);
                self.nodes(intro, Some(&Tag::List));
                self.out.push_str("<ul>");
                self.nodes(items, Some(&Tag::List));
                self.out.push_str("</ul>");
                return;
            }
            Tag::ListItem => self.open("<li>", "</li>"),
        };
        self.nodes(&element.children, Some(&element.tag));
        self.out.push_str(close);
    }

    fn open(&mut self, open: &str, close: &'static str) -> &'static str {
        self.out.push_str(open);
        close
    }
}

/// Whitespace rules that depend on where a text run sits.
///
/// Whitespace-only runs directly inside lists, tables and rows are dropped;
/// list items and text ahead of a list's first item are trimmed at both ends;
/// newline padding next to table parts is collapsed.
fn shape_text<'t>(
    text: &'t str,
    parent: Option<&Tag>,
    prev: Option<&Node>,
    next: Option<&Node>,
) -> &'t str {
    let mut text = text;
    match parent {
        Some(Tag::List | Tag::Table | Tag::Row) if text.trim().is_empty() => return "",
        Some(Tag::List) => text = text.trim(),
        Some(Tag::ListItem) => {
            if prev.is_none() {
                text = text.trim_start();
            }
            if next.is_none() {
                text = text.trim_end();
            }
        }
        Some(Tag::Cell) => {
            if prev.is_none() {
                text = trim_break_start(text);
            }
            if next.is_none() {
                text = trim_break_end(text);
            }
        }
        _ => {}
    }
    if prev.is_some_and(is_table_part) {
        text = trim_break_start(text);
    }
    if next.is_some_and(is_table_part) {
        text = trim_break_end(text);
    }
    text
}

fn is_table_part(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|element| element.tag.is_table_part())
}

fn is_padding(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// Strips leading padding, but only when it contains a line break.
fn trim_break_start(text: &str) -> &str {
    let trimmed = text.trim_start_matches(is_padding);
    let padding = &text[..text.len() - trimmed.len()];
    if padding.contains('\n') { trimmed } else { text }
}

fn trim_break_end(text: &str) -> &str {
    let trimmed = text.trim_end_matches(is_padding);
    let padding = &text[trimmed.len()..];
    if padding.contains('\n') { trimmed } else { text }
}

fn plain_nodes(out: &mut String, nodes: &[Node]) {
    for (idx, node) in nodes.iter().enumerate() {
        match node {
            Node::Text(text) => out.push_str(&text.replace('\r', "")),
            Node::Element(element) if is_plain_block(&element.tag) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                plain_element(out, element);
                let next_starts_line = match nodes.get(idx + 1) {
                    None => true,
                    Some(Node::Text(text)) => text.trim_start_matches('\r').starts_with('\n'),
                    Some(Node::Element(_)) => false,
                };
                if !next_starts_line {
                    out.push('\n');
                }
            }
            Node::Element(element) => plain_element(out, element),
        }
    }
}

/// Elements whose plain text spans whole lines.
fn is_plain_block(tag: &Tag) -> bool {
    matches!(tag, Tag::List | Tag::Table)
}

fn plain_element(out: &mut String, element: &Element) {
    match &element.tag {
        Tag::Image { .. } => {}
        Tag::List => {
            let mut intro = String::new();
            let mut lines: Vec<String> = Vec::new();
            for child in &element.children {
                match child {
                    Node::Element(item) if item.tag == Tag::ListItem => {
                        let mut text = String::new();
                        plain_nodes(&mut text, &item.children);
                        lines.push(format!("- {}", text.trim()));
                    }
                    other if lines.is_empty() => {
                        plain_nodes(&mut intro, std::slice::from_ref(other));
                    }
                    _ => {}
                }
            }
            let intro = intro.trim();
            if !intro.is_empty() {
                lines.insert(0, intro.to_string());
            }
            out.push_str(&lines.join("\n"));
        }
        Tag::Row => {
            let cells: Vec<String> = element
                .children
                .iter()
                .filter_map(Node::as_element)
                .map(|cell| {
                    let mut text = String::new();
                    plain_element(&mut text, cell);
                    text.trim().to_string()
                })
                .collect();
            out.push_str(&cells.join(" | "));
        }
        Tag::Table => {
            let rows: Vec<String> = element
                .children
                .iter()
                .filter_map(Node::as_element)
                .map(|row| {
                    let mut text = String::new();
                    plain_element(&mut text, row);
                    text
                })
                .collect();
            out.push_str(&rows.join("\n"));
        }
        _ => plain_nodes(out, &element.children),
    }
}
