use crate::span::Span;

/// Parsed markup: a forest of text runs and recognised tag elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Markup {
    pub nodes: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub span: Span,
    pub tag: Tag,
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Tag {
    Bold,
    Italic,
    Underline,
    Align(Align),
    Indent,
    /// Validated CSS color: `#` plus hex digits, or a color name.
    Color(String),
    /// Font size in pixels, already clamped.
    Size(u32),
    Quote,
    /// Unvalidated link target; the emitter applies the scheme allow-list.
    Link {
        href: String,
    },
    Image {
        src: String,
    },
    Table,
    Row,
    Cell,
    List,
    ListItem,
}

impl Tag {
    /// Name used in the closing token, `[/name]`.
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Bold => "b",
            Tag::Italic => "i",
            Tag::Underline => "u",
            Tag::Align(align) => align.as_str(),
            Tag::Indent => "indent",
            Tag::Color(_) => "color",
            Tag::Size(_) => "size",
            Tag::Quote => "quote",
            Tag::Link { .. } => "url",
            Tag::Image { .. } => "img",
            Tag::Table => "table",
            Tag::Row => "tr",
            Tag::Cell => "td",
            Tag::List => "list",
            Tag::ListItem => "*",
        }
    }

    pub fn is_table_part(&self) -> bool {
        matches!(self, Tag::Table | Tag::Row | Tag::Cell)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Align {
    Center,
    Left,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Center => "center",
            Align::Left => "left",
            Align::Right => "right",
        }
    }
}
