use std::panic;

use postsmith_core::{RenderOptions, parse_markup, render, render_markup_sanitized};

const CASES: usize = 300;
const MAX_PIECES: usize = 48;
const PIECES: &[&str] = &[
    "[b]", "[/b]", "[i]", "[/i]", "[u]", "[/u]", "[B]", "[/B]",
    "[center]", "[/center]", "[indent]", "[/indent]",
    "[color=red]", "[color=#fff]", "[color=red;x]", "[/color]",
    "[size=3]", "[size=x]", "[/size]",
    "[quote]", "[quote=A]", "[/quote]",
    "[url=", "[url]", "[URL]", "[/url]", "[img]", "[/img]",
    "[table]", "[/table]", "[tr]", "[/tr]", "[td]", "[/td]",
    "[list]", "[/list]", "[*]", "[", "]", "=",
    "javascript:alert(1)", "JaVaScRiPt:x", "https://ok.test/", "http://a.b/c?d=1&e=2",
    "<script>", "</script>", "\" onerror=\"x", "'", "&", "<", ">",
    "\n", "\r\n", " ", "text", "é",
];

// Tags the renderer itself produces; anything else after `<` is a leak.
const ALLOWED_TAGS: &[&str] = &[
    "strong>", "/strong>", "em>", "/em>", "u>", "/u>",
    "div style=\"", "/div>", "span>", "span style=\"", "/span>",
    "blockquote>", "/blockquote>", "a href=\"http", "/a>", "img src=\"http",
    "table>", "/table>", "tr>", "/tr>", "td>", "/td>",
    "ul>", "/ul>", "li>", "/li>", "br>",
];

const ENTITIES: &[&str] = &["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

#[test]
fn parser_never_panics_on_random_markup() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x5eed_0f_b0b0_2024);
    for case in 0..CASES {
        let source = random_markup(&mut rng);
        let result = panic::catch_unwind(|| parse_markup(&source));
        if result.is_err() {
            return Err(format!("parse panicked for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

#[test]
fn rendered_html_only_contains_renderer_tags() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x7a11_0c4e_9d21_e5f3);
    for case in 0..CASES {
        let source = random_markup(&mut rng);
        let html = render(&source, &RenderOptions::default()).html;
        if let Err(message) = check_html(&html) {
            return Err(format!(
                "case {}: {}\nSource: {:?}\nHTML: {:?}",
                case, message, source, html
            )
            .into());
        }
    }
    Ok(())
}

#[test]
fn sanitized_html_never_carries_scripts() {
    let mut rng = Lcg::new(0x0dd_ba11_cafe_f00d);
    for _ in 0..CASES / 3 {
        let source = random_markup(&mut rng);
        let html = render_markup_sanitized(&source).to_ascii_lowercase();
        assert!(!html.contains("<script"), "{html}");
        assert!(!html.contains("href=\"javascript"), "{html}");
        assert!(!html.contains("src=\"javascript"), "{html}");
    }
}

fn check_html(html: &str) -> Result<(), String> {
    let mut rest = html;
    while let Some(idx) = rest.find(['<', '&']) {
        let tail = &rest[idx + 1..];
        if rest[idx..].starts_with('&') {
            if !ENTITIES.iter().any(|entity| rest[idx..].starts_with(entity)) {
                return Err(format!("bare ampersand at {:?}", &rest[idx..]));
            }
        } else {
            if !ALLOWED_TAGS.iter().any(|tag| tail.starts_with(tag)) {
                return Err(format!("unexpected tag at {:?}", &rest[idx..]));
            }
            let end = tail.find('>').ok_or("unterminated tag")?;
            let tag = &tail[..end];
            // Attribute values are quoted; outside the quotes there must be no
            // event handler attribute.
            let unquoted: String = tag.split('"').step_by(2).collect();
            if unquoted.to_ascii_lowercase().contains(" on") {
                return Err(format!("event handler in tag {:?}", tag));
            }
            if tag.matches('"').count() % 2 != 0 {
                return Err(format!("unbalanced quotes in tag {:?}", tag));
            }
        }
        rest = tail;
    }
    Ok(())
}

fn random_markup(rng: &mut Lcg) -> String {
    let pieces = rng.gen_range(0, MAX_PIECES + 1);
    let mut out = String::new();
    for _ in 0..pieces {
        let idx = rng.gen_range(0, PIECES.len());
        out.push_str(PIECES.get(idx).copied().unwrap_or(" "));
    }
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = max - min;
        let value = (self.next() >> 33) as usize;
        min + (value % span)
    }
}
