/// Escapes `& < > " '` and turns newlines into `<br>`. Carriage returns are
/// dropped so CRLF input renders like LF input.
pub(crate) fn push_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("<br>"),
            '\r' => {}
            _ => push_escaped_char(out, ch),
        }
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped_char(&mut out, ch);
    }
    out
}

fn push_escaped_char(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

/// Percent-encodes bytes that have no business in an attribute URL, then
/// escapes the result for a double-quoted attribute.
pub(crate) fn escape_url_attr(url: &str) -> String {
    let mut encoded = String::with_capacity(url.len());
    for &byte in url.as_bytes() {
        match byte {
            b' ' => encoded.push_str("%20"),
            b'\\' => encoded.push_str("%5C"),
            0x00..=0x1F | 0x7F..=0xFF => encoded.push_str(&format!("%{:02X}", byte)),
            _ => encoded.push(byte as char),
        }
    }
    escape_html(&encoded)
}

/// Only absolute `http://` and `https://` targets are allowed.
pub fn is_allowed_url(url: &str) -> bool {
    let url = url.trim();
    if url.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return false;
    }
    let rest = strip_prefix_ignore_case(url, "https://")
        .or_else(|| strip_prefix_ignore_case(url, "http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_allow_list() {
        assert!(is_allowed_url("https://example.com/a?b=c&d"));
        assert!(is_allowed_url("HTTP://Example.com"));
        assert!(is_allowed_url("  https://example.com  "));
        assert!(!is_allowed_url("javascript:alert(1)"));
        assert!(!is_allowed_url("/relative/path"));
        assert!(!is_allowed_url("//evil.example"));
        assert!(!is_allowed_url(""));
        assert!(!is_allowed_url("https://"));
        assert!(!is_allowed_url("https:///path"));
        assert!(!is_allowed_url("https://a b"));
        assert!(!is_allowed_url("data:text/html,hi"));
    }

    #[test]
    fn escapes_each_metacharacter_once() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn url_attr_is_encoded() {
        assert_eq!(escape_url_attr("https://a/b c?x=\"1\"&y"), "https://a/b%20c?x=&quot;1&quot;&amp;y");
    }
}
