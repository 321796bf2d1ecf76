//! Standalone preview pages for rendered forum posts.
//!
//! The page is meant for an isolated frame (`<iframe sandbox srcdoc=...>`):
//! it carries its own stylesheet and a Content-Security-Policy that forbids
//! scripts, so a fragment that somehow slipped past the renderer still cannot
//! execute.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

const BASE_CSS: &str = include_str!("../assets/postsmith.css");

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'none'; img-src http: https:; style-src 'unsafe-inline'";

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Clone)]
pub struct PreviewPage {
    theme: Theme,
    custom_vars: BTreeMap<String, String>,
}

impl PreviewPage {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            custom_vars: BTreeMap::new(),
        }
    }

    /// Overrides a CSS custom property, e.g. `--postsmith-link`. Keys that
    /// are not of the form `--[A-Za-z0-9_-]+` are ignored.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if is_custom_property(&key) {
            self.custom_vars.insert(key, value.into());
        }
        self
    }

    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        let (light_vars, dark_vars) = default_theme_vars();

        match self.theme {
            Theme::Auto => {
                out.push_str(&root_block(&light_vars, 0));
                out.push_str("@media (prefers-color-scheme: dark) {\n");
                out.push_str(&root_block(&dark_vars, 1));
                out.push_str("}\n");
            }
            Theme::Light => out.push_str(&root_block(&light_vars, 0)),
            Theme::Dark => out.push_str(&root_block(&dark_vars, 0)),
        }

        if !self.custom_vars.is_empty() {
            out.push_str(&root_block(&self.custom_vars, 0));
        }

        out.push_str(BASE_CSS);
        out
    }

    /// Wraps a rendered fragment in a complete, script-free HTML document.
    pub fn embed_html(&self, fragment: &str, with_inline_css: bool) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n");
        out.push_str("<html lang=\"en\">\n");
        out.push_str("<head>\n");
        out.push_str("  <meta charset=\"utf-8\" />\n");
        out.push_str("  <meta http-equiv=\"Content-Security-Policy\" content=\"");
        out.push_str(CONTENT_SECURITY_POLICY);
        out.push_str("\" />\n");
        out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
        if with_inline_css {
            out.push_str("  <style>\n");
            out.push_str(&self.stylesheet());
            out.push_str("  </style>\n");
        }
        out.push_str("</head>\n");
        out.push_str("<body>\n");
        out.push_str(fragment);
        if !fragment.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</body>\n");
        out.push_str("</html>\n");
        out
    }

    pub fn generate_files(&self, out_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join("postsmith.css"), self.stylesheet())
    }
}

impl Default for PreviewPage {
    fn default() -> Self {
        Self::new(Theme::Auto)
    }
}

fn default_theme_vars() -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let light = BTreeMap::from([
        ("--postsmith-bg".to_string(), "#f5f5f0".to_string()),
        ("--postsmith-fg".to_string(), "#222222".to_string()),
        ("--postsmith-link".to_string(), "#b22222".to_string()),
        ("--postsmith-border".to_string(), "#c8c8c0".to_string()),
        ("--postsmith-quote-bg".to_string(), "#ebebe4".to_string()),
        ("--postsmith-quote-border".to_string(), "#b22222".to_string()),
    ]);

    let dark = BTreeMap::from([
        ("--postsmith-bg".to_string(), "#17191c".to_string()),
        ("--postsmith-fg".to_string(), "#e4e4e0".to_string()),
        ("--postsmith-link".to_string(), "#ff7b6b".to_string()),
        ("--postsmith-border".to_string(), "#3a3d42".to_string()),
        ("--postsmith-quote-bg".to_string(), "#22252a".to_string()),
        ("--postsmith-quote-border".to_string(), "#ff7b6b".to_string()),
    ]);

    (light, dark)
}

fn is_custom_property(key: &str) -> bool {
    key.strip_prefix("--").is_some_and(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    })
}

fn root_block(vars: &BTreeMap<String, String>, depth: usize) -> String {
    let pad = "  ".repeat(depth);
    let mut out = String::new();
    out.push_str(&pad);
    out.push_str(":root {\n");
    for (key, value) in vars {
        out.push_str(&pad);
        out.push_str("  ");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&value.replace(['<', '>', ';', '{', '}'], ""));
        out.push_str(";\n");
    }
    out.push_str(&pad);
    out.push_str("}\n");
    out
}
