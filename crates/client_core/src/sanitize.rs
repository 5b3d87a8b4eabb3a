//! Sanitization for backend-supplied answer markup.

use std::{collections::HashSet, fmt};

pub const LINK_REL: &str = "noopener noreferrer";

/// Markup that has been through [`sanitize_html`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedHtml(String);

impl SanitizedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SanitizedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips scripts, event handlers and non-web URLs; keeps structural and formatting tags.
pub fn sanitize_html(raw: &str) -> SanitizedHtml {
    let schemes: HashSet<&str> = ["http", "https", "mailto"].into_iter().collect();
    let cleaned = ammonia::Builder::default()
        .url_schemes(schemes)
        .link_rel(Some(LINK_REL))
        .clean(raw)
        .to_string();
    SanitizedHtml(cleaned)
}

/// Escapes text for use in element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
