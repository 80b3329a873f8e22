//! Sanitize untrusted summarizer markup before it reaches a renderer.
//!
//! The summarization service is an external text generator; whatever it
//! returns is treated as hostile. Script-, style-, and embed-bearing
//! elements are removed wholesale (content included), void metadata tags
//! are dropped, and inline event handlers are stripped. Ordinary
//! formatting markup (`<p>`, `<ul>`, `<strong>`, …) passes through.

use std::sync::LazyLock;

use regex::Regex;

/// Elements removed together with their content.
const BLOCKED_CONTAINERS: [&str; 5] = ["script", "style", "iframe", "object", "embed"];

static BLOCKED_WITH_CONTENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLOCKED_CONTAINERS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap()
        })
        .collect()
});

/// Leftover opening/closing tags of blocked containers (unclosed markup).
static BLOCKED_STRAY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLOCKED_CONTAINERS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)</?{tag}\b[^>]*>")).unwrap())
        .collect()
});

/// Void metadata tags with no place in a chat bubble.
static BLOCKED_VOID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(?:link|meta|base)\b[^>]*>").unwrap());

/// Inline event handlers (`onclick="…"`, `onload='…'`).
static EVENT_HANDLERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});

/// Strip dangerous markup from externally produced HTML.
pub fn sanitize_html(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut clean = raw.to_string();
    for pattern in BLOCKED_WITH_CONTENT.iter() {
        clean = pattern.replace_all(&clean, "").into_owned();
    }
    for pattern in BLOCKED_STRAY.iter() {
        clean = pattern.replace_all(&clean, "").into_owned();
    }
    clean = BLOCKED_VOID.replace_all(&clean, "").into_owned();
    clean = EVENT_HANDLERS.replace_all(&clean, "").into_owned();
    clean.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_with_content() {
        let raw = "<p>Before</p><script>alert('x')</script><p>After</p>";
        assert_eq!(sanitize_html(raw), "<p>Before</p><p>After</p>");
    }

    #[test]
    fn strips_style_and_iframe() {
        let raw = "<style>p{color:red}</style><iframe src=\"https://evil.example\"></iframe>ok";
        assert_eq!(sanitize_html(raw), "ok");
    }

    #[test]
    fn strips_unclosed_script_tag() {
        let raw = "fine <script src=\"x.js\"> trailing";
        assert!(!sanitize_html(raw).contains("<script"));
    }

    #[test]
    fn strips_meta_and_link() {
        let raw = "<meta charset=\"utf-8\"><link rel=\"stylesheet\" href=\"x.css\">text";
        assert_eq!(sanitize_html(raw), "text");
    }

    #[test]
    fn strips_inline_event_handlers() {
        let raw = "<p onclick=\"steal()\">hello</p>";
        assert_eq!(sanitize_html(raw), "<p>hello</p>");
    }

    #[test]
    fn keeps_ordinary_formatting() {
        let raw = "<p><strong>Summary</strong></p><ul><li>Rest</li><li>Fluids</li></ul>";
        assert_eq!(sanitize_html(raw), raw);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_html(""), "");
    }

    #[test]
    fn tag_case_is_ignored() {
        let raw = "<SCRIPT>alert(1)</SCRIPT>safe";
        assert_eq!(sanitize_html(raw), "safe");
    }
}
