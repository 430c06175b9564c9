//! HTML allowlist filtering.
//!
//! Untrusted markup is parsed and rebuilt against a strict allowlist.
//! Disallowed tags and attributes disappear while their text content
//! survives; anchors are pinned to http(s) and forced to
//! `rel="nofollow noreferrer noopener" target="_blank"`.

use scraper::node::Node;
use scraper::Html;
use std::collections::HashSet;
use std::sync::OnceLock;

struct Policy {
    tags: HashSet<&'static str>,
    void_tags: HashSet<&'static str>,
}

/// Built once on first use, never mutated.
fn policy() -> &'static Policy {
    static POLICY: OnceLock<Policy> = OnceLock::new();
    POLICY.get_or_init(|| Policy {
        tags: [
            "b", "blockquote", "br", "code", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
            "i", "li", "ol", "p", "pre", "strong", "sub", "sup", "table", "tbody", "td", "th",
            "thead", "tr", "ul", "a", "img",
        ]
        .into_iter()
        .collect(),
        void_tags: ["br", "hr", "img"].into_iter().collect(),
    })
}

/// Rebuild `input` keeping only allowlisted tags and attributes.
pub fn filter_html_tags(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    for child in fragment.root_element().children() {
        render(child, &mut out);
    }
    out
}

fn render(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(element) => {
            let name = element.name();
            let allowed = policy().tags.contains(name);
            if allowed {
                out.push('<');
                out.push_str(name);
                render_attributes(name, &element, out);
                out.push('>');
            }
            for child in node.children() {
                render(child, out);
            }
            if allowed && !policy().void_tags.contains(name) {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        // Comments, doctypes and processing instructions vanish; their
        // children (if any) are still walked.
        _ => {
            for child in node.children() {
                render(child, out);
            }
        }
    }
}

fn render_attributes(name: &str, element: &scraper::node::Element, out: &mut String) {
    match name {
        "a" => {
            if let Some(href) = element.attr("href")
                && has_web_scheme(href)
            {
                push_attr(out, "href", href);
            }
            push_attr(out, "rel", "nofollow noreferrer noopener");
            push_attr(out, "target", "_blank");
        }
        "img" => {
            for key in ["src", "alt", "title"] {
                if let Some(value) = element.attr(key) {
                    push_attr(out, key, value);
                }
            }
        }
        _ => {}
    }
}

fn has_web_scheme(href: &str) -> bool {
    let lower = href.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn push_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape_attr(value));
    out.push('"');
}

fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
