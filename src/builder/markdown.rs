//! Markdown rendering via comrak.
//!
//! The extension set below is a compatibility contract with existing post
//! content: autolinking stays off, and tables, fenced code blocks,
//! strikethrough, footnotes, underline, superscript and inline-highlight
//! stay on. Toggling any of these changes the rendered HTML of published
//! posts.
//!
//! comrak has no inline-highlight extension, so `==text==` is handled by
//! an AST pass over text nodes before formatting.

use crate::utils::escape_into;
use anyhow::{Context, Result};
use comrak::{
    Arena, format_html,
    nodes::{AstNode, NodeValue},
    options::Options,
    parse_document,
};

/// Fixed parser/render options for all posts.
pub fn markdown_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.autolink = false;
    ext.table = true;
    ext.strikethrough = true;
    ext.footnotes = true;
    ext.underline = true;
    ext.superscript = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    // Posts embed raw HTML (figures, scripts for demos); pass it through.
    render.r#unsafe = true;

    options
}

/// Render a markdown body to an HTML fragment.
pub fn render_markdown(markdown: &str) -> Result<String> {
    let options = markdown_options();
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &options);

    rewrite_inline_highlights(root);

    let mut html = String::with_capacity(markdown.len() * 2);
    format_html(root, &options, &mut html).context("Failed to format HTML")?;
    Ok(html)
}

/// Replace `==text==` spans in text nodes with `<mark>` elements.
///
/// Code spans and code blocks keep their content out of text nodes, so
/// fenced examples containing `==` are untouched.
fn rewrite_inline_highlights<'a>(root: &'a AstNode<'a>) {
    for node in root.descendants() {
        let highlighted = {
            let data = node.data.borrow();
            match data.value {
                NodeValue::Text(ref text) => highlight_spans(text),
                _ => None,
            }
        };
        if let Some(html) = highlighted {
            node.data.borrow_mut().value = NodeValue::HtmlInline(html);
        }
    }
}

/// Expand highlight delimiters in a single text run.
///
/// Returns `None` when the text contains no valid `==...==` pair; a valid
/// pair has non-empty content that doesn't start or end with whitespace.
/// The returned string is pre-escaped HTML.
fn highlight_spans(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    let mut replaced = false;

    while let Some(start) = rest.find("==") {
        let after = &rest[start + 2..];
        let valid = after.find("==").and_then(|len| {
            let inner = &after[..len];
            let ok = !inner.is_empty()
                && !inner.starts_with(char::is_whitespace)
                && !inner.ends_with(char::is_whitespace);
            ok.then_some((inner, len))
        });

        match valid {
            Some((inner, len)) => {
                escape_into(&mut out, &rest[..start]);
                out.push_str("<mark>");
                escape_into(&mut out, inner);
                out.push_str("</mark>");
                rest = &after[len + 2..];
                replaced = true;
            }
            None => {
                escape_into(&mut out, &rest[..start + 2]);
                rest = after;
            }
        }
    }

    if !replaced {
        return None;
    }
    escape_into(&mut out, rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_code_block() {
        let html = render_markdown("```c\nint main(void) { return 0; }\n```").unwrap();
        assert!(html.contains("<pre lang=\"c\"><code>"));
        assert!(html.contains("int main(void)"));
    }

    #[test]
    fn test_table() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_strikethrough() {
        let html = render_markdown("~~x~~").unwrap();
        assert!(html.contains("<del>x</del>"));
    }

    #[test]
    fn test_footnote() {
        let html = render_markdown("body[^1]\n\n[^1]: the note").unwrap();
        assert!(html.contains("footnote"));
        assert!(html.contains("the note"));
    }

    #[test]
    fn test_underline() {
        let html = render_markdown("__x__").unwrap();
        assert!(html.contains("<u>x</u>"));
    }

    #[test]
    fn test_superscript() {
        let html = render_markdown("e = mc^2^").unwrap();
        assert!(html.contains("<sup>2</sup>"));
    }

    #[test]
    fn test_inline_highlight() {
        let html = render_markdown("some ==marked text== here").unwrap();
        assert!(html.contains("<mark>marked text</mark>"));
    }

    #[test]
    fn test_highlight_skips_code_spans() {
        let html = render_markdown("`a == b` and ```\nx == y\n```").unwrap();
        assert!(!html.contains("<mark>"));
    }

    #[test]
    fn test_highlight_escapes_content() {
        let html = render_markdown("==a < b==").unwrap();
        assert!(html.contains("<mark>a &lt; b</mark>"));
    }

    #[test]
    fn test_unpaired_highlight_left_alone() {
        let html = render_markdown("a == b").unwrap();
        assert!(!html.contains("<mark>"));
        assert!(html.contains("a == b"));
    }

    #[test]
    fn test_autolink_disabled() {
        let html = render_markdown("visit https://example.com today").unwrap();
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let html = render_markdown("<figure>demo</figure>").unwrap();
        assert!(html.contains("<figure>demo</figure>"));
    }
}
