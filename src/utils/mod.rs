//! Small shared utilities.

pub mod minify;

/// Append `text` to `out` with the HTML special characters escaped.
///
/// Used wherever post-supplied text lands in generated markup outside
/// comrak's own escaper.
pub fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_into() {
        let mut out = String::new();
        escape_into(&mut out, r#"<a href="x">&"#);
        assert_eq!(out, "&lt;a href=&quot;x&quot;&gt;&amp;");
    }
}
