//! HTML minification.
//!
//! Thin wrapper over the `minify_html` crate with automatic
//! enable/disable based on `SiteConfig`.

use crate::config::SiteConfig;

/// Minify HTML output when `build.minify` is enabled.
pub fn minify_html(html: Vec<u8>, config: &SiteConfig) -> Vec<u8> {
    if !config.build.minify {
        return html;
    }
    minify_inner(&html)
}

fn minify_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_disabled_returns_input() {
        let mut config = SiteConfig::default();
        config.build.minify = false;

        let html = b"<html>  <body>  hi  </body>  </html>".to_vec();
        assert_eq!(minify_html(html.clone(), &config), html);
    }

    #[test]
    fn test_minify_enabled_shrinks() {
        let mut config = SiteConfig::default();
        config.build.minify = true;

        let html = b"<html>\n  <body>\n    <p>hi</p>\n  </body>\n</html>".to_vec();
        let out = minify_html(html.clone(), &config);
        assert!(out.len() < html.len());
    }

    #[test]
    fn test_minify_is_deterministic() {
        let mut config = SiteConfig::default();
        config.build.minify = true;

        let html = b"<html><body><p>same in, same out</p></body></html>".to_vec();
        assert_eq!(
            minify_html(html.clone(), &config),
            minify_html(html, &config)
        );
    }
}
