//! Layout templates with named insertion points.
//!
//! A layout is an HTML skeleton under the layouts directory
//! (`layouts/<name>.html`). Posts reference layouts by name; many posts
//! share one layout. Insertion points are `{{ title }}`, `{{ date }}`,
//! `{{ content }}` and `{{ site_title }}` (the index layout additionally
//! uses `{{ posts }}`).

use crate::builder::meta::{Post, PostError};
use crate::config::SiteConfig;
use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};

/// All layout templates, loaded read-only once per build and shared
/// across the parallel post builds.
#[derive(Debug, Default)]
pub struct Layouts {
    templates: HashMap<String, String>,
}

impl Layouts {
    /// Load every `*.html` file in the layouts directory.
    ///
    /// A missing directory yields an empty set: every post then fails
    /// with an unknown-layout error rather than the build aborting.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut templates = HashMap::new();
        if !dir.is_dir() {
            return Ok(Self { templates });
        }

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read layouts dir {}", dir.display()))?
        {
            let path = entry?.path();
            let is_layout = path.is_file() && path.extension().is_some_and(|ext| ext == "html");
            if !is_layout {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read layout {}", path.display()))?;
            templates.insert(name.to_string(), content);
        }

        Ok(Self { templates })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Merge a post's rendered body into its layout.
    pub fn render_post(
        &self,
        post: &Post,
        content: &str,
        config: &SiteConfig,
    ) -> Result<String, PostError> {
        let template = self.get(&post.layout).ok_or_else(|| {
            PostError::UnknownLayout(post.dir.clone(), post.layout.clone())
        })?;

        Ok(interpolate(
            template,
            &[
                ("title", &post.title),
                ("date", &post.date.format("%Y-%m-%d").to_string()),
                ("content", content),
                ("site_title", &config.base.title),
            ],
        ))
    }
}

/// Replace `{{ name }}` insertion points with their values.
///
/// Both spaced (`{{ title }}`) and tight (`{{title}}`) forms are
/// recognized. Unknown insertion points are left in place.
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out
            .replace(&format!("{{{{ {name} }}}}"), value)
            .replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn sample_post(layout: &str) -> Post {
        Post {
            dir: PathBuf::from("/posts/sample"),
            index: 1,
            title: "Sample".into(),
            date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            layout: layout.into(),
            output: PathBuf::from("sample.html"),
            body_path: PathBuf::from("/posts/sample/post.md"),
        }
    }

    #[test]
    fn test_interpolate_spaced_and_tight() {
        let out = interpolate(
            "<h1>{{ title }}</h1><div>{{content}}</div>",
            &[("title", "T"), ("content", "C")],
        );
        assert_eq!(out, "<h1>T</h1><div>C</div>");
    }

    #[test]
    fn test_interpolate_unknown_left_in_place() {
        let out = interpolate("{{ mystery }}", &[("title", "T")]);
        assert_eq!(out, "{{ mystery }}");
    }

    #[test]
    fn test_load_and_render() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("post.html"),
            "<title>{{ title }} - {{ site_title }}</title><time>{{ date }}</time>{{ content }}",
        )
        .unwrap();

        let layouts = Layouts::load(tmp.path()).unwrap();
        let mut config = SiteConfig::default();
        config.base.title = "My Blog".into();

        let html = layouts
            .render_post(&sample_post("post"), "<p>body</p>", &config)
            .unwrap();

        assert!(html.contains("<title>Sample - My Blog</title>"));
        assert!(html.contains("<time>2026-08-30</time>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_unknown_layout_is_post_error() {
        let tmp = TempDir::new().unwrap();
        let layouts = Layouts::load(tmp.path()).unwrap();
        let config = SiteConfig::default();

        let err = layouts
            .render_post(&sample_post("missing"), "x", &config)
            .unwrap_err();
        assert!(matches!(err, PostError::UnknownLayout(..)));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let layouts = Layouts::load(Path::new("/nonexistent/layouts")).unwrap();
        assert!(layouts.get("post").is_none());
    }

    #[test]
    fn test_non_html_files_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a layout").unwrap();
        fs::write(tmp.path().join("post.html"), "layout").unwrap();

        let layouts = Layouts::load(tmp.path()).unwrap();
        assert!(layouts.get("post").is_some());
        assert!(layouts.get("notes").is_none());
    }
}
