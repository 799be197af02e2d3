//! Post building pipeline.
//!
//! One directory per post in, one HTML file out:
//!
//! ```text
//! posts/<dir>/post.toml ──┐
//! posts/<dir>/post.md  ───┼──▶ render markdown ──▶ merge into layout ──▶ output/<output>
//! layouts/<name>.html ────┘
//! ```
//!
//! Posts are independent; the orchestration in `crate::build` runs this
//! pipeline for every post in parallel.

pub mod assets;
pub mod layout;
pub mod markdown;
pub mod meta;

use crate::{
    config::SiteConfig,
    log,
    utils::{escape_into, minify::minify_html},
};
use anyhow::{Context, Result};
use layout::{Layouts, interpolate};
use meta::{Post, PostError};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Collect the immediate subdirectories of the posts root.
///
/// A missing or unreadable posts root is fatal to the build.
pub fn collect_post_dirs(posts_root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(posts_root)
        .with_context(|| format!("Failed to read posts dir {}", posts_root.display()))?;

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    Ok(dirs)
}

/// Build a single post end to end.
///
/// Returns `Ok(None)` when the directory isn't a post (no `post.toml`).
/// The output file is written in one shot after the full render, so a
/// failure never leaves a partially written file behind.
pub fn build_post(
    dir: &Path,
    layouts: &Layouts,
    config: &SiteConfig,
) -> Result<Option<Post>> {
    let Some(post) = Post::from_dir(dir, config)? else {
        return Ok(None);
    };

    let body = fs::read_to_string(&post.body_path)
        .map_err(|err| PostError::Io(post.body_path.clone(), err))?;
    let content = markdown::render_markdown(&body)?;
    let html = layouts.render_post(&post, &content, config)?;
    let html = minify_html(html.into_bytes(), config);

    let target = post.output_path(config);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&target, &html)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    log!("post"; "#{} {}", post.index, post.output.display());
    Ok(Some(post))
}

/// Generate the index listing document from built posts.
///
/// Posts are listed newest-first by their `index` ordering key. Returns
/// `false` (without error) when no index layout exists.
pub fn write_index_listing(
    posts: &[Post],
    layouts: &Layouts,
    config: &SiteConfig,
) -> Result<bool> {
    let Some(template) = layouts.get(&config.build.index_layout) else {
        return Ok(false);
    };

    let mut ordered: Vec<&Post> = posts.iter().collect();
    ordered.sort_by(|a, b| b.index.cmp(&a.index));

    let items: Vec<String> = ordered
        .iter()
        .map(|post| {
            format!(
                r#"<li><a href="{}">{}</a> <time datetime="{date}">{date}</time></li>"#,
                post.href(),
                escape_text(&post.title),
                date = post.date.format("%Y-%m-%d"),
            )
        })
        .collect();

    let html = interpolate(
        template,
        &[
            ("posts", &items.join("\n")),
            ("site_title", &config.base.title),
            ("title", &config.base.title),
        ],
    );
    let html = minify_html(html.into_bytes(), config);

    let target = config.build.output.join("index.html");
    fs::write(&target, &html)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    Ok(true)
}

/// Escape text dropped into generated listing markup.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}
