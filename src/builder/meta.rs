//! Post metadata loading from `post.toml`.
//!
//! Each immediate subdirectory of the posts root that contains a `post.toml`
//! is a post. Recognized keys: `index`, `title`, `date`, `layout`, `output`.
//! Only `output` is required; the rest fall back to documented defaults.

use crate::config::SiteConfig;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

/// Metadata file name inside a post directory.
pub const META_FILE: &str = "post.toml";

/// Preferred body file name. Falls back to the sole `*.md` file.
pub const BODY_FILE: &str = "post.md";

/// Title used when the metadata doesn't supply one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Per-post errors. These abort only the offending post, never the
/// whole build.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("failed to read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse `{0}`")]
    Meta(PathBuf, #[source] toml::de::Error),

    #[error("`{0}` is missing the required `output` field")]
    MissingOutput(PathBuf),

    #[error("`{0}` must be a relative path without `..` components")]
    InvalidOutput(PathBuf),

    #[error("no markdown body file in `{0}`")]
    MissingBody(PathBuf),

    #[error("multiple markdown files in `{0}`, name one `post.md`")]
    AmbiguousBody(PathBuf),

    #[error("invalid date `{1}` in `{0}` (expected YYYY-MM-DD)")]
    Date(PathBuf, String),

    #[error("unknown layout `{1}` referenced by `{0}`")]
    UnknownLayout(PathBuf, String),
}

/// Raw `post.toml` contents as written by the author.
///
/// Dates may be TOML datetimes (`date = 2026-08-30`) or strings
/// (`date = "2026-08-30"`), hence the loose `toml::Value` field.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMeta {
    index: Option<u32>,
    title: Option<String>,
    date: Option<toml::Value>,
    layout: Option<String>,
    output: Option<PathBuf>,
}

/// A post resolved from its directory, with defaults applied.
#[derive(Debug, Clone)]
pub struct Post {
    /// Source directory of the post.
    pub dir: PathBuf,
    /// Ordering key. Unique across posts (duplicates are warned about).
    pub index: u32,
    pub title: String,
    pub date: NaiveDate,
    /// Layout name, resolved against the layouts directory.
    pub layout: String,
    /// Output path relative to the output directory. Required.
    pub output: PathBuf,
    /// Path of the markdown body file.
    pub body_path: PathBuf,
}

impl Post {
    /// Load a post from its directory.
    ///
    /// Returns `Ok(None)` when the directory has no `post.toml` (it is
    /// not a post, e.g. a stray folder). All other failures are reported
    /// as `PostError` naming the offending path.
    pub fn from_dir(dir: &Path, config: &SiteConfig) -> Result<Option<Self>, PostError> {
        let meta_path = dir.join(META_FILE);
        if !meta_path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&meta_path)
            .map_err(|err| PostError::Io(meta_path.clone(), err))?;
        let raw: RawMeta =
            toml::from_str(&content).map_err(|err| PostError::Meta(meta_path.clone(), err))?;

        let output = raw
            .output
            .ok_or_else(|| PostError::MissingOutput(meta_path.clone()))?;
        validate_output(&output)?;

        let date = match raw.date {
            Some(value) => parse_date(&value)
                .ok_or_else(|| PostError::Date(meta_path.clone(), value.to_string()))?,
            None => Local::now().date_naive(),
        };

        Ok(Some(Self {
            dir: dir.to_path_buf(),
            index: raw.index.unwrap_or(0),
            title: raw.title.unwrap_or_else(|| DEFAULT_TITLE.into()),
            date,
            layout: raw
                .layout
                .unwrap_or_else(|| config.build.default_layout.clone()),
            output,
            body_path: find_body(dir)?,
        }))
    }

    /// Absolute output path under the configured output directory.
    pub fn output_path(&self, config: &SiteConfig) -> PathBuf {
        config.build.output.join(&self.output)
    }

    /// Href of this post relative to the site root, for the index listing.
    pub fn href(&self) -> String {
        format!("/{}", self.output.display())
    }
}

/// Output paths must stay inside the output directory.
fn validate_output(output: &Path) -> Result<(), PostError> {
    let escapes = output.is_absolute()
        || output
            .components()
            .any(|c| matches!(c, Component::ParentDir));

    if escapes || output.as_os_str().is_empty() {
        return Err(PostError::InvalidOutput(output.to_path_buf()));
    }
    Ok(())
}

/// Locate the markdown body file of a post directory.
///
/// `post.md` wins; otherwise the directory must contain exactly one
/// `*.md` file.
fn find_body(dir: &Path) -> Result<PathBuf, PostError> {
    let preferred = dir.join(BODY_FILE);
    if preferred.is_file() {
        return Ok(preferred);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| PostError::Io(dir.to_path_buf(), err))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();

    match candidates.len() {
        0 => Err(PostError::MissingBody(dir.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        _ => Err(PostError::AmbiguousBody(dir.to_path_buf())),
    }
}

fn parse_date(value: &toml::Value) -> Option<NaiveDate> {
    match value {
        toml::Value::Datetime(dt) => {
            let date = dt.date?;
            NaiveDate::from_ymd_opt(
                i32::from(date.year),
                u32::from(date.month),
                u32::from(date.day),
            )
        }
        toml::Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    }
}
