//! Static asset copying.
//!
//! Files under the assets directory are copied verbatim into
//! `output/assets/`, preserving their relative paths. Assets have no
//! cross-dependencies, so they copy in parallel alongside the posts.

use crate::config::SiteConfig;
use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use walkdir::WalkDir;

/// Subdirectory of the output tree that receives assets. The server
/// applies the long-cache policy to this prefix.
pub const ASSETS_PREFIX: &str = "assets";

/// Collect all regular files under a directory (recursively).
///
/// Returns an empty list when the directory doesn't exist.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Copy one asset file into the output tree.
pub fn copy_asset(path: &Path, config: &SiteConfig) -> Result<()> {
    let relative = path
        .strip_prefix(&config.build.assets)
        .with_context(|| format!("Asset outside assets dir: {}", path.display()))?;
    let target = config.build.output.join(ASSETS_PREFIX).join(relative);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(path, &target)
        .with_context(|| format!("Failed to copy {}", path.display()))?;

    Ok(())
}
