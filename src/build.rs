//! Site building orchestration.
//!
//! Coordinates post building and asset copying.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── Layouts::load() ──────► read-only templates, shared by all posts
//!     │
//!     ├── rayon::join
//!     │    ├── posts: par_iter ─► build_post() per directory, failures isolated
//!     │    └── assets: par_iter ► copy_asset() verbatim into output/assets
//!     │
//!     └── write_index_listing() ► index.html from the `index` layout
//! ```
//!
//! Per-post failures are reported and counted but never stop the other
//! posts; the build returns an error at the end so the process exit code
//! can gate deployment. Filesystem failures on the output root are fatal
//! immediately.

use crate::{
    builder::{
        assets::{collect_files, copy_asset},
        build_post, collect_post_dirs,
        layout::Layouts,
        meta::Post,
        write_index_listing,
    },
    config::SiteConfig,
    log,
};
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::{collections::HashMap, fs, path::Path};

/// Build the entire site, processing posts and assets in parallel.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    prepare_output(&config.build.output, config.build.clean)?;

    let layouts = Layouts::load(&config.build.layouts)?;
    let post_dirs = collect_post_dirs(&config.build.posts)?;
    let asset_files = collect_files(&config.build.assets);

    log!("build"; "{} post dirs, {} assets", post_dirs.len(), asset_files.len());

    let (post_results, assets_result) = rayon::join(
        || {
            post_dirs
                .par_iter()
                .map(|dir| (dir.as_path(), build_post(dir, &layouts, config)))
                .collect::<Vec<_>>()
        },
        || {
            asset_files
                .par_iter()
                .try_for_each(|path| copy_asset(path, config))
        },
    );

    // Asset copy failures are filesystem errors: fatal.
    assets_result?;

    let mut posts = Vec::new();
    let mut failed = 0usize;
    for (dir, result) in post_results {
        match result {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => {}
            Err(err) => {
                failed += 1;
                log!("error"; "{}: {:#}", dir.display(), err);
            }
        }
    }

    warn_duplicate_indices(&posts);
    write_index_listing(&posts, &layouts, config)?;

    if failed > 0 {
        log!("build"; "{} built, {} failed", posts.len(), failed);
        bail!("{failed} post(s) failed to build");
    }

    log!("build"; "{} built", posts.len());
    Ok(())
}

/// Ensure the output directory exists, clearing it first when requested.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    Ok(())
}

/// The `index` key is an ordering key and should be unique. Collisions
/// make listing order arbitrary between the colliding posts.
fn warn_duplicate_indices(posts: &[Post]) {
    let mut seen: HashMap<u32, &Path> = HashMap::new();
    for post in posts {
        if let Some(other) = seen.insert(post.index, &post.dir) {
            log!(
                "warn";
                "duplicate index {} ({} and {})",
                post.index,
                other.display(),
                post.dir.display()
            );
        }
    }
}
