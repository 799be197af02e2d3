//! `[build]` section configuration.
//!
//! Contains build paths and rendering settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in pluma.toml - build paths and options.
///
/// All directory paths are relative to the project root until
/// normalization (see `SiteConfig::update_with_cli`).
///
/// # Example
/// ```toml
/// [build]
/// posts = "posts"
/// layouts = "layouts"
/// assets = "assets"
/// output = "public"
/// minify = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (set from CLI, not from the config file).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Posts directory: one subdirectory per post.
    #[serde(default = "defaults::build::posts")]
    #[educe(Default = defaults::build::posts())]
    pub posts: PathBuf,

    /// Layout templates directory (`<name>.html` files).
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Static assets directory, copied verbatim to `output/assets`.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Output directory for generated HTML.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Layout used by posts that don't name one in their metadata.
    #[serde(default = "defaults::build::default_layout")]
    #[educe(Default = defaults::build::default_layout())]
    pub default_layout: String,

    /// Layout used for the generated index listing page.
    /// Listing generation is skipped when this layout doesn't exist.
    #[serde(default = "defaults::build::index_layout")]
    #[educe(Default = defaults::build::index_layout())]
    pub index_layout: String,

    /// Minify the html output.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Clean output directory completely before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,
}
