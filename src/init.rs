//! Site initialization module.
//!
//! Creates new site structure with default configuration, a sample post,
//! default layouts, and a production Caddyfile.

use crate::config::SiteConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "pluma.toml";

/// Default site directory structure
const SITE_DIRS: &[&str] = &["posts/hello-world", "layouts", "assets/styles"];

/// Scaffold files written into a new site: (relative path, content).
const SITE_FILES: &[(&str, &str)] = &[
    ("posts/hello-world/post.toml", include_str!("embed/init/post.toml")),
    ("posts/hello-world/post.md", include_str!("embed/init/post.md")),
    ("layouts/post.html", include_str!("embed/init/post.html")),
    ("layouts/index.html", include_str!("embed/init/index.html")),
    ("assets/styles/main.css", include_str!("embed/init/main.css")),
    ("Caddyfile", include_str!("embed/init/Caddyfile")),
];

/// Create a new site with default structure
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Safety check: if no name was provided (init in current dir),
    // the directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `pluma init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(root)?;
    init_default_config(root)?;
    init_site_files(root)?;
    init_gitignore(root, config)?;

    crate::log!("init"; "site created at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(root: &Path) -> Result<()> {
    for dir in SITE_DIRS {
        let path = root.join(dir);
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `pluma init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write the scaffold files (sample post, layouts, stylesheet, Caddyfile)
fn init_site_files(root: &Path) -> Result<()> {
    for (relative, content) in SITE_FILES {
        let path = root.join(relative);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Keep build output out of version control
fn init_gitignore(root: &Path, config: &SiteConfig) -> Result<()> {
    let output_name = config
        .build
        .output
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("public");
    fs::write(root.join(".gitignore"), format!("/{output_name}/\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(root);
        config
    }

    #[test]
    fn test_new_site_structure() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("blog");
        let config = config_for(&root);

        new_site(&config, true).unwrap();

        assert!(root.join("pluma.toml").is_file());
        assert!(root.join("posts/hello-world/post.toml").is_file());
        assert!(root.join("posts/hello-world/post.md").is_file());
        assert!(root.join("layouts/post.html").is_file());
        assert!(root.join("layouts/index.html").is_file());
        assert!(root.join("assets/styles/main.css").is_file());
        assert!(root.join("Caddyfile").is_file());
        assert!(root.join(".gitignore").is_file());
    }

    #[test]
    fn test_scaffolded_config_parses() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("blog");
        new_site(&config_for(&root), true).unwrap();

        let content = fs::read_to_string(root.join("pluma.toml")).unwrap();
        assert!(SiteConfig::from_str(&content).is_ok());
    }

    #[test]
    fn test_refuses_non_empty_dir_without_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("existing.txt"), "x").unwrap();
        let config = config_for(tmp.path());

        assert!(new_site(&config, false).is_err());
    }

    #[test]
    fn test_caddyfile_declares_policies() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("blog");
        new_site(&config_for(&root), true).unwrap();

        let caddyfile = fs::read_to_string(root.join("Caddyfile")).unwrap();
        assert!(caddyfile.contains("encode zstd gzip"));
        assert!(caddyfile.contains("max-age=31536000"));
        assert!(caddyfile.contains("try_files {path} /index.html"));
        assert!(caddyfile.contains("{$SITE_ROOT}"));
        assert!(caddyfile.contains("{$SITE_DOMAIN}"));
    }
}
