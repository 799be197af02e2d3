//! File system watcher for rebuild-on-change.
//!
//! Monitors the posts, layouts and assets directories plus the config
//! file. Posts have no cross-dependencies but layouts are shared, so any
//! change triggers a full rebuild; the build itself is fast enough that
//! incremental tracking isn't worth the bookkeeping.
//!
//! Events are debounced (editors fire several per save) and rebuilds get
//! a cooldown so a rebuild's own output events don't retrigger it.

use crate::{build::build_site, config::SiteConfig, log};
use anyhow::{Context, Result};
use notify::{Event, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Watch source directories and rebuild on changes. Blocks forever.
pub fn watch_for_changes_blocking(config: &'static SiteConfig) -> Result<()> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create watcher")?;

    for dir in [
        &config.build.posts,
        &config.build.layouts,
        &config.build.assets,
    ] {
        if dir.is_dir() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch {}", dir.display()))?;
        }
    }
    if config.config_path.is_file() {
        watcher
            .watch(&config.config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", config.config_path.display()))?;
    }

    log!("watch"; "watching for changes...");

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) => {
                if !debouncer.in_cooldown() {
                    debouncer.add(event);
                }
            }
            Ok(Err(err)) => log!("watch"; "watch error: {err}"),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if debouncer.ready() && !debouncer.in_cooldown() {
            let changed = debouncer.take();
            log_changes(&changed, config.get_root());

            match build_site(config) {
                Ok(()) => log!("watch"; "rebuilt"),
                Err(err) => log!("watch"; "rebuild failed: {err:#}"),
            }
            debouncer.mark_rebuild();
        }
    }

    Ok(())
}

fn log_changes(paths: &[PathBuf], root: &Path) {
    for path in paths.iter().take(3) {
        let display = path.strip_prefix(root).unwrap_or(path);
        log!("watch"; "changed: {}", display.display());
    }
    if paths.len() > 3 {
        log!("watch"; "... and {} more", paths.len() - 3);
    }
}
