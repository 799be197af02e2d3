//! Development server.
//!
//! A lightweight HTTP server over the build output, built on `tiny_http`.
//! It mirrors the production Caddyfile's behavior so header and routing
//! policies can be tested locally:
//!
//! - Static file serving from the document root
//! - Security headers on every response
//! - One-year `Cache-Control` for the `/assets/` prefix
//! - Fallback routing to `index.html` for paths that resolve to nothing
//! - File watching and auto-rebuild (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! Response compression stays in the production server config; the dev
//! server sends identity responses.

use crate::{
    builder::assets::ASSETS_PREFIX, config::SiteConfig, log, watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result};
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Security headers attached to every response.
///
/// Mirrors the scaffolded Caddyfile; keep the two in sync.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    (
        "Content-Security-Policy",
        "default-src 'none'; script-src 'self'; style-src 'self'; img-src 'self'; font-src 'self'",
    ),
    (
        "Strict-Transport-Security",
        "max-age=31536000; includeSubDomains",
    ),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
];

/// Cache policy for the static assets prefix.
const ASSETS_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// How a request path maps onto the document root.
#[derive(Debug, PartialEq, Eq)]
enum Resolution {
    /// Serve this file; `long_cache` marks the assets prefix.
    File { path: PathBuf, long_cache: bool },
    /// Nothing matched; serve the index document instead of a bare 404.
    Fallback(PathBuf),
    /// Nothing matched and there is no index document.
    NotFound,
}

/// Start the development server with optional file watching.
///
/// Binds to the configured interface and port (retrying on port
/// conflicts), spawns the watcher thread if enabled, then blocks in the
/// request loop until Ctrl+C.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let base_port = config.serve.port;

    let (server, addr) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    // Spawn file watcher thread
    if config.serve.watch {
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config) {
                log!("watch"; "{err}");
            }
        });
    }

    // Handle requests in main thread (blocks until Ctrl+C)
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, config) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => {
                continue;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    max_retries,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &SiteConfig) -> Result<()> {
    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    match resolve(&config.build.output, &url_path) {
        Resolution::File { path, long_cache } => serve_file(request, &path, long_cache),
        Resolution::Fallback(path) => serve_file(request, &path, false),
        Resolution::NotFound => serve_not_found(request),
    }
}

/// Resolve a request path against the document root.
///
/// Resolution order:
/// 1. Exact file match
/// 2. Directory with index.html
/// 3. Fallback to the root index document
/// 4. 404 only when no index document exists
fn resolve(serve_root: &Path, url_path: &str) -> Resolution {
    // Strip query string (e.g., ?t=123456) before resolving path
    let path_without_query = url_path.split('?').next().unwrap_or(url_path);
    let request_path = path_without_query.trim_matches('/');

    // Reject traversal before touching the filesystem
    if !request_path.split('/').any(|seg| seg == "..") {
        let long_cache = Path::new(request_path).starts_with(ASSETS_PREFIX);
        let local_path = serve_root.join(request_path);

        if local_path.is_file() {
            return Resolution::File {
                path: local_path,
                long_cache,
            };
        }

        if local_path.is_dir() {
            let index_path = local_path.join("index.html");
            if index_path.is_file() {
                return Resolution::File {
                    path: index_path,
                    long_cache: false,
                };
            }
        }
    }

    let fallback = serve_root.join("index.html");
    if fallback.is_file() {
        Resolution::Fallback(fallback)
    } else {
        Resolution::NotFound
    }
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve a file with content type, security headers, and cache policy.
fn serve_file(request: Request, path: &Path, long_cache: bool) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = guess_content_type(path);

    let mut response = Response::from_data(content)
        .with_header(header("Content-Type", content_type));
    for h in response_headers(long_cache) {
        response = response.with_header(h);
    }

    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let mut response = Response::from_string("404 Not Found")
        .with_status_code(StatusCode(404))
        .with_header(header("Content-Type", "text/plain"));
    for h in response_headers(false) {
        response = response.with_header(h);
    }
    request.respond(response)?;
    Ok(())
}

/// Headers attached to every response: the security set, plus the
/// long-cache policy for the assets prefix.
fn response_headers(long_cache: bool) -> Vec<Header> {
    let mut headers: Vec<Header> = SECURITY_HEADERS
        .iter()
        .map(|&(name, value)| header(name, value))
        .collect();
    if long_cache {
        headers.push(header("Cache-Control", ASSETS_CACHE_CONTROL));
    }
    headers
}

fn header(name: &str, value: &str) -> Header {
    // Both sides are static, well-formed ASCII
    Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap()
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc_root() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<html>index</html>").unwrap();
        fs::write(tmp.path().join("about.html"), "<html>about</html>").unwrap();
        fs::create_dir_all(tmp.path().join("assets")).unwrap();
        fs::write(tmp.path().join("assets/style.css"), "body {}").unwrap();
        tmp
    }

    #[test]
    fn test_resolve_exact_file() {
        let root = doc_root();
        let res = resolve(root.path(), "/about.html");
        assert_eq!(
            res,
            Resolution::File {
                path: root.path().join("about.html"),
                long_cache: false,
            }
        );
    }

    #[test]
    fn test_resolve_assets_long_cache() {
        let root = doc_root();
        let res = resolve(root.path(), "/assets/style.css");
        assert_eq!(
            res,
            Resolution::File {
                path: root.path().join("assets/style.css"),
                long_cache: true,
            }
        );
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_index() {
        let root = doc_root();
        let res = resolve(root.path(), "/no/such/page");
        assert_eq!(res, Resolution::Fallback(root.path().join("index.html")));
    }

    #[test]
    fn test_resolve_query_string_stripped() {
        let root = doc_root();
        let res = resolve(root.path(), "/assets/style.css?t=12345");
        assert!(matches!(
            res,
            Resolution::File { long_cache: true, .. }
        ));
    }

    #[test]
    fn test_resolve_directory_index() {
        let root = doc_root();
        let res = resolve(root.path(), "/");
        assert_eq!(
            res,
            Resolution::File {
                path: root.path().join("index.html"),
                long_cache: false,
            }
        );
    }

    #[test]
    fn test_resolve_traversal_rejected() {
        let root = doc_root();
        let res = resolve(root.path(), "/../../etc/passwd");
        // Traversal must never resolve to a file outside the root
        assert_eq!(res, Resolution::Fallback(root.path().join("index.html")));
    }

    #[test]
    fn test_resolve_not_found_without_index() {
        let tmp = TempDir::new().unwrap();
        let res = resolve(tmp.path(), "/missing");
        assert_eq!(res, Resolution::NotFound);
    }

    #[test]
    fn test_response_headers_security_set() {
        let headers = response_headers(false);

        for &(name, value) in SECURITY_HEADERS {
            assert!(
                headers
                    .iter()
                    .any(|h| h.field.equiv(name) && h.value.as_str() == value),
                "missing header {name}"
            );
        }
        assert!(!headers.iter().any(|h| h.field.equiv("Cache-Control")));
    }

    #[test]
    fn test_response_headers_assets_cache_policy() {
        let headers = response_headers(true);

        assert!(headers.iter().any(|h| {
            h.field.equiv("Cache-Control") && h.value.as_str() == ASSETS_CACHE_CONTROL
        }));
        assert!(headers.iter().any(|h| {
            h.field.equiv("X-Content-Type-Options") && h.value.as_str() == "nosniff"
        }));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(
            guess_content_type(Path::new("a.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            guess_content_type(Path::new("a.css")),
            "text/css; charset=utf-8"
        );
        assert_eq!(guess_content_type(Path::new("a.bin")), "application/octet-stream");
    }
}
