//! Static dashboard asset serving with an explicit get-or-load cache.
//!
//! The cache is an advisory, process-lifetime optimization: correctness
//! never depends on it being populated, and there is no invalidation — the
//! dashboard bundle only changes on redeploy.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use axum::body::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

/// A cached static file.
#[derive(Clone)]
pub struct CachedAsset {
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Get-or-load file cache rooted at the configured assets directory.
pub struct StaticCache {
    root: PathBuf,
    entries: RwLock<HashMap<String, CachedAsset>>,
}

impl StaticCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a request path to an asset, loading and caching on miss.
    ///
    /// `/` maps to `login.html`; extensionless paths get `.html` appended.
    /// Returns `None` for unknown files and for any path that tries to
    /// escape the asset root.
    pub async fn get_or_load(&self, request_path: &str) -> Option<CachedAsset> {
        let key = normalize(request_path)?;

        if let Some(asset) = self.entries.read().await.get(&key) {
            return Some(asset.clone());
        }

        let full_path = self.root.join(&key);
        let body = tokio::fs::read(&full_path).await.ok()?;
        let asset = CachedAsset {
            content_type: content_type_for(&key),
            body: Bytes::from(body),
        };

        debug!(path = %key, bytes = asset.body.len(), "Cached static asset");
        self.entries
            .write()
            .await
            .insert(key, asset.clone());
        Some(asset)
    }
}

/// Map a request path to a relative file key, rejecting traversal.
fn normalize(request_path: &str) -> Option<String> {
    let mut path = request_path.trim_start_matches('/').to_string();
    if path.is_empty() {
        path = "login.html".to_string();
    }
    if !path.contains('.') {
        path.push_str(".html");
    }

    // No absolute paths, no parent-directory escapes.
    let candidate = Path::new(&path);
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => return None,
        }
    }
    Some(path)
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "text/plain; charset=utf-8",
    }
}
