//! Caller IP lookup for the `Source-Ip` header

use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Deserialize)]
struct LookupResponse {
    ip: String,
}

/// Ask `url` for this machine's public address
///
/// Failures are logged and yield `None`; the header is then sent empty.
pub async fn lookup_source_ip(http: &Client, url: &str) -> Option<String> {
    let response = match http.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url, "Source IP lookup failed: {e}");
            return None;
        }
    };

    if !response.status().is_success() {
        warn!(url, status = %response.status(), "Source IP lookup returned an error status");
        return None;
    }

    match response.json::<LookupResponse>().await {
        Ok(LookupResponse { ip }) if !ip.trim().is_empty() => Some(ip.trim().to_string()),
        Ok(_) => {
            warn!(url, "Source IP lookup returned an empty address");
            None
        }
        Err(e) => {
            warn!(url, "Source IP lookup returned an unexpected body: {e}");
            None
        }
    }
}

/// File-backed cache of the last looked-up address
#[derive(Debug, Clone)]
pub struct SourceIpCache {
    http: Client,
    path: PathBuf,
}

impl SourceIpCache {
    pub fn new(http: Client, path: impl Into<PathBuf>) -> Self {
        Self {
            http,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached address, if any
    pub async fn load(&self) -> Option<String> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        let ip = content.trim();
        (!ip.is_empty()).then(|| ip.to_string())
    }

    /// Look up the address and store it
    ///
    /// Falls back to the previously cached value when the lookup fails.
    pub async fn refresh(&self, url: &str) -> Option<String> {
        let Some(ip) = lookup_source_ip(&self.http, url).await else {
            return self.load().await;
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(path = %parent.display(), "Failed to create source IP cache directory: {e}");
                return Some(ip);
            }
        }
        match tokio::fs::write(&self.path, &ip).await {
            Ok(()) => debug!(path = %self.path.display(), "Cached source IP"),
            Err(e) => warn!(path = %self.path.display(), "Failed to cache source IP: {e}"),
        }
        Some(ip)
    }
}
