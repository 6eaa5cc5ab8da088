//! CLI configuration and client wiring

use anyhow::Result;
use lumifi_core::{ErrorContext, LumifiConfig, ValidateConfig};
use lumifi_http::client::source_ip::SourceIpCache;
use lumifi_http::{FileSessionPersistence, LumifiClient, SessionStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Load configuration and apply command line overrides
pub fn load(
    path: Option<&Path>,
    data_dir: Option<PathBuf>,
    timeout: Option<u64>,
) -> Result<LumifiConfig> {
    let mut config = LumifiConfig::load(path)
        .with_context(|| {
            path.map_or_else(
                || "Failed to load configuration".to_string(),
                |p| format!("Failed to load configuration from {}", p.display()),
            )
        })
        .map_err(anyhow::Error::msg)?;

    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(timeout) = timeout {
        config.api.timeout_secs = timeout;
    }
    config
        .validate()
        .with_context_str("Invalid command line override")
        .map_err(anyhow::Error::msg)?;
    Ok(config)
}

/// Build a client whose session survives between invocations
pub async fn build_client(config: &LumifiConfig) -> Result<LumifiClient> {
    let persistence = Arc::new(FileSessionPersistence::new(config.session_path()));
    let session = SessionStore::persistent(persistence);

    let source_ip = resolve_source_ip(config).await?;
    debug!(source_ip = source_ip.as_deref().unwrap_or_default(), "Resolved caller IP");

    let mut builder = LumifiClient::builder()
        .base_url(&config.api.base_url)
        .user_agent(&config.api.user_agent)
        .session(session)
        .source_ip(source_ip)
        .on_session_expired(|expired| {
            eprintln!("Session expired ({}). Sign in again with `lumifi login`.", expired.reason);
        });
    if config.api.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(config.api.timeout_secs));
    }
    Ok(builder.build()?)
}

async fn resolve_source_ip(config: &LumifiConfig) -> Result<Option<String>> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .with_context_str("Failed to create IP lookup client")
        .map_err(anyhow::Error::msg)?;
    let cache = SourceIpCache::new(http, config.source_ip_path());

    if config.ip_lookup.enabled {
        Ok(cache.refresh(&config.ip_lookup.url).await)
    } else {
        Ok(cache.load().await)
    }
}
