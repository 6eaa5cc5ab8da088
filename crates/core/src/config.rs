//! Configuration management for the Lumifi admin client

use crate::error::CoreResult;
use crate::validation::{ValidateConfig, validators};
use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default state directory
pub const STATE_DIR_ENV: &str = "LUMIFI_STATE_DIR";

/// Prefix for configuration environment variables (`LUMIFI_API__BASE_URL`, ...)
pub const ENV_PREFIX: &str = "LUMIFI";

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("lumifi-client/", env!("CARGO_PKG_VERSION"));

/// Public caller IP lookup service
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumifiConfig {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Caller IP lookup configuration
    pub ip_lookup: IpLookupConfig,

    /// Directory holding the persisted session, cached IP and logs
    pub data_dir: PathBuf,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Caller IP lookup, performed once at start-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// Whether to query the lookup service at all
    pub enabled: bool,

    /// Lookup endpoint returning `{"ip": "..."}`
    pub url: String,
}

impl Default for LumifiConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            ip_lookup: IpLookupConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: DEFAULT_IP_LOOKUP_URL.to_string(),
        }
    }
}

/// Resolve the default state directory
///
/// `LUMIFI_STATE_DIR` wins, then the platform data directory.
pub fn default_data_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV).map_or_else(
        |_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lumifi")
        },
        PathBuf::from,
    )
}

impl LumifiConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value cannot be parsed,
    /// or the merged configuration fails validation
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        Self::load_from(path, Self::environment())
    }

    /// `LUMIFI_<SECTION>__<KEY>` variables, e.g. `LUMIFI_API__TIMEOUT_SECS`
    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(path: Option<&Path>, environment: config::Environment) -> CoreResult<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("api.user_agent", defaults.api.user_agent)?
            .set_default("ip_lookup.enabled", defaults.ip_lookup.enabled)?
            .set_default("ip_lookup.url", defaults.ip_lookup.url)?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().to_string())?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(environment)
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the persisted session file
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    /// Path of the cached caller IP
    pub fn source_ip_path(&self) -> PathBuf {
        self.data_dir.join("source_ip")
    }
}

impl ValidateConfig for LumifiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validators::validate_url(&self.api.base_url, "api.base_url")?;
        validators::validate_not_empty(&self.api.user_agent, "api.user_agent")?;
        validators::validate_range(self.api.timeout_secs, 0, 600, "api.timeout_secs")?;
        if self.ip_lookup.enabled {
            validators::validate_url(&self.ip_lookup.url, "ip_lookup.url")?;
        }
        Ok(())
    }
}
