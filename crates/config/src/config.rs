//! Client configuration
//!
//! `ClientConfig` is the single source of truth handed to the client, the
//! storage resolver and the credential delegator at construction. Nothing is
//! read from process-wide state after construction, so two clients built from
//! different configs never influence each other.

use serde::Deserialize;
use std::time::Duration;
use tes_core::{
    ApiGeneration, Error, Result, SecretString, ServiceInfo, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_S3_REGION, DEFAULT_SERVER_ADDRESS,
    DEFAULT_TOKEN_TTL_SECS, DEFAULT_WAIT_TIMEOUT_SECS,
};
use url::Url;

/// Immutable configuration for one client instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub delegation: DelegationConfig,
    pub polling: PollingConfig,
}

impl ClientConfig {
    /// Configuration for a server at `address` with every other setting defaulted
    pub fn for_server(address: impl Into<String>) -> Self {
        Self {
            server: ServerConfig {
                address: address.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Reject settings no client can work with
    pub fn validate(&self) -> Result<()> {
        if self.server.request_timeout_secs == 0 {
            return Err(Error::configuration(
                "server.request_timeout_secs must be greater than zero",
            ));
        }
        self.polling.validate()
    }
}

/// How to reach the TES server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub api_generation: ApiGeneration,
    pub request_timeout_secs: u64,
    /// HTTP basic auth user sent on every request
    pub user: Option<String>,
    pub password: Option<SecretString>,
    /// Fetch service info while constructing the client and fail if it errors
    pub probe_on_connect: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_SERVER_ADDRESS.to_string(),
            api_generation: ApiGeneration::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user: None,
            password: None,
            probe_on_connect: false,
        }
    }
}

impl ServerConfig {
    /// Normalized server base URL
    ///
    /// A bare `host:port` gets `http://`, anything after the authority is
    /// dropped, and schemes other than http/https are rejected.
    pub fn base_url(&self) -> Result<Url> {
        normalize_server_address(&self.address)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Normalize a server address into a base URL with an empty path
pub fn normalize_server_address(address: &str) -> Result<Url> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(Error::configuration("server address cannot be empty"));
    }

    let with_scheme = match trimmed.find("://") {
        Some(idx) => {
            let scheme = &trimmed[..idx];
            if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
                return Err(Error::configuration(format!(
                    "invalid protocol '{scheme}://' in server address; expected 'http://' or 'https://'"
                )));
            }
            trimmed.to_string()
        }
        None => format!("http://{trimmed}"),
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| Error::configuration(format!("invalid server address '{address}': {e}")))?;
    if url.host_str().is_none() {
        return Err(Error::configuration(format!(
            "server address '{address}' has no host"
        )));
    }
    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Object store access for the storage resolver and credential delegation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub s3_endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<SecretString>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            s3_endpoint: None,
            region: DEFAULT_S3_REGION.to_string(),
            access_key: None,
            secret_key: None,
        }
    }
}

/// Access key pair for an S3-compatible object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStoreCredentials {
    pub access_key: String,
    pub secret_key: SecretString,
}

impl StorageConfig {
    /// Both halves of the key pair, if configured and non-blank
    pub fn credentials(&self) -> Option<ObjectStoreCredentials> {
        let access_key = self.access_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let secret_key = self.secret_key.as_ref().filter(|s| !s.is_blank())?;
        Some(ObjectStoreCredentials {
            access_key: access_key.to_string(),
            secret_key: secret_key.clone(),
        })
    }

    /// Fill a missing endpoint from what the server advertises
    #[must_use]
    pub fn with_service_info(mut self, info: &ServiceInfo) -> Self {
        if self.s3_endpoint.is_none() {
            self.s3_endpoint = info.s3_endpoint().map(str::to_string);
        }
        self
    }
}

/// Signed credential delegation to the worker
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    /// HMAC key shared with the server
    pub secret: Option<SecretString>,
    pub token_ttl_secs: u64,
    /// Refuse to submit without a signed token
    pub required: bool,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            required: false,
        }
    }
}

impl DelegationConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Defaults for `wait`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Zero means wait forever
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// `None` when the wait is unbounded
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// A zero interval would read the job in a tight loop
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::configuration(
                "polling.interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}
