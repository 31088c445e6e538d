use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 10;
const MAX_SCRAPE_TIMEOUT_SECS: u64 = 3600;
const SUPPORTED_SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];

#[derive(Clone)]
pub struct ExporterConfig {
    /// Node RPC endpoint (env: GOAT_RPC_NODE)
    pub rpc_node: String,
    /// Listen port for /metrics (env: PORT)
    pub port: u16,
    /// Deadline shared by all RPC calls of one scrape (env: SCRAPE_TIMEOUT_SECS)
    pub scrape_timeout: Duration,
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("rpc_node", &redact_endpoint(&self.rpc_node))
            .field("port", &self.port)
            .field("scrape_timeout", &self.scrape_timeout)
            .finish()
    }
}

impl ExporterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // Required: node endpoint
        let rpc_node = get("GOAT_RPC_NODE").ok_or(ConfigError::MissingRequired("GOAT_RPC_NODE"))?;
        validate_endpoint(&rpc_node)?;

        // Optional: port
        let port = match get("PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(0) | Err(_) => return Err(ConfigError::InvalidPort(raw)),
                Ok(port) => port,
            },
            None => DEFAULT_PORT,
        };

        // Optional: scrape timeout
        let scrape_timeout_secs = match get("SCRAPE_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs @ 1..=MAX_SCRAPE_TIMEOUT_SECS) => secs,
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => DEFAULT_SCRAPE_TIMEOUT_SECS,
        };

        Ok(Self {
            rpc_node,
            port,
            scrape_timeout: Duration::from_secs(scrape_timeout_secs),
        })
    }

    /// Endpoint with any URL password masked, for logs.
    pub fn redacted_rpc_node(&self) -> String {
        redact_endpoint(&self.rpc_node)
    }
}

/// Check that `endpoint` is an absolute http(s) or ws(s) URI with a host.
///
/// Runs before any network I/O so a bad endpoint never reaches the transport.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::MissingRequired("GOAT_RPC_NODE"));
    }

    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", redact_endpoint(endpoint), e)))?;

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: not an absolute URI with a host",
            redact_endpoint(endpoint)
        )));
    }

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
    }

    Ok(url)
}

/// Mask the password component of a URL. Unparseable input is returned as-is.
pub fn redact_endpoint(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(mut url) if url.password().is_some() => {
            // Only fails for cannot-be-a-base URLs, which carry no password.
            let _ = url.set_password(Some("REDACTED"));
            url.to_string()
        }
        _ => endpoint.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0} (e.g. GOAT_RPC_NODE=https://rpc.goat.network)")]
    MissingRequired(&'static str),

    #[error("invalid RPC node URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported RPC node scheme: {0} (expected http, https, ws or wss)")]
    UnsupportedScheme(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("invalid scrape timeout: {0} (expected 1 to 3600 seconds)")]
    InvalidTimeout(String),
}
