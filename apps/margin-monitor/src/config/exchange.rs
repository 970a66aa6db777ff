//! Exchange credential and endpoint configuration.

use serde::{Deserialize, Serialize};

/// Deribit mainnet REST base URL.
pub const MAINNET_BASE_URL: &str = "https://www.deribit.com/api/v2";

/// Deribit testnet REST base URL.
pub const TESTNET_BASE_URL: &str = "https://test.deribit.com/api/v2";

/// Signing scheme for private endpoint calls.
///
/// The two schemes are mutually exclusive: a deployment either signs every
/// request with an HMAC header or exchanges its credentials once for a
/// bearer token and caches it until near expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// Per-request `deri-hmac-sha256` signature header.
    #[default]
    Hmac,
    /// Cached bearer token from a client-credentials exchange.
    OAuth,
}

/// Exchange configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// API key (client id).
    pub api_key: String,
    /// API secret (client secret).
    pub api_secret: String,
    /// Use the exchange testnet instead of mainnet.
    #[serde(default)]
    pub testnet: bool,
    /// Signing scheme for private calls.
    #[serde(default)]
    pub auth_scheme: AuthScheme,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Explicit base URL override (takes precedence over `testnet`).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ExchangeConfig {
    /// Resolve the REST base URL for this configuration.
    pub fn resolved_base_url(&self) -> &str {
        if let Some(url) = &self.base_url {
            return url;
        }
        if self.testnet {
            TESTNET_BASE_URL
        } else {
            MAINNET_BASE_URL
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
