//! Session tokens and request signing.

use std::time::{Duration, Instant};

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Safety margin subtracted from a token's advertised lifetime so a request
/// never departs with a token about to expire in flight.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// A cached bearer token from the credential exchange.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Opaque access token attached to private calls.
    pub access_token: String,
    /// Instant after which the token is treated as absent.
    pub expires_at: Instant,
}

impl SessionToken {
    /// Create a token with an explicit expiry instant.
    pub fn new(access_token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Create a token from the exchange's `expires_in` seconds, applying
    /// the refresh safety margin.
    pub fn from_expires_in(access_token: impl Into<String>, expires_in_secs: u64) -> Self {
        let lifetime = Duration::from_secs(expires_in_secs)
            .saturating_sub(TOKEN_REFRESH_MARGIN);
        Self::new(access_token, Instant::now() + lifetime)
    }

    /// Whether the token is still usable at `now`.
    pub fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Compute the HMAC-SHA256 request signature.
///
/// Canonical string: `ts\nnonce\nmethod\npath\nbody\n` keyed with the API
/// secret, hex-encoded. The body is empty for GET requests.
#[allow(clippy::expect_used)] // HMAC-SHA256 accepts keys of any length; this cannot fail
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    nonce: &str,
    method: &str,
    path: &str,
    body: &str,
) -> String {
    let message = format!("{timestamp}\n{nonce}\n{method}\n{path}\n{body}\n");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Render the `Authorization` header value for the HMAC scheme.
pub fn hmac_header(api_key: &str, timestamp: &str, nonce: &str, signature: &str) -> String {
    format!("deri-hmac-sha256 id={api_key},ts={timestamp},nonce={nonce},sig={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_token_is_invalid() {
        let now = Instant::now();
        let token = SessionToken::new("tok", now - Duration::from_secs(1));
        assert!(!token.is_valid(now));
    }

    #[test]
    fn token_expiring_exactly_now_is_invalid() {
        let now = Instant::now();
        let token = SessionToken::new("tok", now);
        assert!(!token.is_valid(now));
    }

    #[test]
    fn fresh_token_is_valid() {
        let now = Instant::now();
        let token = SessionToken::new("tok", now + Duration::from_secs(3600));
        assert!(token.is_valid(now));
    }

    #[test]
    fn from_expires_in_applies_margin() {
        let token = SessionToken::from_expires_in("tok", 3600);
        let now = Instant::now();
        assert!(token.is_valid(now));
        // Expiry lands before the full advertised hour
        assert!(token.expires_at <= now + Duration::from_secs(3600 - 59));
    }

    #[test]
    fn signature_is_deterministic() {
        let a = sign_request("secret", "1700000000000", "1700000000000", "GET", "/private/get_account_summary", "");
        let b = sign_request("secret", "1700000000000", "1700000000000", "GET", "/private/get_account_summary", "");
        assert_eq!(a, b);
        // SHA-256 output is 32 bytes = 64 hex chars
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_changes_with_path() {
        let a = sign_request("secret", "1", "1", "GET", "/private/get_account_summary", "");
        let b = sign_request("secret", "1", "1", "GET", "/private/get_positions", "");
        assert_ne!(a, b);
    }

    #[test]
    fn signature_changes_with_secret() {
        let a = sign_request("secret-a", "1", "1", "GET", "/p", "");
        let b = sign_request("secret-b", "1", "1", "GET", "/p", "");
        assert_ne!(a, b);
    }

    #[test]
    fn header_format() {
        let header = hmac_header("key-id", "123", "123", "abcd");
        assert_eq!(header, "deri-hmac-sha256 id=key-id,ts=123,nonce=123,sig=abcd");
    }
}
