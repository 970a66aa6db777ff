//! Signed HTTP client for the Deribit REST API.
//!
//! Handles the public/private endpoint split and both signing schemes:
//! per-request HMAC signatures and cached OAuth bearer tokens. Nothing in
//! this module retries; every failure propagates to the caller and the
//! scheduler tries again on its next tick.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::config::{AuthScheme, ExchangeConfig};

use super::api_types::{
    AccountSummaries, AccountSummary, ApiEnvelope, AuthResult, IndexPriceResult, Position,
};
use super::auth::{SessionToken, hmac_header, sign_request};
use super::error::DeribitError;

/// Endpoint access class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// No authentication required (e.g. index price).
    Public,
    /// Requires the configured signing scheme.
    Private,
}

/// Per-request authentication material.
enum RequestAuth {
    None,
    Hmac,
    Bearer(String),
}

/// Authenticated Deribit REST client.
///
/// The cached session token is the only shared mutable state; it lives
/// behind a read/write lock so concurrent callers can check validity
/// cheaply while refreshes remain exclusive.
#[derive(Debug)]
pub struct DeribitClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    base_url: String,
    auth_scheme: AuthScheme,
    session: RwLock<Option<SessionToken>>,
}

impl DeribitClient {
    /// Create a new client from config.
    pub fn new(config: &ExchangeConfig) -> Result<Self, DeribitError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeribitError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            base_url: config.resolved_base_url().to_string(),
            auth_scheme: config.auth_scheme,
            session: RwLock::new(None),
        })
    }

    /// Perform one authentication attempt.
    ///
    /// For the OAuth scheme this exchanges credentials for a bearer token
    /// and caches it. The HMAC scheme has no exchange step; the attempt
    /// reduces to verifying a credential path exists.
    pub async fn authenticate(&self) -> Result<(), DeribitError> {
        match self.auth_scheme {
            AuthScheme::Hmac => {
                if self.api_key.is_empty() || self.api_secret.is_empty() {
                    return Err(DeribitError::AuthRequired);
                }
                Ok(())
            }
            AuthScheme::OAuth => {
                let token = self.fetch_token().await?;
                *self.session.write().await = Some(token);
                Ok(())
            }
        }
    }

    /// Single-currency account snapshot (private).
    pub async fn account_summary(&self, currency: &str) -> Result<AccountSummary, DeribitError> {
        let mut params = BTreeMap::new();
        params.insert("currency", currency.to_uppercase());
        self.request(
            Method::GET,
            "/private/get_account_summary",
            &params,
            Access::Private,
        )
        .await
    }

    /// Multi-currency account snapshot with USD-normalized totals (private).
    ///
    /// `extended` requests additional identity/limit fields which the risk
    /// path accepts and ignores.
    pub async fn account_summaries(
        &self,
        extended: bool,
    ) -> Result<AccountSummaries, DeribitError> {
        let mut params = BTreeMap::new();
        params.insert("extended", extended.to_string());
        self.request(
            Method::GET,
            "/private/get_account_summaries",
            &params,
            Access::Private,
        )
        .await
    }

    /// Current index (spot) price for an index name such as `eth_usd` (public).
    pub async fn index_price(&self, index_name: &str) -> Result<f64, DeribitError> {
        let mut params = BTreeMap::new();
        params.insert("index_name", index_name.to_lowercase());
        let result: IndexPriceResult = self
            .request(
                Method::GET,
                "/public/get_index_price",
                &params,
                Access::Public,
            )
            .await?;
        Ok(result.index_price)
    }

    /// Open futures positions for a currency (private).
    pub async fn positions(&self, currency: &str) -> Result<Vec<Position>, DeribitError> {
        let mut params = BTreeMap::new();
        params.insert("currency", currency.to_uppercase());
        params.insert("kind", "future".to_string());
        self.request(Method::GET, "/private/get_positions", &params, Access::Private)
            .await
    }

    /// Exchange credentials for a fresh session token.
    ///
    /// Any transport, HTTP, or API-level failure surfaces as `Auth`: the
    /// credential exchange itself failed.
    async fn fetch_token(&self) -> Result<SessionToken, DeribitError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(DeribitError::AuthRequired);
        }

        let mut params = BTreeMap::new();
        params.insert("client_id", self.api_key.clone());
        params.insert("client_secret", self.api_secret.clone());
        params.insert("grant_type", "client_credentials".to_string());

        let result: AuthResult = self
            .send(Method::GET, "/public/auth", &params, RequestAuth::None)
            .await
            .map_err(|e| match e {
                DeribitError::AuthRequired => DeribitError::AuthRequired,
                other => DeribitError::Auth(other.to_string()),
            })?;

        Ok(SessionToken::from_expires_in(
            result.access_token,
            result.expires_in,
        ))
    }

    /// Return a valid bearer token, refreshing it if stale or absent.
    ///
    /// Readers take the shared lock for the validity check; a refresh takes
    /// the exclusive lock and re-validates first, so a caller that lost the
    /// race to another refresher does not authenticate twice.
    async fn ensure_authenticated(&self) -> Result<String, DeribitError> {
        {
            let session = self.session.read().await;
            if let Some(token) = session.as_ref()
                && token.is_valid(Instant::now())
            {
                return Ok(token.access_token.clone());
            }
        }

        let mut session = self.session.write().await;
        if let Some(token) = session.as_ref()
            && token.is_valid(Instant::now())
        {
            return Ok(token.access_token.clone());
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *session = Some(token);
        Ok(access_token)
    }

    /// Build and dispatch a request with the scheme-appropriate auth.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &BTreeMap<&'static str, String>,
        access: Access,
    ) -> Result<T, DeribitError> {
        let request_auth = match access {
            Access::Public => RequestAuth::None,
            Access::Private => match self.auth_scheme {
                AuthScheme::Hmac => {
                    if self.api_key.is_empty() || self.api_secret.is_empty() {
                        return Err(DeribitError::AuthRequired);
                    }
                    RequestAuth::Hmac
                }
                AuthScheme::OAuth => RequestAuth::Bearer(self.ensure_authenticated().await?),
            },
        };

        self.send(method, path, params, request_auth).await
    }

    /// Dispatch a request and decode the response envelope.
    ///
    /// GET parameters become a query string in sorted key order; non-GET
    /// parameters are sent as a JSON body. The HMAC signature covers
    /// `method\npath\nbody\n` with an empty body for GET.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &BTreeMap<&'static str, String>,
        request_auth: RequestAuth,
    ) -> Result<T, DeribitError> {
        let url = format!("{}{}", self.base_url, path);
        let is_get = method == Method::GET;

        let body = if is_get {
            String::new()
        } else {
            serde_json::to_string(params).map_err(|e| DeribitError::Transport(e.to_string()))?
        };

        let mut request = self.http.request(method.clone(), &url);
        if is_get {
            if !params.is_empty() {
                let query: Vec<(&str, &str)> =
                    params.iter().map(|(k, v)| (*k, v.as_str())).collect();
                request = request.query(&query);
            }
        } else {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        match request_auth {
            RequestAuth::None => {}
            RequestAuth::Hmac => {
                let timestamp = chrono::Utc::now().timestamp_millis().to_string();
                let nonce = timestamp.clone();
                let signature = sign_request(
                    &self.api_secret,
                    &timestamp,
                    &nonce,
                    method.as_str(),
                    path,
                    &body,
                );
                request = request.header(
                    reqwest::header::AUTHORIZATION,
                    hmac_header(&self.api_key, &timestamp, &nonce, &signature),
                );
            }
            RequestAuth::Bearer(token) => {
                request = request.bearer_auth(token);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeribitError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DeribitError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(DeribitError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
            DeribitError::Transport(format!("failed to decode response from {path}: {e}"))
        })?;

        if let Some(error) = envelope.error {
            return Err(DeribitError::Api {
                message: error.message,
                code: error.code,
            });
        }

        envelope.result.ok_or_else(|| {
            DeribitError::Transport(format!(
                "response from {path} carried neither result nor error"
            ))
        })
    }
}
