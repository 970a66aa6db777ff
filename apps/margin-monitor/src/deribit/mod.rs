//! Deribit exchange integration.
//!
//! Signed HTTP client, typed account snapshot fetchers, and the
//! `MarginDataSource` port the scheduler polls through.

mod api_types;
mod auth;
mod client;
mod error;

use async_trait::async_trait;

pub use api_types::{AccountSummaries, AccountSummary, ApiErrorBody, Position};
pub use auth::{SessionToken, TOKEN_REFRESH_MARGIN};
pub use client::DeribitClient;
pub use error::DeribitError;

/// Port for account-margin data retrieval.
///
/// Fronted by `DeribitClient` in production; test suites substitute stubs.
#[async_trait]
pub trait MarginDataSource: Send + Sync {
    /// One authentication attempt. Fatal at startup if it fails.
    async fn authenticate(&self) -> Result<(), DeribitError>;

    /// Single-currency account snapshot.
    async fn account_summary(&self, currency: &str) -> Result<AccountSummary, DeribitError>;

    /// Multi-currency account snapshot with USD-normalized totals.
    async fn account_summaries(&self, extended: bool) -> Result<AccountSummaries, DeribitError>;

    /// Current index price for an index name such as `eth_usd`.
    async fn index_price(&self, index_name: &str) -> Result<f64, DeribitError>;
}

#[async_trait]
impl MarginDataSource for DeribitClient {
    async fn authenticate(&self) -> Result<(), DeribitError> {
        Self::authenticate(self).await
    }

    async fn account_summary(&self, currency: &str) -> Result<AccountSummary, DeribitError> {
        Self::account_summary(self, currency).await
    }

    async fn account_summaries(&self, extended: bool) -> Result<AccountSummaries, DeribitError> {
        Self::account_summaries(self, extended).await
    }

    async fn index_price(&self, index_name: &str) -> Result<f64, DeribitError> {
        Self::index_price(self, index_name).await
    }
}
