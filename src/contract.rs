//! # contract: collaborator interfaces consumed by the aggregation core
//!
//! The core never talks HTTP or writes files itself. It depends on two traits:
//!
//! - [`PagedFetcher`]: returns every item of a paginated list endpoint as one
//!   concatenated sequence of JSON values, failing atomically for the whole call.
//! - [`ReportEmitter`]: persists the final contributor map and extension table.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`; with the default `test-export-mocks`
//!   feature the generated `MockPagedFetcher` / `MockReportEmitter` are public so
//!   integration tests can script API responses deterministically.

use async_trait::async_trait;
use mockall::automock;

use crate::extensions::ExtensionTable;
use crate::model::ContributorMap;

/// An upstream paginated call failed. Always caught at the narrowest scope that
/// can degrade (group query, project source, single project scan).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

/// Error type for report emission (simple boxed error, as with uploads)
pub type EmitError = Box<dyn std::error::Error + Send + Sync>;

/// Fetches every page of a list endpoint.
///
/// `context` is a short human-readable label (e.g. `"Projects"`, `"42/abc123/diff"`)
/// used only for logging by the implementor.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PagedFetcher: Send + Sync {
    async fn fetch_all_pages(
        &self,
        url: &str,
        credential: &str,
        context: &str,
    ) -> Result<Vec<serde_json::Value>, FetchError>;
}

/// Renders the final aggregates to persisted output.
///
/// Implementors produce a table whose first column is the author identity,
/// followed by one column per discovered extension in discovery order.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReportEmitter: Send + Sync {
    async fn emit(
        &self,
        contributors: &ContributorMap,
        extensions: &ExtensionTable,
    ) -> Result<(), EmitError>;
}
