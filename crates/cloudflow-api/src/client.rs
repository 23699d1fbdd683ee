//! The data-access boundary: five idempotent reads against the REST API.
//!
//! [`DashboardApi`] is the seam the reconciler consumes; [`HttpApi`] is the
//! production implementation. Tests swap in in-memory doubles.

use async_trait::async_trait;
use cloudflow_settings::ApiSettings;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::types::{
    CloudCredential, DashboardSnapshot, DashboardSummary, DataObject, MigrationJob,
    RecommendationReport,
};

/// Errors raised by the data-access boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or undecodable response body.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {path}")]
    Status {
        /// The response status code.
        status: StatusCode,
        /// The request path.
        path: String,
    },
}

/// The five read operations the reconciler re-fetches after migration
/// events.
///
/// All operations are idempotent reads; a re-fetch cycle calls all five and
/// replaces the cached view wholesale with the result.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// Fetch the cost/tier analytics rollup.
    async fn fetch_summary(&self) -> Result<DashboardSummary, ApiError>;
    /// Fetch the migration job list.
    async fn fetch_migrations(&self) -> Result<Vec<MigrationJob>, ApiError>;
    /// Fetch the stored data objects.
    async fn fetch_data_objects(&self) -> Result<Vec<DataObject>, ApiError>;
    /// Fetch the ML recommendation report.
    async fn fetch_recommendations(&self) -> Result<RecommendationReport, ApiError>;
    /// Fetch the stored cloud credentials.
    async fn fetch_credentials(&self) -> Result<Vec<CloudCredential>, ApiError>;
}

/// Run one complete re-fetch cycle: all five reads, concurrently.
///
/// Fails if any single read fails — callers keep their previous view in
/// that case rather than mixing collections from different cycles.
pub async fn fetch_snapshot(api: &dyn DashboardApi) -> Result<DashboardSnapshot, ApiError> {
    let (summary, migrations, data_objects, recommendations, credentials) = tokio::try_join!(
        api.fetch_summary(),
        api.fetch_migrations(),
        api.fetch_data_objects(),
        api.fetch_recommendations(),
        api.fetch_credentials(),
    )?;
    Ok(DashboardSnapshot {
        summary,
        migrations,
        data_objects,
        recommendations,
        credentials,
    })
}

/// Production [`DashboardApi`] over HTTP.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpApi {
    /// Build a client from API settings.
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            auth_token: settings.auth_token.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.get(&url);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
            });
        }
        debug!(path, %status, "fetched collection");
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn fetch_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.get("/api/v1/analytics/summary").await
    }

    async fn fetch_migrations(&self) -> Result<Vec<MigrationJob>, ApiError> {
        self.get("/api/v1/migration/").await
    }

    async fn fetch_data_objects(&self) -> Result<Vec<DataObject>, ApiError> {
        self.get("/api/v1/data/").await
    }

    async fn fetch_recommendations(&self) -> Result<RecommendationReport, ApiError> {
        self.get("/api/v1/recommendations/").await
    }

    async fn fetch_credentials(&self) -> Result<Vec<CloudCredential>, ApiError> {
        self.get("/api/v1/credentials/").await
    }
}
