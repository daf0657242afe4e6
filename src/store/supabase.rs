//! Hosted Postgres REST gateway client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::StoreError;
use crate::metrics::{self, LatencyTimer};
use crate::records::{Row, Table};

use super::{IsFilter, TableStore};

/// Path of the REST gateway below the project URL.
const REST_PATH: &str = "rest/v1/";

/// Error body returned by the gateway on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorBody {
    /// Human readable message.
    pub message: Option<String>,
    /// Postgres or gateway error code.
    pub code: Option<String>,
    /// Extra detail.
    pub details: Option<String>,
    /// Suggested fix.
    pub hint: Option<String>,
}

/// Client for the database's table REST API.
#[derive(Clone)]
pub struct SupabaseClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL of the REST gateway, ending in `/rest/v1/`.
    rest_url: Url,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // default headers carry the API key
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.rest_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SupabaseClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        Self::with_timeout(
            &config.supabase_url,
            &config.supabase_key,
            Duration::from_millis(config.http_timeout_ms),
        )
    }

    /// Create a client for `project_url` with an explicit request timeout.
    pub fn with_timeout(
        project_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let mut base = Url::parse(project_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_url = base.join(REST_PATH)?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| StoreError::Decode(format!("API key is not a valid header: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| StoreError::Decode(format!("API key is not a valid header: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            // Keep connections alive for reuse
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, rest_url })
    }

    /// Get the REST base URL.
    pub fn rest_url(&self) -> &Url {
        &self.rest_url
    }

    /// URL of a table endpoint.
    pub fn table_url(&self, table: Table) -> Result<Url, StoreError> {
        Ok(self.rest_url.join(table.as_ref())?)
    }

    /// Build a filtered select request without sending it.
    pub fn build_select(
        &self,
        table: Table,
        filter: &IsFilter,
    ) -> Result<reqwest::Request, StoreError> {
        let url = self.table_url(table)?;
        let request = self
            .http
            .get(url)
            .query(&[
                ("select", "*".to_string()),
                (filter.column.as_str(), filter.to_query_value()),
            ])
            .build()?;
        Ok(request)
    }

    /// Build an insert request without sending it.
    pub fn build_insert(&self, table: Table, row: &Row) -> Result<reqwest::Request, StoreError> {
        let url = self.table_url(table)?;
        let request = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(row)
            .build()?;
        Ok(request)
    }

    /// Send a request and decode the row array it returns.
    async fn execute(&self, request: reqwest::Request) -> Result<Vec<Row>, StoreError> {
        let response = self.http.execute(request).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: gateway_message(status.as_u16(), &body),
            });
        }

        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| StoreError::Decode(format!("failed to parse rows: {}", e)))
    }

    /// Wrap a call with request/failure counters and a latency timer.
    async fn tracked(
        &self,
        table: Table,
        op: &'static str,
        request: reqwest::Request,
    ) -> Result<Vec<Row>, StoreError> {
        metrics::inc_db_requests(table, op);
        let _timer = LatencyTimer::db(table, op);

        let result = self.execute(request).await;
        if let Err(e) = &result {
            metrics::inc_db_failures(table, op);
            warn!(%table, op, error = %e, "Database request failed");
        }
        result
    }
}

/// Pick the most useful message out of a gateway error body.
fn gateway_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<GatewayErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return match parsed.code {
                Some(code) => format!("{} ({})", message, code),
                None => message,
            };
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}

#[async_trait]
impl TableStore for SupabaseClient {
    #[instrument(skip_all, fields(table = %table, column = %filter.column))]
    async fn select(&self, table: Table, filter: &IsFilter) -> Result<Vec<Row>, StoreError> {
        let request = self.build_select(table, filter)?;
        let rows = self.tracked(table, "select", request).await?;
        debug!(count = rows.len(), "Selected rows");
        Ok(rows)
    }

    #[instrument(skip_all, fields(table = %table))]
    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> {
        let request = self.build_insert(table, &row)?;
        let rows = self.tracked(table, "insert", request).await?;
        debug!(count = rows.len(), "Inserted row");
        Ok(rows)
    }
}
