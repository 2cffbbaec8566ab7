//! REST query execution using reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::error::ExecError;
use crate::rate_limit::{RateLimit, RateLimiter};
use crate::result::{ConnectionInfo, QueryResult};
use crate::traits::QueryExecutor;

/// One page of a query response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    total_size: u64,
    done: bool,
    #[serde(default)]
    records: Vec<Value>,
    next_records_url: Option<String>,
}

/// Error entry in a platform error body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    message: String,
    error_code: String,
}

/// REST query executor
///
/// Runs queries through `/services/data/v{version}/query` and follows
/// `nextRecordsUrl` until the server reports the result set as done.
pub struct RestExecutor {
    client: Client,
    conn_info: ConnectionInfo,
    base_url: Url,
    limiter: Option<RateLimiter>,
    timeout: Duration,
}

impl std::fmt::Debug for RestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestExecutor")
            .field("conn_info", &self.conn_info)
            .field("rate_limit", &self.limiter.as_ref().map(RateLimiter::limit))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RestExecutor {
    /// Create a new REST executor
    ///
    /// # Errors
    /// Returns an error if the instance URL is invalid or the HTTP client cannot be built.
    pub fn new(conn_info: ConnectionInfo) -> Result<Self, ExecError> {
        Self::with_timeout(conn_info, Duration::from_secs(120))
    }

    /// Create a new REST executor with a per-request timeout
    ///
    /// # Errors
    /// Returns an error if the instance URL is invalid or the HTTP client cannot be built.
    pub fn with_timeout(conn_info: ConnectionInfo, timeout: Duration) -> Result<Self, ExecError> {
        let base_url = Url::parse(&conn_info.instance_url)
            .map_err(|e| ExecError::ConfigError(format!("invalid instance URL: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            conn_info,
            base_url,
            limiter: None,
            timeout,
        })
    }

    /// Limit outgoing requests
    #[must_use]
    pub fn with_rate_limit(mut self, limit: RateLimit) -> Self {
        self.limiter = Some(RateLimiter::new(limit));
        self
    }

    /// Get connection information
    #[must_use]
    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.conn_info
    }

    /// URL of the first page of a query
    fn query_url(&self, soql: &str) -> Result<Url, ExecError> {
        let mut url = self
            .base_url
            .join(&format!(
                "/services/data/v{}/query",
                self.conn_info.api_version
            ))
            .map_err(|e| ExecError::ConfigError(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", soql);
        Ok(url)
    }

    /// Fetch one page
    async fn fetch_page(&self, url: Url) -> Result<QueryPage, ExecError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.conn_info.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| ExecError::InvalidResponse(e.to_string()))
    }

    fn transport_error(&self, e: &reqwest::Error) -> ExecError {
        if e.is_timeout() {
            ExecError::Timeout {
                timeout: self.timeout,
            }
        } else {
            ExecError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl QueryExecutor for RestExecutor {
    #[instrument(skip(self), level = "debug")]
    async fn query(&self, soql: &str) -> Result<QueryResult, ExecError> {
        let mut page = self.fetch_page(self.query_url(soql)?).await?;
        let total_size = page.total_size;
        let mut records = std::mem::take(&mut page.records);

        while !page.done {
            let Some(next) = page.next_records_url.take() else {
                return Err(ExecError::InvalidResponse(
                    "result not done but no nextRecordsUrl".to_string(),
                ));
            };
            let url = self
                .base_url
                .join(&next)
                .map_err(|e| ExecError::InvalidResponse(e.to_string()))?;

            debug!(next = %next, fetched = records.len(), "fetching next page");
            page = self.fetch_page(url).await?;
            records.append(&mut page.records);
        }

        debug!(rows = records.len(), "query completed");

        Ok(QueryResult {
            total_size,
            records,
        })
    }

    fn executor_type(&self) -> &'static str {
        "rest"
    }
}

/// Build an `ExecError::Api` from a non-success response body
fn api_error(status: u16, body: &str) -> ExecError {
    match serde_json::from_str::<Vec<ApiErrorBody>>(body) {
        Ok(errors) if !errors.is_empty() => {
            let first = &errors[0];
            ExecError::Api {
                status,
                code: first.error_code.clone(),
                message: first.message.clone(),
            }
        }
        _ => ExecError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: body.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> RestExecutor {
        let info = ConnectionInfo::new("https://acme.my.salesforce.com", "token");
        RestExecutor::new(info).unwrap()
    }

    #[test]
    fn test_query_url_encodes_soql() {
        let url = executor()
            .query_url("SELECT Id FROM Case LIMIT 1")
            .unwrap();

        assert_eq!(url.path(), "/services/data/v62.0/query");
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "q");
        assert_eq!(value, "SELECT Id FROM Case LIMIT 1");
    }

    #[test]
    fn test_invalid_instance_url() {
        let info = ConnectionInfo::new("not a url", "token");
        let result = RestExecutor::new(info);
        assert!(matches!(result, Err(ExecError::ConfigError(_))));
    }

    #[test]
    fn test_api_error_parses_platform_body() {
        let body = r#"[{"message":"sObject type 'AnalyticsSettings' is not supported.","errorCode":"INVALID_TYPE"}]"#;
        let err = api_error(400, body);

        match err {
            ExecError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "INVALID_TYPE");
                assert!(message.contains("AnalyticsSettings"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_falls_back_to_raw_body() {
        let err = api_error(503, "  Service Unavailable \n");
        assert_eq!(err.api_code(), Some("UNKNOWN"));
        assert!(err.to_string().ends_with("Service Unavailable"));
    }

    #[test]
    fn test_query_page_deserialize() {
        let body = r#"{
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v62.0/query/01gxx-2000",
            "records": [{"attributes": {"type": "Case"}, "Id": "500xx"}]
        }"#;
        let page: QueryPage = serde_json::from_str(body).unwrap();

        assert_eq!(page.total_size, 3);
        assert!(!page.done);
        assert_eq!(page.records.len(), 1);
        assert_eq!(
            page.next_records_url.as_deref(),
            Some("/services/data/v62.0/query/01gxx-2000")
        );
    }
}
