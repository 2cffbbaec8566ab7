//! Retrying SOQL client

use std::sync::Arc;

use orgscan_exec::{QueryExecutor, QueryResult};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::InventoryError;
use crate::query::Query;
use crate::retry::RetryPolicy;

/// SOQL client
///
/// Runs every query through the retry policy and decodes records.
/// Nothing is cached; each call reaches the remote account.
#[derive(Clone)]
pub struct SoqlClient {
    /// Remote executor
    executor: Arc<dyn QueryExecutor>,
    /// Retry policy applied to each query
    retry: RetryPolicy,
}

impl SoqlClient {
    /// Create a new client
    pub fn new(executor: Arc<dyn QueryExecutor>, retry: RetryPolicy) -> Self {
        Self { executor, retry }
    }

    /// Retry policy in use
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Execute a query, returning raw records
    ///
    /// # Errors
    /// Returns `InventoryError::Remote` once every attempt has failed.
    #[instrument(skip(self, query), fields(object = query.object(), soql = %query, executor = self.executor.executor_type()))]
    pub async fn query_raw(
        &self,
        operation: &str,
        query: &Query,
    ) -> Result<QueryResult, InventoryError> {
        debug!("executing query");

        let soql = query.build();
        let result = self
            .retry
            .run(operation, || self.executor.query(&soql))
            .await?;

        debug!(rows = result.records.len(), "query completed");

        Ok(result)
    }

    /// Execute a typed query
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt or a record
    /// cannot be decoded into `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &Query,
    ) -> Result<Vec<T>, InventoryError> {
        let result = self.query_raw(operation, query).await?;

        let mut rows = Vec::with_capacity(result.records.len());
        for value in result.records {
            let row: T = serde_json::from_value(value).map_err(|e| InventoryError::ParseError {
                operation: operation.to_string(),
                message: e.to_string(),
            })?;
            rows.push(row);
        }

        Ok(rows)
    }
}

impl std::fmt::Debug for SoqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoqlClient")
            .field("executor", &self.executor.executor_type())
            .field("retry", &self.retry)
            .finish()
    }
}
