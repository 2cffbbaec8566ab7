//! Remote query executor trait

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::QueryResult;

/// Executes query-language strings against a remote account.
///
/// Implementations return every record of the result set in server order,
/// following pagination internally.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a single query
    async fn query(&self, soql: &str) -> Result<QueryResult, ExecError>;

    /// Short identifier used in logs
    fn executor_type(&self) -> &'static str;
}
