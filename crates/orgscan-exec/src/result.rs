//! Result and connection types for query execution

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default REST API version used when none is configured
pub const DEFAULT_API_VERSION: &str = "62.0";

/// Records returned by a query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Total number of records reported by the server
    pub total_size: u64,
    /// Records in server order
    pub records: Vec<Value>,
}

impl QueryResult {
    /// Create a result from a record list
    #[must_use]
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            total_size: records.len() as u64,
            records,
        }
    }

    /// Check if the result set has no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Connection information for the REST API
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Instance base URL (e.g. `https://acme.my.salesforce.com`)
    pub instance_url: String,
    /// OAuth access token
    pub access_token: String,
    /// REST API version, without the leading `v`
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Username the token belongs to, when known
    pub username: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl ConnectionInfo {
    /// Create new connection info
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: default_api_version(),
            username: None,
        }
    }

    /// Set API version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into().trim_start_matches('v').to_string();
        self
    }

    /// Set username
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl std::fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let info = ConnectionInfo::new("https://acme.my.salesforce.com", "00Dsecret!token");
        let debug = format!("{info:?}");

        assert!(debug.contains("acme.my.salesforce.com"));
        assert!(!debug.contains("00Dsecret"));
    }

    #[test]
    fn test_api_version_strips_prefix() {
        let info = ConnectionInfo::new("https://x", "t").with_api_version("v60.0");
        assert_eq!(info.api_version, "60.0");
    }
}
