//! Credential resolution for building a `ConnectionInfo`

use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use crate::error::ExecError;
use crate::result::ConnectionInfo;

/// Where connection credentials come from
#[derive(Clone)]
pub enum CredentialSource {
    /// Instance URL and access token supplied directly
    Token {
        /// Instance base URL
        instance_url: String,
        /// OAuth access token
        access_token: String,
    },
    /// Org alias or username known to the `sf` CLI
    SfCli {
        /// Alias or username passed to `--target-org`
        target_org: String,
    },
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Token { instance_url, .. } => f
                .debug_struct("Token")
                .field("instance_url", instance_url)
                .finish_non_exhaustive(),
            CredentialSource::SfCli { target_org } => f
                .debug_struct("SfCli")
                .field("target_org", target_org)
                .finish(),
        }
    }
}

/// `sf org display --json` envelope
#[derive(Debug, Deserialize)]
struct OrgDisplayEnvelope {
    status: i32,
    result: Option<OrgDisplayResult>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgDisplayResult {
    access_token: String,
    instance_url: String,
    username: Option<String>,
    api_version: Option<String>,
}

impl CredentialSource {
    /// Resolve credentials into connection information
    ///
    /// `api_version` is used unless the `sf` CLI reports one for the org.
    ///
    /// # Errors
    /// Returns `ExecError::AuthFailed` if credentials cannot be obtained.
    #[instrument(skip(self))]
    pub async fn resolve(&self, api_version: &str) -> Result<ConnectionInfo, ExecError> {
        match self {
            CredentialSource::Token {
                instance_url,
                access_token,
            } => {
                if instance_url.is_empty() || access_token.is_empty() {
                    return Err(ExecError::AuthFailed(
                        "instance URL and access token are both required".to_string(),
                    ));
                }
                Ok(ConnectionInfo::new(instance_url, access_token).with_api_version(api_version))
            }
            CredentialSource::SfCli { target_org } => {
                let stdout = run_org_display(target_org, Duration::from_secs(60)).await?;
                let mut info = parse_org_display(&stdout)?;
                if info.api_version.is_empty() {
                    info = info.with_api_version(api_version);
                }
                info!(instance = %info.instance_url, "resolved org credentials via sf cli");
                Ok(info)
            }
        }
    }
}

/// Run `sf org display` and return its stdout
async fn run_org_display(target_org: &str, limit: Duration) -> Result<String, ExecError> {
    debug!(target_org = %target_org, "running sf org display");

    let child = Command::new("sf")
        .args(["org", "display", "--target-org", target_org, "--json"])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::SpawnError(format!("sf: {e}")))?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(ExecError::SpawnError(e.to_string())),
        Err(_) => {
            error!(target_org = %target_org, timeout = ?limit, "sf org display timed out");
            return Err(ExecError::Timeout { timeout: limit });
        }
    };

    // `sf --json` reports failures in the JSON body as well, so stdout is parsed either way
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if stdout.trim().is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExecError::AuthFailed(format!(
            "sf org display produced no output: {}",
            stderr.trim()
        )));
    }

    Ok(stdout)
}

/// Parse the JSON printed by `sf org display --json`
///
/// An empty `api_version` in the returned info means the CLI did not report one.
///
/// # Errors
/// Returns `ExecError::AuthFailed` if the command reported an error or the
/// output lacks a token.
pub fn parse_org_display(stdout: &str) -> Result<ConnectionInfo, ExecError> {
    let envelope: OrgDisplayEnvelope = serde_json::from_str(stdout)
        .map_err(|e| ExecError::InvalidResponse(format!("sf org display: {e}")))?;

    if envelope.status != 0 {
        return Err(ExecError::AuthFailed(
            envelope
                .message
                .unwrap_or_else(|| format!("sf exited with status {}", envelope.status)),
        ));
    }

    let result = envelope
        .result
        .ok_or_else(|| ExecError::AuthFailed("sf org display returned no result".to_string()))?;

    let mut info = ConnectionInfo::new(result.instance_url, result.access_token);
    info.api_version = result
        .api_version
        .map(|v| v.trim_start_matches('v').to_string())
        .unwrap_or_default();
    if let Some(username) = result.username {
        info = info.with_username(username);
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_org_display_success() {
        let stdout = r#"{
            "status": 0,
            "result": {
                "id": "00D5g000000abcd",
                "apiVersion": "61.0",
                "accessToken": "00D5g!AQ4AQ",
                "instanceUrl": "https://acme.my.salesforce.com",
                "username": "admin@acme.com",
                "alias": "acme"
            }
        }"#;

        let info = parse_org_display(stdout).unwrap();
        assert_eq!(info.instance_url, "https://acme.my.salesforce.com");
        assert_eq!(info.access_token, "00D5g!AQ4AQ");
        assert_eq!(info.api_version, "61.0");
        assert_eq!(info.username.as_deref(), Some("admin@acme.com"));
    }

    #[test]
    fn test_parse_org_display_error_status() {
        let stdout = r#"{"status": 1, "name": "NoOrgFound", "message": "No authorization information found for nope."}"#;

        let err = parse_org_display(stdout).unwrap_err();
        assert!(matches!(err, ExecError::AuthFailed(msg) if msg.contains("nope")));
    }

    #[test]
    fn test_parse_org_display_garbage() {
        let err = parse_org_display("Warning: update available").unwrap_err();
        assert!(matches!(err, ExecError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_token_source_requires_both_values() {
        let source = CredentialSource::Token {
            instance_url: "https://acme.my.salesforce.com".to_string(),
            access_token: String::new(),
        };

        let err = source.resolve("62.0").await.unwrap_err();
        assert!(matches!(err, ExecError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_token_source_resolves() {
        let source = CredentialSource::Token {
            instance_url: "https://acme.my.salesforce.com".to_string(),
            access_token: "token".to_string(),
        };

        let info = source.resolve("60.0").await.unwrap();
        assert_eq!(info.api_version, "60.0");
    }
}
