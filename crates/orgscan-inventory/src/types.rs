//! Inventory type definitions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Report schema version
pub const REPORT_VERSION: &str = "1.0";

// ============================================================================
// Records
// ============================================================================

/// Organization record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationRecord {
    /// Record ID
    pub id: String,
    /// Organization name
    pub name: String,
    /// Edition (Enterprise Edition, Developer Edition, ...)
    #[serde(default)]
    pub organization_type: String,
    /// Whether this is a sandbox
    #[serde(default)]
    pub is_sandbox: bool,
    /// Instance name (e.g. `NA123`)
    #[serde(default)]
    pub instance_name: String,
}

/// Installed package license
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageLicense {
    /// Record ID
    pub id: String,
    /// Namespace prefix (absent for unmanaged packages)
    pub namespace_prefix: Option<String>,
    /// License status
    pub status: Option<String>,
    /// Allowed seats, `-1` for unlimited
    pub allowed_licenses: Option<i64>,
    /// Used seats
    pub used_licenses: Option<i64>,
    /// Creation timestamp
    pub created_date: Option<String>,
    /// Expiration timestamp, absent for packages that never expire
    pub expiration_date: Option<String>,
}

/// User license
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserLicense {
    /// Record ID
    pub id: String,
    /// API name
    pub name: String,
    /// Display label
    pub master_label: String,
    /// License status
    #[serde(default)]
    pub status: String,
    /// Total seats
    #[serde(default)]
    pub total_licenses: i64,
    /// Used seats
    #[serde(default)]
    pub used_licenses: i64,
}

/// Permission set license
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionSetLicense {
    /// Record ID
    pub id: String,
    /// Display label
    pub master_label: String,
    /// License status
    #[serde(default)]
    pub status: String,
    /// Total seats
    #[serde(default)]
    pub total_licenses: i64,
    /// Used seats
    #[serde(default)]
    pub used_licenses: i64,
    /// Expiration date
    pub expiration_date: Option<String>,
}

/// Named credential
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamedCredential {
    /// Record ID
    pub id: String,
    /// API name
    pub developer_name: String,
    /// Display label
    pub master_label: String,
    /// Callout endpoint
    pub endpoint: Option<String>,
}

/// Custom setting definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomSetting {
    /// Record ID
    pub id: String,
    /// API name
    pub developer_name: String,
    /// Display label
    pub master_label: String,
}

// ============================================================================
// Capabilities
// ============================================================================

/// Capability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityStatus {
    /// Capability is active on the account
    Enabled,
}

impl fmt::Display for CapabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityStatus::Enabled => write!(f, "Enabled"),
        }
    }
}

/// Named optional feature of the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Capability name; identity of the capability
    pub name: String,
    /// Status
    pub status: CapabilityStatus,
}

impl Capability {
    /// Create an enabled capability
    pub fn enabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CapabilityStatus::Enabled,
        }
    }
}

/// Capabilities keyed by name, in first-seen order
///
/// The base capability is always the first entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct CapabilityList(Vec<Capability>);

impl TryFrom<Vec<Capability>> for CapabilityList {
    type Error = String;

    fn try_from(capabilities: Vec<Capability>) -> Result<Self, Self::Error> {
        let mut iter = capabilities.into_iter();
        let Some(base) = iter.next() else {
            return Err("capability list must start with the base capability".to_string());
        };

        let mut list = Self(vec![base]);
        for capability in iter {
            if list.contains(&capability.name) {
                return Err(format!("duplicate capability: {}", capability.name));
            }
            list.0.push(capability);
        }
        Ok(list)
    }
}

impl From<CapabilityList> for Vec<Capability> {
    fn from(list: CapabilityList) -> Self {
        list.0
    }
}

impl CapabilityList {
    /// Create a list holding only the base capability
    pub fn with_base(base: impl Into<String>) -> Self {
        Self(vec![Capability::enabled(base)])
    }

    /// Add a capability unless one with the same name exists
    ///
    /// Returns `true` if the capability was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(Capability::enabled(name));
        true
    }

    /// Check for a capability by name
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.name == name)
    }

    /// Capability names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }

    /// Iterate capabilities in order
    pub fn iter(&self) -> std::slice::Iter<'_, Capability> {
        self.0.iter()
    }

    /// Number of capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the base capability is always present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a CapabilityList {
    type Item = &'a Capability;
    type IntoIter = std::slice::Iter<'a, Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Report
// ============================================================================

/// Records of one inventory section, or the reason they are missing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section<T> {
    /// Collected records; empty when collection failed
    pub records: Vec<T>,
    /// Failure message when collection failed after all retries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Section<T> {
    /// Successfully collected section
    #[must_use]
    pub fn collected(records: Vec<T>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    /// Section that could not be collected
    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            records: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Check if the section failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self::collected(Vec::new())
    }
}

/// Organization summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: String,
    /// Organization name
    pub name: String,
    /// Edition
    #[serde(rename = "type")]
    pub org_type: String,
    /// Whether this is a sandbox
    pub is_sandbox: bool,
    /// Instance name
    pub instance: String,
    /// Enabled feature names; omitted when none are known
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl From<&OrganizationRecord> for OrganizationSummary {
    fn from(record: &OrganizationRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            org_type: record.organization_type.clone(),
            is_sandbox: record.is_sandbox,
            instance: record.instance_name.clone(),
            features: Vec::new(),
        }
    }
}

/// Integration points
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrations {
    /// Named credentials
    pub named_credentials: Section<NamedCredential>,
    /// Custom settings, collected only by the integrations listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_settings: Option<Section<CustomSetting>>,
}

impl Integrations {
    /// Check if no integration points were found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named_credentials.records.is_empty()
            && self
                .custom_settings
                .as_ref()
                .is_none_or(|s| s.records.is_empty())
    }
}

/// Complete account inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    /// Organization summary
    pub organization: OrganizationSummary,
    /// Detected capabilities
    pub cloud_products: CapabilityList,
    /// Installed packages
    pub installed_packages: Section<PackageLicense>,
    /// User licenses
    pub user_licenses: Section<UserLicense>,
    /// Permission set licenses
    pub permission_set_licenses: Section<PermissionSetLicense>,
    /// Integration points
    pub integrations: Integrations,
    /// When the inventory was collected
    pub collected_at: DateTime<Utc>,
    /// Report schema version
    pub version: String,
}

impl InventoryReport {
    /// Names of sections that failed to collect
    #[must_use]
    pub fn failed_sections(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.installed_packages.is_failed() {
            failed.push("installedPackages");
        }
        if self.user_licenses.is_failed() {
            failed.push("userLicenses");
        }
        if self.permission_set_licenses.is_failed() {
            failed.push("permissionSetLicenses");
        }
        if self.integrations.named_credentials.is_failed() {
            failed.push("namedCredentials");
        }
        failed
    }

    /// Check if every section was collected
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_sections().is_empty()
    }
}
