//! Inventory assembly
//!
//! Only the organization query is critical. Every other section is collected
//! in isolation: a section that fails after all retries is recorded with an
//! error marker and the run continues.

use std::sync::Arc;

use chrono::Utc;
use orgscan_exec::QueryExecutor;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use crate::client::SoqlClient;
use crate::config::InventoryConfig;
use crate::detector::CapabilityDetector;
use crate::error::InventoryError;
use crate::query::{Query, queries};
use crate::retry::RetryPolicy;
use crate::types::{
    CapabilityList, CustomSetting, Integrations, InventoryReport, NamedCredential,
    OrganizationRecord, OrganizationSummary, PackageLicense, PermissionSetLicense, Section,
    UserLicense, REPORT_VERSION,
};

/// Inventory assembler
///
/// High-level API for collecting an account inventory.
#[derive(Debug, Clone)]
pub struct InventoryAssembler {
    client: SoqlClient,
    detector: CapabilityDetector,
}

impl InventoryAssembler {
    /// Create an assembler from configuration
    pub fn new(executor: Arc<dyn QueryExecutor>, config: &InventoryConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.performance);
        let detector = CapabilityDetector::new(Arc::new(config.detection.clone()))
            .with_concurrency(config.performance.batch_size);
        Self::from_parts(SoqlClient::new(executor, retry), detector)
    }

    /// Create an assembler from an existing client and detector
    #[must_use]
    pub fn from_parts(client: SoqlClient, detector: CapabilityDetector) -> Self {
        Self { client, detector }
    }

    /// Collect the full inventory
    ///
    /// # Errors
    /// Returns an error only if the organization record cannot be fetched.
    /// Failures of other sections are recorded in the report.
    #[instrument(skip(self))]
    pub async fn build_inventory(&self) -> Result<InventoryReport, InventoryError> {
        info!("collecting full inventory");

        let organization = self.organization().await?;

        let (packages, user_licenses, permission_set_licenses, named_credentials, capabilities) = tokio::join!(
            self.section("installed packages", self.installed_packages()),
            self.section("user licenses", self.user_licenses()),
            self.section("permission set licenses", self.permission_set_licenses()),
            self.section("named credentials", self.named_credentials()),
            self.detector.detect_capabilities(&organization, &self.client),
        );

        let report = InventoryReport {
            organization: OrganizationSummary::from(&organization),
            cloud_products: capabilities,
            installed_packages: packages,
            user_licenses,
            permission_set_licenses,
            integrations: Integrations {
                named_credentials,
                custom_settings: None,
            },
            collected_at: Utc::now(),
            version: REPORT_VERSION.to_string(),
        };

        let failed = report.failed_sections();
        if failed.is_empty() {
            info!("inventory collection completed");
        } else {
            warn!(failed = ?failed, "inventory collection completed with missing sections");
        }

        Ok(report)
    }

    /// Detect capabilities for the account
    ///
    /// # Errors
    /// Returns an error if the organization record cannot be fetched.
    #[instrument(skip(self))]
    pub async fn cloud_products(&self) -> Result<CapabilityList, InventoryError> {
        let organization = self.organization().await?;
        Ok(self
            .detector
            .detect_capabilities(&organization, &self.client)
            .await)
    }

    /// Get the organization record
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt or returns no record.
    #[instrument(skip(self))]
    pub async fn organization(&self) -> Result<OrganizationRecord, InventoryError> {
        let rows: Vec<OrganizationRecord> = self
            .client
            .query("organization", &queries::organization())
            .await?;

        rows.into_iter()
            .next()
            .ok_or(InventoryError::OrganizationNotFound)
    }

    /// Get installed packages
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt.
    pub async fn installed_packages(&self) -> Result<Vec<PackageLicense>, InventoryError> {
        self.fetch("installed packages", &queries::package_licenses())
            .await
    }

    /// Get user licenses
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt.
    pub async fn user_licenses(&self) -> Result<Vec<UserLicense>, InventoryError> {
        self.fetch("user licenses", &queries::user_licenses()).await
    }

    /// Get permission set licenses
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt.
    pub async fn permission_set_licenses(
        &self,
    ) -> Result<Vec<PermissionSetLicense>, InventoryError> {
        self.fetch("permission set licenses", &queries::permission_set_licenses())
            .await
    }

    /// Get named credentials
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt.
    pub async fn named_credentials(&self) -> Result<Vec<NamedCredential>, InventoryError> {
        self.fetch("named credentials", &queries::named_credentials())
            .await
    }

    /// Get custom settings
    ///
    /// # Errors
    /// Returns an error if the query fails on every attempt.
    pub async fn custom_settings(&self) -> Result<Vec<CustomSetting>, InventoryError> {
        self.fetch("custom settings", &queries::custom_settings())
            .await
    }

    /// Get named credentials and custom settings, each isolated
    #[instrument(skip(self))]
    pub async fn integrations(&self) -> Integrations {
        let (named_credentials, custom_settings) = tokio::join!(
            self.section("named credentials", self.named_credentials()),
            self.section("custom settings", self.custom_settings()),
        );

        Integrations {
            named_credentials,
            custom_settings: Some(custom_settings),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &Query,
    ) -> Result<Vec<T>, InventoryError> {
        let rows = self.client.query(operation, query).await?;
        info!(section = operation, count = rows.len(), "collected section");
        Ok(rows)
    }

    /// Convert a section result into a `Section`, logging failures
    async fn section<T>(
        &self,
        name: &str,
        fetch: impl Future<Output = Result<Vec<T>, InventoryError>>,
    ) -> Section<T> {
        match fetch.await {
            Ok(records) => Section::collected(records),
            Err(e) => {
                warn!(section = name, error = %e, "failed to collect section");
                Section::failed(e)
            }
        }
    }
}
