//! Capability detection
//!
//! The platform has no endpoint listing active capabilities, so they are
//! inferred from probes: installed package namespaces, and one-row queries
//! against objects that only exist (or only hold data) when a capability is
//! active. A failing probe is a negative signal for that probe alone.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::catalog::{ObjectProbe, ProbeCatalog};
use crate::client::SoqlClient;
use crate::error::InventoryError;
use crate::query::queries;
use crate::types::{CapabilityList, OrganizationRecord};

/// Result of evaluating one object probe
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The probe query returned at least one record
    Present,
    /// The probe query succeeded with no records
    Absent,
    /// The probe query failed; treated as absent
    Errored(InventoryError),
}

impl ProbeOutcome {
    /// Check if the outcome counts as evidence of the capability
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

/// Capability detector
///
/// Holds the probe catalog; the remote connection is supplied per call.
#[derive(Debug, Clone)]
pub struct CapabilityDetector {
    catalog: Arc<ProbeCatalog>,
    concurrency: usize,
}

impl CapabilityDetector {
    /// Create a detector that evaluates one object probe at a time
    pub fn new(catalog: Arc<ProbeCatalog>) -> Self {
        Self {
            catalog,
            concurrency: 1,
        }
    }

    /// Evaluate up to `n` object probes concurrently
    #[must_use]
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Probe catalog
    #[must_use]
    pub fn catalog(&self) -> &ProbeCatalog {
        &self.catalog
    }

    /// Detect active capabilities
    ///
    /// Never fails: the base capability is always first, followed by
    /// package-derived capabilities in package order, then object-derived
    /// capabilities in catalog order, each name kept at its first occurrence.
    #[instrument(skip_all, fields(org = %organization.id))]
    pub async fn detect_capabilities(
        &self,
        organization: &OrganizationRecord,
        client: &SoqlClient,
    ) -> CapabilityList {
        let mut capabilities = CapabilityList::with_base(&self.catalog.base_capability);

        match self.package_capabilities(client).await {
            Ok(names) => {
                for name in names {
                    capabilities.insert(&name);
                }
            }
            Err(e) => debug!(error = %e, "package list unavailable, skipping package probes"),
        }

        let outcomes = self.probe_objects(client).await;
        for (probe, outcome) in self.catalog.object_based.iter().zip(outcomes) {
            match outcome {
                ProbeOutcome::Present => {
                    capabilities.insert(&probe.capability);
                }
                ProbeOutcome::Absent => {
                    debug!(object = %probe.object, "probe returned no records");
                }
                ProbeOutcome::Errored(e) => {
                    debug!(object = %probe.object, error = %e, "probe failed, treating as absent");
                }
            }
        }

        info!(count = capabilities.len(), "capability detection completed");

        capabilities
    }

    /// Capabilities mapped from installed package namespaces, in package order
    ///
    /// # Errors
    /// Returns an error if the package query fails on every attempt.
    pub async fn package_capabilities(
        &self,
        client: &SoqlClient,
    ) -> Result<Vec<String>, InventoryError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct NamespaceRow {
            namespace_prefix: Option<String>,
        }

        let rows: Vec<NamespaceRow> = client
            .query("package namespaces", &queries::package_namespaces())
            .await?;

        let map = self.catalog.namespace_map();
        let names = rows
            .iter()
            .filter_map(|row| row.namespace_prefix.as_deref())
            .filter_map(|prefix| map.get(prefix))
            .map(|name| (*name).to_string())
            .collect();

        Ok(names)
    }

    /// Evaluate every object probe; outcomes are in catalog order
    pub async fn probe_objects(&self, client: &SoqlClient) -> Vec<ProbeOutcome> {
        stream::iter(&self.catalog.object_based)
            .map(|probe| Self::probe_object(client, probe))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Evaluate one object probe
    pub async fn probe_object(client: &SoqlClient, probe: &ObjectProbe) -> ProbeOutcome {
        let operation = format!("probe {}", probe.object);
        match client
            .query_raw(&operation, &queries::object_exists(&probe.object))
            .await
        {
            Ok(result) if result.is_empty() => ProbeOutcome::Absent,
            Ok(_) => ProbeOutcome::Present,
            Err(e) => ProbeOutcome::Errored(e),
        }
    }
}
