//! Capability probe catalog
//!
//! Probes come in two kinds. Package-based probes map an installed package's
//! namespace prefix to a capability. Object-based probes map an object type to
//! a capability that is present when a one-row query against it returns data.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Namespace prefix → capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageProbe {
    /// Namespace prefix, matched exactly and case-sensitively
    pub prefix: String,
    /// Capability reported when a package with this prefix is installed
    pub capability: String,
}

/// Object existence → capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProbe {
    /// Object API name
    pub object: String,
    /// Capability reported when the object returns at least one record
    pub capability: String,
}

/// The fixed set of probes evaluated by the capability detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeCatalog {
    /// Always-on capability, reported first for every account
    pub base_capability: String,
    /// Package-based probes
    #[serde(default)]
    pub package_based: Vec<PackageProbe>,
    /// Object-based probes, evaluated in this order
    #[serde(default)]
    pub object_based: Vec<ObjectProbe>,
}

impl ProbeCatalog {
    /// Create a catalog with only the base capability
    pub fn new(base_capability: impl Into<String>) -> Self {
        Self {
            base_capability: base_capability.into(),
            package_based: Vec::new(),
            object_based: Vec::new(),
        }
    }

    /// Add a package-based probe
    #[must_use]
    pub fn with_package(mut self, prefix: impl Into<String>, capability: impl Into<String>) -> Self {
        self.package_based.push(PackageProbe {
            prefix: prefix.into(),
            capability: capability.into(),
        });
        self
    }

    /// Add an object-based probe
    #[must_use]
    pub fn with_object(mut self, object: impl Into<String>, capability: impl Into<String>) -> Self {
        self.object_based.push(ObjectProbe {
            object: object.into(),
            capability: capability.into(),
        });
        self
    }

    /// Lookup table from namespace prefix to capability
    #[must_use]
    pub fn namespace_map(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::with_capacity(self.package_based.len());
        for probe in &self.package_based {
            map.entry(probe.prefix.as_str())
                .or_insert(probe.capability.as_str());
        }
        map
    }

    /// Check the catalog is usable
    ///
    /// # Errors
    /// Returns `InventoryError::ConfigError` for an empty base capability,
    /// empty or duplicate prefixes, or object names that are not plain
    /// identifiers (they are interpolated into queries).
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.base_capability.trim().is_empty() {
            return Err(InventoryError::ConfigError(
                "detection.base_capability must not be empty".to_string(),
            ));
        }

        let mut prefixes = HashSet::new();
        for probe in &self.package_based {
            if probe.prefix.is_empty() || probe.capability.trim().is_empty() {
                return Err(InventoryError::ConfigError(format!(
                    "package probe has empty prefix or capability: {probe:?}"
                )));
            }
            if !prefixes.insert(probe.prefix.as_str()) {
                return Err(InventoryError::ConfigError(format!(
                    "duplicate package prefix: {}",
                    probe.prefix
                )));
            }
        }

        for probe in &self.object_based {
            if !is_identifier(&probe.object) {
                return Err(InventoryError::ConfigError(format!(
                    "invalid object name in probe: {:?}",
                    probe.object
                )));
            }
            if probe.capability.trim().is_empty() {
                return Err(InventoryError::ConfigError(format!(
                    "object probe {} has empty capability",
                    probe.object
                )));
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
