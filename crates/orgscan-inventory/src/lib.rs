//! orgscan-inventory: account inventory and capability detection
//!
//! Collects organization metadata, packages, licenses and integration points
//! over a `QueryExecutor`, and infers active capabilities from a probe catalog.
//! Every remote call goes through a bounded retry policy.

pub mod assembler;
pub mod catalog;
pub mod client;
pub mod config;
pub mod detector;
pub mod error;
pub mod query;
pub mod retry;
pub mod types;

pub use assembler::InventoryAssembler;
pub use catalog::{ObjectProbe, PackageProbe, ProbeCatalog};
pub use client::SoqlClient;
pub use config::InventoryConfig;
pub use detector::{CapabilityDetector, ProbeOutcome};
pub use error::InventoryError;
pub use retry::{RetryError, RetryPolicy};
pub use types::{Capability, CapabilityList, CapabilityStatus, InventoryReport, Section};
