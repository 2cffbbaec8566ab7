//! orgscan-exec: Remote query abstraction
//!
//! Provides the `QueryExecutor` trait, a REST implementation against the
//! platform query endpoint, and credential resolution for building connections.

pub mod auth;
pub mod error;
pub mod rate_limit;
pub mod rest;
pub mod result;
pub mod traits;

pub use auth::CredentialSource;
pub use error::ExecError;
pub use rate_limit::{RateLimit, RateLimiter};
pub use rest::RestExecutor;
pub use result::{ConnectionInfo, QueryResult};
pub use traits::QueryExecutor;
