use async_trait::async_trait;
use std::fmt;

/// Service-discovery backend failure. `ConsulApiError` (spec.md §7) becomes
/// [`SdError::Backend`] here since the Consul adapter itself is built on
/// this same client stack (SPEC_FULL.md §6) and surfaces `HttpError`
/// through it.
#[derive(Debug)]
pub enum SdError {
    UnregisteredService(String),
    Backend(String),
}

impl fmt::Display for SdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdError::UnregisteredService(name) => write!(f, "no endpoint registered for service '{name}'"),
            SdError::Backend(msg) => write!(f, "service discovery backend error: {msg}"),
        }
    }
}

impl std::error::Error for SdError {}

/// Maps `(service, version?)` to a base URL. Implementations live in
/// `r2e-rpc-sd` (static table, Consul, router formatter); the trait itself
/// lives here so `r2e-rpc-core::ClientFactory` can depend on it without a
/// circular crate dependency.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    async fn get_endpoint(&self, service: &str, version: Option<&str>) -> Result<String, SdError>;
}
