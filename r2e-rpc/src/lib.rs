//! R2E RPC — a declarative, contract-driven HTTP client runtime for
//! calling RPC-style REST services.
//!
//! This facade crate re-exports the call-plane sub-crates through a single
//! dependency with feature flags, mirroring the `r2e` facade crate's own
//! pattern. Import everything you need with:
//!
//! ```ignore
//! use r2e_rpc::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature         | Default | Crate                   |
//! |-----------------|---------|-------------------------|
//! | `cache`         | **yes** | `r2e-rpc-cache`         |
//! | `breaker`       | **yes** | `r2e-rpc-breaker`       |
//! | `prometheus`    | **yes** | `r2e-rpc-prometheus`    |
//! | `observability` | **yes** | `r2e-rpc-observability` |
//! | `sd`            | **yes** | `r2e-rpc-sd`            |
//!
//! # Quickstart
//!
//! ```ignore
//! use std::sync::Arc;
//! use r2e_rpc::prelude::*;
//!
//! let registry = Registry::new();
//! registry.register(
//!     "api_user", "users", "user", Some("v1"),
//!     Some("/users/{username}"), &[HttpMethod::Get],
//!     None, &[],
//! )?;
//!
//! let sd = StaticDiscovery::new().with_service("user", Some("v1"), "https://u.v1");
//! let factory = ClientFactory::new(Arc::new(sd)).with_registry(Arc::new(registry));
//!
//! let client = factory.call("api_user", None).await?;
//! let user: User = client.resource("users").get(UserReq { username: "alice".into() }, None, None)
//!     .await?
//!     .unwrap();
//! ```

// Re-export sub-crates as public modules, the same way the `r2e` facade
// crate exposes `r2e::r2e_core`, `r2e::r2e_security`, etc.
pub extern crate r2e_rpc_core;

#[cfg(feature = "cache")]
pub extern crate r2e_rpc_cache;

#[cfg(feature = "breaker")]
pub extern crate r2e_rpc_breaker;

#[cfg(feature = "prometheus")]
pub extern crate r2e_rpc_prometheus;

#[cfg(feature = "observability")]
pub extern crate r2e_rpc_observability;

#[cfg(feature = "sd")]
pub extern crate r2e_rpc_sd;

// Re-export everything from r2e-rpc-core at the top level for convenience.
pub use r2e_rpc_core::*;

#[cfg(feature = "cache")]
pub use r2e_rpc_cache as cache;

#[cfg(feature = "breaker")]
pub use r2e_rpc_breaker as breaker;

#[cfg(feature = "prometheus")]
pub use r2e_rpc_prometheus as prometheus;

#[cfg(feature = "observability")]
pub use r2e_rpc_observability as observability;

#[cfg(feature = "sd")]
pub use r2e_rpc_sd as sd;

/// Unified prelude — import everything with `use r2e_rpc::prelude::*`.
pub mod prelude {
    pub use r2e_rpc_core::{
        BasicAuthorization, Client, ClientFactory, ClientFactoryError, CollectionError,
        CollectionIterator, CollectionMeta, CollectionParser, ConfigurationError,
        DefaultCollectionParser, FakeTransport, FieldSpec, HTTPAuthorization, HttpError,
        HttpMethod, HttpRequest, HttpResponse, HttpTimeout, Location, Middleware, MiddlewareChain,
        Registry, RequestSchema, ResponseBox, RouteProxy, Secret, SdError, ServiceDiscovery,
        Transport,
    };

    #[cfg(feature = "cache")]
    pub use r2e_rpc_cache::{CacheControlPolicy, CacheStore, HttpCacheMiddleware, InMemoryStore};

    #[cfg(feature = "breaker")]
    pub use r2e_rpc_breaker::{CircuitBreakerMiddleware, CircuitState};

    #[cfg(feature = "prometheus")]
    pub use r2e_rpc_prometheus::{MetricsConfig, PrometheusMetrics};

    #[cfg(feature = "observability")]
    pub use r2e_rpc_observability::{ObservabilityConfig, TracingMiddleware};

    #[cfg(feature = "sd")]
    pub use r2e_rpc_sd::{ConsulConfig, ConsulDiscovery, RouterDiscovery, StaticDiscovery};
}
