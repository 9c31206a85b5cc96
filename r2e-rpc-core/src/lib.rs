//! Call-plane core for `r2e-rpc`: types, schema model, registry, route
//! proxy, middleware chain, and transport boundary for a declarative,
//! contract-driven HTTP client runtime.
//!
//! Application code registers a [`registry::Registry`], builds a
//! [`factory::ClientFactory`] around a [`sd::ServiceDiscovery`] adapter, and
//! resolves a [`client::Client`] per call via `ClientFactory::call`. Plugin
//! crates (`r2e-rpc-cache`, `r2e-rpc-breaker`, `r2e-rpc-prometheus`,
//! `r2e-rpc-observability`, `r2e-rpc-sd`) add [`middleware::Middleware`]
//! implementations and `ServiceDiscovery` adapters on top of this crate.

pub mod auth;
pub mod client;
pub mod error;
pub mod factory;
pub mod middleware;
pub mod registry;
pub mod route_proxy;
pub mod schema;
pub mod sd;
pub mod serializer;
pub mod transport;
pub mod types;

pub use auth::{BasicAuthorization, HTTPAuthorization, HTTPUnauthenticated};
pub use client::Client;
pub use error::{ConfigurationError, HttpError, TransportErrorKind};
pub use factory::{ClientFactory, ClientFactoryError};
pub use middleware::{InitOnce, Middleware, MiddlewareChain, Next};
pub use registry::{Registry, RouteDef, ServiceBinding};
pub use route_proxy::{CallTag, CollectionError, CollectionIterator, ResponseBox, RouteProxy};
pub use schema::{
    CollectionMeta, CollectionParser, DefaultCollectionParser, FieldSpec, Location, RequestSchema,
    Secret,
};
pub use sd::{SdError, ServiceDiscovery};
pub use serializer::{BodySerializer, FormUrlencodedBodySerializer, JsonBodySerializer, SerializerRegistry};
pub use transport::{CallContext, FakeTransport, ReqwestTransport, ReqwestTransportConfig, Transport};
pub use types::{HttpMethod, HttpRequest, HttpResponse, HttpTimeout, Link, Links, ParamValue};
