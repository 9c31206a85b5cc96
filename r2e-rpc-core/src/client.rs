use crate::error::HttpError;
use crate::middleware::{Middleware, MiddlewareChain};
use crate::registry::{Registry, RouteDef};
use crate::route_proxy::RouteProxy;
use crate::schema::CollectionParser;
use crate::serializer::SerializerRegistry;
use crate::transport::Transport;
use crate::types::HttpTimeout;
use std::sync::Arc;

/// A short-lived handle bound to one resolved endpoint. Created by
/// `ClientFactory::call`; attribute-style resource access (`client.users`)
/// is re-expressed as `client.resource("users")` returning a [`RouteProxy`]
/// (SPEC_FULL.md §9 design note).
pub struct Client {
    pub(crate) registry: Arc<Registry>,
    pub(crate) client_name: String,
    pub(crate) endpoint: String,
    pub(crate) chain: MiddlewareChain,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) serializers: Arc<SerializerRegistry>,
    pub(crate) default_timeout: HttpTimeout,
    pub(crate) auth: Option<Arc<dyn Middleware>>,
    pub(crate) factory_auth: Arc<dyn Middleware>,
    pub(crate) collection_parser: Arc<dyn CollectionParser>,
    pub(crate) error_parser: Arc<dyn Fn(HttpError) -> HttpError + Send + Sync>,
}

impl Client {
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Prepends `middleware` to *this client's* chain only — it does not
    /// retroactively affect the factory's chain nor any other client
    /// created from that factory (spec.md §4.4, §5).
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.chain.add_middleware(middleware);
    }

    /// Sets (or replaces) this client's auth override, which outranks the
    /// factory default but is itself outranked by any per-call auth
    /// (spec.md §4.8).
    pub fn with_auth(mut self, auth: Arc<dyn Middleware>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Returns the `RouteProxy` for `resource`. Missing resources still
    /// produce a proxy — its verb methods raise `ConfigurationError` lazily,
    /// matching the original's dynamic attribute-resolution-at-call-time
    /// behavior rather than failing at attribute access.
    pub fn resource(&self, resource: &str) -> RouteProxy {
        let route = self
            .registry
            .get_route(&self.client_name, resource)
            .unwrap_or_else(RouteDef::default);
        RouteProxy {
            client_name: self.client_name.clone(),
            resource: resource.to_string(),
            endpoint: self.endpoint.clone(),
            route,
            chain: self.chain.clone(),
            transport: self.transport.clone(),
            serializers: self.serializers.clone(),
            default_timeout: self.default_timeout,
            client_auth: self.auth.clone(),
            factory_auth: self.factory_auth.clone(),
            collection_parser: self.collection_parser.clone(),
            error_parser: self.error_parser.clone(),
        }
    }
}
