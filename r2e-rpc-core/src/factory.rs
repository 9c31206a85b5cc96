use crate::auth::HTTPUnauthenticated;
use crate::client::Client;
use crate::error::HttpError;
use crate::middleware::{Middleware, MiddlewareChain};
use crate::registry::Registry;
use crate::schema::{CollectionParser, DefaultCollectionParser};
use crate::sd::{SdError, ServiceDiscovery};
use crate::serializer::SerializerRegistry;
use crate::transport::{ReqwestTransport, ReqwestTransportConfig, Transport};
use crate::types::HttpTimeout;
use std::fmt;
use std::sync::Arc;

/// Error surfaced by `ClientFactory::call`: either the client name has no
/// registered service binding, or service discovery itself failed.
#[derive(Debug)]
pub enum ClientFactoryError {
    UnregisteredService(String),
    Sd(SdError),
}

impl fmt::Display for ClientFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientFactoryError::UnregisteredService(name) => {
                write!(f, "client '{name}' has no registered service binding")
            }
            ClientFactoryError::Sd(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ClientFactoryError {}

/// Binds service discovery, transport, registry, default timeout, and
/// default middlewares. Builder-style construction, mirroring the
/// `ObservabilityConfig`/`MetricsConfig` convention used elsewhere in this
/// workspace family: a `new(...)` constructor with sane defaults plus
/// `with_*` chainable setters.
pub struct ClientFactory {
    sd: Arc<dyn ServiceDiscovery>,
    transport: Arc<dyn Transport>,
    registry: Arc<Registry>,
    chain: MiddlewareChain,
    default_timeout: HttpTimeout,
    default_auth: Arc<dyn Middleware>,
    serializers: Arc<SerializerRegistry>,
    collection_parser: Arc<dyn CollectionParser>,
    error_parser: Arc<dyn Fn(HttpError) -> HttpError + Send + Sync>,
}

impl ClientFactory {
    pub fn new(sd: Arc<dyn ServiceDiscovery>) -> Self {
        Self {
            sd,
            transport: Arc::new(ReqwestTransport::new()),
            registry: Arc::new(Registry::new()),
            chain: MiddlewareChain::new(),
            default_timeout: HttpTimeout::default(),
            default_auth: Arc::new(HTTPUnauthenticated),
            serializers: Arc::new(SerializerRegistry::new()),
            collection_parser: Arc::new(DefaultCollectionParser),
            error_parser: Arc::new(|e| e),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Builds the default `reqwest`-backed transport from `verify_certificate`
    /// and `proxies`, as the factory's constructor parameters of the same
    /// name describe (spec.md §6). Ignored if `with_transport` was also
    /// called — whichever is applied last wins.
    pub fn with_tls_and_proxies(mut self, verify_certificate: bool, proxies: Vec<String>) -> Self {
        self.transport = Arc::new(ReqwestTransport::from_config(ReqwestTransportConfig {
            verify_certificate,
            proxies,
        }));
        self
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_timeout(mut self, timeout: HttpTimeout) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn Middleware>) -> Self {
        self.default_auth = auth;
        self
    }

    pub fn with_collection_parser(mut self, parser: Arc<dyn CollectionParser>) -> Self {
        self.collection_parser = parser;
        self
    }

    pub fn with_error_parser(
        mut self,
        parser: Arc<dyn Fn(HttpError) -> HttpError + Send + Sync>,
    ) -> Self {
        self.error_parser = parser;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Prepends `middleware` to the factory's chain. Clients created before
    /// this call are unaffected — they already snapshotted the prior chain
    /// (spec.md §4.4, §5).
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.chain.add_middleware(middleware);
    }

    /// Invokes every middleware's `initialize()` exactly once. Safe to call
    /// again — each middleware's own `initialize()` is idempotent.
    pub async fn initialize(&self) {
        self.chain.initialize_all().await;
    }

    /// Resolves `client_name`'s endpoint via service discovery and returns a
    /// `Client` snapshotting this factory's current middleware chain.
    pub async fn call(
        &self,
        client_name: &str,
        auth: Option<Arc<dyn Middleware>>,
    ) -> Result<Client, ClientFactoryError> {
        let binding = self
            .registry
            .get_service(client_name)
            .ok_or_else(|| ClientFactoryError::UnregisteredService(client_name.to_string()))?;
        let endpoint = self
            .sd
            .get_endpoint(&binding.service, binding.version.as_deref())
            .await
            .map_err(ClientFactoryError::Sd)?;

        tracing::debug!(client = %client_name, %endpoint, "resolved client endpoint");

        Ok(Client {
            registry: self.registry.clone(),
            client_name: client_name.to_string(),
            endpoint,
            chain: self.chain.clone(),
            transport: self.transport.clone(),
            serializers: self.serializers.clone(),
            default_timeout: self.default_timeout,
            auth,
            factory_auth: self.default_auth.clone(),
            collection_parser: self.collection_parser.clone(),
            error_parser: self.error_parser.clone(),
        })
    }
}
