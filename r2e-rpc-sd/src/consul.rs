use crate::static_discovery::StaticDiscovery;
use async_trait::async_trait;
use r2e_rpc_core::{
    Client, ClientFactory, FieldSpec, HTTPAuthorization, HttpError, HttpMethod, HttpTimeout,
    Registry, RequestSchema, SdError, ServiceDiscovery, Transport,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How [`ConsulDiscovery`] picks one instance out of a multi-entry catalog
/// response (spec.md §4.9: "may load-balance across returned instances").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsulLoadBalancing {
    RoundRobin,
    Random,
}

/// Construction knobs for [`ConsulDiscovery`].
#[derive(Debug, Clone)]
pub struct ConsulConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub load_balancing: ConsulLoadBalancing,
}

impl ConsulConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            load_balancing: ConsulLoadBalancing::RoundRobin,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_load_balancing(mut self, load_balancing: ConsulLoadBalancing) -> Self {
        self.load_balancing = load_balancing;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "ServiceAddress")]
    service_address: String,
    #[serde(rename = "ServicePort")]
    service_port: u16,
}

#[derive(Debug, Serialize)]
struct CatalogServiceQuery {
    name: String,
}

impl RequestSchema for CatalogServiceQuery {
    fn fields() -> &'static [FieldSpec] {
        &[FieldSpec::path("name")]
    }
}

/// Consul-backed service discovery (spec.md §4.9), self-hosted via the same
/// client stack this crate family provides: resolution is itself an
/// `r2e_rpc_core` call — a `consul` client's `services` resource, `GET
/// /catalog/service/{name}` — mirroring the original's
/// `blacksmith.sd.adapters.consul` adapter (SPEC_FULL.md §6).
pub struct ConsulDiscovery {
    factory: ClientFactory,
    load_balancing: ConsulLoadBalancing,
    round_robin: AtomicUsize,
}

impl ConsulDiscovery {
    pub fn new(config: ConsulConfig) -> Self {
        let registry = Registry::new();
        registry
            .register(
                "consul",
                "services",
                "consul",
                None,
                Some("/catalog/service/{name}"),
                &[HttpMethod::Get],
                None,
                &[],
            )
            .expect("single hand-written registration cannot conflict with itself");

        let sd = StaticDiscovery::new().with_service("consul", None, config.base_url.clone());
        let mut factory = ClientFactory::new(Arc::new(sd)).with_registry(Arc::new(registry));
        if let Some(token) = &config.token {
            factory = factory.with_auth(Arc::new(HTTPAuthorization::new("Bearer", token.clone())));
        }

        Self {
            factory,
            load_balancing: config.load_balancing,
            round_robin: AtomicUsize::new(0),
        }
    }

    /// Overrides the transport used to reach Consul itself. Exists mainly so
    /// tests can swap in a `FakeTransport` rather than a socket.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.factory = self.factory.with_transport(transport);
        self
    }

    async fn client(&self) -> Result<Client, SdError> {
        self.factory
            .call("consul", None)
            .await
            .map_err(|e| SdError::Backend(e.to_string()))
    }

    fn pick<'a>(&self, entries: &'a [CatalogEntry]) -> &'a CatalogEntry {
        match self.load_balancing {
            ConsulLoadBalancing::RoundRobin => {
                let idx = self.round_robin.fetch_add(1, Ordering::Relaxed) % entries.len();
                &entries[idx]
            }
            ConsulLoadBalancing::Random => {
                let idx = rand::random::<usize>() % entries.len();
                &entries[idx]
            }
        }
    }
}

#[async_trait]
impl ServiceDiscovery for ConsulDiscovery {
    async fn get_endpoint(&self, service: &str, version: Option<&str>) -> Result<String, SdError> {
        let catalog_name = match version {
            Some(v) => format!("{service}-{v}"),
            None => service.to_string(),
        };

        let client = self.client().await?;
        let query = CatalogServiceQuery { name: catalog_name };
        let response = client
            .resource("services")
            .get::<CatalogServiceQuery, Vec<CatalogEntry>>(query, None, Some(HttpTimeout::default()))
            .await
            .map_err(|e| SdError::Backend(e.to_string()))?;

        let entries = response.into_result().map_err(|err| match &err {
            HttpError::Status { status_code, .. } => {
                SdError::Backend(format!("consul catalog lookup failed with status {status_code}"))
            }
            other => SdError::Backend(other.to_string()),
        })?;

        if entries.is_empty() {
            return Err(SdError::UnregisteredService(service.to_string()));
        }

        let entry = self.pick(&entries);
        let endpoint = match version {
            Some(v) => format!("http://{}:{}/{}", entry.service_address, entry.service_port, v),
            None => format!("http://{}:{}", entry.service_address, entry.service_port),
        };
        tracing::debug!(%service, ?version, %endpoint, candidates = entries.len(), "resolved consul catalog entry");
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2e_rpc_core::{FakeTransport, HttpResponse};
    use std::collections::HashMap;

    fn entries_response(entries: serde_json::Value) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse::new(200, HashMap::new(), entries))
    }

    #[tokio::test]
    async fn resolves_unversioned_endpoint_from_first_entry() {
        let transport = FakeTransport::new(vec![entries_response(serde_json::json!([
            {"ServiceAddress": "10.0.0.1", "ServicePort": 8080}
        ]))]);
        let sd = ConsulDiscovery::new(ConsulConfig::new("http://consul.internal:8500"))
            .with_transport(Arc::new(transport));

        let url = sd.get_endpoint("weather", None).await.unwrap();
        assert_eq!(url, "http://10.0.0.1:8080");
    }

    #[tokio::test]
    async fn resolves_versioned_endpoint_with_version_suffix() {
        let transport = FakeTransport::new(vec![entries_response(serde_json::json!([
            {"ServiceAddress": "10.0.0.2", "ServicePort": 9090}
        ]))]);
        let sd = ConsulDiscovery::new(ConsulConfig::new("http://consul.internal:8500"))
            .with_transport(Arc::new(transport));

        let url = sd.get_endpoint("weather", Some("v2")).await.unwrap();
        assert_eq!(url, "http://10.0.0.2:9090/v2");
    }

    #[tokio::test]
    async fn round_robins_across_multiple_entries() {
        let transport = FakeTransport::new(vec![
            entries_response(serde_json::json!([
                {"ServiceAddress": "10.0.0.1", "ServicePort": 1},
                {"ServiceAddress": "10.0.0.2", "ServicePort": 2},
            ])),
            entries_response(serde_json::json!([
                {"ServiceAddress": "10.0.0.1", "ServicePort": 1},
                {"ServiceAddress": "10.0.0.2", "ServicePort": 2},
            ])),
        ]);
        let sd = ConsulDiscovery::new(
            ConsulConfig::new("http://consul.internal:8500").with_load_balancing(ConsulLoadBalancing::RoundRobin),
        )
        .with_transport(Arc::new(transport));

        let first = sd.get_endpoint("weather", None).await.unwrap();
        let second = sd.get_endpoint("weather", None).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn empty_catalog_is_unregistered_service() {
        let transport = FakeTransport::new(vec![entries_response(serde_json::json!([]))]);
        let sd = ConsulDiscovery::new(ConsulConfig::new("http://consul.internal:8500"))
            .with_transport(Arc::new(transport));

        let err = sd.get_endpoint("missing", None).await.unwrap_err();
        assert!(matches!(err, SdError::UnregisteredService(name) if name == "missing"));
    }

    #[tokio::test]
    async fn server_error_maps_to_backend_error() {
        let req = r2e_rpc_core::HttpRequest::new(r2e_rpc_core::HttpMethod::Get, "/catalog/service/weather");
        let resp = HttpResponse::new(503, HashMap::new(), serde_json::Value::Null);
        let transport = FakeTransport::new(vec![Err(HttpError::Status {
            request: req,
            response: resp,
            status_code: 503,
        })]);
        let sd = ConsulDiscovery::new(ConsulConfig::new("http://consul.internal:8500"))
            .with_transport(Arc::new(transport));

        let err = sd.get_endpoint("weather", None).await.unwrap_err();
        assert!(matches!(err, SdError::Backend(msg) if msg.contains("503")));
    }
}
