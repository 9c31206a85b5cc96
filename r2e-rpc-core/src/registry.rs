use crate::error::ConfigurationError;
use crate::types::HttpMethod;
use dashmap::DashMap;
use std::collections::HashSet;

/// The `(service, version?)` a client name is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    pub service: String,
    pub version: Option<String>,
}

/// One resource's routing facts for a client: an optional item route and an
/// optional collection route, each with the set of HTTP methods that have a
/// registered contract.
///
/// The original dynamic registry stores a `Request`/`Response` schema pair
/// per method (spec.md §4.2). Here the schema *types* are enforced by Rust's
/// generics at the call site (`RouteProxy::get::<Req, Resp>`) rather than by
/// a runtime type check — there is no weaker compile-time guarantee to fall
/// back to, so the registry's job narrows to tracking which path and which
/// methods exist (see DESIGN.md's resolution of this Open Question).
#[derive(Debug, Clone, Default)]
pub struct RouteDef {
    pub path: Option<String>,
    pub methods: HashSet<HttpMethod>,
    pub collection_path: Option<String>,
    pub collection_methods: HashSet<HttpMethod>,
}

impl RouteDef {
    pub fn has_item_method(&self, method: HttpMethod) -> bool {
        self.path.is_some() && self.methods.contains(&method)
    }

    pub fn has_collection_method(&self, method: HttpMethod) -> bool {
        self.collection_path.is_some() && self.collection_methods.contains(&method)
    }
}

/// `client_name -> (service, version?)` plus `client_name -> {resource ->
/// RouteDef}`. Registration is additive; re-registering the same
/// `(client_name, resource)` with an identical binding is idempotent,
/// with a conflicting one is an error (spec.md §4.2).
#[derive(Default)]
pub struct Registry {
    services: DashMap<String, ServiceBinding>,
    resources: DashMap<(String, String), RouteDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or updates one resource's route entry for a client.
    ///
    /// `methods`/`collection_methods` are merged into whatever is already
    /// registered for `(client_name, resource)`. Registering the same
    /// `(service, version)` binding twice for a client is idempotent;
    /// registering a conflicting one is an error.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &self,
        client_name: &str,
        resource: &str,
        service: &str,
        version: Option<&str>,
        path: Option<&str>,
        methods: &[HttpMethod],
        collection_path: Option<&str>,
        collection_methods: &[HttpMethod],
    ) -> Result<(), ConfigurationError> {
        let binding = ServiceBinding {
            service: service.to_string(),
            version: version.map(str::to_string),
        };
        match self.services.get(client_name) {
            Some(existing) if *existing != binding => {
                return Err(ConfigurationError::UnregisteredResource {
                    client_name: client_name.to_string(),
                    resource: resource.to_string(),
                });
            }
            _ => {
                self.services.insert(client_name.to_string(), binding);
            }
        }

        let key = (client_name.to_string(), resource.to_string());
        let mut entry = self.resources.entry(key).or_default();
        if let Some(p) = path {
            entry.path = Some(p.to_string());
        }
        entry.methods.extend(methods.iter().copied());
        if let Some(p) = collection_path {
            entry.collection_path = Some(p.to_string());
        }
        entry.collection_methods.extend(collection_methods.iter().copied());
        Ok(())
    }

    /// `(service, version?)` a client name is bound to, plus the resource
    /// route definitions registered under it.
    pub fn get_service(&self, client_name: &str) -> Option<ServiceBinding> {
        self.services.get(client_name).map(|e| e.clone())
    }

    pub fn get_route(&self, client_name: &str, resource: &str) -> Option<RouteDef> {
        self.resources
            .get(&(client_name.to_string(), resource.to_string()))
            .map(|e| e.clone())
    }
}
