use async_trait::async_trait;
use r2e_rpc_core::{SdError, ServiceDiscovery};
use std::collections::HashMap;

/// Table-based service discovery: `(service, version?) -> base URL`
/// (spec.md §4.9). A missing entry raises [`SdError::UnregisteredService`].
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    table: HashMap<(String, Option<String>), String>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, service: impl Into<String>, version: Option<&str>, url: impl Into<String>) -> Self {
        let service = service.into();
        let url = url.into();
        if let Err(err) = url::Url::parse(&url) {
            tracing::warn!(%service, %url, %err, "registered static discovery entry does not parse as a URL");
        }
        self.table.insert((service, version.map(str::to_string)), url);
        self
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn get_endpoint(&self, service: &str, version: Option<&str>) -> Result<String, SdError> {
        let endpoint = self
            .table
            .get(&(service.to_string(), version.map(str::to_string)))
            .cloned()
            .ok_or_else(|| SdError::UnregisteredService(service.to_string()))?;
        tracing::debug!(%service, ?version, %endpoint, "resolved static discovery entry");
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_registered_entry() {
        let sd = StaticDiscovery::new().with_service("weather", Some("v2"), "http://weather.internal");
        let url = sd.get_endpoint("weather", Some("v2")).await.unwrap();
        assert_eq!(url, "http://weather.internal");
    }

    #[tokio::test]
    async fn unversioned_and_versioned_entries_are_distinct() {
        let sd = StaticDiscovery::new()
            .with_service("weather", None, "http://weather-default.internal")
            .with_service("weather", Some("v2"), "http://weather-v2.internal");
        assert_eq!(sd.get_endpoint("weather", None).await.unwrap(), "http://weather-default.internal");
        assert_eq!(sd.get_endpoint("weather", Some("v2")).await.unwrap(), "http://weather-v2.internal");
    }

    #[tokio::test]
    async fn missing_entry_is_unregistered_service() {
        let sd = StaticDiscovery::new();
        let err = sd.get_endpoint("missing", None).await.unwrap_err();
        assert!(matches!(err, SdError::UnregisteredService(name) if name == "missing"));
    }
}
