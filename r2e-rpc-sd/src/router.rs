use async_trait::async_trait;
use r2e_rpc_core::{SdError, ServiceDiscovery};

/// Purely format-based service discovery (spec.md §4.9): no network call is
/// made, the endpoint is assembled from a configurable format string.
///
/// Defaults match the spec: `http://router/{service}-{version}/{version}`
/// when a version is given, `http://router/{service}` otherwise. The `{}`
/// placeholders in a custom format are filled positionally — `service` then
/// `version` for the versioned format, `service` alone for the unversioned
/// one.
#[derive(Debug, Clone)]
pub struct RouterDiscovery {
    versioned_format: String,
    unversioned_format: String,
}

impl RouterDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_versioned_format(mut self, format: impl Into<String>) -> Self {
        self.versioned_format = format.into();
        self
    }

    pub fn with_unversioned_format(mut self, format: impl Into<String>) -> Self {
        self.unversioned_format = format.into();
        self
    }
}

impl Default for RouterDiscovery {
    fn default() -> Self {
        Self {
            versioned_format: "http://router/{service}-{version}/{version}".to_string(),
            unversioned_format: "http://router/{service}".to_string(),
        }
    }
}

#[async_trait]
impl ServiceDiscovery for RouterDiscovery {
    async fn get_endpoint(&self, service: &str, version: Option<&str>) -> Result<String, SdError> {
        let endpoint = match version {
            Some(version) => self
                .versioned_format
                .replace("{service}", service)
                .replace("{version}", version),
            None => self.unversioned_format.replace("{service}", service),
        };
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn versioned_endpoint_follows_the_default_format() {
        let sd = RouterDiscovery::new();
        let url = sd.get_endpoint("weather", Some("v2")).await.unwrap();
        assert_eq!(url, "http://router/weather-v2/v2");
    }

    #[tokio::test]
    async fn unversioned_endpoint_follows_the_default_format() {
        let sd = RouterDiscovery::new();
        let url = sd.get_endpoint("weather", None).await.unwrap();
        assert_eq!(url, "http://router/weather");
    }

    #[tokio::test]
    async fn custom_format_is_honored() {
        let sd = RouterDiscovery::new()
            .with_versioned_format("http://{service}.internal/{version}")
            .with_unversioned_format("http://{service}.internal");
        assert_eq!(
            sd.get_endpoint("weather", Some("v3")).await.unwrap(),
            "http://weather.internal/v3"
        );
        assert_eq!(
            sd.get_endpoint("weather", None).await.unwrap(),
            "http://weather.internal"
        );
    }
}
