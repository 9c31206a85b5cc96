use crate::error::{HttpError, TransportErrorKind};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Per-call context threaded alongside the request through the middleware
/// chain and the transport — everything a middleware needs to tag its
/// observability output without parsing the request itself.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub client_name: String,
    pub resource: String,
    /// Unsubstituted route path pattern, e.g. `/users/{username}`.
    pub path_pattern: String,
    pub timeout: crate::types::HttpTimeout,
}

/// Adapter over an HTTP engine. The default implementation wraps `reqwest`;
/// tests use [`FakeTransport`] instead.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest, ctx: &CallContext) -> Result<HttpResponse, HttpError>;
}

/// Construction knobs for the default transport: TLS verification and
/// outbound proxies, threaded from `ClientFactory::new` (spec.md §6).
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransportConfig {
    pub verify_certificate: bool,
    pub proxies: Vec<String>,
}

impl ReqwestTransportConfig {
    pub fn new() -> Self {
        Self {
            verify_certificate: true,
            proxies: Vec::new(),
        }
    }
}

/// Default transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::from_config(ReqwestTransportConfig::new())
    }

    pub fn from_config(config: ReqwestTransportConfig) -> Self {
        let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(!config.verify_certificate);
        for proxy in &config.proxies {
            if let Ok(proxy) = reqwest::Proxy::all(proxy) {
                builder = builder.proxy(proxy);
            }
        }
        let client = builder.build().unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest, ctx: &CallContext) -> Result<HttpResponse, HttpError> {
        let url = request.resolved_url().map_err(|e| HttpError::Transport {
            request: request.clone(),
            message: e.to_string(),
            kind: TransportErrorKind::Connect,
        })?;
        let query = request.query_string();
        let url = if query.is_empty() {
            url
        } else {
            format!("{url}?{query}")
        };

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .unwrap_or(reqwest::Method::GET);
        let mut builder = self
            .client
            .request(method, &url)
            .timeout(Duration::from_secs_f64(ctx.timeout.total))
            .body(request.body.clone());
        for (k, v) in &request.headers {
            builder = builder.header(k, v);
        }

        let response = builder.send().await.map_err(|e| HttpError::Transport {
            request: request.clone(),
            message: e.to_string(),
            kind: if e.is_timeout() {
                TransportErrorKind::Timeout
            } else if e.is_connect() {
                TransportErrorKind::Connect
            } else {
                TransportErrorKind::Dns
            },
        })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let bytes = response.bytes().await.map_err(|e| HttpError::Transport {
            request: request.clone(),
            message: e.to_string(),
            kind: TransportErrorKind::Connect,
        })?;
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        let http_response = HttpResponse::new(status, headers, json);
        if (200..300).contains(&status) {
            Ok(http_response)
        } else {
            Err(HttpError::Status {
                request: request.clone(),
                response: http_response,
                status_code: status,
            })
        }
    }
}

/// Test double that returns a scripted sequence of responses without a
/// socket, matching the original's `fake_http_middleware_cache` test
/// fixture. Each call to [`Transport::send`] consumes one entry; calling
/// past the end panics loudly rather than hanging, which is the point of
/// a fake.
pub struct FakeTransport {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<HttpResponse, HttpError>>>,
    calls: std::sync::Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &HttpRequest, _ctx: &CallContext) -> Result<HttpResponse, HttpError> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("FakeTransport exhausted: more calls were made than responses scripted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;

    #[tokio::test]
    async fn fake_transport_returns_scripted_responses_in_order() {
        let transport = FakeTransport::new(vec![
            Ok(HttpResponse::new(200, HashMap::new(), serde_json::json!({"a": 1}))),
            Ok(HttpResponse::new(200, HashMap::new(), serde_json::json!({"a": 2}))),
        ]);
        let ctx = CallContext {
            client_name: "c".into(),
            resource: "r".into(),
            path_pattern: "/x".into(),
            timeout: Default::default(),
        };
        let req = HttpRequest::new(HttpMethod::Get, "/x");
        let r1 = transport.send(&req, &ctx).await.unwrap();
        let r2 = transport.send(&req, &ctx).await.unwrap();
        assert_eq!(r1.json["a"], 1);
        assert_eq!(r2.json["a"], 2);
        assert_eq!(transport.call_count(), 2);
    }
}
