use crate::cache_control::{parse_cache_control, parse_vary};
use crate::metrics::CacheMetricsHook;
use crate::policy::{CacheControlPolicy, DefaultCacheControlPolicy};
use crate::store::CacheStore;
use async_trait::async_trait;
use r2e_rpc_core::{CallContext, HttpError, HttpRequest, HttpResponse, Middleware, Next};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Serialize, Deserialize)]
struct VaryRecord {
    ttl_seconds: u64,
    headers: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct CachedResponse {
    status: u16,
    headers: HashMap<String, String>,
    json: serde_json::Value,
}

impl CachedResponse {
    fn from_response(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            json: response.json.clone(),
        }
    }

    fn into_response(self) -> HttpResponse {
        HttpResponse::new(self.status, self.headers, self.json)
    }
}

fn variant_suffix(vary_headers: &[String], request: &HttpRequest) -> String {
    vary_headers
        .iter()
        .map(|name| {
            let value = request
                .headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            format!("{name}={value}")
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Vary-aware HTTP cache middleware for cacheable `GET` responses honoring
/// `Cache-Control: max-age=N, public` and `Vary` (spec.md §4.5).
///
/// Maintains two entries per `(client_name, path)`: a Vary record naming
/// which request headers discriminate variants, and one response entry per
/// discriminated variant. Both entries share the response's `max-age` as
/// their TTL.
pub struct HttpCacheMiddleware {
    store: Arc<dyn CacheStore>,
    policy: Arc<dyn CacheControlPolicy>,
    metrics: Option<Arc<dyn CacheMetricsHook>>,
}

impl HttpCacheMiddleware {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            policy: Arc::new(DefaultCacheControlPolicy),
            metrics: None,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn CacheControlPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, hook: Arc<dyn CacheMetricsHook>) -> Self {
        self.metrics = Some(hook);
        self
    }

    fn vary_key(client_name: &str, path: &str) -> String {
        format!("{client_name}${path}")
    }

    async fn read(&self, vary_key: &str, request: &HttpRequest) -> Option<HttpResponse> {
        let vary_raw = self.store.get(vary_key).await?;
        let vary_record: VaryRecord = serde_json::from_str(&vary_raw).ok()?;
        let suffix = variant_suffix(&vary_record.headers, request);
        let response_key = format!("{vary_key}${suffix}");
        let response_raw = self.store.get(&response_key).await?;
        let cached: CachedResponse = serde_json::from_str(&response_raw).ok()?;
        Some(cached.into_response())
    }

    /// Returns `true` if the response was written to the cache.
    async fn write(&self, vary_key: &str, request: &HttpRequest, response: &HttpResponse) -> bool {
        let cc = response
            .header("cache-control")
            .map(parse_cache_control)
            .unwrap_or_default();
        let max_age = match cc.max_age {
            Some(seconds) if seconds > 0 && cc.public => seconds,
            _ => return false,
        };
        let ttl = Duration::from_secs(max_age);
        let vary_headers = response.header("vary").map(parse_vary).unwrap_or_default();

        let vary_record = VaryRecord {
            ttl_seconds: max_age,
            headers: vary_headers.clone(),
        };
        self.store
            .set(vary_key, serde_json::to_string(&vary_record).unwrap_or_default(), ttl)
            .await;

        let suffix = variant_suffix(&vary_headers, request);
        let response_key = format!("{vary_key}${suffix}");
        let cached = CachedResponse::from_response(response);
        self.store
            .set(&response_key, serde_json::to_string(&cached).unwrap_or_default(), ttl)
            .await;
        true
    }
}

#[async_trait]
impl Middleware for HttpCacheMiddleware {
    async fn handle(
        &self,
        request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<HttpResponse, HttpError> {
        if !self.policy.should_handle(&request) {
            if let Some(hook) = &self.metrics {
                hook.record_miss(&ctx.client_name, "uncachable_request", request.method.as_str(), &ctx.path_pattern, 0);
            }
            return next.call(request, ctx).await;
        }

        let vary_key = Self::vary_key(&ctx.client_name, &ctx.path_pattern);
        let start = Instant::now();
        if let Some(cached) = self.read(&vary_key, &request).await {
            tracing::debug!(client = %ctx.client_name, path = %ctx.path_pattern, "cache hit");
            if let Some(hook) = &self.metrics {
                hook.record_hit(
                    &ctx.client_name,
                    request.method.as_str(),
                    &ctx.path_pattern,
                    cached.status,
                    start.elapsed().as_secs_f64(),
                );
            }
            return Ok(cached);
        }

        tracing::debug!(client = %ctx.client_name, path = %ctx.path_pattern, "cache miss");
        let response = next.call(request.clone(), ctx).await?;
        let wrote = self.write(&vary_key, &request, &response).await;
        if let Some(hook) = &self.metrics {
            let state = if wrote { "cached" } else { "uncachable_response" };
            hook.record_miss(&ctx.client_name, state, request.method.as_str(), &ctx.path_pattern, response.status);
        }
        Ok(response)
    }
}
