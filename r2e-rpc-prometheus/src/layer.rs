use crate::metrics::PrometheusMetrics;
use async_trait::async_trait;
use r2e_rpc_core::{CallContext, HttpError, HttpRequest, HttpResponse, Middleware, Next};
use std::time::Instant;

/// Wraps `next` in a timer and always records
/// `request_latency_seconds{client,method,path,status}` (spec.md §4.7),
/// deriving a status from the error when the transport never produced a
/// response (`500` for transport failures and open circuits, matching the
/// original's "derived from the error's response" rule).
#[async_trait]
impl Middleware for PrometheusMetrics {
    async fn handle(
        &self,
        request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<HttpResponse, HttpError> {
        let method = request.method.as_str();
        let start = Instant::now();
        let result = next.call(request, ctx).await;
        let duration = start.elapsed().as_secs_f64();

        let status = match &result {
            Ok(response) => response.status,
            Err(err) => err.status_code().unwrap_or(500),
        };

        self.record_request(&ctx.client_name, method, &ctx.path_pattern, &status.to_string(), duration);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsConfig;
    use r2e_rpc_core::{FakeTransport, HttpMethod, HttpTimeout, MiddlewareChain};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ctx() -> CallContext {
        CallContext {
            client_name: "weather".into(),
            resource: "forecast".into(),
            path_pattern: "/forecast".into(),
            timeout: HttpTimeout::default(),
        }
    }

    #[tokio::test]
    async fn records_latency_for_successful_calls() {
        let metrics = Arc::new(PrometheusMetrics::new(MetricsConfig::default()));
        let mut chain = MiddlewareChain::new();
        chain.add_middleware(metrics.clone());

        let transport = FakeTransport::new(vec![Ok(HttpResponse::new(
            200,
            HashMap::new(),
            serde_json::Value::Null,
        ))]);
        let req = HttpRequest::new(HttpMethod::Get, "/forecast");
        chain.run(req, &ctx(), &transport).await.unwrap();

        let text = crate::metrics::encode_metrics(metrics.registry());
        assert!(text.contains("r2e_rpc_request_latency_seconds_count"));
        assert!(text.contains("status=\"200\""));
    }

    #[tokio::test]
    async fn derives_status_500_for_transport_failures() {
        let metrics = Arc::new(PrometheusMetrics::new(MetricsConfig::default()));
        let mut chain = MiddlewareChain::new();
        chain.add_middleware(metrics.clone());

        let req = HttpRequest::new(HttpMethod::Get, "/forecast");
        let transport = FakeTransport::new(vec![Err(HttpError::Transport {
            request: req.clone(),
            message: "connection refused".into(),
            kind: r2e_rpc_core::TransportErrorKind::Connect,
        })]);
        assert!(chain.run(req, &ctx(), &transport).await.is_err());

        let text = crate::metrics::encode_metrics(metrics.registry());
        assert!(text.contains("status=\"500\""));
    }
}
