use crate::metrics::BreakerHook;
use crate::state::BreakerState;
use async_trait::async_trait;
use dashmap::DashMap;
use r2e_rpc_core::{CallContext, HttpError, HttpRequest, HttpResponse, Middleware, Next};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_OPEN_TTL: Duration = Duration::from_secs(30);

/// Per-client circuit breaker middleware (spec.md §4.6). Maintains one
/// [`BreakerState`] per `client_name` in a shared `DashMap`; callers
/// against the same client contend on the same entry so an open breaker
/// short-circuits every concurrent caller, not just the one that tripped
/// it.
pub struct CircuitBreakerMiddleware {
    table: DashMap<String, Arc<Mutex<BreakerState>>>,
    failure_threshold: u32,
    open_ttl: Duration,
    hook: Option<Arc<dyn BreakerHook>>,
}

impl CircuitBreakerMiddleware {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            open_ttl: DEFAULT_OPEN_TTL,
            hook: None,
        }
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_open_ttl(mut self, ttl: Duration) -> Self {
        self.open_ttl = ttl;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn BreakerHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    fn breaker_for(&self, client_name: &str) -> Arc<Mutex<BreakerState>> {
        self.table
            .entry(client_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(BreakerState::new(self.failure_threshold, self.open_ttl))))
            .clone()
    }
}

impl Default for CircuitBreakerMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for CircuitBreakerMiddleware {
    async fn handle(
        &self,
        request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<HttpResponse, HttpError> {
        let breaker = self.breaker_for(&ctx.client_name);

        let admitted = {
            let mut guard = breaker.lock().await;
            guard.admit()
        };
        if !admitted {
            return Err(HttpError::CircuitOpen { client_name: ctx.client_name.clone() });
        }

        let result = next.call(request, ctx).await;

        let counted_failure = match &result {
            Ok(_) => false,
            Err(err) => !err.is_client_error(),
        };

        let transition = {
            let mut guard = breaker.lock().await;
            if counted_failure {
                guard.record_failure()
            } else if result.is_ok() {
                guard.record_success()
            } else {
                None
            }
        };

        if counted_failure {
            if let Some(hook) = &self.hook {
                hook.failed(&ctx.client_name);
            }
        }
        if let Some(new_state) = transition {
            tracing::info!(client = %ctx.client_name, state = ?new_state, "circuit breaker state changed");
            if let Some(hook) = &self.hook {
                hook.state_changed(&ctx.client_name, new_state);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2e_rpc_core::{FakeTransport, HttpMethod, MiddlewareChain};
    use std::collections::HashMap;

    fn ctx(client: &str) -> CallContext {
        CallContext {
            client_name: client.into(),
            resource: "r".into(),
            path_pattern: "/x".into(),
            timeout: Default::default(),
        }
    }

    fn status_err(code: u16) -> Result<HttpResponse, HttpError> {
        let req = HttpRequest::new(HttpMethod::Get, "/x");
        let resp = HttpResponse::new(code, HashMap::new(), serde_json::Value::Null);
        Err(HttpError::Status { request: req, response: resp, status_code: code })
    }

    #[tokio::test]
    async fn opens_after_threshold_failures_and_short_circuits() {
        let mut chain = MiddlewareChain::new();
        chain.add_middleware(Arc::new(CircuitBreakerMiddleware::new().with_failure_threshold(2)));

        let transport = FakeTransport::new(vec![status_err(500), status_err(500)]);
        let req = HttpRequest::new(HttpMethod::Get, "/x");

        assert!(chain.run(req.clone(), &ctx("svc"), &transport).await.is_err());
        assert!(chain.run(req.clone(), &ctx("svc"), &transport).await.is_err());

        let result = chain.run(req, &ctx("svc"), &transport).await;
        assert!(matches!(result, Err(HttpError::CircuitOpen { .. })));
        assert_eq!(transport.call_count(), 2, "third call must short-circuit before reaching the transport");
    }

    #[tokio::test]
    async fn client_errors_do_not_count_as_breaker_failures() {
        let mut chain = MiddlewareChain::new();
        chain.add_middleware(Arc::new(CircuitBreakerMiddleware::new().with_failure_threshold(1)));

        let transport = FakeTransport::new(vec![status_err(404), status_err(404), status_err(404)]);
        let req = HttpRequest::new(HttpMethod::Get, "/x");

        for _ in 0..3 {
            let result = chain.run(req.clone(), &ctx("svc"), &transport).await;
            assert!(matches!(result, Err(HttpError::Status { status_code: 404, .. })));
        }
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn half_open_success_closes_breaker() {
        let mut chain = MiddlewareChain::new();
        chain.add_middleware(Arc::new(
            CircuitBreakerMiddleware::new()
                .with_failure_threshold(1)
                .with_open_ttl(Duration::from_millis(10)),
        ));

        let transport = FakeTransport::new(vec![
            status_err(500),
            Ok(HttpResponse::new(200, HashMap::new(), serde_json::Value::Null)),
            Ok(HttpResponse::new(200, HashMap::new(), serde_json::Value::Null)),
        ]);
        let req = HttpRequest::new(HttpMethod::Get, "/x");

        assert!(chain.run(req.clone(), &ctx("svc"), &transport).await.is_err());
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(chain.run(req.clone(), &ctx("svc"), &transport).await.is_ok());
        assert!(chain.run(req, &ctx("svc"), &transport).await.is_ok());
        assert_eq!(transport.call_count(), 3);
    }
}
