use crate::error::HttpError;
use crate::transport::{CallContext, Transport};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A middleware wraps the rest of the chain. Composition order is
/// well-defined: `add_middleware` prepends, so the most recently added
/// middleware is outermost and runs first on descent, last on ascent
/// (spec.md §4.4, §5 "Ordering").
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Invoked exactly once by the factory before first use. Idempotent if
    /// called again — implementations that track a counter should still
    /// only perform their side effect once (spec.md §4.4).
    async fn initialize(&self) {}

    async fn handle(
        &self,
        request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<HttpResponse, HttpError>;
}

/// The remaining portion of the chain below the currently-executing
/// middleware, terminating in the transport.
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    transport: &'a (dyn Transport + 'a),
}

impl<'a> Next<'a> {
    pub fn new(middlewares: &'a [Arc<dyn Middleware>], transport: &'a (dyn Transport + 'a)) -> Self {
        Self { middlewares, transport }
    }

    pub fn call(self, request: HttpRequest, ctx: &'a CallContext) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            match self.middlewares.split_first() {
                Some((mw, rest)) => {
                    let next = Next::new(rest, self.transport);
                    mw.handle(request, ctx, next).await
                }
                None => self.transport.send(&request, ctx).await,
            }
        })
    }
}

/// An ordered, clonable stack of middlewares. `Client` snapshots the
/// factory's chain at creation time (spec.md §4.4, §5 "Shared resources");
/// later mutation of one chain never affects a chain already snapshotted
/// from it.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `middleware` so it runs outermost.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.insert(0, middleware);
    }

    pub async fn initialize_all(&self) {
        for mw in &self.middlewares {
            mw.initialize().await;
        }
    }

    pub async fn run(
        &self,
        request: HttpRequest,
        ctx: &CallContext,
        transport: &dyn Transport,
    ) -> Result<HttpResponse, HttpError> {
        Next::new(&self.middlewares, transport).call(request, ctx).await
    }
}

/// Helper for middlewares that need "call my side effect exactly once,
/// idempotent on repeat calls" semantics for `initialize()`.
#[derive(Default)]
pub struct InitOnce(AtomicUsize);

impl InitOnce {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Returns `true` the first time it's called, `false` afterwards, while
    /// always incrementing the internal counter so callers can assert on
    /// how many times `initialize()` was invoked.
    pub fn mark(&self) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst) == 0
    }

    pub fn call_count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FakeTransport;
    use crate::types::HttpMethod;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct RecordingMiddleware {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for RecordingMiddleware {
        async fn handle(
            &self,
            request: HttpRequest,
            ctx: &CallContext,
            next: Next<'_>,
        ) -> Result<HttpResponse, HttpError> {
            self.log.lock().unwrap().push(self.name);
            let result = next.call(request, ctx).await;
            self.log.lock().unwrap().push(self.name);
            result
        }
    }

    fn ctx() -> CallContext {
        CallContext {
            client_name: "c".into(),
            resource: "r".into(),
            path_pattern: "/x".into(),
            timeout: Default::default(),
        }
    }

    #[tokio::test]
    async fn middlewares_run_outer_to_inner_then_inner_to_outer() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        // add_middleware prepends; adding "a" then "b" makes "b" outermost.
        chain.add_middleware(Arc::new(RecordingMiddleware { name: "a", log: log.clone() }));
        chain.add_middleware(Arc::new(RecordingMiddleware { name: "b", log: log.clone() }));

        let transport = FakeTransport::new(vec![Ok(HttpResponse::new(
            200,
            HashMap::new(),
            serde_json::Value::Null,
        ))]);
        let req = HttpRequest::new(HttpMethod::Get, "/x");
        chain.run(req, &ctx(), &transport).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["b", "a", "a", "b"]);
    }

    #[tokio::test]
    async fn add_middleware_on_client_chain_does_not_mutate_source() {
        let mut factory_chain = MiddlewareChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        factory_chain.add_middleware(Arc::new(RecordingMiddleware { name: "base", log: log.clone() }));

        let mut client_chain = factory_chain.clone();
        client_chain.add_middleware(Arc::new(RecordingMiddleware { name: "client-only", log: log.clone() }));

        assert_eq!(factory_chain.middlewares.len(), 1);
        assert_eq!(client_chain.middlewares.len(), 2);
    }

    #[test]
    fn init_once_reports_first_call_and_counts_all() {
        let init = InitOnce::new();
        assert!(init.mark());
        assert!(!init.mark());
        assert_eq!(init.call_count(), 2);
    }
}
