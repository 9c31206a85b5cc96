use async_trait::async_trait;
use opentelemetry::propagation::Injector;
use r2e_rpc_core::{CallContext, HttpError, HttpRequest, HttpResponse, Middleware, Next};
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

struct HeaderInjector<'a>(&'a mut std::collections::HashMap<String, String>);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.0.insert(key.to_string(), value);
    }
}

/// Per-call tracing middleware (spec.md §4.7). Opens a `CLIENT`-kind span
/// named `"{METHOD} {path pattern}"`, injects the W3C trace carrier into
/// the outbound request's headers, and tags the span with `client_name`,
/// `http.path`, `http.querystring`, and — once the call resolves —
/// `http.status_code`.
///
/// Span closure is guaranteed on every exit path, including error and
/// task cancellation, because the span is driven by `Instrument` around
/// the awaited future rather than entered/exited manually.
pub struct TracingMiddleware {
    capture_headers: Vec<String>,
}

impl TracingMiddleware {
    pub fn new() -> Self {
        Self { capture_headers: Vec::new() }
    }

    pub fn with_captured_headers(capture_headers: Vec<String>) -> Self {
        Self { capture_headers }
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(
        &self,
        mut request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<HttpResponse, HttpError> {
        let span = tracing::info_span!(
            "http_client_call",
            otel.name = %format!("{} {}", request.method, ctx.path_pattern),
            otel.kind = "client",
            client_name = %ctx.client_name,
            http.path = %ctx.path_pattern,
            http.querystring = %request.query_string(),
            http.status_code = tracing::field::Empty,
        );

        for name in &self.capture_headers {
            if let Some(value) = request.headers.get(name.as_str()) {
                tracing::debug!(parent: &span, header.name = %name, header.value = %value, "captured header");
            }
        }

        let otel_cx = span.context();
        opentelemetry::global::get_text_map_propagator(|propagator| {
            propagator.inject_context(&otel_cx, &mut HeaderInjector(&mut request.headers));
        });

        let result = next.call(request, ctx).instrument(span.clone()).await;

        match &result {
            Ok(response) => {
                span.record("http.status_code", response.status as u64);
            }
            Err(err) => {
                if let Some(code) = err.status_code() {
                    span.record("http.status_code", code as u64);
                }
            }
        }

        result
    }
}
