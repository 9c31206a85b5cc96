use crate::error::HttpError;
use crate::middleware::{Middleware, Next};
use crate::transport::CallContext;
use crate::types::HttpRequest;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

/// Sets the `Authorization` header to `"{scheme} {token}"`, overwriting any
/// existing value (spec.md §4.8). Factory, client, and call-level auth are
/// all instances of this same middleware; `RouteProxy` picks exactly one
/// per call (call > client > factory) and runs it as the outermost step of
/// that call's chain, so "more specific wins" falls out of only ever
/// having one instance in play rather than needing layered overwrites.
pub struct HTTPAuthorization {
    scheme: String,
    token: String,
}

impl HTTPAuthorization {
    pub fn new(scheme: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            token: token.into(),
        }
    }

    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.token)
    }
}

#[async_trait]
impl Middleware for HTTPAuthorization {
    async fn handle(
        &self,
        mut request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<crate::types::HttpResponse, HttpError> {
        request
            .headers
            .insert("Authorization".to_string(), self.header_value());
        tracing::debug!(client = %ctx.client_name, scheme = %self.scheme, "authorization header overwritten");
        next.call(request, ctx).await
    }
}

/// Precomputes the base64-encoded `user:pass` value at construction time, as
/// the original's `BasicAuthorization` helper does.
pub struct BasicAuthorization;

impl BasicAuthorization {
    pub fn new(user: &str, pass: &str) -> HTTPAuthorization {
        let encoded = BASE64_STANDARD.encode(format!("{user}:{pass}"));
        HTTPAuthorization::new("Basic", encoded)
    }
}

/// No-op sentinel used as the factory's default `auth`, matching the
/// original's `HTTPUnauthenticated` default (spec.md §9 design note /
/// SPEC_FULL.md §4.13).
#[derive(Default)]
pub struct HTTPUnauthenticated;

#[async_trait]
impl Middleware for HTTPUnauthenticated {
    async fn handle(
        &self,
        request: HttpRequest,
        ctx: &CallContext,
        next: Next<'_>,
    ) -> Result<crate::types::HttpResponse, HttpError> {
        next.call(request, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FakeTransport;
    use crate::types::{HttpMethod, HttpResponse};
    use std::collections::HashMap;

    fn ctx() -> CallContext {
        CallContext {
            client_name: "c".into(),
            resource: "r".into(),
            path_pattern: "/x".into(),
            timeout: Default::default(),
        }
    }

    #[tokio::test]
    async fn http_authorization_overwrites_existing_header() {
        let transport = FakeTransport::new(vec![Ok(HttpResponse::new(
            200,
            HashMap::new(),
            serde_json::Value::Null,
        ))]);
        let mut req = HttpRequest::new(HttpMethod::Get, "/x");
        req.headers.insert("Authorization".to_string(), "Bearer old".to_string());

        let auth = HTTPAuthorization::new("Bearer", "new");
        let next = Next::new(&[], &transport);
        auth.handle(req, &ctx(), next).await.unwrap();

        let sent = transport.calls();
        assert_eq!(sent[0].headers.get("Authorization"), Some(&"Bearer new".to_string()));
    }

    #[test]
    fn basic_authorization_precomputes_base64() {
        let auth = BasicAuthorization::new("user", "pass");
        assert_eq!(auth.header_value(), "Basic dXNlcjpwYXNz");
    }

    #[tokio::test]
    async fn http_unauthenticated_is_a_no_op() {
        let transport = FakeTransport::new(vec![Ok(HttpResponse::new(
            200,
            HashMap::new(),
            serde_json::Value::Null,
        ))]);
        let req = HttpRequest::new(HttpMethod::Get, "/x");
        let next = Next::new(&[], &transport);
        HTTPUnauthenticated.handle(req, &ctx(), next).await.unwrap();
        let sent = transport.calls();
        assert!(sent[0].headers.get("Authorization").is_none());
    }
}
