use r2e_rpc_core::{HttpMethod, HttpRequest};

/// Decides whether a request is even a candidate for caching. A custom
/// policy that returns `false` bypasses both the read and write paths; the
/// response is still returned unchanged (spec.md §4.5 "Policy extension").
pub trait CacheControlPolicy: Send + Sync {
    fn should_handle(&self, request: &HttpRequest) -> bool;
}

/// Default policy: only `GET` requests are cache candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCacheControlPolicy;

impl CacheControlPolicy for DefaultCacheControlPolicy {
    fn should_handle(&self, request: &HttpRequest) -> bool {
        request.method == HttpMethod::Get
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_handles_get() {
        let req = HttpRequest::new(HttpMethod::Get, "/x");
        assert!(DefaultCacheControlPolicy.should_handle(&req));
    }

    #[test]
    fn default_policy_skips_post() {
        let req = HttpRequest::new(HttpMethod::Post, "/x");
        assert!(!DefaultCacheControlPolicy.should_handle(&req));
    }
}
