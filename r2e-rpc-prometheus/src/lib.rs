//! Prometheus metrics for `r2e-rpc` (spec.md §4.7, §4.6, §4.5, §6).
//!
//! [`metrics::PrometheusMetrics`] is the single collaborator this crate
//! exposes: add it to a factory's middleware chain for request latency,
//! hand it to [`r2e_rpc_breaker::CircuitBreakerMiddleware::with_hook`] for
//! breaker state/error metrics, and to
//! [`r2e_rpc_cache::HttpCacheMiddleware::with_metrics`] for cache hit/miss
//! metrics — it implements all three collaborator traits directly.

mod breaker_hook;
mod cache_hook;
pub mod handler;
pub mod layer;
pub mod metrics;

pub use handler::metrics_text;
pub use metrics::{encode_metrics, MetricsConfig, PrometheusMetrics};
