//! Per-client circuit breaker middleware for `r2e-rpc` (spec.md §4.6).
//!
//! [`middleware::CircuitBreakerMiddleware`] holds one [`state::BreakerState`]
//! per `client_name`, transitioning closed → open on consecutive counted
//! failures and open → half-open → closed once its TTL elapses. HTTP
//! client errors (4xx) are excluded from the failure count via
//! [`r2e_rpc_core::HttpError::is_client_error`].

pub mod metrics;
pub mod middleware;
pub mod state;

pub use metrics::BreakerHook;
pub use middleware::CircuitBreakerMiddleware;
pub use state::CircuitState;
