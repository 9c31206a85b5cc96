//! Service discovery adapters for `r2e-rpc` (spec.md §4.9): a static table,
//! a Consul-backed resolver built on the call-plane's own client stack, and
//! a purely format-based router resolver.

pub mod consul;
pub mod router;
pub mod static_discovery;

pub use consul::{ConsulConfig, ConsulDiscovery};
pub use router::RouterDiscovery;
pub use static_discovery::StaticDiscovery;
