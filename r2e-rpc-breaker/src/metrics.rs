use crate::state::CircuitState;

/// Subscriber for breaker `state_changed`/`failed` events, matching
/// spec.md §4.6's `(circuit_name, event_type, payload)` hook contract.
/// `r2e-rpc-prometheus` implements this against a `circuit_breaker_state`
/// gauge and a `circuit_breaker_error` counter.
pub trait BreakerHook: Send + Sync {
    fn state_changed(&self, client_name: &str, new_state: CircuitState);
    fn failed(&self, client_name: &str);
}
