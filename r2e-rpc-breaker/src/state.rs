use std::time::{Duration, Instant};

/// Observable state of a single client's breaker, mirrored 1:1 by the
/// Prometheus gauge mapping `{0=closed,1=half-open,2=open}` (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

impl CircuitState {
    pub fn as_gauge_value(&self) -> i64 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::HalfOpen => 1,
            CircuitState::Open => 2,
        }
    }
}

/// Per-client breaker state machine. Not `Send`-shared directly; callers
/// hold it behind a `tokio::sync::Mutex` in the shared breaker table so
/// mutations stay atomic under concurrency (spec.md §5 "Shared resources").
pub struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    failure_threshold: u32,
    open_ttl: Duration,
    /// Set while a half-open probe call is outstanding, so concurrent
    /// callers don't all get admitted as the probe (spec.md §4.6: "the next
    /// call proceeds", singular).
    half_open_probe_in_flight: bool,
}

impl BreakerState {
    pub fn new(failure_threshold: u32, open_ttl: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            failure_threshold,
            open_ttl,
            half_open_probe_in_flight: false,
        }
    }

    /// Call before invoking the wrapped chain. Transitions `open` to
    /// `half-open` once the TTL has elapsed and reports whether the call
    /// may proceed. In `half-open`, only one in-flight probe is admitted at
    /// a time; every other caller is short-circuited until that probe
    /// resolves via [`Self::record_success`] or [`Self::record_failure`].
    pub fn admit(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if self.half_open_probe_in_flight {
                    false
                } else {
                    self.half_open_probe_in_flight = true;
                    true
                }
            }
            CircuitState::Open => {
                let elapsed = self.opened_at.map(|t| t.elapsed()).unwrap_or(Duration::MAX);
                if elapsed >= self.open_ttl {
                    self.state = CircuitState::HalfOpen;
                    self.half_open_probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Returns `Some(new_state)` if the call caused a transition.
    pub fn record_success(&mut self) -> Option<CircuitState> {
        self.consecutive_failures = 0;
        self.half_open_probe_in_flight = false;
        if self.state != CircuitState::Closed {
            self.state = CircuitState::Closed;
            self.opened_at = None;
            return Some(CircuitState::Closed);
        }
        None
    }

    /// Returns `Some(new_state)` if the call caused a transition.
    pub fn record_failure(&mut self) -> Option<CircuitState> {
        match self.state {
            CircuitState::HalfOpen => {
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
                self.half_open_probe_in_flight = false;
                Some(CircuitState::Open)
            }
            CircuitState::Closed => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= self.failure_threshold {
                    self.state = CircuitState::Open;
                    self.opened_at = Some(Instant::now());
                    Some(CircuitState::Open)
                } else {
                    None
                }
            }
            CircuitState::Open => None,
        }
    }

    pub fn current(&self) -> CircuitState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_consecutive_failures() {
        let mut b = BreakerState::new(3, Duration::from_secs(30));
        assert!(b.record_failure().is_none());
        assert!(b.record_failure().is_none());
        assert_eq!(b.record_failure(), Some(CircuitState::Open));
        assert_eq!(b.current(), CircuitState::Open);
    }

    #[test]
    fn open_short_circuits_until_ttl_elapses() {
        let mut b = BreakerState::new(1, Duration::from_millis(20));
        b.record_failure();
        assert!(!b.admit());
        std::thread::sleep(Duration::from_millis(30));
        assert!(b.admit());
        assert_eq!(b.current(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_success_closes_the_circuit() {
        let mut b = BreakerState::new(1, Duration::from_millis(10));
        b.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        b.admit();
        assert_eq!(b.record_success(), Some(CircuitState::Closed));
        assert_eq!(b.current(), CircuitState::Closed);
    }

    #[test]
    fn half_open_admits_only_one_probe_at_a_time() {
        let mut b = BreakerState::new(1, Duration::from_millis(10));
        b.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(b.admit());
        assert_eq!(b.current(), CircuitState::HalfOpen);
        // A second concurrent caller is short-circuited while the probe is outstanding.
        assert!(!b.admit());
        assert!(!b.admit());
        b.record_success();
        assert_eq!(b.current(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_and_restarts_ttl() {
        let mut b = BreakerState::new(1, Duration::from_millis(10));
        b.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        b.admit();
        assert_eq!(b.record_failure(), Some(CircuitState::Open));
        assert!(!b.admit());
    }

    #[test]
    fn success_resets_consecutive_failure_count() {
        let mut b = BreakerState::new(3, Duration::from_secs(30));
        b.record_failure();
        b.record_failure();
        b.record_success();
        assert!(b.record_failure().is_none());
        assert!(b.record_failure().is_none());
    }
}
