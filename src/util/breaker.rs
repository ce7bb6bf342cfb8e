//! Circuit breaker for external dependencies.
//!
//! Each external dependency (search provider, page fetcher) owns one
//! breaker instance. A tripped breaker lets callers short-circuit without
//! attempting the network call, preventing cascading latency during a
//! provider outage.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests allowed (default).
    Closed,
    /// Requests blocked until the reset timeout elapses.
    Open,
    /// One trial request allowed; resolved by the next success/failure.
    HalfOpen,
}

struct BreakerInner {
    failures: u32,
    state: CircuitState,
    next_retry_at: Option<Instant>,
}

/// Per-dependency failure tracker with closed → open → half_open transitions.
///
/// State transitions are atomic; the breaker may be shared across the
/// concurrent calls of a single pipeline run.
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `failure_threshold` consecutive
    /// failures and allows a trial request after `reset_timeout_ms`.
    pub fn new(failure_threshold: u32, reset_timeout_ms: u64) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                failures: 0,
                state: CircuitState::Closed,
                next_retry_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
            reset_timeout: Duration::from_millis(reset_timeout_ms),
        }
    }

    /// Whether a request may be issued right now.
    ///
    /// When open and the reset deadline has passed, transitions to
    /// half-open and returns true exactly once per deadline; the next
    /// `success`/`failure` resolves the trial.
    pub fn can_request(&self) -> bool {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Open => {
                let deadline_passed = inner
                    .next_retry_at
                    .map(|at| Instant::now() >= at)
                    .unwrap_or(true);
                if deadline_passed {
                    inner.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
            CircuitState::Closed | CircuitState::HalfOpen => true,
        }
    }

    /// Record a successful call: resets the failure count and closes.
    pub fn success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.failures = 0;
        inner.state = CircuitState::Closed;
        inner.next_retry_at = None;
    }

    /// Record a failed call; opens the breaker at the threshold.
    pub fn failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.failures += 1;
        if inner.failures >= self.failure_threshold {
            inner.state = CircuitState::Open;
            inner.next_retry_at = Some(Instant::now() + self.reset_timeout);
        }
    }

    /// Current state, for observability and tests.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    /// Consecutive failure count since the last success.
    pub fn failures(&self) -> u32 {
        self.inner.lock().expect("breaker lock poisoned").failures
    }
}
