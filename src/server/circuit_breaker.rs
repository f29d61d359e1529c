//! Circuit breaker around the synchronous server connection.
//!
//! A framing error or repeated stat failure marks the server unreachable
//! until timeout elapses, at which point the next cycle may attempt to
//! reconnect (§7).

use crate::error::{SchedError, SchedResult};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed (normal operation)
    Closed,
    /// Circuit is open (failing, rejecting requests)
    Open,
    /// Circuit is half-open (testing recovery)
    HalfOpen,
}

/// Circuit breaker for fault tolerance
pub struct CircuitBreaker {
    /// Current state
    state: Arc<RwLock<CircuitState>>,
    /// Failure count
    failure_count: Arc<RwLock<u32>>,
    /// Success count (for half-open)
    success_count: Arc<RwLock<u32>>,
    /// Last failure time
    last_failure: Arc<RwLock<Option<Instant>>>,
    /// Failure threshold
    failure_threshold: u32,
    /// Success threshold (for half-open)
    success_threshold: u32,
    /// Timeout for open state
    timeout: Duration,
}

impl CircuitBreaker {
    /// Create new circuit breaker
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CircuitState::Closed)),
            failure_count: Arc::new(RwLock::new(0)),
            success_count: Arc::new(RwLock::new(0)),
            last_failure: Arc::new(RwLock::new(None)),
            failure_threshold,
            success_threshold: 3,
            timeout,
        }
    }

    /// Execute operation with circuit breaker protection. The bookkeeping
    /// locks are plain `parking_lot` locks, never held across an `.await` —
    /// only the operation future itself is awaited.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> SchedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = SchedResult<T>>,
    {
        // Check circuit state
        let state = *self.state.read();

        match state {
            CircuitState::Open => {
                // Check if timeout has passed
                let last_failure = *self.last_failure.read();
                if let Some(last) = last_failure {
                    if last.elapsed() >= self.timeout {
                        // Transition to half-open
                        *self.state.write() = CircuitState::HalfOpen;
                        *self.success_count.write() = 0;
                    } else {
                        return Err(SchedError::ServerUnreachable(
                            "server connection circuit open".to_string(),
                        ));
                    }
                } else {
                    return Err(SchedError::ServerUnreachable(
                        "server connection circuit open".to_string(),
                    ));
                }
            }
            CircuitState::HalfOpen => {
                // Allow operation to test recovery
            }
            CircuitState::Closed => {
                // Normal operation
            }
        }

        // Execute operation
        match operation().await {
            Ok(result) => {
                // Success - reset failure count
                *self.failure_count.write() = 0;

                // Update state if half-open
                let state = *self.state.read();
                if state == CircuitState::HalfOpen {
                    let mut success_count = self.success_count.write();
                    *success_count += 1;

                    if *success_count >= self.success_threshold {
                        // Transition to closed
                        *self.state.write() = CircuitState::Closed;
                        *success_count = 0;
                    }
                }

                Ok(result)
            }
            Err(e) => {
                // Failure - increment failure count
                let mut failure_count = self.failure_count.write();
                *failure_count += 1;

                *self.last_failure.write() = Some(Instant::now());

                // Check if threshold exceeded
                if *failure_count >= self.failure_threshold {
                    *self.state.write() = CircuitState::Open;
                }

                Err(e)
            }
        }
    }

    /// Get current state
    pub async fn get_state(&self) -> CircuitState {
        *self.state.read()
    }
}
