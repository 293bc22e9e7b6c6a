//! Circuit breaker for oracle calls.
//!
//! When calls for a stage keep failing after their retries, the circuit for
//! that stage opens and further calls fail fast with
//! [`OracleError::CircuitOpen`](crate::oracle::OracleError::CircuitOpen)
//! until the recovery timeout has passed.

use adjudicator_core::PipelineStage;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed calls before the circuit opens.
    pub failure_threshold: u32,

    #[serde(with = "crate::config::duration_serde")]
    pub recovery_timeout: Duration,

    /// Successful trial calls needed to close a half-open circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { successes: u32 },
}

/// Per-stage circuit breaker. Stages recover independently.
pub struct CircuitBreaker {
    states: RwLock<HashMap<PipelineStage, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls for `stage` should fail fast.
    ///
    /// An open circuit whose recovery timeout has elapsed moves to half-open
    /// and lets the call through.
    pub fn is_open(&self, stage: PipelineStage) -> bool {
        let mut states = self.states.write();
        let opened_at = match states.get(&stage) {
            Some(CircuitState::Open { opened_at }) => *opened_at,
            _ => return false,
        };

        if opened_at.elapsed() >= self.config.recovery_timeout {
            states.insert(stage, CircuitState::HalfOpen { successes: 0 });
            tracing::info!(stage = %stage, "Circuit half-open, allowing trial call");
            false
        } else {
            true
        }
    }

    pub fn record_success(&self, stage: PipelineStage) {
        let mut states = self.states.write();
        let next = match states.get(&stage) {
            Some(CircuitState::HalfOpen { successes }) if successes + 1 < self.config.success_threshold => {
                CircuitState::HalfOpen {
                    successes: successes + 1,
                }
            }
            Some(CircuitState::HalfOpen { .. }) => {
                tracing::info!(stage = %stage, "Circuit closed after successful recovery");
                CircuitState::Closed { failures: 0 }
            }
            _ => CircuitState::Closed { failures: 0 },
        };
        states.insert(stage, next);
    }

    pub fn record_failure(&self, stage: PipelineStage) {
        let mut states = self.states.write();
        let failures = match states.get(&stage) {
            Some(CircuitState::Closed { failures }) => failures + 1,
            Some(CircuitState::Open { .. }) => return,
            // A failed trial call reopens immediately.
            Some(CircuitState::HalfOpen { .. }) => self.config.failure_threshold,
            None => 1,
        };

        if failures >= self.config.failure_threshold {
            states.insert(
                stage,
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                stage = %stage,
                failures,
                recovery_timeout = ?self.config.recovery_timeout,
                "Circuit opened"
            );
        } else {
            states.insert(stage, CircuitState::Closed { failures });
        }
    }

    pub fn state(&self, stage: PipelineStage) -> CircuitState {
        self.states
            .read()
            .get(&stage)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(recovery_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            recovery_timeout,
            success_threshold: 1,
        })
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open(PipelineStage::Extraction));
        assert_eq!(
            cb.state(PipelineStage::Extraction),
            CircuitState::Closed { failures: 0 }
        );
    }

    #[test]
    fn test_circuit_opens_after_threshold() {
        let cb = breaker(Duration::from_secs(60));
        cb.record_failure(PipelineStage::Qualification);
        assert!(!cb.is_open(PipelineStage::Qualification));
        cb.record_failure(PipelineStage::Qualification);
        assert!(cb.is_open(PipelineStage::Qualification));
    }

    #[test]
    fn test_stages_are_independent() {
        let cb = breaker(Duration::from_secs(60));
        cb.record_failure(PipelineStage::Extraction);
        cb.record_failure(PipelineStage::Extraction);
        assert!(cb.is_open(PipelineStage::Extraction));
        assert!(!cb.is_open(PipelineStage::Consistency));
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = breaker(Duration::from_secs(60));
        cb.record_failure(PipelineStage::Extraction);
        cb.record_success(PipelineStage::Extraction);
        cb.record_failure(PipelineStage::Extraction);
        assert!(!cb.is_open(PipelineStage::Extraction));
    }

    #[test]
    fn test_half_open_after_timeout_then_close() {
        let cb = breaker(Duration::ZERO);
        cb.record_failure(PipelineStage::Consistency);
        cb.record_failure(PipelineStage::Consistency);

        assert!(!cb.is_open(PipelineStage::Consistency));
        assert_eq!(
            cb.state(PipelineStage::Consistency),
            CircuitState::HalfOpen { successes: 0 }
        );

        cb.record_success(PipelineStage::Consistency);
        assert_eq!(
            cb.state(PipelineStage::Consistency),
            CircuitState::Closed { failures: 0 }
        );
    }

    #[test]
    fn test_failed_trial_reopens() {
        let cb = breaker(Duration::ZERO);
        cb.record_failure(PipelineStage::Extraction);
        cb.record_failure(PipelineStage::Extraction);
        assert!(!cb.is_open(PipelineStage::Extraction));

        cb.record_failure(PipelineStage::Extraction);
        assert!(matches!(
            cb.state(PipelineStage::Extraction),
            CircuitState::Open { .. }
        ));
    }

    #[test]
    fn test_reset_clears_all_stages() {
        let cb = breaker(Duration::from_secs(60));
        cb.record_failure(PipelineStage::Extraction);
        cb.record_failure(PipelineStage::Extraction);
        cb.reset();
        assert!(!cb.is_open(PipelineStage::Extraction));
    }
}
