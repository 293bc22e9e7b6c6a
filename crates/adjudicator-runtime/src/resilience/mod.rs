//! Resilience patterns for oracle calls.
//!
//! - Retry: bounded exponential backoff for transient errors only
//! - Circuit breaker: per-stage fail-fast after repeated failures

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::RetryConfig;
