//! Retry and circuit breaking around any oracle client.

use async_trait::async_trait;
use backon::Retryable;
use std::sync::Arc;
use std::time::Duration;

use super::{OracleClient, OracleError, OracleRequest, OracleResponse};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, RetryConfig};

/// Decorates an oracle with bounded exponential-backoff retries for
/// transient errors and a per-stage circuit breaker.
///
/// Non-transient errors are returned after the first attempt. Response
/// content is never inspected here; a well-delivered but unusable answer is
/// the caller's parse error and is not retried.
pub struct ResilientOracle {
    inner: Arc<dyn OracleClient>,
    retry: RetryConfig,
    breaker: CircuitBreaker,
}

impl ResilientOracle {
    pub fn new(inner: Arc<dyn OracleClient>, retry: RetryConfig, breaker: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            retry,
            breaker: CircuitBreaker::new(breaker),
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl OracleClient for ResilientOracle {
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError> {
        let stage = request.stage;
        if self.breaker.is_open(stage) {
            tracing::warn!(stage = %stage, "Circuit open, skipping oracle call");
            return Err(OracleError::CircuitOpen(stage));
        }

        let attempt = || {
            let inner = Arc::clone(&self.inner);
            let request = request.clone();
            async move { inner.complete(request).await }
        };

        let result = attempt
            .retry(self.retry.backoff())
            .when(|e: &OracleError| e.is_transient())
            .notify(|e: &OracleError, delay: Duration| {
                tracing::warn!(
                    stage = %stage,
                    error = %e,
                    delay = ?delay,
                    "Transient oracle failure, retrying"
                );
            })
            .await;

        match &result {
            Ok(_) => self.breaker.record_success(stage),
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    stage = %stage,
                    error = %e,
                    attempts = self.retry.max_attempts,
                    "Oracle retries exhausted"
                );
                self.breaker.record_failure(stage);
            }
            Err(e) => {
                tracing::warn!(stage = %stage, error = %e, "Oracle call failed");
            }
        }
        result
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
