use std::{future::Future, time::Duration};

use membench_config::RetryPolicy;

use crate::Result;

/// Delay before retry number `attempt` (1 = the first retry).
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
	let exponent = attempt.saturating_sub(1) as i32;
	let raw = policy.initial_backoff_ms as f64 * policy.backoff_multiplier.powi(exponent);
	let capped = raw.min(policy.max_backoff_ms as f64).max(0.0);

	Duration::from_millis(capped as u64)
}

/// Runs `call` until it succeeds, returns a non-retryable error, or the policy's attempts run
/// out. The last error is returned as is.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 0_u32;

	loop {
		attempt += 1;

		match call().await {
			Ok(value) => return Ok(value),
			Err(err) if attempt < max_attempts && err.is_retryable() => {
				let delay = backoff_delay(policy, attempt);

				tracing::debug!(
					error = %err,
					operation,
					attempt,
					delay_ms = delay.as_millis() as u64,
					"Provider call failed. Retrying."
				);
				tokio::time::sleep(delay).await;
			},
			Err(err) => return Err(err),
		}
	}
}
