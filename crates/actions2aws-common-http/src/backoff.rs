// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded polling with linear backoff.
//!
//! Used for resources that exist eventually but may not be visible on the
//! first read, such as a job log that is still being flushed. Unlike a
//! transient-error retry, "not ready" is an expected answer here: errors from
//! the poll function are returned immediately and never retried.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Linear backoff: after the `n`th not-ready answer, wait `step * (n - 1)`.
///
/// With the defaults (6 attempts, 1s step) the waits between attempts are
/// 0s, 1s, 2s, 3s, 4s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
	pub max_attempts: u32,
	pub step: Duration,
}

impl Default for LinearBackoff {
	fn default() -> Self {
		Self {
			max_attempts: 6,
			step: Duration::from_secs(1),
		}
	}
}

impl LinearBackoff {
	pub fn new(max_attempts: u32, step: Duration) -> Self {
		Self { max_attempts, step }
	}

	/// Wait after the `failed_attempt`th (1-based) not-ready answer.
	pub fn delay_after(&self, failed_attempt: u32) -> Duration {
		self.step * failed_attempt.saturating_sub(1)
	}

	/// Cumulative wait when the first `failures` attempts are not ready and
	/// another attempt follows each of them.
	pub fn cumulative_delay(&self, failures: u32) -> Duration {
		(1..=failures).map(|n| self.delay_after(n)).sum()
	}

	/// Worst-case time spent sleeping before giving up.
	pub fn worst_case_delay(&self) -> Duration {
		self.cumulative_delay(self.max_attempts.saturating_sub(1))
	}
}

/// One answer from the polled resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T> {
	Ready(T),
	NotReady,
}

/// Result of [`poll_with_backoff`] when no error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
	Ready { value: T, attempts: u32 },
	Exhausted { attempts: u32 },
}

/// Calls `f` until it reports [`Readiness::Ready`], an error, or the attempt
/// budget is spent.
pub async fn poll_with_backoff<F, Fut, T, E>(
	policy: &LinearBackoff,
	mut f: F,
) -> Result<PollOutcome<T>, E>
where
	F: FnMut(u32) -> Fut,
	Fut: Future<Output = Result<Readiness<T>, E>>,
{
	let max_attempts = policy.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		attempt += 1;

		match f(attempt).await? {
			Readiness::Ready(value) => {
				debug!(attempt, "resource ready");
				return Ok(PollOutcome::Ready {
					value,
					attempts: attempt,
				});
			}
			Readiness::NotReady if attempt >= max_attempts => {
				warn!(attempt, max_attempts, "resource still not ready, giving up");
				return Ok(PollOutcome::Exhausted { attempts: attempt });
			}
			Readiness::NotReady => {
				let delay = policy.delay_after(attempt);
				debug!(
					attempt,
					max_attempts,
					delay_ms = delay.as_millis() as u64,
					"resource not ready, backing off"
				);
				tokio::time::sleep(delay).await;
			}
		}
	}
}
