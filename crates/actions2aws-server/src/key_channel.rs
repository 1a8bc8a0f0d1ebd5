// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reading the job's public key back out of its own log.
//!
//! The broker never accepts a key from the caller. The job prints its key
//! into its log; GitHub records that; the broker fetches the log for the
//! verified job and step and takes the key from there. Only whoever produced
//! that log holds the matching private key.
//!
//! GitHub publishes step logs with some delay, so a missing log is polled
//! with [`LinearBackoff`]. A log that is there but has no marker is final.

use actions2aws_common_core::extract_public_key;
use actions2aws_common_http::{poll_with_backoff, LinearBackoff, PollOutcome};
use actions2aws_server_github::{GitHubError, LogLocation, LogSource};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum KeyExchangeError {
	#[error("job log was not available after {attempts} attempts")]
	LogNotReady { attempts: u32 },

	#[error("job log contains no public key marker")]
	MarkerMissing,

	#[error(transparent)]
	Platform(#[from] GitHubError),
}

/// Returns the public key published in the step log at `location`.
#[instrument(skip(source, policy), fields(repo = %location.repo, job_id = location.job_id, step = location.step_number))]
pub async fn retrieve_key(
	source: &dyn LogSource,
	policy: &LinearBackoff,
	location: &LogLocation,
) -> Result<String, KeyExchangeError> {
	let outcome = poll_with_backoff(policy, |attempt| async move {
		debug!(attempt, "fetching job log");
		source.fetch_log(location).await
	})
	.await?;

	match outcome {
		PollOutcome::Ready { value: log, attempts } => {
			let key = extract_public_key(&log).ok_or(KeyExchangeError::MarkerMissing)?;
			debug!(attempts, "found public key in job log");
			Ok(key.to_string())
		}
		PollOutcome::Exhausted { attempts } => Err(KeyExchangeError::LogNotReady { attempts }),
	}
}
