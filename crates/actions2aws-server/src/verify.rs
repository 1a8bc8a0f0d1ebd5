// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity verification against GitHub's own records.
//!
//! Nothing in a [`CredentialRequest`] is believed. The repository, run, job
//! and step names are only used to look up what GitHub says about them, with
//! the broker's own token, and the request is authenticated by what comes
//! back: a run that is not from a fork, in the permitted account, containing
//! the named job and step.
//!
//! `Repo` and `RunId` end up in GitHub URLs, so they are held to GitHub's own
//! syntax before any lookup, and the run GitHub returns must name the same
//! repository the account check was made against.

use actions2aws_common_core::{CredentialRequest, RequestError};
use actions2aws_server_github::{
	CiPlatform, GitHubError, JobList, JobRecord, RunRecord, StepRecord,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum VerifyError {
	#[error(transparent)]
	InvalidRequest(#[from] RequestError),

	#[error("run {run_id} of {repo} was triggered from a fork")]
	ForkRejected { repo: String, run_id: String },

	#[error("account '{account}' is not permitted")]
	OrgMismatch { account: String },

	#[error("run belongs to '{actual}', not '{requested}'")]
	RepositoryMismatch { requested: String, actual: String },

	#[error("job '{0}' not found in run")]
	JobNotFound(String),

	#[error("step '{step}' not found in job '{job}'")]
	StepNotFound { job: String, step: String },

	#[error(transparent)]
	Platform(#[from] GitHubError),
}

/// The authenticated job, with the raw documents tag expressions run over.
#[derive(Debug, Clone)]
pub struct VerifiedJob {
	pub run: RunRecord,
	pub job: JobRecord,
	pub step: StepRecord,
	/// Position of `job` in `jobs_raw["jobs"]`.
	pub job_index: usize,
	pub run_raw: Value,
	pub jobs_raw: Value,
}

/// Duplicate job or step names resolve to the last entry in GitHub's order.
#[instrument(skip(platform, request), fields(repo = %request.repo, run_id = %request.run_id, job = %request.job_name, step = %request.step_name))]
pub async fn verify(
	platform: &dyn CiPlatform,
	permitted_org: &str,
	request: &CredentialRequest,
) -> Result<VerifiedJob, VerifyError> {
	request.validate()?;

	let run_raw = platform.get_run(&request.repo, &request.run_id).await?;
	let run = RunRecord::from_value(&run_raw)?;

	if run.is_fork() {
		warn!(
			repository_id = run.repository.id,
			head_repository_id = run.head_repository.id,
			"rejecting run from fork"
		);
		return Err(VerifyError::ForkRejected {
			repo: request.repo.clone(),
			run_id: request.run_id.clone(),
		});
	}

	let account = request.account();
	if account != permitted_org {
		warn!(account, "rejecting request for account outside the permitted one");
		return Err(VerifyError::OrgMismatch {
			account: account.to_string(),
		});
	}

	if !run.belongs_to(&request.repo) {
		warn!(actual = %run.repository.full_name, "run belongs to a different repository");
		return Err(VerifyError::RepositoryMismatch {
			requested: request.repo.clone(),
			actual: run.repository.full_name.clone(),
		});
	}

	let jobs_raw = platform.get_jobs(&request.repo, &request.run_id).await?;
	let jobs = JobList::from_value(&jobs_raw)?;

	let (job_index, job) = jobs
		.find_job(&request.job_name)
		.ok_or_else(|| VerifyError::JobNotFound(request.job_name.clone()))?;
	let step = job
		.find_step(&request.step_name)
		.ok_or_else(|| VerifyError::StepNotFound {
			job: request.job_name.clone(),
			step: request.step_name.clone(),
		})?
		.clone();
	let job = job.clone();

	debug!(job_id = job.id, step_number = step.number, job_index, "verified job");

	Ok(VerifiedJob {
		run,
		job,
		step,
		job_index,
		run_raw,
		jobs_raw,
	})
}
