// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed views of the GitHub Actions documents the broker relies on.
//!
//! Only the fields used for verification are modelled; everything else stays
//! in the raw JSON for tag computation.

use serde::Deserialize;
use serde_json::Value;

use crate::error::GitHubError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryRef {
	/// `0` when GitHub omits the repository (treated as unknown).
	#[serde(default)]
	pub id: u64,
	/// `owner/name` as GitHub spells it.
	#[serde(default)]
	pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunRecord {
	pub id: u64,
	pub run_number: u64,
	#[serde(default)]
	pub head_sha: String,
	#[serde(default)]
	pub repository: RepositoryRef,
	#[serde(default)]
	pub head_repository: RepositoryRef,
}

impl RunRecord {
	pub fn from_value(value: &Value) -> Result<Self, GitHubError> {
		Self::deserialize(value)
			.map_err(|e| GitHubError::InvalidResponse(format!("workflow run: {e}")))
	}

	/// A run whose head lives in a different repository than the one it
	/// runs in was triggered from a fork.
	pub fn is_fork(&self) -> bool {
		self.repository.id != 0 && self.head_repository.id != self.repository.id
	}

	/// Whether GitHub says this run belongs to `repo`. Repository names are
	/// case-insensitive on GitHub.
	pub fn belongs_to(&self, repo: &str) -> bool {
		!self.repository.full_name.is_empty() && self.repository.full_name.eq_ignore_ascii_case(repo)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepRecord {
	pub name: String,
	pub number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobRecord {
	pub id: u64,
	#[serde(default)]
	pub head_sha: String,
	pub name: String,
	#[serde(default)]
	pub steps: Vec<StepRecord>,
}

impl JobRecord {
	/// The last step named `name`, in list order.
	pub fn find_step(&self, name: &str) -> Option<&StepRecord> {
		self.steps.iter().rev().find(|step| step.name == name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobList {
	#[serde(default)]
	pub jobs: Vec<JobRecord>,
}

impl JobList {
	pub fn from_value(value: &Value) -> Result<Self, GitHubError> {
		Self::deserialize(value)
			.map_err(|e| GitHubError::InvalidResponse(format!("workflow jobs: {e}")))
	}

	/// Index and record of the last job named `name`, in list order.
	///
	/// The index addresses the same job in the raw `jobs` array.
	pub fn find_job(&self, name: &str) -> Option<(usize, &JobRecord)> {
		self.jobs
			.iter()
			.enumerate()
			.rev()
			.find(|(_, job)| job.name == name)
	}
}

/// Where a step's log lives on the GitHub web UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLocation {
	pub repo: String,
	pub commit_sha: String,
	pub job_id: u64,
	pub step_number: u64,
}

impl LogLocation {
	/// Path relative to the web base URL.
	pub fn path(&self) -> String {
		format!(
			"{}/commit/{}/checks/{}/logs/{}",
			self.repo, self.commit_sha, self.job_id, self.step_number
		)
	}
}
