// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub Actions access for the actions2aws broker.
//!
//! The broker treats GitHub as the authority on who is asking: run and job
//! metadata come from the REST API with the broker's own token, and the job
//! log (which carries the job's public key) comes from the web UI's log
//! endpoint with a logged-in session cookie.
//!
//! Both seams are traits so the broker can be exercised against fakes.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

use actions2aws_common_http::Readiness;
use async_trait::async_trait;
use serde_json::Value;

pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use error::GitHubError;
pub use types::{JobList, JobRecord, LogLocation, RepositoryRef, RunRecord, StepRecord};

/// Authoritative run and job metadata.
///
/// Documents are returned raw so tag expressions can address any field;
/// callers decode the typed view with [`RunRecord::from_value`] and
/// [`JobList::from_value`].
#[async_trait]
pub trait CiPlatform: Send + Sync {
	async fn get_run(&self, repo: &str, run_id: &str) -> Result<Value, GitHubError>;
	async fn get_jobs(&self, repo: &str, run_id: &str) -> Result<Value, GitHubError>;
}

/// The step log of a single job.
#[async_trait]
pub trait LogSource: Send + Sync {
	/// `NotReady` when the platform has not published the log yet.
	async fn fetch_log(&self, location: &LogLocation) -> Result<Readiness<String>, GitHubError>;
}
