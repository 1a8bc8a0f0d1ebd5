// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `reqwest` implementation of [`CiPlatform`] and [`LogSource`].

use actions2aws_common_core::{validate_repo, validate_run_id};
use actions2aws_common_http::{new_client, Readiness};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::GitHubConfig;
use crate::error::GitHubError;
use crate::types::LogLocation;
use crate::{CiPlatform, LogSource};

const API_VERSION: &str = "2022-11-28";
const JOBS_PAGE_SIZE: &str = "100";

#[derive(Debug, Clone)]
pub struct GitHubClient {
	http: Client,
	config: GitHubConfig,
}

impl GitHubClient {
	pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
		Ok(Self {
			http: new_client()?,
			config,
		})
	}

	pub fn with_http_client(config: GitHubConfig, http: Client) -> Self {
		Self { http, config }
	}

	fn api_endpoint(&self, path: &str) -> Result<Url, GitHubError> {
		self.config
			.api_url()
			.join(path)
			.map_err(|e| GitHubError::Config(format!("cannot build API URL for '{path}': {e}")))
	}

	async fn get_api_document(
		&self,
		url: Url,
		what: impl FnOnce() -> String,
	) -> Result<Value, GitHubError> {
		let response = self
			.http
			.get(url)
			.header(header::ACCEPT, "application/vnd.github+json")
			.header(
				header::AUTHORIZATION,
				format!("Bearer {}", self.config.api_token().expose()),
			)
			.header("X-GitHub-Api-Version", API_VERSION)
			.send()
			.await?;

		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			return Err(GitHubError::NotFound(what()));
		}
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(GitHubError::api_error(status.as_u16(), body));
		}

		response
			.json()
			.await
			.map_err(|e| GitHubError::InvalidResponse(format!("{}: {e}", what())))
	}
}

#[async_trait]
impl CiPlatform for GitHubClient {
	#[instrument(skip(self), name = "GitHubClient::get_run")]
	async fn get_run(&self, repo: &str, run_id: &str) -> Result<Value, GitHubError> {
		validate_repo(repo)?;
		validate_run_id(run_id)?;
		let url = self.api_endpoint(&format!("repos/{repo}/actions/runs/{run_id}"))?;
		debug!(%url, "fetching workflow run");
		self.get_api_document(url, || format!("workflow run {repo}#{run_id}"))
			.await
	}

	#[instrument(skip(self), name = "GitHubClient::get_jobs")]
	async fn get_jobs(&self, repo: &str, run_id: &str) -> Result<Value, GitHubError> {
		validate_repo(repo)?;
		validate_run_id(run_id)?;
		let mut url = self.api_endpoint(&format!("repos/{repo}/actions/runs/{run_id}/jobs"))?;
		url.query_pairs_mut().append_pair("per_page", JOBS_PAGE_SIZE);
		debug!(%url, "fetching workflow jobs");
		self.get_api_document(url, || format!("jobs of workflow run {repo}#{run_id}"))
			.await
	}
}

#[async_trait]
impl LogSource for GitHubClient {
	#[instrument(skip(self), fields(job_id = location.job_id, step = location.step_number), name = "GitHubClient::fetch_log")]
	async fn fetch_log(&self, location: &LogLocation) -> Result<Readiness<String>, GitHubError> {
		validate_repo(&location.repo)?;
		if location.commit_sha.is_empty() || !location.commit_sha.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(GitHubError::InvalidResponse(format!(
				"commit sha '{}' is not hexadecimal",
				location.commit_sha
			)));
		}
		let path = location.path();
		let url = self
			.config
			.web_url()
			.join(&path)
			.map_err(|e| GitHubError::Config(format!("cannot build log URL for '{path}': {e}")))?;

		let response = self
			.http
			.get(url)
			.header("X-Requested-With", "XMLHttpRequest")
			.header(
				header::COOKIE,
				format!("user_session={}", self.config.user_session().expose()),
			)
			.send()
			.await?;

		let status = response.status();
		if status == StatusCode::NOT_FOUND {
			debug!("job log not published yet");
			return Ok(Readiness::NotReady);
		}
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(GitHubError::api_error(status.as_u16(), body));
		}

		Ok(Readiness::Ready(response.text().await?))
	}
}
