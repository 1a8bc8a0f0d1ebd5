// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory stand-ins for GitHub and STS.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use actions2aws_common_core::{format_marker, IssuedCredentials};
use actions2aws_common_http::Readiness;
use actions2aws_common_secret::SecretString;
use actions2aws_server_github::{CiPlatform, GitHubError, LogLocation, LogSource};
use actions2aws_server_sts::{CredentialMinter, MintError, MintRequest};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

pub const REPO_ID: u64 = 100;

pub fn run_document(repository_id: u64, head_repository_id: u64) -> Value {
	json!({
		"id": 42,
		"run_number": 7,
		"head_sha": "abc123",
		"head_commit": {
			"id": "abc123",
			"author": {"email": "a@x.com"}
		},
		"repository": {"id": repository_id, "full_name": "acme/svc"},
		"head_repository": {"id": head_repository_id, "full_name": "acme/svc"}
	})
}

pub fn jobs_document() -> Value {
	json!({
		"total_count": 2,
		"jobs": [
			{"id": 8, "name": "lint", "head_sha": "abc123", "steps": [
				{"name": "Set up job", "number": 1}
			]},
			{"id": 9, "name": "build", "head_sha": "abc123", "steps": [
				{"name": "Set up job", "number": 1},
				{"name": "keygen", "number": 2},
				{"name": "deploy", "number": 3}
			]}
		]
	})
}

pub struct FakePlatform {
	pub run: Result<Value, u16>,
	pub jobs: Value,
	pub run_calls: AtomicU32,
	pub jobs_calls: AtomicU32,
}

impl FakePlatform {
	pub fn new(run: Value, jobs: Value) -> Self {
		Self {
			run: Ok(run),
			jobs,
			run_calls: AtomicU32::new(0),
			jobs_calls: AtomicU32::new(0),
		}
	}

	pub fn legitimate() -> Self {
		Self::new(run_document(REPO_ID, REPO_ID), jobs_document())
	}

	pub fn failing(status: u16) -> Self {
		Self {
			run: Err(status),
			..Self::legitimate()
		}
	}
}

#[async_trait]
impl CiPlatform for FakePlatform {
	async fn get_run(&self, repo: &str, run_id: &str) -> Result<Value, GitHubError> {
		self.run_calls.fetch_add(1, Ordering::SeqCst);
		match &self.run {
			Ok(run) => Ok(run.clone()),
			Err(404) => Err(GitHubError::NotFound(format!("workflow run {repo}#{run_id}"))),
			Err(status) => Err(GitHubError::api_error(*status, "upstream failure")),
		}
	}

	async fn get_jobs(&self, _repo: &str, _run_id: &str) -> Result<Value, GitHubError> {
		self.jobs_calls.fetch_add(1, Ordering::SeqCst);
		Ok(self.jobs.clone())
	}
}

/// Answers `NotReady` a fixed number of times, then serves `log`.
pub struct FakeLogs {
	answers: Mutex<VecDeque<Readiness<String>>>,
	fallback: Readiness<String>,
	pub calls: AtomicU32,
	pub last_location: Mutex<Option<LogLocation>>,
}

impl FakeLogs {
	pub fn after(not_ready: u32, log: impl Into<String>) -> Self {
		let mut answers: VecDeque<_> = (0..not_ready).map(|_| Readiness::NotReady).collect();
		let log = log.into();
		answers.push_back(Readiness::Ready(log.clone()));
		Self {
			answers: Mutex::new(answers),
			fallback: Readiness::Ready(log),
			calls: AtomicU32::new(0),
			last_location: Mutex::new(None),
		}
	}

	pub fn never_ready() -> Self {
		Self {
			answers: Mutex::new(VecDeque::new()),
			fallback: Readiness::NotReady,
			calls: AtomicU32::new(0),
			last_location: Mutex::new(None),
		}
	}

	pub fn with_key(public_key: &str) -> Self {
		Self::after(
			0,
			format!(
				"2025-06-01T12:00:00.0000000Z ##[group]Run actions2aws keygen\n\
				 2025-06-01T12:00:00.1000000Z {}\n\
				 2025-06-01T12:00:00.2000000Z ##[endgroup]\n",
				format_marker(public_key)
			),
		)
	}

	pub fn calls(&self) -> u32 {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl LogSource for FakeLogs {
	async fn fetch_log(&self, location: &LogLocation) -> Result<Readiness<String>, GitHubError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		*self.last_location.lock().unwrap() = Some(location.clone());
		let next = self.answers.lock().unwrap().pop_front();
		Ok(next.unwrap_or_else(|| self.fallback.clone()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMint {
	pub repo: String,
	pub role_arn: String,
	pub session_name: String,
	pub tags: BTreeMap<String, String>,
}

pub struct FakeMinter {
	pub fail: bool,
	pub calls: Mutex<Vec<RecordedMint>>,
}

impl FakeMinter {
	pub fn new() -> Self {
		Self {
			fail: false,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn refusing() -> Self {
		Self {
			fail: true,
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn credentials() -> IssuedCredentials {
		IssuedCredentials {
			access_key_id: "ASIAEXAMPLE".to_string(),
			secret_access_key: SecretString::new("wJalrXUtnFEMI/K7MDENG".to_string()),
			session_token: SecretString::new("FwoGZXIvYXdzEBcaDH".to_string()),
			expiry: Utc.with_ymd_and_hms(2025, 6, 1, 13, 0, 0).unwrap(),
		}
	}

	pub fn recorded(&self) -> Vec<RecordedMint> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl CredentialMinter for FakeMinter {
	async fn mint(&self, request: &MintRequest<'_>) -> Result<IssuedCredentials, MintError> {
		self.calls.lock().unwrap().push(RecordedMint {
			repo: request.repo.to_string(),
			role_arn: request.role_arn.to_string(),
			session_name: request.session_name.clone(),
			tags: request.tags.clone(),
		});
		if self.fail {
			return Err(MintError::Provider("AccessDenied: not authorized".to_string()));
		}
		Ok(Self::credentials())
	}
}
