// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire payloads exchanged between the job-side client and the broker.
//!
//! Field names are PascalCase on the wire (`Repo`, `RunId`, `RoleARN`,
//! `AccessKeyId`, ...) to stay compatible with existing clients.

use std::sync::LazyLock;

use actions2aws_common_secret::SecretString;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::ErrorKind;

/// A credential request as sent by the job.
///
/// Nothing in here is trusted. The broker only uses these fields as lookup
/// keys into GitHub's own records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
	/// `owner/name`
	#[serde(rename = "Repo")]
	pub repo: String,
	#[serde(rename = "RunId")]
	pub run_id: String,
	#[serde(rename = "JobName")]
	pub job_name: String,
	#[serde(rename = "StepName")]
	pub step_name: String,
	#[serde(rename = "RoleARN")]
	pub role_arn: String,
}

// GitHub's own rules: owners are alphanumeric with inner hyphens, repository
// names add `.` and `_`. Nothing here can form a path segment of its own.
static REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]{0,38}/[A-Za-z0-9._-]{1,100}$").expect("repo regex is valid")
});

static RUN_ID_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[0-9]{1,20}$").expect("run id regex is valid"));

/// A request field that cannot be used as a GitHub lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
	#[error("repository '{0}' is not of the form owner/name")]
	InvalidRepo(String),

	#[error("run id '{0}' is not numeric")]
	InvalidRunId(String),
}

/// Accepts exactly `owner/name`.
pub fn validate_repo(repo: &str) -> Result<(), RequestError> {
	let name = repo.split_once('/').map(|(_, name)| name);
	if !REPO_RE.is_match(repo) || matches!(name, Some(".") | Some("..")) {
		return Err(RequestError::InvalidRepo(repo.to_string()));
	}
	Ok(())
}

pub fn validate_run_id(run_id: &str) -> Result<(), RequestError> {
	if !RUN_ID_RE.is_match(run_id) {
		return Err(RequestError::InvalidRunId(run_id.to_string()));
	}
	Ok(())
}

impl CredentialRequest {
	/// The account segment of `repo`: everything before the first `/`.
	pub fn account(&self) -> &str {
		self.repo.split('/').next().unwrap_or_default()
	}

	/// Checks the fields that end up in GitHub URLs.
	pub fn validate(&self) -> Result<(), RequestError> {
		validate_repo(&self.repo)?;
		validate_run_id(&self.run_id)
	}
}

/// Short-lived AWS credentials, as minted by STS and delivered encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
	pub access_key_id: String,
	pub secret_access_key: SecretString,
	pub session_token: SecretString,
	pub expiry: DateTime<Utc>,
}

#[derive(Serialize)]
struct CredentialsRef<'a> {
	#[serde(rename = "AccessKeyId")]
	access_key_id: &'a str,
	#[serde(rename = "SecretAccessKey")]
	secret_access_key: &'a str,
	#[serde(rename = "SessionToken")]
	session_token: &'a str,
	#[serde(rename = "Expiry")]
	expiry: &'a DateTime<Utc>,
}

#[derive(Deserialize)]
struct CredentialsOwned {
	#[serde(rename = "AccessKeyId")]
	access_key_id: String,
	#[serde(rename = "SecretAccessKey")]
	secret_access_key: String,
	#[serde(rename = "SessionToken")]
	session_token: String,
	#[serde(rename = "Expiry")]
	expiry: DateTime<Utc>,
}

// Serialized only into the encrypted envelope, so the secret halves are
// written in the clear here.
impl Serialize for IssuedCredentials {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		CredentialsRef {
			access_key_id: &self.access_key_id,
			secret_access_key: self.secret_access_key.expose(),
			session_token: self.session_token.expose(),
			expiry: &self.expiry,
		}
		.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for IssuedCredentials {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let owned = CredentialsOwned::deserialize(deserializer)?;
		Ok(Self {
			access_key_id: owned.access_key_id,
			secret_access_key: SecretString::new(owned.secret_access_key),
			session_token: SecretString::new(owned.session_token),
			expiry: owned.expiry,
		})
	}
}

/// Body of every non-success broker response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: ErrorKind,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			error,
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn sample_credentials() -> IssuedCredentials {
		IssuedCredentials {
			access_key_id: "ASIAEXAMPLE".to_string(),
			secret_access_key: SecretString::new("wJalrXUtnFEMI".to_string()),
			session_token: SecretString::new("FwoGZXIvYXdzEBc".to_string()),
			expiry: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
		}
	}

	#[test]
	fn request_uses_pascal_case_field_names() {
		let json = r#"{
			"Repo": "acme/svc",
			"RunId": "42",
			"JobName": "build",
			"StepName": "deploy",
			"RoleARN": "arn:aws:iam::123456789012:role/ci"
		}"#;

		let request: CredentialRequest = serde_json::from_str(json).unwrap();
		assert_eq!(request.repo, "acme/svc");
		assert_eq!(request.run_id, "42");
		assert_eq!(request.role_arn, "arn:aws:iam::123456789012:role/ci");

		let back = serde_json::to_value(&request).unwrap();
		assert_eq!(back["RoleARN"], "arn:aws:iam::123456789012:role/ci");
	}

	#[test]
	fn account_is_first_path_segment() {
		let mut request = CredentialRequest {
			repo: "acme/svc".to_string(),
			run_id: "1".to_string(),
			job_name: "build".to_string(),
			step_name: "deploy".to_string(),
			role_arn: "arn".to_string(),
		};
		assert_eq!(request.account(), "acme");

		request.repo = "acme/svc/extra".to_string();
		assert_eq!(request.account(), "acme");

		request.repo = "no-slash".to_string();
		assert_eq!(request.account(), "no-slash");
	}

	#[test]
	fn repo_must_be_owner_slash_name() {
		for repo in ["acme/svc", "acme-corp/svc.rs", "a/b_c-d.e", "ACME/Svc"] {
			assert_eq!(validate_repo(repo), Ok(()), "{repo}");
		}
		for repo in [
			"acme/../evil/svc",
			"acme/svc/extra",
			"acme/..",
			"acme/.",
			"../evil",
			"acme/svc%2F..",
			"acme/svc?x=1",
			"acme/svc#frag",
			"acme",
			"/svc",
			"acme/",
			"-acme/svc",
			"acme/svc\n",
			"acme/ svc",
		] {
			assert!(
				matches!(validate_repo(repo), Err(RequestError::InvalidRepo(_))),
				"{repo}"
			);
		}
	}

	#[test]
	fn run_id_must_be_digits() {
		assert_eq!(validate_run_id("42"), Ok(()));
		for run_id in ["", "-1", "42a", "../../../../evil/svc/actions/runs/1", "4 2", "1e3"] {
			assert!(
				matches!(validate_run_id(run_id), Err(RequestError::InvalidRunId(_))),
				"{run_id}"
			);
		}
	}

	#[test]
	fn validate_checks_repo_and_run_id() {
		let mut request = CredentialRequest {
			repo: "acme/svc".to_string(),
			run_id: "42".to_string(),
			job_name: "build".to_string(),
			step_name: "deploy".to_string(),
			role_arn: "arn".to_string(),
		};
		assert_eq!(request.validate(), Ok(()));

		request.run_id = "../../../../evil/svc/actions/runs/1".to_string();
		assert!(matches!(request.validate(), Err(RequestError::InvalidRunId(_))));

		request.run_id = "42".to_string();
		request.repo = "acme/../evil/svc".to_string();
		assert!(matches!(request.validate(), Err(RequestError::InvalidRepo(_))));
	}

	#[test]
	fn credentials_serialize_in_clear_for_the_envelope() {
		let json = serde_json::to_value(sample_credentials()).unwrap();
		assert_eq!(json["AccessKeyId"], "ASIAEXAMPLE");
		assert_eq!(json["SecretAccessKey"], "wJalrXUtnFEMI");
		assert_eq!(json["SessionToken"], "FwoGZXIvYXdzEBc");
		assert_eq!(json["Expiry"], "2025-06-01T12:00:00Z");

		let parsed: IssuedCredentials = serde_json::from_value(json).unwrap();
		assert_eq!(parsed, sample_credentials());
	}

	#[test]
	fn credentials_debug_hides_secret_halves() {
		let debug = format!("{:?}", sample_credentials());
		assert!(debug.contains("ASIAEXAMPLE"));
		assert!(!debug.contains("wJalrXUtnFEMI"));
		assert!(!debug.contains("FwoGZXIvYXdzEBc"));
	}

	#[test]
	fn error_response_shape() {
		let body = ErrorResponse::new(ErrorKind::LookupFailure, "job not found");
		let json = serde_json::to_value(&body).unwrap();
		assert_eq!(json["error"], "lookup_failure");
		assert_eq!(json["message"], "job not found");
	}
}
