// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `actions2aws request`: ask the broker for credentials for this job.
//!
//! The request is built from the runner's own environment. The response is
//! ciphertext for the identity `keygen` left on disk; it is opened locally
//! and handed on through [`crate::export`].

use std::io::Write;
use std::path::PathBuf;

use actions2aws_common_core::{open, CredentialRequest, ErrorResponse, IssuedCredentials};
use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::{export, key_file};

#[derive(Debug, Clone, clap::Args)]
pub struct RequestArgs {
	/// Broker URL
	#[arg(long, env = "ACTIONS2AWS_URL")]
	pub url: String,

	/// Role to assume
	#[arg(long, env = "ACTIONS2AWS_ROLE")]
	pub role: String,

	/// Step whose log carries the public key
	#[arg(long, env = "ACTIONS2AWS_STEP_NAME")]
	pub step_name: String,

	#[arg(long, env = "GITHUB_REPOSITORY")]
	pub repo: String,

	#[arg(long, env = "GITHUB_RUN_ID")]
	pub run_id: String,

	#[arg(long, env = "GITHUB_JOB")]
	pub job: String,

	/// File the runner loads into later steps' environment
	#[arg(long, env = "GITHUB_ENV")]
	pub github_env: PathBuf,

	/// Private key written by keygen [default: $HOME/.actions2aws/key]
	#[arg(long, env = "ACTIONS2AWS_KEY_FILE")]
	pub key_file: Option<PathBuf>,
}

impl RequestArgs {
	fn credential_request(&self) -> CredentialRequest {
		CredentialRequest {
			repo: self.repo.clone(),
			run_id: self.run_id.clone(),
			job_name: self.job.clone(),
			step_name: self.step_name.clone(),
			role_arn: self.role.clone(),
		}
	}
}

pub async fn run(args: RequestArgs) -> Result<()> {
	let client = actions2aws_common_http::new_client()?;
	let mut stdout = std::io::stdout().lock();
	execute(&args, &client, &mut stdout).await
}

/// Requests, decrypts and exports. Masks go to `out` before anything touches
/// the environment file.
#[instrument(skip_all, fields(repo = %args.repo, run_id = %args.run_id, job = %args.job))]
pub async fn execute(args: &RequestArgs, client: &reqwest::Client, out: &mut impl Write) -> Result<()> {
	let key_path = match &args.key_file {
		Some(path) => path.clone(),
		None => key_file::default_key_path()?,
	};
	let identity = key_file::load_identity(&key_path)
		.await
		.context("failed to load private key; run `actions2aws keygen` first")?;

	let ciphertext = send_request(client, &args.url, &args.credential_request()).await?;

	let plaintext = open(&ciphertext, &identity).context("failed to decrypt broker response")?;
	let credentials: IssuedCredentials =
		serde_json::from_slice(&plaintext).context("broker response is not a credential record")?;

	export::write_masks(out, &credentials)?;
	export::append_to_env_file(&args.github_env, &credentials)
		.await
		.with_context(|| format!("failed to write {}", args.github_env.display()))?;

	info!(
		access_key_id = %credentials.access_key_id,
		expiry = %credentials.expiry,
		"exported aws credentials"
	);
	Ok(())
}

/// POSTs the request and returns the ciphertext body.
///
/// A non-success status is an error carrying the broker's structured body
/// when it sent one.
pub async fn send_request(
	client: &reqwest::Client,
	url: &str,
	request: &CredentialRequest,
) -> Result<Vec<u8>> {
	debug!(url, "requesting credentials");
	let resp = client
		.post(url)
		.json(request)
		.send()
		.await
		.with_context(|| format!("failed to reach broker at {url}"))?;

	let status = resp.status();
	if !status.is_success() {
		let body = resp.text().await.unwrap_or_default();
		warn!(status = %status, "broker refused request");
		return Err(match serde_json::from_str::<ErrorResponse>(&body) {
			Ok(refusal) => anyhow!("broker refused request: {status} {}: {}", refusal.error, refusal.message),
			Err(_) => anyhow!("broker refused request: {status} - {body}"),
		});
	}

	Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
	use super::*;
	use actions2aws_common_core::{seal, ErrorKind, Identity};
	use actions2aws_common_secret::SecretString;
	use chrono::{TimeZone, Utc};
	use tempfile::TempDir;
	use wiremock::matchers::{body_json, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn credentials() -> IssuedCredentials {
		IssuedCredentials {
			access_key_id: "ASIAEXAMPLE".to_string(),
			secret_access_key: SecretString::new("wJalrXUtnFEMI".to_string()),
			session_token: SecretString::new("FwoGZXIvYXdzEBc".to_string()),
			expiry: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
		}
	}

	fn args(server: &MockServer, dir: &TempDir) -> RequestArgs {
		RequestArgs {
			url: format!("{}/", server.uri()),
			role: "arn:aws:iam::123456789012:role/ci".to_string(),
			step_name: "deploy".to_string(),
			repo: "acme/svc".to_string(),
			run_id: "42".to_string(),
			job: "build".to_string(),
			github_env: dir.path().join("github_env"),
			key_file: Some(dir.path().join(".actions2aws").join("key")),
		}
	}

	async fn identity_on_disk(args: &RequestArgs) -> Identity {
		let identity = Identity::generate();
		key_file::save_identity(&identity, args.key_file.as_ref().unwrap())
			.await
			.unwrap();
		identity
	}

	#[tokio::test]
	async fn decrypts_masks_and_exports() {
		let server = MockServer::start().await;
		let dir = TempDir::new().unwrap();
		let args = args(&server, &dir);
		let identity = identity_on_disk(&args).await;

		let plaintext = serde_json::to_vec(&credentials()).unwrap();
		let ciphertext = seal(&plaintext, &identity.recipient()).unwrap();

		Mock::given(method("POST"))
			.and(path("/"))
			.and(header("content-type", "application/json"))
			.and(body_json(serde_json::json!({
				"Repo": "acme/svc",
				"RunId": "42",
				"JobName": "build",
				"StepName": "deploy",
				"RoleARN": "arn:aws:iam::123456789012:role/ci"
			})))
			.respond_with(ResponseTemplate::new(200).set_body_bytes(ciphertext))
			.expect(1)
			.mount(&server)
			.await;

		let mut out = Vec::new();
		execute(&args, &reqwest::Client::new(), &mut out).await.unwrap();

		let printed = String::from_utf8(out).unwrap();
		assert!(printed.contains("::add-mask::wJalrXUtnFEMI\n"));
		assert!(printed.contains("::add-mask::FwoGZXIvYXdzEBc\n"));

		let env = std::fs::read_to_string(&args.github_env).unwrap();
		assert!(env.contains("AWS_ACCESS_KEY_ID=ASIAEXAMPLE\n"));
		assert!(env.contains("AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI\n"));
		assert!(env.contains("AWS_SESSION_TOKEN=FwoGZXIvYXdzEBc\n"));
	}

	#[tokio::test]
	async fn refusal_surfaces_structured_error_and_exports_nothing() {
		let server = MockServer::start().await;
		let dir = TempDir::new().unwrap();
		let args = args(&server, &dir);
		identity_on_disk(&args).await;

		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(403).set_body_json(ErrorResponse::new(
				ErrorKind::AuthenticationFailure,
				"account 'evil' is not permitted",
			)))
			.mount(&server)
			.await;

		let mut out = Vec::new();
		let err = execute(&args, &reqwest::Client::new(), &mut out)
			.await
			.unwrap_err()
			.to_string();

		assert!(err.contains("403"), "{err}");
		assert!(err.contains("authentication_failure"), "{err}");
		assert!(err.contains("not permitted"), "{err}");
		assert!(out.is_empty());
		assert!(!args.github_env.exists());
	}

	#[tokio::test]
	async fn response_for_another_key_fails_to_decrypt() {
		let server = MockServer::start().await;
		let dir = TempDir::new().unwrap();
		let args = args(&server, &dir);
		identity_on_disk(&args).await;

		let plaintext = serde_json::to_vec(&credentials()).unwrap();
		let ciphertext = seal(&plaintext, &Identity::generate().recipient()).unwrap();
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_bytes(ciphertext))
			.mount(&server)
			.await;

		let mut out = Vec::new();
		let err = execute(&args, &reqwest::Client::new(), &mut out)
			.await
			.unwrap_err();

		assert!(err.to_string().contains("decrypt"), "{err}");
		assert!(!args.github_env.exists());
	}

	#[tokio::test]
	async fn missing_key_file_fails_before_contacting_broker() {
		let server = MockServer::start().await;
		let dir = TempDir::new().unwrap();
		let args = args(&server, &dir);

		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&server)
			.await;

		let mut out = Vec::new();
		let err = execute(&args, &reqwest::Client::new(), &mut out)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("keygen"), "{err}");
	}
}
