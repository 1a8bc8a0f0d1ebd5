// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The credential issuing pipeline.
//!
//! verify → fetch key from log → compute tags → mint → encrypt. Each stage
//! either hands its result to the next or aborts the request; a response is
//! only ever the ciphertext of a complete credential set.

use std::sync::Arc;

use actions2aws_common_core::{seal, CredentialRequest, Recipient};
use actions2aws_common_http::LinearBackoff;
use actions2aws_server_config::ServerConfig;
use actions2aws_server_github::{CiPlatform, GitHubClient, GitHubConfig, GitHubError, LogLocation, LogSource};
use actions2aws_server_sts::{session_name, CredentialMinter, MintRequest, StsMinter};
use actions2aws_server_tags::{compute_tags, TagError, TagEvaluator, TagExpression};
use thiserror::Error;
use tracing::{info, instrument};

use crate::error::BrokerError;
use crate::key_channel::retrieve_key;
use crate::verify::verify;

/// Immutable per-process state shared by every request.
pub struct Broker {
	platform: Arc<dyn CiPlatform>,
	logs: Arc<dyn LogSource>,
	minter: Arc<dyn CredentialMinter>,
	tags: Arc<dyn TagEvaluator>,
	permitted_org: String,
	key_backoff: LinearBackoff,
}

#[derive(Debug, Error)]
pub enum StartupError {
	#[error("GitHub client: {0}")]
	GitHub(#[from] GitHubError),

	#[error("tag expression: {0}")]
	Tags(#[from] TagError),
}

impl Broker {
	pub fn new(
		platform: Arc<dyn CiPlatform>,
		logs: Arc<dyn LogSource>,
		minter: Arc<dyn CredentialMinter>,
		tags: Arc<dyn TagEvaluator>,
		permitted_org: impl Into<String>,
		key_backoff: LinearBackoff,
	) -> Self {
		Self {
			platform,
			logs,
			minter,
			tags,
			permitted_org: permitted_org.into(),
			key_backoff,
		}
	}

	/// Wires up GitHub and STS from the resolved configuration.
	pub async fn from_config(config: &ServerConfig) -> Result<Self, StartupError> {
		let github = Arc::new(GitHubClient::new(GitHubConfig::new(
			&config.github.api_url,
			&config.github.web_url,
			config.github.api_token.clone(),
			config.github.user_session.clone(),
		)?)?);

		let tags = match &config.broker.tags_expression {
			Some(source) => TagExpression::parse(source)?,
			None => TagExpression::default(),
		};

		let minter = StsMinter::from_env().await;

		Ok(Self::new(
			github.clone(),
			github,
			Arc::new(minter),
			Arc::new(tags),
			config.broker.permitted_org.clone(),
			config.broker.key_backoff(),
		))
	}

	pub fn permitted_org(&self) -> &str {
		&self.permitted_org
	}

	/// Runs the full pipeline and returns the encrypted credential record.
	#[instrument(skip(self), fields(repo = %request.repo, run_id = %request.run_id))]
	pub async fn issue(&self, request: &CredentialRequest) -> Result<Vec<u8>, BrokerError> {
		let verified = verify(self.platform.as_ref(), &self.permitted_org, request).await?;

		let location = LogLocation {
			repo: request.repo.clone(),
			commit_sha: verified.job.head_sha.clone(),
			job_id: verified.job.id,
			step_number: verified.step.number,
		};
		let public_key = retrieve_key(self.logs.as_ref(), &self.key_backoff, &location).await?;
		// Parsed before minting so an unusable key never costs a credential set.
		let recipient = Recipient::parse(&public_key)?;

		let tags = compute_tags(
			self.tags.as_ref(),
			&verified.jobs_raw,
			&verified.run_raw,
			verified.job_index,
		)?;

		let mint_request = MintRequest {
			repo: &request.repo,
			role_arn: &request.role_arn,
			session_name: session_name(&request.repo, verified.run.run_number),
			tags: &tags,
		};
		let credentials = self.minter.mint(&mint_request).await?;

		info!(
			target: "actions2aws::audit",
			request = ?request,
			access_key_id = %credentials.access_key_id,
			expiry = %credentials.expiry,
			tags = ?tags,
			"issued aws credentials"
		);

		let plaintext = zeroize::Zeroizing::new(serde_json::to_vec(&credentials)?);
		Ok(seal(&plaintext, &recipient)?)
	}
}
