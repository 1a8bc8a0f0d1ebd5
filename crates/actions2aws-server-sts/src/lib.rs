// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential minting through AWS STS `AssumeRole`.
//!
//! The repository name is passed as the external ID, so a role's trust
//! policy can pin which repository may assume it even when several
//! organisations share one broker deployment. Every call mints a fresh
//! credential set; nothing is cached or refreshed.

use std::collections::BTreeMap;

use actions2aws_common_core::IssuedCredentials;
use actions2aws_common_secret::SecretString;
use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::primitives::DateTime as AwsDateTime;
use aws_sdk_sts::types::Tag;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum MintError {
	#[error("STS AssumeRole failed: {0}")]
	Provider(String),

	#[error("STS response carried no credentials")]
	MissingCredentials,

	#[error("invalid session tag '{key}': {message}")]
	InvalidTag { key: String, message: String },

	#[error("credential expiry {0} is out of range")]
	InvalidExpiry(String),
}

/// Everything STS needs to mint one credential set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest<'a> {
	/// `owner/name`, also used as the external ID.
	pub repo: &'a str,
	pub role_arn: &'a str,
	pub session_name: String,
	pub tags: &'a BTreeMap<String, String>,
}

/// `owner/name` + run 7 becomes `owner_name_7`.
pub fn session_name(repo: &str, run_number: u64) -> String {
	format!("{}_{run_number}", repo.replace('/', "_"))
}

#[async_trait]
pub trait CredentialMinter: Send + Sync {
	async fn mint(&self, request: &MintRequest<'_>) -> Result<IssuedCredentials, MintError>;
}

#[derive(Debug, Clone)]
pub struct StsMinter {
	client: aws_sdk_sts::Client,
}

impl StsMinter {
	pub fn new(client: aws_sdk_sts::Client) -> Self {
		Self { client }
	}

	/// Uses the default AWS credential chain and region resolution.
	pub async fn from_env() -> Self {
		let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
		Self::new(aws_sdk_sts::Client::new(&config))
	}
}

fn session_tags(tags: &BTreeMap<String, String>) -> Result<Vec<Tag>, MintError> {
	tags.iter()
		.map(|(key, value)| {
			Tag::builder()
				.key(key)
				.value(value)
				.build()
				.map_err(|e| MintError::InvalidTag {
					key: key.clone(),
					message: e.to_string(),
				})
		})
		.collect()
}

fn expiry_to_chrono(expiry: &AwsDateTime) -> Result<DateTime<Utc>, MintError> {
	DateTime::from_timestamp(expiry.secs(), expiry.subsec_nanos())
		.ok_or_else(|| MintError::InvalidExpiry(format!("{expiry:?}")))
}

#[async_trait]
impl CredentialMinter for StsMinter {
	#[instrument(skip(self, request), fields(repo = request.repo, role_arn = request.role_arn, session = %request.session_name))]
	async fn mint(&self, request: &MintRequest<'_>) -> Result<IssuedCredentials, MintError> {
		let output = self
			.client
			.assume_role()
			.role_arn(request.role_arn)
			.role_session_name(&request.session_name)
			.external_id(request.repo)
			.set_tags(Some(session_tags(request.tags)?))
			.send()
			.await
			.map_err(|e| MintError::Provider(DisplayErrorContext(&e).to_string()))?;

		let credentials = output.credentials().ok_or(MintError::MissingCredentials)?;
		debug!("assumed role");

		Ok(IssuedCredentials {
			access_key_id: credentials.access_key_id().to_string(),
			secret_access_key: SecretString::new(credentials.secret_access_key().to_string()),
			session_token: SecretString::new(credentials.session_token().to_string()),
			expiry: expiry_to_chrono(credentials.expiration())?,
		})
	}
}
