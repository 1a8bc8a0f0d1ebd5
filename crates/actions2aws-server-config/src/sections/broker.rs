// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use actions2aws_common_http::LinearBackoff;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_KEY_MAX_ATTEMPTS: u32 = 6;
const DEFAULT_KEY_BACKOFF_STEP_MS: u64 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BrokerConfigLayer {
	pub permitted_org: Option<String>,
	pub tags_expression: Option<String>,
	pub key_max_attempts: Option<u32>,
	pub key_backoff_step_ms: Option<u64>,
}

impl BrokerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.permitted_org.is_some() {
			self.permitted_org = other.permitted_org;
		}
		if other.tags_expression.is_some() {
			self.tags_expression = other.tags_expression;
		}
		if other.key_max_attempts.is_some() {
			self.key_max_attempts = other.key_max_attempts;
		}
		if other.key_backoff_step_ms.is_some() {
			self.key_backoff_step_ms = other.key_backoff_step_ms;
		}
	}

	pub fn finalize(self) -> Result<BrokerConfig, ConfigError> {
		let permitted_org = self
			.permitted_org
			.map(|org| org.trim().to_string())
			.filter(|org| !org.is_empty())
			.ok_or(ConfigError::Missing("ACTIONS2AWS_SERVER_PERMITTED_ORG"))?;

		if permitted_org.contains('/') {
			return Err(ConfigError::InvalidValue {
				key: "permitted_org".to_string(),
				message: format!("'{permitted_org}' must be an account name, not owner/repo"),
			});
		}

		let key_max_attempts = self.key_max_attempts.unwrap_or(DEFAULT_KEY_MAX_ATTEMPTS);
		if key_max_attempts == 0 {
			return Err(ConfigError::InvalidValue {
				key: "key_max_attempts".to_string(),
				message: "must be at least 1".to_string(),
			});
		}

		Ok(BrokerConfig {
			permitted_org,
			tags_expression: self.tags_expression.filter(|e| !e.trim().is_empty()),
			key_max_attempts,
			key_backoff_step_ms: self
				.key_backoff_step_ms
				.unwrap_or(DEFAULT_KEY_BACKOFF_STEP_MS),
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerConfig {
	/// The only GitHub account whose repositories may receive credentials.
	pub permitted_org: String,
	/// Overrides the default tag expression when set.
	pub tags_expression: Option<String>,
	pub key_max_attempts: u32,
	pub key_backoff_step_ms: u64,
}

impl BrokerConfig {
	/// Polling policy for the job log that carries the public key.
	pub fn key_backoff(&self) -> LinearBackoff {
		LinearBackoff::new(
			self.key_max_attempts,
			Duration::from_millis(self.key_backoff_step_ms),
		)
	}
}
