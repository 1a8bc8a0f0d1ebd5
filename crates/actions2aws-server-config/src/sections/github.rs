// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub endpoints and credentials.
//!
//! The base URLs may come from any source. The API token and the user
//! session cookie are secrets and only ever come from the environment (or a
//! `_FILE` it points at), so the layer has no fields for them and rejects
//! unknown keys to catch a token pasted into the TOML file.

use actions2aws_common_secret::SecretString;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_URL: &str = "https://github.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GitHubConfigLayer {
	pub api_url: Option<String>,
	pub web_url: Option<String>,
}

impl GitHubConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.web_url.is_some() {
			self.web_url = other.web_url;
		}
	}

	pub fn finalize(self, api_token: SecretString, user_session: SecretString) -> GitHubSettings {
		GitHubSettings {
			api_url: self.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
			web_url: self.web_url.unwrap_or_else(|| DEFAULT_WEB_URL.to_string()),
			api_token,
			user_session,
		}
	}
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
	pub api_url: String,
	pub web_url: String,
	/// Bearer token for run and job metadata.
	pub api_token: SecretString,
	/// `user_session` cookie for job logs.
	pub user_session: SecretString,
}
