// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connection settings for [`GitHubClient`](crate::GitHubClient).

use actions2aws_common_secret::SecretString;
use reqwest::Url;

use crate::error::GitHubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Two credentials with different reach: the API token reads run and job
/// metadata, the user session cookie reads job logs through the web UI.
#[derive(Clone)]
pub struct GitHubConfig {
	api_url: Url,
	web_url: Url,
	api_token: SecretString,
	user_session: SecretString,
}

impl std::fmt::Debug for GitHubConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GitHubConfig")
			.field("api_url", &self.api_url.as_str())
			.field("web_url", &self.web_url.as_str())
			.field("api_token", &self.api_token)
			.field("user_session", &self.user_session)
			.finish()
	}
}

/// Parses `raw` and guarantees a trailing slash so `Url::join` appends.
fn normalize_base_url(raw: &str) -> Result<Url, GitHubError> {
	let trimmed = raw.trim().trim_end_matches('/');
	let url = Url::parse(&format!("{trimmed}/"))
		.map_err(|e| GitHubError::Config(format!("invalid base URL '{raw}': {e}")))?;

	if url.host_str().is_none() {
		return Err(GitHubError::Config(format!(
			"base URL '{raw}' must include a host"
		)));
	}
	if url.scheme() != "https" && url.scheme() != "http" {
		return Err(GitHubError::Config(format!(
			"base URL '{raw}' must use http or https"
		)));
	}

	Ok(url)
}

impl GitHubConfig {
	pub fn new(
		api_url: &str,
		web_url: &str,
		api_token: SecretString,
		user_session: SecretString,
	) -> Result<Self, GitHubError> {
		Ok(Self {
			api_url: normalize_base_url(api_url)?,
			web_url: normalize_base_url(web_url)?,
			api_token,
			user_session,
		})
	}

	/// github.com endpoints.
	pub fn public(api_token: SecretString, user_session: SecretString) -> Result<Self, GitHubError> {
		Self::new(DEFAULT_API_URL, DEFAULT_WEB_URL, api_token, user_session)
	}

	pub fn api_url(&self) -> &Url {
		&self.api_url
	}

	pub fn web_url(&self) -> &Url {
		&self.web_url
	}

	pub fn api_token(&self) -> &SecretString {
		&self.api_token
	}

	pub fn user_session(&self) -> &SecretString {
		&self.user_session
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn secret(s: &str) -> SecretString {
		SecretString::new(s.to_string())
	}

	#[test]
	fn public_endpoints() {
		let config = GitHubConfig::public(secret("t"), secret("s")).unwrap();
		assert_eq!(config.api_url().as_str(), "https://api.github.com/");
		assert_eq!(config.web_url().as_str(), "https://github.com/");
	}

	#[test]
	fn base_urls_keep_path_prefix() {
		let config = GitHubConfig::new(
			"https://ghe.example.com/api/v3/",
			"https://ghe.example.com",
			secret("t"),
			secret("s"),
		)
		.unwrap();
		assert_eq!(
			config
				.api_url()
				.join("repos/acme/svc/actions/runs/1")
				.unwrap()
				.as_str(),
			"https://ghe.example.com/api/v3/repos/acme/svc/actions/runs/1"
		);
	}

	#[test]
	fn rejects_invalid_urls() {
		assert!(GitHubConfig::new("not a url", DEFAULT_WEB_URL, secret("t"), secret("s")).is_err());
		assert!(GitHubConfig::new(DEFAULT_API_URL, "ftp://github.com", secret("t"), secret("s")).is_err());
	}

	#[test]
	fn debug_redacts_credentials() {
		let config = GitHubConfig::public(secret("ghp_token"), secret("session-cookie")).unwrap();
		let debug = format!("{config:?}");
		assert!(!debug.contains("ghp_token"));
		assert!(!debug.contains("session-cookie"));
		assert!(debug.contains("[REDACTED]"));
	}
}
