// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the actions2aws broker.
//!
//! Layered from built-in defaults, an optional TOML file
//! (`/etc/actions2aws/server.toml` unless overridden) and
//! `ACTIONS2AWS_SERVER_*` environment variables, in increasing precedence.
//! Older deployments' unprefixed names (`PERMITTED_GITHUB_ORG`,
//! `TAGS_JMESPATH`, `GITHUB_API_TOKEN`, `GITHUB_USER_SESSION`) are honoured
//! when the prefixed name is unset.
//! The resolved [`ServerConfig`] is built once at startup and shared
//! read-only by every request.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::path::PathBuf;

use actions2aws_common_secret::{load_secret_env, SecretEnvError, SecretString};
use tracing::{debug, info, warn};

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	legacy_alias, ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, LEGACY_ENV_ALIASES,
};

pub const GITHUB_API_TOKEN_VAR: &str = "ACTIONS2AWS_SERVER_GITHUB_API_TOKEN";
pub const GITHUB_USER_SESSION_VAR: &str = "ACTIONS2AWS_SERVER_GITHUB_USER_SESSION";

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub logging: LoggingConfig,
	pub github: GitHubSettings,
	pub broker: BrokerConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// The two GitHub secrets, read from the environment or `*_FILE`.
pub struct GitHubSecrets {
	pub api_token: SecretString,
	pub user_session: SecretString,
}

pub fn load_github_secrets() -> Result<GitHubSecrets, ConfigError> {
	Ok(GitHubSecrets {
		api_token: resolve_secret(GITHUB_API_TOKEN_VAR, load_secret_env)?,
		user_session: resolve_secret(GITHUB_USER_SESSION_VAR, load_secret_env)?,
	})
}

/// Loads `var` (or `var_FILE`), falling back to its legacy name.
fn resolve_secret(
	var: &str,
	load: impl Fn(&str) -> Result<Option<SecretString>, SecretEnvError>,
) -> Result<SecretString, ConfigError> {
	let secret_err = |e: SecretEnvError| ConfigError::Secret(e.to_string());

	if let Some(secret) = load(var).map_err(secret_err)? {
		return Ok(secret);
	}
	if let Some(legacy) = legacy_alias(var) {
		if let Some(secret) = load(legacy).map_err(secret_err)? {
			warn!(variable = legacy, replacement = var, "using legacy environment variable");
			return Ok(secret);
		}
	}
	Err(ConfigError::Secret(format!(
		"required secret not found: set either {var} or {var}_FILE"
	)))
}

/// Loads from all sources with the system config file.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_config_with_file(sources::SYSTEM_CONFIG_PATH)
}

/// Loads from all sources with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<ServerConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(EnvSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(DefaultsSource),
	];

	let merged = merge_sources(&mut sources)?;
	finalize(merged, load_github_secrets()?)
}

fn merge_sources(sources: &mut [Box<dyn ConfigSource>]) -> Result<ServerConfigLayer, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources.iter() {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}
	Ok(merged)
}

/// Resolves a merged layer into the final configuration.
pub fn finalize(layer: ServerConfigLayer, secrets: GitHubSecrets) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let github = layer
		.github
		.unwrap_or_default()
		.finalize(secrets.api_token, secrets.user_session);
	let broker = layer.broker.unwrap_or_default().finalize()?;

	info!(
		host = %http.host,
		port = http.port,
		permitted_org = %broker.permitted_org,
		github_api = %github.api_url,
		custom_tags = broker.tags_expression.is_some(),
		key_max_attempts = broker.key_max_attempts,
		"server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		logging,
		github,
		broker,
	})
}
