// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, a TOML file and environment variables.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{BrokerConfigLayer, GitHubConfigLayer, HttpConfigLayer, LoggingConfigLayer};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/actions2aws/server.toml";

/// `(current, legacy)` variable names for settings deployments already export.
pub const LEGACY_ENV_ALIASES: &[(&str, &str)] = &[
	("ACTIONS2AWS_SERVER_PERMITTED_ORG", "PERMITTED_GITHUB_ORG"),
	("ACTIONS2AWS_SERVER_TAGS_EXPRESSION", "TAGS_JMESPATH"),
	("ACTIONS2AWS_SERVER_GITHUB_API_TOKEN", "GITHUB_API_TOKEN"),
	("ACTIONS2AWS_SERVER_GITHUB_USER_SESSION", "GITHUB_USER_SESSION"),
];

/// The legacy name for `current`, if it has one.
pub fn legacy_alias(current: &str) -> Option<&'static str> {
	LEGACY_ENV_ALIASES
		.iter()
		.find(|(name, _)| *name == current)
		.map(|(_, legacy)| *legacy)
}

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		Ok(ServerConfigLayer::default())
	}
}

/// A TOML file. A missing file is an empty layer, not an error.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variables, named `ACTIONS2AWS_SERVER_<FIELD>`.
///
/// The pre-rename names in [`LEGACY_ENV_ALIASES`] are still read when the
/// current name is unset. Secrets are not part of the layer; see
/// [`crate::load_github_secrets`].
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		load_from(|name| std::env::var(name).ok())
	}
}

/// Builds a layer from any variable lookup; blank values count as unset.
pub(crate) fn load_from(
	lookup: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfigLayer, ConfigError> {
	let set = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
	let var = |name: &str| {
		set(name).or_else(|| {
			let legacy = legacy_alias(name)?;
			let value = set(legacy)?;
			warn!(variable = legacy, replacement = name, "using legacy environment variable");
			Some(value)
		})
	};

	let bool_var = |name: &str| -> Result<Option<bool>, ConfigError> {
		match var(name) {
			Some(v) => match v.trim().to_ascii_lowercase().as_str() {
				"1" | "true" | "yes" => Ok(Some(true)),
				"0" | "false" | "no" => Ok(Some(false)),
				_ => Err(ConfigError::InvalidValue {
					key: name.to_string(),
					message: format!("invalid boolean value '{v}'"),
				}),
			},
			None => Ok(None),
		}
	};

	fn parsed<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
		match value {
			Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {} value '{v}'", std::any::type_name::<T>()),
			}),
			None => Ok(None),
		}
	}

	Ok(ServerConfigLayer {
		http: Some(HttpConfigLayer {
			host: var("ACTIONS2AWS_SERVER_HOST"),
			port: parsed("ACTIONS2AWS_SERVER_PORT", var("ACTIONS2AWS_SERVER_PORT"))?,
		}),
		logging: Some(LoggingConfigLayer {
			level: var("ACTIONS2AWS_SERVER_LOG_LEVEL"),
			json: bool_var("ACTIONS2AWS_SERVER_LOG_JSON")?,
		}),
		github: Some(GitHubConfigLayer {
			api_url: var("ACTIONS2AWS_SERVER_GITHUB_API_URL"),
			web_url: var("ACTIONS2AWS_SERVER_GITHUB_WEB_URL"),
		}),
		broker: Some(BrokerConfigLayer {
			permitted_org: var("ACTIONS2AWS_SERVER_PERMITTED_ORG"),
			tags_expression: var("ACTIONS2AWS_SERVER_TAGS_EXPRESSION"),
			key_max_attempts: parsed(
				"ACTIONS2AWS_SERVER_KEY_MAX_ATTEMPTS",
				var("ACTIONS2AWS_SERVER_KEY_MAX_ATTEMPTS"),
			)?,
			key_backoff_step_ms: parsed(
				"ACTIONS2AWS_SERVER_KEY_BACKOFF_STEP_MS",
				var("ACTIONS2AWS_SERVER_KEY_BACKOFF_STEP_MS"),
			)?,
		}),
	})
}
