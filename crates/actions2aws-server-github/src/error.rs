// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use actions2aws_common_core::RequestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	/// The API answered 404 for a run or job listing.
	#[error("{0} not found")]
	NotFound(String),

	#[error("GitHub API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	#[error("invalid response from GitHub: {0}")]
	InvalidResponse(String),

	#[error("configuration error: {0}")]
	Config(String),

	/// A lookup key that would not address exactly one repository or run.
	#[error(transparent)]
	InvalidRequest(#[from] RequestError),
}

impl GitHubError {
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}
}
