// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates a client builder with the actions2aws User-Agent and a 30 second
/// request timeout.
///
/// GitHub rejects API requests that carry no User-Agent, so every outbound
/// client in the workspace starts here.
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.timeout(DEFAULT_TIMEOUT)
}

/// Builds a client from [`builder`].
pub fn new_client() -> reqwest::Result<Client> {
	builder().build()
}

/// Format: `actions2aws/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"actions2aws/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
