// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::sections::{BrokerConfigLayer, GitHubConfigLayer, HttpConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration; every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	pub http: Option<HttpConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
	pub github: Option<GitHubConfigLayer>,
	pub broker: Option<BrokerConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *base = Some(incoming),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	/// Fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_section(&mut self.github, other.github, GitHubConfigLayer::merge);
		merge_section(&mut self.broker, other.broker, BrokerConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_fills_missing_sections_and_overlays_present_ones() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("127.0.0.1".to_string()),
				port: Some(8080),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(9090),
			}),
			broker: Some(BrokerConfigLayer {
				permitted_org: Some("acme".to_string()),
				..Default::default()
			}),
			..Default::default()
		});

		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("127.0.0.1"));
		assert_eq!(http.port, Some(9090));
		assert_eq!(
			base.broker.unwrap().permitted_org.as_deref(),
			Some("acme")
		);
		assert!(base.logging.is_none());
	}
}
