// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The log line that carries a job's public key to the broker.
//!
//! The client prints `ACTIONS2AWS PUBKEY: <key>` to stdout, GitHub captures it
//! in the job log, and the broker reads the log back and extracts the key.
//! The key encoding never contains whitespace, so the first non-whitespace
//! run after the prefix is the whole key.

use std::sync::LazyLock;

use regex::Regex;

pub const MARKER_PREFIX: &str = "ACTIONS2AWS PUBKEY: ";

static MARKER_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"ACTIONS2AWS PUBKEY: (\S+)").expect("marker regex is valid"));

pub fn format_marker(public_key: &str) -> String {
	format!("{MARKER_PREFIX}{public_key}")
}

/// Returns the key from the first marker line in `log`.
///
/// Anything the step prints after keygen may echo untrusted text, so later
/// markers never replace the first one.
pub fn extract_public_key(log: &str) -> Option<&str> {
	MARKER_RE
		.captures(log)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str())
}
