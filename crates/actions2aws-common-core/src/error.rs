// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed credential request.
///
/// Every broker error maps onto exactly one kind; the kind is what callers
/// see in the `error` field of a structured error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// The request body could not be parsed.
	InvalidRequest,
	/// Forked run, or repository outside the permitted account.
	AuthenticationFailure,
	/// Named job or step does not exist in the run.
	LookupFailure,
	/// Job log never became available, or carried no public key.
	KeyExchangeFailure,
	/// Attribution tags could not be computed.
	TagFailure,
	/// The cloud provider refused to issue credentials.
	MintingFailure,
	/// Bad published key, or encryption/decryption failed.
	CryptoFailure,
	/// Network or upstream API error.
	TransportFailure,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::InvalidRequest => "invalid_request",
			ErrorKind::AuthenticationFailure => "authentication_failure",
			ErrorKind::LookupFailure => "lookup_failure",
			ErrorKind::KeyExchangeFailure => "key_exchange_failure",
			ErrorKind::TagFailure => "tag_failure",
			ErrorKind::MintingFailure => "minting_failure",
			ErrorKind::CryptoFailure => "crypto_failure",
			ErrorKind::TransportFailure => "transport_failure",
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
