// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-job age X25519 keys.
//!
//! An [`Identity`] is generated once per job by `actions2aws keygen`; its
//! [`Recipient`] is printed into the job log. Both use age's bech32 text
//! forms (`age1...` and `AGE-SECRET-KEY-1...`), which contain no whitespace
//! and survive a trip through a log line and a key file.

use age::secrecy::ExposeSecret;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use actions2aws_common_secret::Secret;

pub const PUBLIC_KEY_PREFIX: &str = "age1";
pub const SECRET_KEY_PREFIX: &str = "AGE-SECRET-KEY-1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
	#[error("invalid identity: {0}")]
	InvalidIdentity(&'static str),

	#[error("invalid recipient: {0}")]
	InvalidRecipient(&'static str),
}

/// The private half of a job's ephemeral keypair.
pub struct Identity {
	inner: age::x25519::Identity,
}

impl Identity {
	pub fn generate() -> Self {
		Self {
			inner: age::x25519::Identity::generate(),
		}
	}

	pub fn recipient(&self) -> Recipient {
		Recipient {
			inner: self.inner.to_public(),
		}
	}

	/// Text form for the key file.
	pub fn to_secret_string(&self) -> Secret<String> {
		Secret::new(self.inner.to_string().expose_secret().to_string())
	}

	pub fn parse(s: &str) -> Result<Self, KeyError> {
		let inner = s.trim().parse().map_err(KeyError::InvalidIdentity)?;
		Ok(Self { inner })
	}

	pub(crate) fn as_age(&self) -> &age::x25519::Identity {
		&self.inner
	}
}

impl fmt::Debug for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Identity")
			.field("recipient", &self.recipient())
			.field("secret", &"[REDACTED]")
			.finish()
	}
}

/// The public half of a job's keypair; the thing printed into the log.
#[derive(Clone, PartialEq, Eq)]
pub struct Recipient {
	inner: age::x25519::Recipient,
}

impl Recipient {
	pub fn parse(s: &str) -> Result<Self, KeyError> {
		let inner = s.trim().parse().map_err(KeyError::InvalidRecipient)?;
		Ok(Self { inner })
	}

	pub(crate) fn as_age(&self) -> &age::x25519::Recipient {
		&self.inner
	}
}

impl fmt::Display for Recipient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.inner, f)
	}
}

impl fmt::Debug for Recipient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = self.inner.to_string();
		let shown = text.get(..12).unwrap_or(&text);
		f.debug_struct("Recipient")
			.field("prefix", &format!("{shown}..."))
			.finish()
	}
}

impl FromStr for Recipient {
	type Err = KeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
