// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Public-key encryption of the broker's response.
//!
//! Responses are binary age files addressed to the job's single
//! [`Recipient`]; only the holder of the matching [`Identity`] can open them.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::keys::{Identity, Recipient};

/// The first line of every binary age file.
pub const AGE_HEADER: &[u8] = b"age-encryption.org/v1\n";

#[derive(Error, Debug)]
pub enum CryptoError {
	#[error("encryption failed: {0}")]
	Encrypt(#[from] age::EncryptError),

	#[error("decryption failed: {0}")]
	Decrypt(#[from] age::DecryptError),
}

/// Encrypt `plaintext` so that only `recipient`'s identity can open it.
pub fn seal(plaintext: &[u8], recipient: &Recipient) -> Result<Vec<u8>, CryptoError> {
	Ok(age::encrypt(recipient.as_age(), plaintext)?)
}

/// Decrypt a response produced by [`seal`] with the job's identity.
pub fn open(envelope: &[u8], identity: &Identity) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
	Ok(Zeroizing::new(age::decrypt(identity.as_age(), envelope)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn seal_then_open_with_matching_identity() {
		let identity = Identity::generate();
		let envelope = seal(b"{\"AccessKeyId\":\"ASIA\"}", &identity.recipient()).unwrap();

		assert!(envelope.starts_with(AGE_HEADER));
		let opened = open(&envelope, &identity).unwrap();
		assert_eq!(opened.as_slice(), b"{\"AccessKeyId\":\"ASIA\"}");
	}

	#[test]
	fn wrong_identity_cannot_open() {
		let intended = Identity::generate();
		let other = Identity::generate();
		let envelope = seal(b"secret", &intended.recipient()).unwrap();

		assert!(matches!(
			open(&envelope, &other),
			Err(CryptoError::Decrypt(age::DecryptError::NoMatchingKeys))
		));
	}

	#[test]
	fn tampering_with_header_is_detected() {
		let identity = Identity::generate();
		let mut envelope = seal(b"secret", &identity.recipient()).unwrap();
		let stanza = AGE_HEADER.len() + 3;
		envelope[stanza] ^= 0x01;

		assert!(open(&envelope, &identity).is_err());
	}

	#[test]
	fn truncated_and_foreign_envelopes_are_rejected() {
		let identity = Identity::generate();
		assert!(matches!(
			open(b"short", &identity),
			Err(CryptoError::Decrypt(_))
		));

		let envelope = seal(b"secret", &identity.recipient()).unwrap();
		assert!(open(&envelope[..envelope.len() - 1], &identity).is_err());
	}

	#[test]
	fn sealing_twice_produces_different_envelopes() {
		let identity = Identity::generate();
		let a = seal(b"same", &identity.recipient()).unwrap();
		let b = seal(b"same", &identity.recipient()).unwrap();
		assert_ne!(a, b);
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(32))]

		#[test]
		fn open_inverts_seal(plaintext in proptest::collection::vec(any::<u8>(), 0..4096)) {
			let identity = Identity::generate();
			let envelope = seal(&plaintext, &identity.recipient()).unwrap();
			let opened = open(&envelope, &identity).unwrap();
			prop_assert_eq!(opened.as_slice(), plaintext.as_slice());
		}

		#[test]
		fn any_flipped_byte_fails(
			plaintext in proptest::collection::vec(any::<u8>(), 1..512),
			idx in any::<usize>(),
		) {
			let identity = Identity::generate();
			let mut envelope = seal(&plaintext, &identity.recipient()).unwrap();
			let idx = idx % envelope.len();
			envelope[idx] ^= 0x80;
			prop_assert!(open(&envelope, &identity).is_err());
		}
	}
}
