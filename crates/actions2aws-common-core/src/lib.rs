// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Types shared by the actions2aws broker and the job-side client.
//!
//! - [`payload`]: the JSON request and the credential record carried inside
//!   the encrypted response
//! - [`marker`]: the `ACTIONS2AWS PUBKEY:` log line that carries the job's
//!   public key from its log to the broker
//! - [`keys`]: the per-job age X25519 identity and its public recipient
//! - [`envelope`]: age encryption of the response to that recipient
//! - [`error`]: the error taxonomy surfaced to callers

pub mod envelope;
pub mod error;
pub mod keys;
pub mod marker;
pub mod payload;

pub use envelope::{open, seal, CryptoError};
pub use error::ErrorKind;
pub use keys::{Identity, KeyError, Recipient};
pub use marker::{extract_public_key, format_marker, MARKER_PREFIX};
pub use payload::{
	validate_repo, validate_run_id, CredentialRequest, ErrorResponse, IssuedCredentials, RequestError,
};
