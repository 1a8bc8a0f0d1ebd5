// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Handing decrypted credentials to later steps of the job.
//!
//! Every value is registered with the runner's log masking first, then the
//! standard AWS variables are appended to the file named by `GITHUB_ENV`,
//! which the runner loads into the environment of subsequent steps.

use std::io::Write;
use std::path::Path;

use actions2aws_common_core::IssuedCredentials;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use zeroize::Zeroizing;

/// Writes one `::add-mask::` workflow command per credential value.
pub fn write_masks(out: &mut impl Write, credentials: &IssuedCredentials) -> std::io::Result<()> {
	writeln!(out, "::add-mask::{}", credentials.access_key_id)?;
	writeln!(out, "::add-mask::{}", credentials.secret_access_key.expose())?;
	writeln!(out, "::add-mask::{}", credentials.session_token.expose())?;
	out.flush()
}

pub fn env_assignments(credentials: &IssuedCredentials) -> Zeroizing<String> {
	Zeroizing::new(format!(
		"AWS_ACCESS_KEY_ID={}\nAWS_SECRET_ACCESS_KEY={}\nAWS_SESSION_TOKEN={}\n",
		credentials.access_key_id,
		credentials.secret_access_key.expose(),
		credentials.session_token.expose(),
	))
}

/// Appends the assignments, creating the file `0644` if it is missing.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn append_to_env_file(path: &Path, credentials: &IssuedCredentials) -> std::io::Result<()> {
	let mut options = tokio::fs::OpenOptions::new();
	options.append(true).create(true);
	#[cfg(unix)]
	options.mode(0o644);

	let mut file = options.open(path).await?;
	file.write_all(env_assignments(credentials).as_bytes()).await?;
	file.flush().await
}
