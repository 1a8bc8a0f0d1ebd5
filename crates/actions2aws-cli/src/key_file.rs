// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The per-job private key on disk.
//!
//! `keygen` and `request` run as separate steps of the same job, so the
//! identity is kept in `$HOME/.actions2aws/key` in between. The directory is
//! created `0700` and the file `0600`; a second keygen overwrites the file
//! and resets its mode.

use std::path::{Path, PathBuf};

use actions2aws_common_core::{Identity, KeyError};
use thiserror::Error;
use tokio::fs;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum KeyFileError {
	#[error("failed to access key file: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid key file: {0}")]
	InvalidFormat(#[from] KeyError),

	#[error("failed to get home directory")]
	NoHomeDir,
}

pub type Result<T> = std::result::Result<T, KeyFileError>;

pub fn default_key_path() -> Result<PathBuf> {
	dirs::home_dir()
		.map(|home| home.join(".actions2aws").join("key"))
		.ok_or(KeyFileError::NoHomeDir)
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn save_identity(identity: &Identity, path: impl AsRef<Path>) -> Result<()> {
	let path = path.as_ref();

	if let Some(parent) = path.parent() {
		let mut builder = fs::DirBuilder::new();
		builder.recursive(true);
		#[cfg(unix)]
		builder.mode(0o700);
		builder.create(parent).await?;
	}

	let secret = identity.to_secret_string();
	let content = zeroize::Zeroizing::new(format!("{}\n", secret.expose()));

	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		use tokio::fs::OpenOptions;
		use tokio::io::AsyncWriteExt;

		let mut file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.mode(0o600)
			.open(path)
			.await?;
		// `mode` only applies on create; tighten a pre-existing file before writing.
		file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
		file.write_all(content.as_bytes()).await?;
	}

	#[cfg(not(unix))]
	{
		fs::write(path, content.as_bytes()).await?;
	}

	Ok(())
}

#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn load_identity(path: impl AsRef<Path>) -> Result<Identity> {
	let content = zeroize::Zeroizing::new(fs::read_to_string(path.as_ref()).await?);
	Ok(Identity::parse(content.trim())?)
}
