// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `actions2aws keygen`: create the job's identity and publish its public
//! half on stdout, where the runner captures it into the job log.

use std::io::Write;
use std::path::{Path, PathBuf};

use actions2aws_common_core::{format_marker, Identity};
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::key_file;

#[derive(Debug, Clone, clap::Args)]
pub struct KeygenArgs {
	/// Where to keep the private key [default: $HOME/.actions2aws/key]
	#[arg(long, env = "ACTIONS2AWS_KEY_FILE")]
	pub key_file: Option<PathBuf>,
}

pub async fn run(args: KeygenArgs) -> Result<()> {
	let path = match args.key_file {
		Some(path) => path,
		None => key_file::default_key_path()?,
	};
	let mut stdout = std::io::stdout().lock();
	keygen(&path, &mut stdout).await
}

/// The key is saved before the marker is printed so a published key always
/// has its private half on disk.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn keygen(path: &Path, out: &mut impl Write) -> Result<()> {
	let identity = Identity::generate();
	key_file::save_identity(&identity, path)
		.await
		.context("failed to save private key")?;

	writeln!(out, "{}", format_marker(&identity.recipient().to_string()))?;
	out.flush()?;

	info!("published job public key");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use actions2aws_common_core::extract_public_key;
	use tempfile::TempDir;

	#[tokio::test]
	async fn printed_marker_matches_saved_key() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join(".actions2aws").join("key");

		let mut out = Vec::new();
		keygen(&path, &mut out).await.unwrap();

		let printed = String::from_utf8(out).unwrap();
		assert!(printed.starts_with("ACTIONS2AWS PUBKEY: age1"));
		assert!(printed.ends_with('\n'));

		let published = extract_public_key(&printed).unwrap();
		let saved = key_file::load_identity(&path).await.unwrap();
		assert_eq!(published, saved.recipient().to_string());
	}

	#[tokio::test]
	async fn each_keygen_publishes_a_new_key() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("key");

		let mut first = Vec::new();
		keygen(&path, &mut first).await.unwrap();
		let mut second = Vec::new();
		keygen(&path, &mut second).await.unwrap();

		assert_ne!(first, second);
		let saved = key_file::load_identity(&path).await.unwrap();
		assert_eq!(
			String::from_utf8(second).unwrap().trim(),
			format_marker(&saved.recipient().to_string())
		);
	}
}
