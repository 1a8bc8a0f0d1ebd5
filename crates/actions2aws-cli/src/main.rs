// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `actions2aws`: the job-side half of actions2aws.
//!
//! ```yaml
//! - name: keygen
//!   run: actions2aws keygen
//! - name: credentials
//!   run: actions2aws request
//!   env:
//!     ACTIONS2AWS_URL: https://broker.example.com/
//!     ACTIONS2AWS_ROLE: arn:aws:iam::123456789012:role/ci
//!     ACTIONS2AWS_STEP_NAME: keygen
//! ```

mod export;
mod key_file;
mod keygen;
mod request;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "actions2aws", version, about = "AWS credentials for GitHub Actions jobs")]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Generate this job's key and print its public half for the broker
	Keygen(keygen::KeygenArgs),
	/// Request credentials and export them to later steps
	Request(request::RequestArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
	// stdout carries the marker line and workflow commands.
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let cli = Cli::parse();
	match cli.command {
		Command::Keygen(args) => keygen::run(args).await,
		Command::Request(args) => request::run(args).await,
	}
}
