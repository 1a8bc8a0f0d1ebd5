// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! actions2aws broker binary.

use std::path::PathBuf;
use std::sync::Arc;

use actions2aws_server::{create_router, Broker};
use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Issues short-lived AWS credentials to verified GitHub Actions jobs.
#[derive(Parser, Debug)]
#[command(name = "actions2aws-server", version)]
struct Args {
	/// Path to the TOML config file.
	#[arg(
		long,
		env = "ACTIONS2AWS_SERVER_CONFIG",
		default_value = "/etc/actions2aws/server.toml"
	)]
	config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	dotenvy::dotenv().ok();

	let config = actions2aws_server_config::load_config_with_file(&args.config)
		.context("failed to load configuration")?;

	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
	let registry = tracing_subscriber::registry().with(filter);
	if config.logging.json {
		registry
			.with(tracing_subscriber::fmt::layer().json().with_current_span(false))
			.init();
	} else {
		registry.with(tracing_subscriber::fmt::layer()).init();
	}

	let broker = Broker::from_config(&config)
		.await
		.context("failed to initialise broker")?;

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		permitted_org = broker.permitted_org(),
		"starting actions2aws-server"
	);

	let app = create_router(Arc::new(broker)).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;
	tracing::info!("listening on {}", addr);

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("server shutdown complete");
	Ok(())
}
