// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP binding: `POST /` issues credentials, `GET /health` for liveness checks.

use std::sync::Arc;

use actions2aws_common_core::CredentialRequest;
use axum::{
	body::Bytes,
	extract::State,
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
	Router,
};
use tracing::warn;

use crate::broker::Broker;
use crate::error::BrokerError;

pub fn create_router(broker: Arc<Broker>) -> Router {
	Router::new()
		.route("/", post(issue_credentials))
		.route("/health", get(health))
		.with_state(broker)
}

async fn health() -> &'static str {
	"ok"
}

// The body is parsed by hand so malformed JSON gets the same structured
// error response as every other failure.
async fn issue_credentials(State(broker): State<Arc<Broker>>, body: Bytes) -> Response {
	let request: CredentialRequest = match serde_json::from_slice(&body) {
		Ok(request) => request,
		Err(e) => return BrokerError::InvalidRequest(e.to_string()).into_response(),
	};

	match broker.issue(&request).await {
		Ok(ciphertext) => (
			StatusCode::OK,
			[(header::CONTENT_TYPE, "application/octet-stream")],
			ciphertext,
		)
			.into_response(),
		Err(e) => {
			warn!(
				error = %e,
				kind = %e.kind(),
				repo = %request.repo,
				run_id = %request.run_id,
				"credential request refused"
			);
			e.into_response()
		}
	}
}
