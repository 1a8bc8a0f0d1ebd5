// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use actions2aws_common_core::{CryptoError, ErrorKind, ErrorResponse, KeyError};
use actions2aws_server_github::GitHubError;
use actions2aws_server_sts::MintError;
use actions2aws_server_tags::TagError;
use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use thiserror::Error;

use crate::key_channel::KeyExchangeError;
use crate::verify::VerifyError;

/// Why a credential request was refused. Every variant aborts the whole
/// request; nothing is issued on any error path.
#[derive(Debug, Error)]
pub enum BrokerError {
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error(transparent)]
	Verify(#[from] VerifyError),

	#[error(transparent)]
	KeyExchange(#[from] KeyExchangeError),

	#[error("published public key is invalid: {0}")]
	InvalidPublicKey(#[from] KeyError),

	#[error("failed to compute tags: {0}")]
	Tags(#[from] TagError),

	#[error(transparent)]
	Minting(#[from] MintError),

	#[error("failed to serialize credentials: {0}")]
	Serialize(#[from] serde_json::Error),

	#[error("failed to encrypt credentials: {0}")]
	Crypto(#[from] CryptoError),
}

impl BrokerError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			BrokerError::InvalidRequest(_) => ErrorKind::InvalidRequest,
			BrokerError::Verify(e) => match e {
				VerifyError::InvalidRequest(_)
				| VerifyError::Platform(GitHubError::InvalidRequest(_)) => ErrorKind::InvalidRequest,
				VerifyError::ForkRejected { .. }
				| VerifyError::OrgMismatch { .. }
				| VerifyError::RepositoryMismatch { .. } => ErrorKind::AuthenticationFailure,
				VerifyError::JobNotFound(_)
				| VerifyError::StepNotFound { .. }
				| VerifyError::Platform(GitHubError::NotFound(_)) => ErrorKind::LookupFailure,
				VerifyError::Platform(_) => ErrorKind::TransportFailure,
			},
			BrokerError::KeyExchange(e) => match e {
				KeyExchangeError::LogNotReady { .. } | KeyExchangeError::MarkerMissing => {
					ErrorKind::KeyExchangeFailure
				}
				KeyExchangeError::Platform(GitHubError::InvalidRequest(_)) => ErrorKind::InvalidRequest,
				KeyExchangeError::Platform(_) => ErrorKind::TransportFailure,
			},
			BrokerError::InvalidPublicKey(_) | BrokerError::Serialize(_) | BrokerError::Crypto(_) => {
				ErrorKind::CryptoFailure
			}
			BrokerError::Tags(_) => ErrorKind::TagFailure,
			BrokerError::Minting(_) => ErrorKind::MintingFailure,
		}
	}

	pub fn status(&self) -> StatusCode {
		match self.kind() {
			ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
			ErrorKind::AuthenticationFailure => StatusCode::FORBIDDEN,
			ErrorKind::LookupFailure => StatusCode::NOT_FOUND,
			ErrorKind::KeyExchangeFailure | ErrorKind::CryptoFailure => {
				StatusCode::UNPROCESSABLE_ENTITY
			}
			ErrorKind::TagFailure => StatusCode::INTERNAL_SERVER_ERROR,
			ErrorKind::MintingFailure | ErrorKind::TransportFailure => StatusCode::BAD_GATEWAY,
		}
	}
}

impl IntoResponse for BrokerError {
	fn into_response(self) -> Response {
		let body = ErrorResponse::new(self.kind(), self.to_string());
		(self.status(), Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use actions2aws_common_core::RequestError;

	#[test]
	fn taxonomy_mapping() {
		let cases: Vec<(BrokerError, ErrorKind, StatusCode)> = vec![
			(
				BrokerError::InvalidRequest("bad json".to_string()),
				ErrorKind::InvalidRequest,
				StatusCode::BAD_REQUEST,
			),
			(
				VerifyError::ForkRejected {
					repo: "acme/svc".to_string(),
					run_id: "1".to_string(),
				}
				.into(),
				ErrorKind::AuthenticationFailure,
				StatusCode::FORBIDDEN,
			),
			(
				VerifyError::OrgMismatch {
					account: "evil".to_string(),
				}
				.into(),
				ErrorKind::AuthenticationFailure,
				StatusCode::FORBIDDEN,
			),
			(
				VerifyError::InvalidRequest(RequestError::InvalidRepo("acme/../evil/svc".to_string()))
					.into(),
				ErrorKind::InvalidRequest,
				StatusCode::BAD_REQUEST,
			),
			(
				VerifyError::RepositoryMismatch {
					requested: "acme/svc".to_string(),
					actual: "evil/svc".to_string(),
				}
				.into(),
				ErrorKind::AuthenticationFailure,
				StatusCode::FORBIDDEN,
			),
			(
				VerifyError::JobNotFound("build".to_string()).into(),
				ErrorKind::LookupFailure,
				StatusCode::NOT_FOUND,
			),
			(
				VerifyError::Platform(GitHubError::NotFound("run".to_string())).into(),
				ErrorKind::LookupFailure,
				StatusCode::NOT_FOUND,
			),
			(
				VerifyError::Platform(GitHubError::api_error(500, "boom")).into(),
				ErrorKind::TransportFailure,
				StatusCode::BAD_GATEWAY,
			),
			(
				KeyExchangeError::LogNotReady { attempts: 6 }.into(),
				ErrorKind::KeyExchangeFailure,
				StatusCode::UNPROCESSABLE_ENTITY,
			),
			(
				KeyExchangeError::MarkerMissing.into(),
				ErrorKind::KeyExchangeFailure,
				StatusCode::UNPROCESSABLE_ENTITY,
			),
			(
				KeyError::InvalidRecipient("invalid Bech32 encoding").into(),
				ErrorKind::CryptoFailure,
				StatusCode::UNPROCESSABLE_ENTITY,
			),
			(
				TagError::NotAnObject("a string").into(),
				ErrorKind::TagFailure,
				StatusCode::INTERNAL_SERVER_ERROR,
			),
			(
				MintError::Provider("AccessDenied".to_string()).into(),
				ErrorKind::MintingFailure,
				StatusCode::BAD_GATEWAY,
			),
		];

		for (error, kind, status) in cases {
			assert_eq!(error.kind(), kind, "{error}");
			assert_eq!(error.status(), status, "{error}");
		}
	}

	#[tokio::test]
	async fn response_body_is_structured() {
		let response =
			BrokerError::from(VerifyError::JobNotFound("build".to_string())).into_response();
		assert_eq!(response.status(), StatusCode::NOT_FOUND);

		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
		assert_eq!(body.error, ErrorKind::LookupFailure);
		assert_eq!(body.message, "job 'build' not found in run");
	}
}
