// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagError {
	#[error("invalid tag expression: {0}")]
	Expression(String),

	#[error("tag expression failed to evaluate: {0}")]
	Evaluation(String),

	#[error("tag expression must produce an object, got {0}")]
	NotAnObject(&'static str),

	#[error("tag '{key}' evaluated to {found}, expected a string")]
	NonStringTagValue { key: String, found: &'static str },

	#[error("job index {index} is out of range for {len} jobs")]
	JobIndexOutOfRange { index: usize, len: usize },
}
