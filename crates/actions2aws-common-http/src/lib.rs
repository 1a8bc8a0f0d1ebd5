// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for actions2aws.
//!
//! This crate provides:
//! - A pre-configured HTTP client with a consistent User-Agent header
//! - A linear backoff policy for polling resources that are not ready yet

mod backoff;
mod client;

pub use backoff::{poll_with_backoff, LinearBackoff, PollOutcome, Readiness};
pub use client::{builder, new_client, user_agent};
