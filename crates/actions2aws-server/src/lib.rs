// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The actions2aws credential broker.
//!
//! A GitHub Actions job asks for AWS credentials by naming its repository,
//! run, job and step. The broker checks those against GitHub, reads the
//! job's public key back out of the job's log, mints tagged STS credentials
//! and returns them encrypted to that key.

pub mod broker;
pub mod error;
pub mod key_channel;
pub mod routes;
pub mod verify;

#[cfg(test)]
mod testing;

pub use broker::{Broker, StartupError};
pub use error::BrokerError;
pub use key_channel::{retrieve_key, KeyExchangeError};
pub use routes::create_router;
pub use verify::{verify, VerifiedJob, VerifyError};
