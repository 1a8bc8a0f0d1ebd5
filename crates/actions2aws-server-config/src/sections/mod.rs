// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each has a `*ConfigLayer` of optional fields that
//! sources fill in, and a resolved config produced by `finalize`.

mod broker;
pub(crate) mod github;
mod http;
mod logging;

pub use broker::{BrokerConfig, BrokerConfigLayer};
pub use github::{GitHubConfigLayer, GitHubSettings};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
