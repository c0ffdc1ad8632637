// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Pre-configured HTTP clients with the standard LogVault headers.

use std::time::Duration;

use logvault_core::{ApiError, Credential, FailureCategory, LogVaultError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// SDK version sent in the User-Agent and `X-Client-Version` headers.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP header names.
pub mod headers {
	pub const CLIENT_VERSION: &str = "X-Client-Version";
	pub const RETRY_AFTER: &str = "Retry-After";
}

/// Which client is talking; reflected in the User-Agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
	Blocking,
	Async,
}

/// Returns the LogVault User-Agent string.
///
/// Format: `logvault-rust/{version}` or `logvault-rust-async/{version}`
pub fn user_agent(flavor: Flavor) -> String {
	match flavor {
		Flavor::Blocking => format!("logvault-rust/{SDK_VERSION}"),
		Flavor::Async => format!("logvault-rust-async/{SDK_VERSION}"),
	}
}

/// Headers sent on every request. The `Authorization` value is marked
/// sensitive so it is hidden from reqwest's own debug output.
pub fn default_headers(credential: &Credential) -> Result<HeaderMap> {
	let mut auth = HeaderValue::from_str(&credential.bearer()).map_err(|_| {
		LogVaultError::Authentication(
			"API key contains characters not allowed in an HTTP header".to_string(),
		)
	})?;
	auth.set_sensitive(true);

	let mut map = HeaderMap::new();
	map.insert(AUTHORIZATION, auth);
	map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
	map.insert(headers::CLIENT_VERSION, HeaderValue::from_static(SDK_VERSION));
	Ok(map)
}

/// Creates the pooled async client.
///
/// The async client has a single total timeout per request.
pub fn new_async_client(credential: &Credential, timeout: Duration) -> Result<reqwest::Client> {
	reqwest::Client::builder()
		.user_agent(user_agent(Flavor::Async))
		.default_headers(default_headers(credential)?)
		.timeout(timeout)
		.build()
		.map_err(|_| ApiError::transport(FailureCategory::Other, 0).into())
}

/// Creates the pooled blocking client.
///
/// Timeouts are two-phase: `connect_timeout` bounds connection setup and
/// `read_timeout` bounds each request once connected.
pub fn new_blocking_client(
	credential: &Credential,
	connect_timeout: Duration,
	read_timeout: Duration,
) -> Result<reqwest::blocking::Client> {
	reqwest::blocking::Client::builder()
		.user_agent(user_agent(Flavor::Blocking))
		.default_headers(default_headers(credential)?)
		.connect_timeout(connect_timeout)
		.timeout(read_timeout)
		.build()
		.map_err(|_| ApiError::transport(FailureCategory::Other, 0).into())
}
