// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration shared by the blocking and async clients.

use std::fmt;
use std::time::Duration;

use logvault_common_http::Url;
use logvault_core::{Credential, LogVaultError, Result, RetryPolicy};

use crate::env::{self, EnvError};

pub const DEFAULT_BASE_URL: &str = "https://api.logvault.eu";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable client settings. Build one with [`ClientConfig::builder`] or
/// [`ClientConfig::from_env`].
#[derive(Clone)]
pub struct ClientConfig {
	pub credential: Credential,
	pub base_url: Url,
	/// Connection setup limit for the blocking client.
	pub connect_timeout: Duration,
	/// Per-request limit for the blocking client.
	pub read_timeout: Duration,
	/// Per-request limit for the async client.
	pub total_timeout: Duration,
	pub retry_policy: RetryPolicy,
}

impl ClientConfig {
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::new()
	}

	/// Reads `LOGVAULT_API_KEY` (or `LOGVAULT_API_KEY_FILE`),
	/// `LOGVAULT_BASE_URL` and `LOGVAULT_MAX_RETRIES`.
	pub fn from_env() -> Result<Self> {
		ClientConfigBuilder::from_env()?.build()
	}
}

impl fmt::Debug for ClientConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientConfig")
			.field("credential", &self.credential)
			.field("base_url", &self.base_url.as_str())
			.field("connect_timeout", &self.connect_timeout)
			.field("read_timeout", &self.read_timeout)
			.field("total_timeout", &self.total_timeout)
			.field("retry_policy", &self.retry_policy)
			.finish()
	}
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
	api_key: Option<String>,
	base_url: Option<String>,
	connect_timeout: Duration,
	read_timeout: Duration,
	total_timeout: Duration,
	retry_policy: RetryPolicy,
}

impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ClientConfigBuilder {
	pub fn new() -> Self {
		Self {
			api_key: None,
			base_url: None,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			read_timeout: DEFAULT_READ_TIMEOUT,
			total_timeout: DEFAULT_TOTAL_TIMEOUT,
			retry_policy: RetryPolicy::default(),
		}
	}

	/// Starts from the environment. Explicit setters called afterwards win.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut builder = Self::new();
		builder.api_key = env::load_secret_with(env::API_KEY_VAR, &lookup).map_err(env_error)?;
		builder.base_url = lookup(env::BASE_URL_VAR).filter(|url| !url.trim().is_empty());
		if let Some(max_retries) =
			env::parse_var::<u32, _>(env::MAX_RETRIES_VAR, &lookup).map_err(env_error)?
		{
			builder.retry_policy.max_retries = max_retries;
		}
		Ok(builder)
	}

	/// Sets the API key (`lv_live_…` or `lv_test_…`).
	pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());
		self
	}

	/// Sets the service URL. Trailing slashes are ignored.
	///
	/// Example: `https://api.logvault.eu`
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	pub fn connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = timeout;
		self
	}

	pub fn read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout = timeout;
		self
	}

	/// Sets the async client's total per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.total_timeout = timeout;
		self
	}

	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.retry_policy.max_retries = max_retries;
		self
	}

	pub fn backoff_base(mut self, backoff_base: Duration) -> Self {
		self.retry_policy.backoff_base = backoff_base;
		self
	}

	pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.retry_policy = policy;
		self
	}

	pub fn build(self) -> Result<ClientConfig> {
		let credential = Credential::new(self.api_key.unwrap_or_default())?;
		let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

		Ok(ClientConfig {
			credential,
			base_url,
			connect_timeout: self.connect_timeout,
			read_timeout: self.read_timeout,
			total_timeout: self.total_timeout,
			retry_policy: self.retry_policy,
		})
	}
}

fn parse_base_url(raw: &str) -> Result<Url> {
	let trimmed = raw.trim().trim_end_matches('/');
	let url = Url::parse(trimmed)
		.map_err(|e| LogVaultError::validation(format!("invalid base URL: {e}")))?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(LogVaultError::validation(format!(
			"base URL must use http or https, got {}",
			url.scheme()
		)));
	}
	if url.cannot_be_a_base() {
		return Err(LogVaultError::validation("base URL cannot carry a path"));
	}
	Ok(url)
}

fn env_error(err: EnvError) -> LogVaultError {
	LogVaultError::validation(err.to_string())
}
