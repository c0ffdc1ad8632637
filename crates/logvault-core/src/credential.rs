// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API credential used as the bearer token on every request.
//!
//! Keys use a prefix format: `lv_live_<random>` for production traffic or
//! `lv_test_<random>` for sandbox traffic. The prefix is a convention, not a
//! contract: an unknown prefix is reported with a warning and the key is
//! still used, so a future key format does not break deployed clients.

use std::fmt;

use tracing::warn;
use zeroize::Zeroize;

use crate::error::{LogVaultError, Result};

/// The redaction placeholder used wherever a credential would be printed.
pub const REDACTED: &str = "[REDACTED]";

pub const LIVE_PREFIX: &str = "lv_live_";
pub const TEST_PREFIX: &str = "lv_test_";

/// Mode marker carried in the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
	Live,
	Test,
	Unknown,
}

/// An API key. Zeroized on drop; `Debug` and `Display` are redacted.
#[derive(Zeroize, Clone, PartialEq, Eq)]
#[zeroize(drop)]
pub struct Credential {
	token: String,
}

impl Credential {
	/// Wraps a raw key.
	///
	/// Fails with [`LogVaultError::Authentication`] when the key is empty or
	/// only whitespace. Logs a warning when the prefix is not recognised.
	pub fn new(token: impl Into<String>) -> Result<Self> {
		let token = token.into();
		if token.trim().is_empty() {
			return Err(LogVaultError::Authentication("API key is required".to_string()));
		}

		let credential = Self { token };
		if credential.mode() == CredentialMode::Unknown {
			warn!(
				expected = %format!("{LIVE_PREFIX}* or {TEST_PREFIX}*"),
				"API key does not start with an expected prefix"
			);
		}
		Ok(credential)
	}

	pub fn mode(&self) -> CredentialMode {
		if self.token.starts_with(LIVE_PREFIX) {
			CredentialMode::Live
		} else if self.token.starts_with(TEST_PREFIX) {
			CredentialMode::Test
		} else {
			CredentialMode::Unknown
		}
	}

	/// Explicitly access the raw key.
	///
	/// The only caller should be the code that writes the `Authorization`
	/// header.
	pub fn expose(&self) -> &str {
		&self.token
	}

	/// `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.token)
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Credential").field(&REDACTED).finish()
	}
}

impl fmt::Display for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}
