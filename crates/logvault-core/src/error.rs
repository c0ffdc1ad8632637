// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy shared by the blocking and async clients.
//!
//! Every failure a caller can observe is one of the [`LogVaultError`]
//! variants. Transport errors are reduced to a [`FailureCategory`] before they
//! get here, and response bodies are never embedded verbatim, so messages are
//! safe to log.

use std::fmt;

use thiserror::Error;

/// Broad category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
	/// Connect or read deadline elapsed.
	Timeout,
	/// Connection refused, DNS resolution or TLS handshake failure.
	Connect,
	/// The request could not be built or sent.
	Request,
	/// The connection failed while the response body was being read.
	Body,
	/// The response body was not valid JSON.
	Decode,
	/// Anything the transport could not categorise.
	Other,
}

impl FailureCategory {
	/// Name used in error messages.
	pub fn as_str(&self) -> &'static str {
		match self {
			FailureCategory::Timeout => "Timeout",
			FailureCategory::Connect => "ConnectionError",
			FailureCategory::Request => "RequestError",
			FailureCategory::Body => "ReadError",
			FailureCategory::Decode => "DecodeError",
			FailureCategory::Other => "TransportError",
		}
	}

	/// Whether a failure of this category is worth another attempt.
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			FailureCategory::Timeout | FailureCategory::Connect | FailureCategory::Body
		)
	}
}

impl fmt::Display for FailureCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What went wrong in an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
	/// The server answered with a status the client does not accept.
	Status,
	/// An entity-scoped endpoint answered 404.
	NotFound { id: String },
	/// The request never produced a usable response.
	Transport(FailureCategory),
	/// A success response carried a body that is not JSON.
	Decode,
}

/// Catch-all failure: exhausted retries, unexpected statuses, network errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
	pub kind: ApiErrorKind,
	pub status: Option<u16>,
	pub attempts: u32,
}

impl ApiError {
	pub fn status(status: u16, attempts: u32) -> Self {
		Self {
			kind: ApiErrorKind::Status,
			status: Some(status),
			attempts,
		}
	}

	pub fn not_found(id: impl Into<String>) -> Self {
		Self {
			kind: ApiErrorKind::NotFound { id: id.into() },
			status: Some(404),
			attempts: 1,
		}
	}

	pub fn transport(category: FailureCategory, attempts: u32) -> Self {
		Self {
			kind: ApiErrorKind::Transport(category),
			status: None,
			attempts,
		}
	}

	pub fn decode(status: u16, attempts: u32) -> Self {
		Self {
			kind: ApiErrorKind::Decode,
			status: Some(status),
			attempts,
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self.kind, ApiErrorKind::NotFound { .. })
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			ApiErrorKind::Status => match self.status {
				Some(status) => write!(f, "HTTP {status}")?,
				None => f.write_str("HTTP error")?,
			},
			ApiErrorKind::NotFound { id } => return write!(f, "event not found: {id}"),
			ApiErrorKind::Transport(category) => write!(f, "LogVault connection error: {category}")?,
			ApiErrorKind::Decode => f.write_str("failed to decode response body")?,
		}
		if self.attempts > 1 {
			write!(f, " after {} attempts", self.attempts)?;
		}
		Ok(())
	}
}

impl std::error::Error for ApiError {}

/// Errors returned by LogVault client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogVaultError {
	/// The credential is missing or was rejected by the server.
	#[error("authentication failed: {0}")]
	Authentication(String),

	/// Malformed input, caught locally or rejected by the server with 422.
	#[error("validation failed: {0}")]
	Validation(String),

	/// Quota or throughput exceeded and the retry budget is spent.
	#[error("rate limited{}", retry_hint(.retry_after_secs))]
	RateLimited {
		retry_after_secs: Option<u64>,
		attempts: u32,
	},

	#[error(transparent)]
	Api(#[from] ApiError),

	/// The cancellation token fired before the operation completed.
	#[error("request cancelled")]
	Cancelled,

	/// The async client was used after `close()`.
	#[error("client has been closed")]
	ClientClosed,
}

impl LogVaultError {
	pub fn validation(message: impl Into<String>) -> Self {
		LogVaultError::Validation(message.into())
	}

	/// HTTP status behind this error, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			LogVaultError::RateLimited { .. } => Some(429),
			LogVaultError::Api(err) => err.status,
			_ => None,
		}
	}

	/// Whether the same call could succeed if the caller tries again later.
	pub fn is_retryable(&self) -> bool {
		match self {
			LogVaultError::RateLimited { .. } => true,
			LogVaultError::Api(err) => match err.kind {
				ApiErrorKind::Status => err.status.is_some_and(|s| s >= 500),
				ApiErrorKind::Transport(category) => category.is_transient(),
				_ => false,
			},
			_ => false,
		}
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, LogVaultError::Api(err) if err.is_not_found())
	}
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
	match retry_after_secs {
		Some(secs) => format!(", retry after {secs} seconds"),
		None => String::new(),
	}
}

/// Result type alias for LogVault operations.
pub type Result<T> = std::result::Result<T, LogVaultError>;
