// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Status and failure classification shared by both clients.
//!
//! | Status                         | Outcome                                        |
//! |--------------------------------|------------------------------------------------|
//! | 2xx                            | success, body decoded as JSON                  |
//! | 401                            | `Authentication`, fatal                        |
//! | 422                            | `Validation` with server detail, fatal         |
//! | 404 on an entity endpoint      | `Api` / `NotFound`, fatal                      |
//! | in `retryable_statuses`        | transient; once exhausted 429 → `RateLimited`, |
//! |                                | anything else → `Api` / `Status`               |
//! | anything else                  | `Api` / `Status`, fatal                        |

use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::{ApiError, FailureCategory, LogVaultError, Result};
use crate::policy::RetryPolicy;

/// Longest server-supplied validation detail carried into an error.
pub const MAX_DETAIL_CHARS: usize = 200;

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
	/// 2xx; the caller decodes the body with [`decode_success`].
	Success,
	/// Stop now with this error.
	Fatal(LogVaultError),
	/// May succeed on another attempt.
	Transient(Transient),
}

/// A failure worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transient {
	Status {
		status: u16,
		retry_after_secs: Option<u64>,
	},
	Transport(FailureCategory),
}

impl Transient {
	/// Error to report when no retry budget is left.
	pub fn exhausted(self, attempts: u32) -> LogVaultError {
		match self {
			Transient::Status {
				status: 429,
				retry_after_secs,
			} => LogVaultError::RateLimited {
				retry_after_secs,
				attempts,
			},
			Transient::Status { status, .. } => ApiError::status(status, attempts).into(),
			Transient::Transport(category) => ApiError::transport(category, attempts).into(),
		}
	}

	/// Short label for log fields.
	pub fn label(&self) -> String {
		match self {
			Transient::Status { status, .. } => format!("HTTP {status}"),
			Transient::Transport(category) => category.to_string(),
		}
	}
}

/// Classifies a received status code.
///
/// `attempts` is the number of attempts made so far, including this one.
pub fn classify_status(
	policy: &RetryPolicy,
	endpoint: &Endpoint,
	status: u16,
	retry_after_secs: Option<u64>,
	body: &str,
	attempts: u32,
) -> Classification {
	match status {
		200..=299 => Classification::Success,
		401 => Classification::Fatal(LogVaultError::Authentication(
			"Invalid API key".to_string(),
		)),
		422 => Classification::Fatal(LogVaultError::Validation(server_detail(body))),
		404 if endpoint.entity_id().is_some() => {
			let id = endpoint.entity_id().unwrap_or_default();
			Classification::Fatal(ApiError::not_found(id).into())
		}
		s if policy.is_retryable_status(s) => Classification::Transient(Transient::Status {
			status: s,
			retry_after_secs,
		}),
		s => Classification::Fatal(ApiError::status(s, attempts).into()),
	}
}

/// Classifies a request that produced no response.
pub fn classify_failure(category: FailureCategory, attempts: u32) -> Classification {
	if category.is_transient() {
		Classification::Transient(Transient::Transport(category))
	} else {
		Classification::Fatal(ApiError::transport(category, attempts).into())
	}
}

/// Decodes a 2xx body. An empty body decodes to `null`.
pub fn decode_success(status: u16, body: &str, attempts: u32) -> Result<Value> {
	if body.trim().is_empty() {
		return Ok(Value::Null);
	}
	serde_json::from_str(body).map_err(|_| ApiError::decode(status, attempts).into())
}

/// Extracts a readable message from a 422 body without echoing it wholesale.
///
/// Looks at `detail`, `message` and `error`. A `detail` array of
/// `{loc, msg}` objects is flattened to `loc: msg` pairs; any `input` the
/// server echoed back is ignored.
pub fn server_detail(body: &str) -> String {
	let detail = serde_json::from_str::<Value>(body)
		.ok()
		.and_then(|json| extract_detail(&json));

	match detail {
		Some(detail) if !detail.is_empty() => truncate_chars(&detail, MAX_DETAIL_CHARS),
		_ => "request rejected by server".to_string(),
	}
}

fn extract_detail(json: &Value) -> Option<String> {
	for key in ["detail", "message", "error"] {
		match json.get(key) {
			Some(Value::String(s)) => return Some(s.clone()),
			Some(Value::Array(items)) => {
				let parts: Vec<String> = items.iter().filter_map(describe_item).collect();
				if !parts.is_empty() {
					return Some(parts.join("; "));
				}
			}
			_ => {}
		}
	}
	None
}

fn describe_item(item: &Value) -> Option<String> {
	match item {
		Value::String(s) => Some(s.clone()),
		Value::Object(obj) => {
			let msg = obj.get("msg").and_then(Value::as_str)?;
			let loc = obj.get("loc").and_then(Value::as_array).map(|loc| {
				loc.iter()
					.map(|p| match p {
						Value::String(s) => s.clone(),
						other => other.to_string(),
					})
					.collect::<Vec<_>>()
					.join(".")
			});
			Some(match loc {
				Some(loc) if !loc.is_empty() => format!("{loc}: {msg}"),
				_ => msg.to_string(),
			})
		}
		_ => None,
	}
}

fn truncate_chars(s: &str, max: usize) -> String {
	match s.char_indices().nth(max) {
		Some((idx, _)) => format!("{}…", &s[..idx]),
		None => s.to_string(),
	}
}
