// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event submission payloads.
//!
//! [`EventBuilder`] assembles the body for `POST /v1/events` and returns a
//! [`PayloadOutcome`]. Two failure modes are kept apart on purpose:
//!
//! - metadata that cannot be encoded produces [`PayloadOutcome::Dropped`]
//!   with a logged diagnostic; no request is sent and the caller is not
//!   handed an error, so a broken audit record never takes down the
//!   surrounding business logic;
//! - an invalid action or a body over [`MAX_PAYLOAD_SIZE`] is a caller bug
//!   and is returned as [`LogVaultError::Validation`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::action::validate_action;
use crate::error::{LogVaultError, Result};

/// Maximum encoded size of a submission (1 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Level used when the caller does not set one.
pub const DEFAULT_LEVEL: &str = "info";

/// Wire shape of an event submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSubmission {
	pub action: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resource: Option<String>,
	#[serde(default)]
	pub metadata: Map<String, Value>,
	pub level: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	pub timestamp: String,
}

/// A submission that passed validation, with its encoded body.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
	submission: EventSubmission,
	body: String,
}

impl EncodedPayload {
	pub fn submission(&self) -> &EventSubmission {
		&self.submission
	}

	pub fn body(&self) -> &str {
		&self.body
	}

	pub fn into_body(self) -> String {
		self.body
	}

	/// Encoded size in bytes.
	pub fn len(&self) -> usize {
		self.body.len()
	}

	pub fn is_empty(&self) -> bool {
		self.body.is_empty()
	}
}

/// Result of building a payload that did not hit a hard error.
#[derive(Debug, Clone)]
#[must_use]
pub enum PayloadOutcome {
	/// Ready to send.
	Encoded(EncodedPayload),
	/// Encoding failed; nothing should be sent.
	Dropped { diagnostic: String },
}

impl PayloadOutcome {
	pub fn encoded(self) -> Option<EncodedPayload> {
		match self {
			PayloadOutcome::Encoded(payload) => Some(payload),
			PayloadOutcome::Dropped { .. } => None,
		}
	}

	pub fn is_dropped(&self) -> bool {
		matches!(self, PayloadOutcome::Dropped { .. })
	}
}

/// Builder for an audit event submission.
///
/// # Example
///
/// ```
/// use logvault_core::{EventBuilder, PayloadOutcome};
///
/// let outcome = EventBuilder::new("user.login")
///     .user_id("user_123")
///     .meta("ip", "1.2.3.4")
///     .build()
///     .unwrap();
///
/// assert!(matches!(outcome, PayloadOutcome::Encoded(_)));
/// ```
#[derive(Debug, Clone)]
pub struct EventBuilder {
	action: String,
	user_id: Option<String>,
	resource: Option<String>,
	metadata: Map<String, Value>,
	level: String,
	message: Option<String>,
	timestamp: Option<DateTime<Utc>>,
	encode_error: Option<String>,
}

impl EventBuilder {
	pub fn new(action: impl Into<String>) -> Self {
		Self {
			action: action.into(),
			user_id: None,
			resource: None,
			metadata: Map::new(),
			level: DEFAULT_LEVEL.to_string(),
			message: None,
			timestamp: None,
			encode_error: None,
		}
	}

	pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	/// Sets the resource the action was performed on, e.g. `document:456`.
	pub fn resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());
		self
	}

	pub fn level(mut self, level: impl Into<String>) -> Self {
		self.level = level.into();
		self
	}

	pub fn message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	/// Sets the event time. Defaults to the moment [`build`](Self::build) runs.
	pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	/// Replaces the metadata with any value that encodes to a JSON object.
	///
	/// Encoding problems are not reported here; they surface as
	/// [`PayloadOutcome::Dropped`] from [`build`](Self::build).
	pub fn metadata<T>(mut self, metadata: &T) -> Self
	where
		T: Serialize + ?Sized,
	{
		match serde_json::to_value(metadata) {
			Ok(Value::Object(map)) => self.metadata = map,
			Ok(Value::Null) => self.metadata = Map::new(),
			Ok(other) => {
				self.encode_error = Some(format!(
					"metadata must encode to a JSON object, got {}",
					json_kind(&other)
				));
			}
			Err(e) => self.encode_error = Some(e.to_string()),
		}
		self
	}

	/// Replaces the metadata with a ready JSON object.
	pub fn metadata_map(mut self, metadata: Map<String, Value>) -> Self {
		self.metadata = metadata;
		self
	}

	/// Inserts a single metadata entry.
	pub fn meta<V>(mut self, key: impl Into<String>, value: V) -> Self
	where
		V: Serialize,
	{
		match serde_json::to_value(value) {
			Ok(value) => {
				self.metadata.insert(key.into(), value);
			}
			Err(e) => self.encode_error = Some(e.to_string()),
		}
		self
	}

	/// Validates and encodes the submission.
	pub fn build(self) -> Result<PayloadOutcome> {
		validate_action(&self.action)?;

		if let Some(diagnostic) = self.encode_error {
			error!(action = %self.action, diagnostic = %diagnostic, "serialization failed, event dropped");
			return Ok(PayloadOutcome::Dropped { diagnostic });
		}

		let timestamp = self.timestamp.unwrap_or_else(Utc::now);
		let submission = EventSubmission {
			action: self.action,
			user_id: self.user_id,
			resource: self.resource,
			metadata: self.metadata,
			level: self.level,
			message: self.message,
			timestamp: format_timestamp(&timestamp),
		};

		let body = match serde_json::to_string(&submission) {
			Ok(body) => body,
			Err(e) => {
				let diagnostic = e.to_string();
				error!(action = %submission.action, diagnostic = %diagnostic, "serialization failed, event dropped");
				return Ok(PayloadOutcome::Dropped { diagnostic });
			}
		};

		if body.len() > MAX_PAYLOAD_SIZE {
			return Err(LogVaultError::Validation(format!(
				"payload size {} bytes exceeds the {MAX_PAYLOAD_SIZE} byte limit",
				body.len()
			)));
		}

		Ok(PayloadOutcome::Encoded(EncodedPayload { submission, body }))
	}
}

/// RFC 3339 with microseconds and an explicit `Z` offset.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
	timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
