// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The LogVault HTTP endpoints the SDK talks to.

use std::fmt;

use crate::error::{LogVaultError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
	Get,
	Post,
}

impl Method {
	pub fn as_str(&self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One operation of the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
	/// `POST /v1/events`
	CreateEvent,
	/// `GET /v1/events`
	ListEvents,
	/// `GET /v1/events/{id}`
	GetEvent(String),
	/// `GET /v1/events/{id}/verify`
	VerifyEvent(String),
	/// `GET /v1/events/search`
	SearchEvents,
}

impl Endpoint {
	pub fn method(&self) -> Method {
		match self {
			Endpoint::CreateEvent => Method::Post,
			_ => Method::Get,
		}
	}

	/// Path segments relative to the base URL. Ids are returned raw and must
	/// be percent-encoded by the URL builder.
	pub fn path_segments(&self) -> Vec<&str> {
		match self {
			Endpoint::CreateEvent | Endpoint::ListEvents => vec!["v1", "events"],
			Endpoint::GetEvent(id) => vec!["v1", "events", id],
			Endpoint::VerifyEvent(id) => vec!["v1", "events", id, "verify"],
			Endpoint::SearchEvents => vec!["v1", "events", "search"],
		}
	}

	/// Id of the entity this endpoint is scoped to. A 404 from a scoped
	/// endpoint means the entity does not exist.
	pub fn entity_id(&self) -> Option<&str> {
		match self {
			Endpoint::GetEvent(id) | Endpoint::VerifyEvent(id) => Some(id),
			_ => None,
		}
	}

	/// Rejects requests that cannot address anything, before any I/O.
	pub fn validate(&self) -> Result<()> {
		match self.entity_id() {
			Some(id) if id.trim().is_empty() => Err(LogVaultError::validation("event id is required")),
			Some("." | "..") => Err(LogVaultError::validation("event id is not a valid path segment")),
			_ => Ok(()),
		}
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} /{}", self.method(), self.path_segments().join("/"))
	}
}
