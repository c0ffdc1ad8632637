// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Query filters for listing and searching events.

use crate::error::{LogVaultError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;

/// Filter for `GET /v1/events`.
///
/// # Example
///
/// ```
/// use logvault_core::ListQuery;
///
/// let query = ListQuery::new().page(2).page_size(500).action("user.*");
/// assert_eq!(query.effective_page_size(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
	page: u32,
	page_size: u32,
	user_id: Option<String>,
	action: Option<String>,
}

impl ListQuery {
	pub fn new() -> Self {
		Self {
			page: 1,
			page_size: DEFAULT_PAGE_SIZE,
			user_id: None,
			action: None,
		}
	}

	/// 1-indexed page number.
	pub fn page(mut self, page: u32) -> Self {
		self.page = page;
		self
	}

	/// Requested page size; clamped to `1..=100` when sent.
	pub fn page_size(mut self, page_size: u32) -> Self {
		self.page_size = page_size;
		self
	}

	pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	/// Action filter. The server accepts `*` wildcards.
	pub fn action(mut self, action: impl Into<String>) -> Self {
		self.action = Some(action.into());
		self
	}

	pub fn effective_page_size(&self) -> u32 {
		self.page_size.clamp(1, MAX_PAGE_SIZE)
	}

	/// Query string parameters, validated.
	pub fn to_params(&self) -> Result<Vec<(&'static str, String)>> {
		if self.page == 0 {
			return Err(LogVaultError::validation("page must be at least 1"));
		}

		let mut params = vec![
			("page", self.page.to_string()),
			("page_size", self.effective_page_size().to_string()),
		];
		if let Some(user_id) = self.user_id.as_deref().filter(|s| !s.is_empty()) {
			params.push(("user_id", user_id.to_string()));
		}
		if let Some(action) = self.action.as_deref().filter(|s| !s.is_empty()) {
			params.push(("action", action.to_string()));
		}
		Ok(params)
	}
}

impl Default for ListQuery {
	fn default() -> Self {
		Self::new()
	}
}

/// Filter for `GET /v1/events/search`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
	query: String,
	limit: u32,
}

impl SearchQuery {
	/// Natural-language query, e.g. `failed login attempts`.
	pub fn new(query: impl Into<String>) -> Self {
		Self {
			query: query.into(),
			limit: DEFAULT_SEARCH_LIMIT,
		}
	}

	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = limit;
		self
	}

	pub fn to_params(&self) -> Result<Vec<(&'static str, String)>> {
		if self.query.chars().count() < MIN_SEARCH_QUERY_CHARS {
			return Err(LogVaultError::validation(
				"query must be at least 2 characters",
			));
		}
		Ok(vec![
			("q", self.query.clone()),
			("limit", self.limit.max(1).to_string()),
		])
	}
}
