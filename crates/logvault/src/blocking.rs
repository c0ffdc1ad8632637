// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Blocking LogVault client.
//!
//! Each call occupies the calling thread. Retries happen inside the
//! [`RetryAdapter`], below the call boundary.
//!
//! # Example
//!
//! ```no_run
//! use logvault::{Client, ClientConfig, EventBuilder};
//!
//! let config = ClientConfig::builder().api_key("lv_live_xxx").build()?;
//! let client = Client::new(config)?;
//!
//! client.log(
//!     EventBuilder::new("user.login")
//!         .user_id("user_123")
//!         .meta("ip", "1.2.3.4"),
//! )?;
//! # Ok::<(), logvault::LogVaultError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use logvault_common_http::{new_blocking_client, BlockingTransport, ReqwestBlockingTransport};
use logvault_core::{Endpoint, EventBuilder, ListQuery, PayloadOutcome, Result, SearchQuery};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ClientConfig;
use crate::dispatch::{build_request, resolve};
use crate::retry::RetryAdapter;

struct ClientInner {
	config: ClientConfig,
	adapter: RetryAdapter<Arc<dyn BlockingTransport>>,
}

/// Thread-blocking client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct Client {
	inner: Arc<ClientInner>,
	token: CancellationToken,
}

impl Client {
	/// Builds a client over a pooled `reqwest::blocking::Client`.
	///
	/// Must not be called from inside an async runtime; use
	/// [`AsyncClient`](crate::AsyncClient) there.
	pub fn new(config: ClientConfig) -> Result<Self> {
		let http = new_blocking_client(
			&config.credential,
			config.connect_timeout,
			config.read_timeout,
		)?;
		Ok(Self::with_transport(
			config,
			Arc::new(ReqwestBlockingTransport::new(http)),
		))
	}

	/// Builds a client over any [`BlockingTransport`].
	pub fn with_transport(config: ClientConfig, transport: Arc<dyn BlockingTransport>) -> Self {
		info!(
			base_url = %config.base_url,
			max_retries = config.retry_policy.max_retries,
			"LogVault client initialized"
		);
		let adapter = RetryAdapter::new(transport, config.retry_policy.clone());
		Self {
			inner: Arc::new(ClientInner { config, adapter }),
			token: CancellationToken::new(),
		}
	}

	/// Returns a handle whose calls abort with `Cancelled` once `token` fires.
	pub fn with_cancellation(&self, token: CancellationToken) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
			token,
		}
	}

	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// Submits an audit event.
	///
	/// Returns the created event, or `None` when the metadata could not be
	/// encoded and the event was dropped without a request.
	pub fn log(&self, event: EventBuilder) -> Result<Option<Value>> {
		match event.build()? {
			PayloadOutcome::Encoded(payload) => self
				.execute(Endpoint::CreateEvent, Vec::new(), Some(payload.into_body()))
				.map(Some),
			PayloadOutcome::Dropped { .. } => Ok(None),
		}
	}

	/// Lists events, newest first, one page at a time.
	pub fn list_events(&self, query: &ListQuery) -> Result<Value> {
		self.execute(Endpoint::ListEvents, query.to_params()?, None)
	}

	pub fn get_event(&self, event_id: &str) -> Result<Value> {
		self.execute(Endpoint::GetEvent(event_id.to_string()), Vec::new(), None)
	}

	/// Asks the server to re-check the event's signature.
	pub fn verify_event(&self, event_id: &str) -> Result<Value> {
		self.execute(Endpoint::VerifyEvent(event_id.to_string()), Vec::new(), None)
	}

	pub fn search_events(&self, query: &SearchQuery) -> Result<Value> {
		self.execute(Endpoint::SearchEvents, query.to_params()?, None)
	}

	fn execute(
		&self,
		endpoint: Endpoint,
		query: Vec<(&'static str, String)>,
		body: Option<String>,
	) -> Result<Value> {
		let request = build_request(&self.inner.config.base_url, &endpoint, query, body)?;
		let attempted = self.inner.adapter.execute(&request, &endpoint, &self.token)?;
		resolve(
			self.inner.adapter.policy(),
			&endpoint,
			&attempted.result,
			attempted.attempts,
		)
	}
}

impl fmt::Debug for Client {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Client")
			.field("config", &self.inner.config)
			.field("cancelled", &self.token.is_cancelled())
			.finish()
	}
}
