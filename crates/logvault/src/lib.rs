// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for the LogVault audit-logging service.
//!
//! Two clients share one validation, payload and retry core:
//!
//! - [`Client`] blocks the calling thread and retries inside a
//!   [`RetryAdapter`] on the doubling schedule.
//! - [`AsyncClient`] runs inside tokio, retries in an explicit loop on the
//!   jittered exponential schedule and owns one pooled session.
//!
//! Both submit events (`POST /v1/events`), list and search them, fetch a
//! single event and ask the server to verify an event's signature.
//!
//! # Example
//!
//! ```no_run
//! use logvault::{Client, ClientConfig, EventBuilder, ListQuery};
//!
//! let client = Client::new(ClientConfig::from_env()?)?;
//!
//! let created = client.log(
//!     EventBuilder::new("document.delete")
//!         .user_id("user_123")
//!         .resource("document:456"),
//! )?;
//!
//! if let Some(event) = created {
//!     let id = event["id"].as_str().unwrap_or_default();
//!     let verdict = client.verify_event(id)?;
//!     println!("valid: {}", verdict["valid"]);
//! }
//!
//! let page = client.list_events(&ListQuery::new().user_id("user_123"))?;
//! # let _ = page;
//! # Ok::<(), logvault::LogVaultError>(())
//! ```

mod async_client;
mod blocking;
mod config;
mod dispatch;
pub mod env;
mod retry;
mod session;

pub use async_client::AsyncClient;
pub use blocking::Client;
pub use config::{
	ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT,
	DEFAULT_READ_TIMEOUT, DEFAULT_TOTAL_TIMEOUT,
};
pub use retry::{Attempted, RetryAdapter, CANCEL_POLL_INTERVAL};
pub use session::SessionOrigin;

pub use logvault_common_http::{
	AsyncTransport, BlockingTransport, HttpRequest, HttpResponse, TransportResult, SDK_VERSION,
};
pub use logvault_core::{
	validate_action, ApiError, ApiErrorKind, BackoffSchedule, Credential, CredentialMode, Endpoint,
	EventBuilder, FailureCategory, ListQuery, LogVaultError, Method, PayloadOutcome, Result,
	RetryPolicy, SearchQuery, MAX_PAYLOAD_SIZE,
};
pub use tokio_util::sync::CancellationToken;
