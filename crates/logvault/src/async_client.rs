// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Async LogVault client for use inside a tokio runtime.
//!
//! Retries are explicit in [`AsyncClient`]'s request loop and use the
//! jittered exponential schedule. Backoff sleeps suspend only the calling
//! task. Both attempts and sleeps race the client's cancellation tokens.
//!
//! # Example
//!
//! ```no_run
//! use logvault::{AsyncClient, ClientConfig, EventBuilder};
//!
//! # async fn run() -> logvault::Result<()> {
//! let config = ClientConfig::builder().api_key("lv_live_xxx").build()?;
//!
//! AsyncClient::scoped(config, |client| async move {
//!     client.log(EventBuilder::new("document.delete").resource("document:456")).await?;
//!     Ok::<_, logvault::LogVaultError>(())
//! })
//! .await
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use logvault_common_http::{
	default_headers, new_async_client, AsyncTransport, ReqwestTransport,
};
use logvault_core::{
	BackoffSchedule, Endpoint, EventBuilder, ListQuery, LogVaultError, PayloadOutcome, Result,
	SearchQuery,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::dispatch::{build_request, step, Step};
use crate::session::{Connector, Session, SessionOrigin};

struct AsyncInner {
	config: ClientConfig,
	session: Session,
	root: CancellationToken,
}

/// Cooperative client. Clones share one session and one root token.
#[derive(Clone)]
pub struct AsyncClient {
	inner: Arc<AsyncInner>,
	token: Option<CancellationToken>,
}

impl AsyncClient {
	/// Creates a client whose session opens on first use.
	///
	/// Prefer [`connect`](Self::connect) or [`scoped`](Self::scoped); a
	/// session opened by a request is logged as implicit.
	pub fn new(config: ClientConfig) -> Result<Self> {
		default_headers(&config.credential)?;

		let credential = config.credential.clone();
		let timeout = config.total_timeout;
		let connector: Connector = Box::new(move || -> Result<Arc<dyn AsyncTransport>> {
			let http = new_async_client(&credential, timeout)?;
			Ok(Arc::new(ReqwestTransport::new(http)) as Arc<dyn AsyncTransport>)
		});
		Ok(Self::with_connector(config, connector))
	}

	/// Creates a client and opens its session.
	pub async fn connect(config: ClientConfig) -> Result<Self> {
		let client = Self::new(config)?;
		client.open().await?;
		Ok(client)
	}

	/// Creates a client over any [`AsyncTransport`]. The session still
	/// follows the explicit/implicit lifecycle.
	pub fn with_transport(config: ClientConfig, transport: Arc<dyn AsyncTransport>) -> Self {
		let connector: Connector =
			Box::new(move || -> Result<Arc<dyn AsyncTransport>> { Ok(Arc::clone(&transport)) });
		Self::with_connector(config, connector)
	}

	fn with_connector(config: ClientConfig, connector: Connector) -> Self {
		info!(
			base_url = %config.base_url,
			max_retries = config.retry_policy.max_retries,
			"LogVault async client initialized"
		);
		Self {
			inner: Arc::new(AsyncInner {
				config,
				session: Session::new(connector),
				root: CancellationToken::new(),
			}),
			token: None,
		}
	}

	/// Runs `f` with a connected client and closes the session afterwards,
	/// whether `f` succeeded or not.
	pub async fn scoped<F, Fut, T>(config: ClientConfig, f: F) -> Result<T>
	where
		F: FnOnce(AsyncClient) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let client = Self::connect(config).await?;
		let result = f(client.clone()).await;
		client.close().await;
		result
	}

	/// Opens the session explicitly. No-op when it is already open.
	pub async fn open(&self) -> Result<()> {
		self.inner.session.acquire(SessionOrigin::Explicit).await?;
		Ok(())
	}

	/// Releases the session. Later calls fail with `ClientClosed`.
	/// Calling `close` again has no effect.
	pub async fn close(&self) {
		self.inner.session.close().await;
	}

	/// Cancels every in-flight call on every clone, then closes.
	pub async fn shutdown(&self) {
		self.inner.root.cancel();
		self.close().await;
	}

	pub async fn is_closed(&self) -> bool {
		self.inner.session.is_closed().await
	}

	/// How the open session was created; `None` before it opens or after
	/// [`close`](Self::close).
	pub async fn session_origin(&self) -> Option<SessionOrigin> {
		self.inner.session.origin().await
	}

	/// Returns a handle whose calls abort with `Cancelled` once `token` fires.
	pub fn with_cancellation(&self, token: CancellationToken) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
			token: Some(token),
		}
	}

	/// The client-wide token cancelled by [`shutdown`](Self::shutdown).
	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.inner.root
	}

	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// Submits an audit event.
	///
	/// Returns the created event, or `None` when the metadata could not be
	/// encoded and the event was dropped without a request.
	pub async fn log(&self, event: EventBuilder) -> Result<Option<Value>> {
		match event.build()? {
			PayloadOutcome::Encoded(payload) => self
				.execute(Endpoint::CreateEvent, Vec::new(), Some(payload.into_body()))
				.await
				.map(Some),
			PayloadOutcome::Dropped { .. } => Ok(None),
		}
	}

	pub async fn list_events(&self, query: &ListQuery) -> Result<Value> {
		self.execute(Endpoint::ListEvents, query.to_params()?, None).await
	}

	pub async fn get_event(&self, event_id: &str) -> Result<Value> {
		self.execute(Endpoint::GetEvent(event_id.to_string()), Vec::new(), None)
			.await
	}

	/// Asks the server to re-check the event's signature.
	pub async fn verify_event(&self, event_id: &str) -> Result<Value> {
		self.execute(Endpoint::VerifyEvent(event_id.to_string()), Vec::new(), None)
			.await
	}

	pub async fn search_events(&self, query: &SearchQuery) -> Result<Value> {
		self.execute(Endpoint::SearchEvents, query.to_params()?, None)
			.await
	}

	fn is_cancelled(&self) -> bool {
		self.inner.root.is_cancelled() || self.token.as_ref().is_some_and(|t| t.is_cancelled())
	}

	async fn cancelled(&self) {
		match &self.token {
			Some(token) => tokio::select! {
				() = self.inner.root.cancelled() => {}
				() = token.cancelled() => {}
			},
			None => self.inner.root.cancelled().await,
		}
	}

	async fn execute(
		&self,
		endpoint: Endpoint,
		query: Vec<(&'static str, String)>,
		body: Option<String>,
	) -> Result<Value> {
		let request = build_request(&self.inner.config.base_url, &endpoint, query, body)?;
		if self.is_cancelled() {
			return Err(LogVaultError::Cancelled);
		}
		let transport = self.inner.session.acquire(SessionOrigin::Implicit).await?;
		let policy = &self.inner.config.retry_policy;

		let mut retries = 0u32;
		loop {
			let attempts = retries + 1;
			debug!(method = %request.method, path = %request.url.path(), attempt = attempts, "sending request");

			let result = tokio::select! {
				biased;
				() = self.cancelled() => return Err(LogVaultError::Cancelled),
				result = transport.send(&request) => result,
			};

			let transient = match step(policy, &endpoint, &result, attempts) {
				Step::Done(outcome) => return outcome,
				Step::Retry(transient) => transient,
			};
			if !policy.allows_retry(request.method, retries) {
				return Err(transient.exhausted(attempts));
			}

			retries += 1;
			let delay = policy.delay(BackoffSchedule::JitteredExponential, retries);
			warn!(
				reason = %transient.label(),
				attempt = attempts,
				max_attempts = policy.max_attempts(),
				delay_ms = delay.as_millis() as u64,
				"retrying after transient failure"
			);

			tokio::select! {
				biased;
				() = self.cancelled() => return Err(LogVaultError::Cancelled),
				() = tokio::time::sleep(delay) => {}
			}
		}
	}
}

impl fmt::Debug for AsyncClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AsyncClient")
			.field("config", &self.inner.config)
			.field("cancelled", &self.is_cancelled())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use logvault_common_http::{HttpRequest, HttpResponse, TransportResult};
	use logvault_core::FailureCategory;
	use std::collections::VecDeque;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Mutex;
	use std::time::Duration;
	use tokio::time::Instant;

	struct Scripted {
		responses: Mutex<VecDeque<TransportResult>>,
		calls: AtomicU32,
	}

	impl Scripted {
		fn new(responses: Vec<TransportResult>) -> Arc<Self> {
			Arc::new(Self {
				responses: Mutex::new(responses.into()),
				calls: AtomicU32::new(0),
			})
		}

		fn calls(&self) -> u32 {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl AsyncTransport for Scripted {
		async fn send(&self, _request: &HttpRequest) -> TransportResult {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let next = self.responses.lock().unwrap().pop_front();
			next.unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
		}
	}

	/// Never answers.
	struct Hang;

	#[async_trait]
	impl AsyncTransport for Hang {
		async fn send(&self, _request: &HttpRequest) -> TransportResult {
			tokio::time::sleep(Duration::from_secs(3600)).await;
			Err(FailureCategory::Timeout)
		}
	}

	fn config(backoff: Duration) -> ClientConfig {
		ClientConfig::builder()
			.api_key("lv_test_abc123")
			.backoff_base(backoff)
			.build()
			.unwrap()
	}

	fn client(transport: Arc<Scripted>) -> AsyncClient {
		AsyncClient::with_transport(config(Duration::from_millis(1)), transport)
	}

	#[tokio::test]
	async fn unauthorized_is_not_retried() {
		let transport = Scripted::new(vec![Ok(HttpResponse::new(401, ""))]);
		let client = client(transport.clone());

		let err = client.log(EventBuilder::new("user.login")).await.unwrap_err();
		assert!(matches!(err, LogVaultError::Authentication(_)));
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn unprocessable_is_not_retried() {
		let transport = Scripted::new(vec![Ok(HttpResponse::new(422, r#"{"detail":"nope"}"#))]);
		let client = client(transport.clone());

		let err = client.log(EventBuilder::new("user.login")).await.unwrap_err();
		assert_eq!(err, LogVaultError::Validation("nope".to_string()));
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn server_errors_then_success() {
		let transport = Scripted::new(vec![
			Ok(HttpResponse::new(503, "")),
			Err(FailureCategory::Timeout),
			Ok(HttpResponse::new(201, r#"{"id":"evt_1"}"#)),
		]);
		let client = client(transport.clone());

		let created = client
			.log(EventBuilder::new("user.login"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(created["id"], "evt_1");
		assert_eq!(transport.calls(), 3);
	}

	#[tokio::test]
	async fn persistent_server_error_exhausts_budget() {
		let transport = Scripted::new(vec![Ok(HttpResponse::new(503, "")); 10]);
		let client = client(transport.clone());

		let err = client.log(EventBuilder::new("user.login")).await.unwrap_err();
		assert_eq!(err.status(), Some(503));
		assert_eq!(transport.calls(), 4);
	}

	#[tokio::test]
	async fn persistent_rate_limit_keeps_retry_after() {
		let transport = Scripted::new(vec![
			Ok(HttpResponse::new(429, "").with_retry_after(60));
			10
		]);
		let client = client(transport.clone());

		let err = client.log(EventBuilder::new("user.login")).await.unwrap_err();
		assert_eq!(
			err,
			LogVaultError::RateLimited {
				retry_after_secs: Some(60),
				attempts: 4
			}
		);
		assert_eq!(transport.calls(), 4);
	}

	#[tokio::test]
	async fn get_server_error_is_single_attempt() {
		let transport = Scripted::new(vec![Ok(HttpResponse::new(503, "")); 4]);
		let client = client(transport.clone());

		let err = client.get_event("evt_1").await.unwrap_err();
		assert_eq!(err.status(), Some(503));
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn local_validation_sends_nothing() {
		let transport = Scripted::new(vec![]);
		let client = client(transport.clone());

		assert!(client.search_events(&SearchQuery::new("x")).await.is_err());
		assert!(client.list_events(&ListQuery::new().page(0)).await.is_err());
		assert!(client.verify_event("").await.is_err());
		assert!(client.log(EventBuilder::new("nodot")).await.is_err());
		assert_eq!(transport.calls(), 0);
		assert_eq!(client.session_origin().await, None);
	}

	#[tokio::test(start_paused = true)]
	async fn backoff_follows_jittered_schedule() {
		let transport = Scripted::new(vec![Ok(HttpResponse::new(503, "")); 10]);
		let client = AsyncClient::with_transport(config(Duration::from_secs(1)), transport.clone());

		let started = Instant::now();
		let err = client.log(EventBuilder::new("user.login")).await.unwrap_err();
		let elapsed = started.elapsed();

		assert_eq!(err.status(), Some(503));
		assert_eq!(transport.calls(), 4);
		// 2 + 4 + 8 seconds plus up to one second of jitter per retry.
		assert!(elapsed >= Duration::from_secs(14), "{elapsed:?}");
		assert!(elapsed <= Duration::from_secs(17), "{elapsed:?}");
	}

	#[tokio::test(start_paused = true)]
	async fn cancel_during_backoff_stops_retrying() {
		let transport = Scripted::new(vec![Ok(HttpResponse::new(503, "")); 10]);
		let client = AsyncClient::with_transport(config(Duration::from_secs(30)), transport.clone());
		let token = CancellationToken::new();
		let handle = client.with_cancellation(token.clone());

		let call = tokio::spawn(async move { handle.log(EventBuilder::new("user.login")).await });
		tokio::time::sleep(Duration::from_secs(5)).await;
		token.cancel();

		let err = call.await.unwrap().unwrap_err();
		assert_eq!(err, LogVaultError::Cancelled);
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn shutdown_aborts_in_flight_attempt() {
		let client = AsyncClient::with_transport(config(Duration::from_millis(1)), Arc::new(Hang));
		let worker = client.clone();

		let call = tokio::spawn(async move { worker.get_event("evt_1").await });
		tokio::time::sleep(Duration::from_secs(1)).await;
		client.shutdown().await;

		assert_eq!(call.await.unwrap().unwrap_err(), LogVaultError::Cancelled);
		assert!(client.is_closed().await);
	}

	#[tokio::test]
	async fn implicit_session_is_observable() {
		let client = client(Scripted::new(vec![]));
		assert_eq!(client.session_origin().await, None);

		client.list_events(&ListQuery::new()).await.unwrap();
		assert_eq!(client.session_origin().await, Some(SessionOrigin::Implicit));
	}

	#[tokio::test]
	async fn explicit_open_is_observable() {
		let client = client(Scripted::new(vec![]));
		client.open().await.unwrap();

		client.list_events(&ListQuery::new()).await.unwrap();
		assert_eq!(client.session_origin().await, Some(SessionOrigin::Explicit));
	}

	#[tokio::test]
	async fn closed_client_refuses_calls() {
		let transport = Scripted::new(vec![]);
		let client = client(transport.clone());
		client.open().await.unwrap();

		client.close().await;
		client.close().await;

		let err = client.get_event("evt_1").await.unwrap_err();
		assert_eq!(err, LogVaultError::ClientClosed);
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn new_validates_credential_header_eagerly() {
		let config = ClientConfig::builder()
			.api_key("lv_test_bad\nkey")
			.build()
			.unwrap();
		assert!(matches!(
			AsyncClient::new(config),
			Err(LogVaultError::Authentication(_))
		));
	}

	#[tokio::test]
	async fn debug_does_not_leak_key() {
		let client = client(Scripted::new(vec![]));
		assert!(!format!("{client:?}").contains("abc123"));
	}
}
