// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry adapter for the blocking client.
//!
//! The adapter wraps a [`BlockingTransport`] and retries below the client
//! call boundary: the client sees one call and gets back the last attempt.

use std::thread;
use std::time::{Duration, Instant};

use logvault_common_http::{BlockingTransport, HttpRequest, TransportResult};
use logvault_core::{BackoffSchedule, Endpoint, LogVaultError, Result, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::{step, Step};

/// Granularity at which a backoff sleep notices cancellation.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The last attempt made and how many attempts it took.
#[derive(Debug)]
pub struct Attempted {
	pub result: TransportResult,
	pub attempts: u32,
}

/// Blocking transport with retries on the doubling schedule.
#[derive(Debug, Clone)]
pub struct RetryAdapter<T> {
	inner: T,
	policy: RetryPolicy,
}

impl<T: BlockingTransport> RetryAdapter<T> {
	pub fn new(inner: T, policy: RetryPolicy) -> Self {
		Self { inner, policy }
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// Sends `request`, retrying transient outcomes while the policy allows.
	///
	/// Returns `Cancelled` if `token` fires before an attempt or during a
	/// backoff sleep. An attempt already in flight runs to its timeout.
	pub fn execute(
		&self,
		request: &HttpRequest,
		endpoint: &Endpoint,
		token: &CancellationToken,
	) -> Result<Attempted> {
		let mut attempts = 0u32;

		loop {
			if token.is_cancelled() {
				return Err(LogVaultError::Cancelled);
			}

			attempts += 1;
			debug!(method = %request.method, path = %request.url.path(), attempt = attempts, "sending request");
			let result = self.inner.send(request);

			let transient = match step(&self.policy, endpoint, &result, attempts) {
				Step::Retry(transient) if self.policy.allows_retry(request.method, attempts - 1) => {
					transient
				}
				_ => return Ok(Attempted { result, attempts }),
			};

			let delay = self.policy.delay(BackoffSchedule::Doubling, attempts);
			warn!(
				reason = %transient.label(),
				attempt = attempts,
				max_attempts = self.policy.max_attempts(),
				delay_ms = delay.as_millis() as u64,
				"retrying after transient failure"
			);
			sleep_cancellable(delay, token)?;
		}
	}
}

/// Sleeps for `delay`, waking every [`CANCEL_POLL_INTERVAL`] to check
/// `token`.
pub(crate) fn sleep_cancellable(delay: Duration, token: &CancellationToken) -> Result<()> {
	let deadline = Instant::now() + delay;
	loop {
		if token.is_cancelled() {
			return Err(LogVaultError::Cancelled);
		}
		let remaining = deadline.saturating_duration_since(Instant::now());
		if remaining.is_zero() {
			return Ok(());
		}
		thread::sleep(remaining.min(CANCEL_POLL_INTERVAL));
	}
}
