// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retry policy and backoff schedules shared by both clients.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::endpoint::Method;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSchedule {
	/// `base × 2^(n-1)`: 1, 2, 4 … units. Used by the blocking retry adapter.
	Doubling,
	/// `base × 2^n + uniform(0, base)`. Used by the async retry loop.
	JitteredExponential,
}

/// Which requests are retried, how often and how long to wait.
///
/// A retryable request is attempted at most `max_retries + 1` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub backoff_base: Duration,
	pub retryable_statuses: BTreeSet<u16>,
	pub retryable_methods: BTreeSet<Method>,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: DEFAULT_MAX_RETRIES,
			backoff_base: DEFAULT_BACKOFF_BASE,
			retryable_statuses: std::iter::once(429).chain(500..=599).collect(),
			retryable_methods: BTreeSet::from([Method::Post]),
		}
	}
}

impl RetryPolicy {
	/// A policy that never retries.
	pub fn none() -> Self {
		Self {
			max_retries: 0,
			..Self::default()
		}
	}

	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;
		self
	}

	pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
		self.backoff_base = backoff_base;
		self
	}

	pub fn with_retryable_method(mut self, method: Method) -> Self {
		self.retryable_methods.insert(method);
		self
	}

	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	pub fn is_retryable_status(&self, status: u16) -> bool {
		self.retryable_statuses.contains(&status)
	}

	pub fn retries_method(&self, method: Method) -> bool {
		self.retryable_methods.contains(&method)
	}

	/// Whether another attempt is allowed after `retries_so_far` retries.
	pub fn allows_retry(&self, method: Method, retries_so_far: u32) -> bool {
		self.retries_method(method) && retries_so_far < self.max_retries
	}

	/// Delay before retry number `retry` (1-based).
	pub fn delay(&self, schedule: BackoffSchedule, retry: u32) -> Duration {
		match schedule {
			BackoffSchedule::Doubling => self.doubling_delay(retry),
			BackoffSchedule::JitteredExponential => self.jittered_delay_with(retry, fastrand::f64()),
		}
	}

	pub fn doubling_delay(&self, retry: u32) -> Duration {
		self.backoff_base
			.saturating_mul(pow2(retry.saturating_sub(1)))
	}

	/// Jittered delay with an explicit jitter fraction in `[0, 1)`.
	pub fn jittered_delay_with(&self, retry: u32, jitter: f64) -> Duration {
		let exponential = self.backoff_base.saturating_mul(pow2(retry));
		exponential.saturating_add(self.backoff_base.mul_f64(jitter.clamp(0.0, 1.0)))
	}
}

fn pow2(exp: u32) -> u32 {
	1u32.checked_shl(exp).unwrap_or(u32::MAX)
}
