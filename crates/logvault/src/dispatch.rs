// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request assembly and attempt resolution shared by both clients.

use logvault_common_http::{endpoint_url, HttpRequest, TransportResult, Url};
use logvault_core::{
	classify_failure, classify_status, decode_success, Classification, Endpoint, RetryPolicy,
	Result, Transient,
};
use serde_json::Value;

/// Resolves `endpoint` against `base` after local validation.
pub(crate) fn build_request(
	base: &Url,
	endpoint: &Endpoint,
	query: Vec<(&'static str, String)>,
	body: Option<String>,
) -> Result<HttpRequest> {
	endpoint.validate()?;
	Ok(HttpRequest {
		method: endpoint.method(),
		url: endpoint_url(base, endpoint)?,
		query,
		body,
	})
}

/// What to do after one attempt.
#[derive(Debug)]
pub(crate) enum Step {
	Done(Result<Value>),
	Retry(Transient),
}

pub(crate) fn step(
	policy: &RetryPolicy,
	endpoint: &Endpoint,
	result: &TransportResult,
	attempts: u32,
) -> Step {
	match result {
		Ok(response) => match classify_status(
			policy,
			endpoint,
			response.status,
			response.retry_after_secs,
			&response.body,
			attempts,
		) {
			Classification::Success => {
				Step::Done(decode_success(response.status, &response.body, attempts))
			}
			Classification::Fatal(err) => Step::Done(Err(err)),
			Classification::Transient(transient) => Step::Retry(transient),
		},
		Err(category) => match classify_failure(*category, attempts) {
			Classification::Transient(transient) => Step::Retry(transient),
			Classification::Fatal(err) => Step::Done(Err(err)),
			Classification::Success => unreachable!("a failed request cannot classify as success"),
		},
	}
}

/// Final result of the last attempt when no more retries will be made.
pub(crate) fn resolve(
	policy: &RetryPolicy,
	endpoint: &Endpoint,
	result: &TransportResult,
	attempts: u32,
) -> Result<Value> {
	match step(policy, endpoint, result, attempts) {
		Step::Done(outcome) => outcome,
		Step::Retry(transient) => Err(transient.exhausted(attempts)),
	}
}
