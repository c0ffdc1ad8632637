// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the LogVault SDK.
//!
//! This crate provides:
//! - Pre-configured blocking and async `reqwest` clients carrying the
//!   LogVault User-Agent, version and authorization headers
//! - Single-attempt transports behind the [`BlockingTransport`] and
//!   [`AsyncTransport`] traits

mod client;
mod transport;

pub use client::{
	default_headers, headers, new_async_client, new_blocking_client, user_agent, Flavor,
	SDK_VERSION,
};
pub use transport::{
	categorize, categorize_body, endpoint_url, parse_retry_after, AsyncTransport,
	BlockingTransport, HttpRequest, HttpResponse, ReqwestBlockingTransport, ReqwestTransport,
	TransportResult,
};
pub use reqwest::Url;
