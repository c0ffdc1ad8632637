// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-attempt HTTP transports.
//!
//! A transport sends exactly one request and reports either the response or
//! the [`FailureCategory`] of the failure. Retrying and status
//! classification happen above this layer, so the `reqwest` implementations
//! and the fakes used in tests are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use logvault_core::{Endpoint, FailureCategory, LogVaultError, Method, Result};
use reqwest::header::HeaderMap;
use reqwest::Url;
use tracing::trace;

use crate::client::headers;

/// One request, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
	pub method: Method,
	pub url: Url,
	pub query: Vec<(&'static str, String)>,
	pub body: Option<String>,
}

/// The parts of a response the SDK looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub retry_after_secs: Option<u64>,
	pub body: String,
}

impl HttpResponse {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			retry_after_secs: None,
			body: body.into(),
		}
	}

	pub fn with_retry_after(mut self, secs: u64) -> Self {
		self.retry_after_secs = Some(secs);
		self
	}
}

pub type TransportResult = std::result::Result<HttpResponse, FailureCategory>;

/// Thread-blocking transport. Implementations must be safe to share
/// between threads.
pub trait BlockingTransport: Send + Sync {
	fn send(&self, request: &HttpRequest) -> TransportResult;
}

/// Cooperative transport for use inside a tokio runtime.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
	async fn send(&self, request: &HttpRequest) -> TransportResult;
}

impl<T: BlockingTransport + ?Sized> BlockingTransport for Arc<T> {
	fn send(&self, request: &HttpRequest) -> TransportResult {
		(**self).send(request)
	}
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Arc<T> {
	async fn send(&self, request: &HttpRequest) -> TransportResult {
		(**self).send(request).await
	}
}

/// Resolves an endpoint against the base URL.
///
/// Endpoint segments are appended to the base path and percent-encoded, so
/// an event id can never escape its path segment.
pub fn endpoint_url(base: &Url, endpoint: &Endpoint) -> Result<Url> {
	let mut url = base.clone();
	{
		let mut segments = url
			.path_segments_mut()
			.map_err(|_| LogVaultError::validation("base URL cannot carry a path"))?;
		segments.pop_if_empty();
		segments.extend(endpoint.path_segments());
	}
	Ok(url)
}

/// Maps a reqwest error onto a category, discarding everything else.
pub fn categorize(err: &reqwest::Error) -> FailureCategory {
	if err.is_timeout() {
		FailureCategory::Timeout
	} else if err.is_connect() {
		FailureCategory::Connect
	} else if err.is_decode() {
		FailureCategory::Decode
	} else if err.is_body() {
		FailureCategory::Body
	} else if err.is_request() || err.is_builder() {
		FailureCategory::Request
	} else {
		FailureCategory::Other
	}
}

/// Maps a failure while reading the response body. The status line has
/// already arrived, so anything but a deadline is the connection going away.
pub fn categorize_body(err: &reqwest::Error) -> FailureCategory {
	if err.is_timeout() {
		FailureCategory::Timeout
	} else {
		FailureCategory::Body
	}
}

/// Parses `Retry-After` given in whole seconds. HTTP-date values are ignored.
pub fn parse_retry_after(map: &HeaderMap) -> Option<u64> {
	map.get(headers::RETRY_AFTER)
		.and_then(|v| v.to_str().ok())
		.and_then(|s| s.trim().parse().ok())
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
	}
}

/// [`AsyncTransport`] over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
	async fn send(&self, request: &HttpRequest) -> TransportResult {
		let mut builder = self
			.client
			.request(to_reqwest_method(request.method), request.url.clone());
		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}
		if let Some(body) = &request.body {
			builder = builder.body(body.clone());
		}

		let response = builder.send().await.map_err(|e| categorize(&e))?;
		let status = response.status().as_u16();
		let retry_after_secs = parse_retry_after(response.headers());
		let body = response.text().await.map_err(|e| categorize_body(&e))?;
		trace!(status, bytes = body.len(), "response received");

		Ok(HttpResponse {
			status,
			retry_after_secs,
			body,
		})
	}
}

/// [`BlockingTransport`] over a pooled `reqwest::blocking::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestBlockingTransport {
	client: reqwest::blocking::Client,
}

impl ReqwestBlockingTransport {
	pub fn new(client: reqwest::blocking::Client) -> Self {
		Self { client }
	}
}

impl BlockingTransport for ReqwestBlockingTransport {
	fn send(&self, request: &HttpRequest) -> TransportResult {
		let mut builder = self
			.client
			.request(to_reqwest_method(request.method), request.url.clone());
		if !request.query.is_empty() {
			builder = builder.query(&request.query);
		}
		if let Some(body) = &request.body {
			builder = builder.body(body.clone());
		}

		let response = builder.send().map_err(|e| categorize(&e))?;
		let status = response.status().as_u16();
		let retry_after_secs = parse_retry_after(response.headers());
		let body = response.text().map_err(|e| categorize_body(&e))?;
		trace!(status, bytes = body.len(), "response received");

		Ok(HttpResponse {
			status,
			retry_after_secs,
			body,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::new_async_client;
	use logvault_core::Credential;
	use reqwest::header::HeaderValue;
	use std::time::Duration;
	use wiremock::matchers::{body_string, header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn base(url: &str) -> Url {
		Url::parse(url).unwrap()
	}

	#[test]
	fn endpoint_url_appends_to_base_path() {
		let url = endpoint_url(&base("https://api.logvault.eu"), &Endpoint::CreateEvent).unwrap();
		assert_eq!(url.as_str(), "https://api.logvault.eu/v1/events");

		let url = endpoint_url(
			&base("https://example.com/api"),
			&Endpoint::VerifyEvent("evt_1".into()),
		)
		.unwrap();
		assert_eq!(url.as_str(), "https://example.com/api/v1/events/evt_1/verify");
	}

	#[test]
	fn event_id_is_encoded_as_one_segment() {
		let url = endpoint_url(
			&base("https://example.com"),
			&Endpoint::GetEvent("a/b?c".into()),
		)
		.unwrap();
		assert_eq!(url.path(), "/v1/events/a%2Fb%3Fc");
		assert_eq!(url.query(), None);
	}

	#[test]
	fn retry_after_seconds() {
		let mut map = HeaderMap::new();
		assert_eq!(parse_retry_after(&map), None);

		map.insert(headers::RETRY_AFTER, HeaderValue::from_static("60"));
		assert_eq!(parse_retry_after(&map), Some(60));

		map.insert(
			headers::RETRY_AFTER,
			HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
		);
		assert_eq!(parse_retry_after(&map), None);
	}

	#[tokio::test]
	async fn reqwest_transport_sends_headers_query_and_body() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/v1/events"))
			.and(header("authorization", "Bearer lv_test_abc123"))
			.and(header("content-type", "application/json"))
			.and(query_param("dry_run", "1"))
			.and(body_string(r#"{"action":"user.login"}"#))
			.respond_with(
				ResponseTemplate::new(429)
					.insert_header("Retry-After", "7")
					.set_body_string("slow down"),
			)
			.expect(1)
			.mount(&server)
			.await;

		let credential = Credential::new("lv_test_abc123").unwrap();
		let transport = ReqwestTransport::new(
			new_async_client(&credential, Duration::from_secs(5)).unwrap(),
		);
		let request = HttpRequest {
			method: Method::Post,
			url: endpoint_url(&base(&server.uri()), &Endpoint::CreateEvent).unwrap(),
			query: vec![("dry_run", "1".to_string())],
			body: Some(r#"{"action":"user.login"}"#.to_string()),
		};

		let response = transport.send(&request).await.unwrap();
		assert_eq!(response.status, 429);
		assert_eq!(response.retry_after_secs, Some(7));
		assert_eq!(response.body, "slow down");
	}

	/// Accepts one connection, promises 100 body bytes, sends 5 and hangs up.
	fn truncating_server() -> String {
		use std::io::{Read, Write};

		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();
		std::thread::spawn(move || {
			let (mut stream, _) = listener.accept().unwrap();
			let mut buf = [0u8; 8192];
			let _ = stream.read(&mut buf);
			let _ = stream.write_all(
				b"HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"id\"",
			);
			let _ = stream.flush();
		});
		format!("http://{addr}/v1/events")
	}

	#[tokio::test]
	async fn truncated_body_is_a_transient_read_failure() {
		let credential = Credential::new("lv_test_abc123").unwrap();
		let transport = ReqwestTransport::new(
			new_async_client(&credential, Duration::from_secs(5)).unwrap(),
		);
		let request = HttpRequest {
			method: Method::Get,
			url: base(&truncating_server()),
			query: vec![],
			body: None,
		};

		let failure = transport.send(&request).await.unwrap_err();
		assert_eq!(failure, FailureCategory::Body);
		assert!(failure.is_transient());
	}

	#[tokio::test]
	async fn refused_connection_is_categorised() {
		let credential = Credential::new("lv_test_abc123").unwrap();
		let transport = ReqwestTransport::new(
			new_async_client(&credential, Duration::from_secs(5)).unwrap(),
		);
		let request = HttpRequest {
			method: Method::Get,
			url: base("http://127.0.0.1:1/v1/events"),
			query: vec![],
			body: None,
		};

		assert_eq!(
			transport.send(&request).await,
			Err(FailureCategory::Connect)
		);
	}
}
