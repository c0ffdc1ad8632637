// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the LogVault audit-logging SDK.
//!
//! Everything here is free of I/O so that the blocking and async clients in
//! the `logvault` crate share one definition of:
//!
//! - action validation and payload encoding
//! - list/search query filters
//! - the retry policy and its backoff schedules
//! - status classification and the error taxonomy

pub mod action;
pub mod classify;
pub mod credential;
pub mod endpoint;
pub mod error;
pub mod payload;
pub mod policy;
pub mod query;

pub use action::{is_valid_action, validate_action};
pub use classify::{classify_failure, classify_status, decode_success, Classification, Transient};
pub use credential::{Credential, CredentialMode};
pub use endpoint::{Endpoint, Method};
pub use error::{ApiError, ApiErrorKind, FailureCategory, LogVaultError, Result};
pub use payload::{
	EncodedPayload, EventBuilder, EventSubmission, PayloadOutcome, MAX_PAYLOAD_SIZE,
};
pub use policy::{BackoffSchedule, RetryPolicy};
pub use query::{ListQuery, SearchQuery};
