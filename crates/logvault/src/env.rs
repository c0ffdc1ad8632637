// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment variable helpers for client configuration.
//!
//! The API key supports the `*_FILE` convention used by Docker and
//! Kubernetes secrets: `LOGVAULT_API_KEY_FILE=/run/secrets/logvault` is read
//! in preference to `LOGVAULT_API_KEY`.

use std::path::PathBuf;
use std::{env, fs};

use thiserror::Error;

pub const API_KEY_VAR: &str = "LOGVAULT_API_KEY";
pub const BASE_URL_VAR: &str = "LOGVAULT_BASE_URL";
pub const MAX_RETRIES_VAR: &str = "LOGVAULT_MAX_RETRIES";

/// Errors that can occur when reading configuration from the environment.
#[derive(Debug, Error)]
pub enum EnvError {
	/// Failed to read the secret file.
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The secret file path was empty.
	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },

	/// Neither the variable nor its `_FILE` variant is set.
	#[error("required secret not found: set either {var} or {file_var}")]
	Missing { var: String, file_var: String },

	/// The variable is set but cannot be parsed.
	#[error("{var} is not valid: {reason}")]
	Invalid { var: String, reason: String },
}

/// Load a secret using the `VAR` / `VAR_FILE` convention.
///
/// `VAR_FILE` wins when both are set. One trailing newline is stripped from
/// file content; everything else is kept as-is.
pub fn load_secret_env(var: &str) -> Result<Option<String>, EnvError> {
	load_secret_with(var, |name| env::var(name).ok())
}

/// Like [`load_secret_env`] but fails when the secret is absent.
pub fn require_secret_env(var: &str) -> Result<String, EnvError> {
	load_secret_env(var)?.ok_or_else(|| EnvError::Missing {
		var: var.to_string(),
		file_var: format!("{var}_FILE"),
	})
}

pub(crate) fn load_secret_with<F>(var: &str, lookup: F) -> Result<Option<String>, EnvError>
where
	F: Fn(&str) -> Option<String>,
{
	let file_var = format!("{var}_FILE");

	if let Some(path_str) = lookup(&file_var) {
		if path_str.is_empty() {
			return Err(EnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|e| EnvError::Io {
			path: path.clone(),
			source: e,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content);
		let secret = secret.strip_suffix('\r').unwrap_or(secret);
		return Ok(Some(secret.to_string()));
	}

	Ok(lookup(var))
}

pub(crate) fn parse_var<T, F>(var: &str, lookup: &F) -> Result<Option<T>, EnvError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
	F: Fn(&str) -> Option<String>,
{
	match lookup(var) {
		Some(raw) => raw
			.trim()
			.parse()
			.map(Some)
			.map_err(|e: T::Err| EnvError::Invalid {
				var: var.to_string(),
				reason: e.to_string(),
			}),
		None => Ok(None),
	}
}
