// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event action names in `domain.event` form.

use crate::error::{LogVaultError, Result};

/// Validates an action name.
///
/// Valid actions must:
/// - Consist of at least two segments separated by `.`
/// - Have every segment non-empty and made only of ASCII letters, digits or `_`
///
/// Letters are accepted in either case. `user.login`, `billing.invoice.paid`
/// and `Auth.Failed_2FA` pass; `login`, `.user.login`, `user..login` and
/// `user-login.ok` do not.
pub fn validate_action(action: &str) -> Result<()> {
	if is_valid_action(action) {
		Ok(())
	} else {
		Err(LogVaultError::Validation(format!(
			"invalid action format '{action}', expected 'domain.event'"
		)))
	}
}

/// Boolean form of [`validate_action`].
pub fn is_valid_action(action: &str) -> bool {
	let mut segments = 0usize;
	for segment in action.split('.') {
		if segment.is_empty() || !segment.bytes().all(is_segment_byte) {
			return false;
		}
		segments += 1;
	}
	segments >= 2
}

fn is_segment_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || b == b'_'
}
