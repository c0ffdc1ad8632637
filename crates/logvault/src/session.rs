// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The async client's owned HTTP session.
//!
//! The session is opened either explicitly ([`AsyncClient::connect`] /
//! [`AsyncClient::open`]) or implicitly on the first request. Implicit
//! creation is logged at `warn` level and remembered as
//! [`SessionOrigin::Implicit`] so callers can detect it.
//!
//! [`AsyncClient::connect`]: crate::AsyncClient::connect
//! [`AsyncClient::open`]: crate::AsyncClient::open

use std::sync::Arc;

use logvault_common_http::AsyncTransport;
use logvault_core::{LogVaultError, Result};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// How the current session came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
	/// Opened by the caller before the first request.
	Explicit,
	/// Opened on demand by a request.
	Implicit,
}

pub(crate) type Connector = Box<dyn Fn() -> Result<Arc<dyn AsyncTransport>> + Send + Sync>;

enum SessionState {
	Idle,
	Open {
		transport: Arc<dyn AsyncTransport>,
		origin: SessionOrigin,
	},
	Closed,
}

pub(crate) struct Session {
	connector: Connector,
	state: RwLock<SessionState>,
}

impl Session {
	pub(crate) fn new(connector: Connector) -> Self {
		Self {
			connector,
			state: RwLock::new(SessionState::Idle),
		}
	}

	/// Returns the open session, creating it if needed.
	pub(crate) async fn acquire(&self, origin: SessionOrigin) -> Result<Arc<dyn AsyncTransport>> {
		{
			let state = self.state.read().await;
			match &*state {
				SessionState::Open { transport, .. } => return Ok(Arc::clone(transport)),
				SessionState::Closed => return Err(LogVaultError::ClientClosed),
				SessionState::Idle => {}
			}
		}

		let mut state = self.state.write().await;
		match &*state {
			SessionState::Open { transport, .. } => Ok(Arc::clone(transport)),
			SessionState::Closed => Err(LogVaultError::ClientClosed),
			SessionState::Idle => {
				let transport = (self.connector)()?;
				match origin {
					SessionOrigin::Explicit => debug!("LogVault session opened"),
					SessionOrigin::Implicit => warn!(
						"LogVault session created implicitly; call AsyncClient::connect or \
						 AsyncClient::open before issuing requests"
					),
				}
				*state = SessionState::Open {
					transport: Arc::clone(&transport),
					origin,
				};
				Ok(transport)
			}
		}
	}

	pub(crate) async fn origin(&self) -> Option<SessionOrigin> {
		match &*self.state.read().await {
			SessionState::Open { origin, .. } => Some(*origin),
			_ => None,
		}
	}

	pub(crate) async fn is_closed(&self) -> bool {
		matches!(&*self.state.read().await, SessionState::Closed)
	}

	/// Releases the session. Returns `false` if it was already closed.
	pub(crate) async fn close(&self) -> bool {
		let mut state = self.state.write().await;
		let was_closed = matches!(&*state, SessionState::Closed);
		if matches!(&*state, SessionState::Open { .. }) {
			debug!("LogVault session closed");
		}
		*state = SessionState::Closed;
		!was_closed
	}
}
