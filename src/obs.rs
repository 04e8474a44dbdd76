//! Optional observability helpers for cache and API operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `calendar_bridge.op` with the `op`
//!   (operation kind) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `calendar_bridge_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`, and `calendar_bridge_api_response_total`
//!   for every remote response, labeled by status `class`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Session blob reloaded into the in-memory cache.
	CacheLoad,
	/// In-memory cache flushed to the session store.
	CachePersist,
	/// Single cache entry deleted and flushed.
	CacheDelete,
	/// Cache emptied and its session slot removed.
	CacheClear,
	/// Access token handed out by a token provider.
	TokenAcquire,
	/// Authenticated call against the remote API.
	ApiRequest,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::CacheLoad => "cache_load",
			OpKind::CachePersist => "cache_persist",
			OpKind::CacheDelete => "cache_delete",
			OpKind::CacheClear => "cache_clear",
			OpKind::TokenAcquire => "token_acquire",
			OpKind::ApiRequest => "api_request",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}

	/// Maps a finished operation onto its outcome label.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure }
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
