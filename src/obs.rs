//! Observability helpers for token and API flows.
//!
//! Every flow runs inside a `shr_stay.flow` span carrying the `flow` and `stage` fields. With the
//! `metrics` feature enabled, flow outcomes, data-endpoint status families and room-cache lookups
//! are also counted.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Cached access token handed out without a grant.
	Cache,
	/// Refresh token grant.
	Refresh,
	/// Client credentials grant.
	ClientCredentials,
	/// Authenticated data request.
	ApiRequest,
	/// Room-list pipeline.
	RoomList,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Cache => "cache",
			FlowKind::Refresh => "refresh",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::ApiRequest => "api_request",
			FlowKind::RoomList => "room_list",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records success or failure for a finished flow.
pub fn record_result<T, E>(kind: FlowKind, result: &std::result::Result<T, E>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
