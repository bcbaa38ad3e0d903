//! Counters exported through the global `metrics` recorder when the `metrics` feature is on.
//!
//! - `shr_stay_flow_total{flow, outcome}`: token and API flow attempts and results.
//! - `shr_stay_api_response_total{class, status}`: data-endpoint replies by host class and
//!   status family.
//! - `shr_stay_room_cache_total{result}`: room-list cache lookups.

// self
use crate::{
	config::ApiClass,
	obs::{FlowKind, FlowOutcome},
};

/// Result of a room-list cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheLookup {
	/// A stored list was served.
	Hit,
	/// Nothing usable was stored; the list was fetched.
	Miss,
	/// The caller skipped the read and forced a fetch.
	Bypass,
}
impl CacheLookup {
	/// Returns a stable label suitable for metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheLookup::Hit => "hit",
			CacheLookup::Miss => "miss",
			CacheLookup::Bypass => "bypass",
		}
	}
}

/// Records a flow outcome.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!("shr_stay_flow_total", "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records the HTTP status family of a data-endpoint reply.
pub fn record_api_response(class: ApiClass, code: u16) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"shr_stay_api_response_total",
		"class" => class.as_str(),
		"status" => status_family(code)
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (class, code);
}

/// Records a room-list cache lookup.
pub fn record_room_cache(lookup: CacheLookup) {
	#[cfg(feature = "metrics")]
	metrics::counter!("shr_stay_room_cache_total", "result" => lookup.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = lookup;
}

/// Buckets a status code into `1xx`..`5xx`, or `other` outside that range.
pub fn status_family(code: u16) -> &'static str {
	match code {
		100..=199 => "1xx",
		200..=299 => "2xx",
		300..=399 => "3xx",
		400..=499 => "4xx",
		500..=599 => "5xx",
		_ => "other",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_codes_bucket_by_family() {
		assert_eq!(status_family(200), "2xx");
		assert_eq!(status_family(403), "4xx");
		assert_eq!(status_family(503), "5xx");
		assert_eq!(status_family(42), "other");
	}

	#[test]
	fn counters_are_silent_without_a_recorder() {
		record_flow_outcome(FlowKind::RoomList, FlowOutcome::Failure);
		record_api_response(ApiClass::Distribution, 500);

		for lookup in [CacheLookup::Hit, CacheLookup::Miss, CacheLookup::Bypass] {
			record_room_cache(lookup);
		}

		assert_eq!(CacheLookup::Bypass.as_str(), "bypass");
	}
}
