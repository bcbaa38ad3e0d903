//! Diagnostics snapshot of the cached token pair.

// self
use crate::{_prelude::*, auth::token::record::TokenRecord};

/// Read-only view of the token record that never exposes secrets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
	/// Whether an access token is cached.
	pub has_access_token: bool,
	/// Absolute access-token expiry.
	pub access_expires_at: Option<OffsetDateTime>,
	/// Seconds until the access token expires, floored at zero.
	pub access_expires_in: i64,
	/// Whether the cached access token is usable (outside the safety margin).
	pub access_valid: bool,
	/// Whether a refresh token is cached.
	pub has_refresh_token: bool,
	/// Absolute refresh-token expiry.
	pub refresh_expires_at: Option<OffsetDateTime>,
	/// Seconds until the refresh token expires, floored at zero.
	pub refresh_expires_in: i64,
}
impl TokenInfo {
	/// Summarizes `record` as observed at `now`.
	pub fn from_record(
		record: Option<&TokenRecord>,
		now: OffsetDateTime,
		safety_margin: Duration,
	) -> Self {
		let Some(record) = record else {
			return Self::default();
		};

		Self {
			has_access_token: true,
			access_expires_at: Some(record.access_expiry),
			access_expires_in: remaining(record.access_expiry, now),
			access_valid: record.is_usable_at(now, safety_margin),
			has_refresh_token: record.refresh_token.is_some(),
			refresh_expires_at: record.refresh_expiry,
			refresh_expires_in: record.refresh_expiry.map(|at| remaining(at, now)).unwrap_or(0),
		}
	}
}

fn remaining(expiry: OffsetDateTime, now: OffsetDateTime) -> i64 {
	(expiry - now).whole_seconds().max(0)
}
