//! Token record structs, expiry bookkeeping, and builders.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, store::offset_clamped};

/// Usability of the access token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is valid beyond the safety margin.
	Active,
	/// Token has not expired yet but falls inside the safety margin.
	Stale,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no access expiry (absolute or relative) was configured.
	#[error("Access expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when a refresh token was provided without an expiry.
	#[error("Refresh expiry must be supplied alongside a refresh token.")]
	MissingRefreshExpiry,
}

/// Access token plus optional refresh token, each with an absolute expiry.
///
/// Records are replaced wholesale on every grant; nothing mutates a stored record in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Absolute access-token expiry.
	pub access_expiry: OffsetDateTime,
	/// Refresh token secret, if the server issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute refresh-token expiry; present whenever `refresh_token` is.
	pub refresh_expiry: Option<OffsetDateTime>,
	/// Instant the record was assembled.
	pub issued_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Computes the access-token status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime, safety_margin: Duration) -> TokenStatus {
		let stale_from = self.access_expiry.checked_sub(safety_margin);

		if instant >= self.access_expiry {
			TokenStatus::Expired
		} else if stale_from.is_none_or(|at| instant >= at) {
			TokenStatus::Stale
		} else {
			TokenStatus::Active
		}
	}

	/// Returns `true` if the access token may be handed out at `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime, safety_margin: Duration) -> bool {
		matches!(self.status_at(instant, safety_margin), TokenStatus::Active)
	}

	/// Returns the refresh token if it can still be redeemed at `instant`.
	pub fn refreshable_at(&self, instant: OffsetDateTime) -> Option<&TokenSecret> {
		match (&self.refresh_token, self.refresh_expiry) {
			(Some(token), Some(expiry)) if instant < expiry => Some(token),
			_ => None,
		}
	}

	/// Latest instant any part of the record is still useful; drives the cache TTL.
	pub fn retain_until(&self) -> OffsetDateTime {
		match self.refresh_expiry {
			Some(refresh) if refresh > self.access_expiry => refresh,
			_ => self.access_expiry,
		}
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("access_expiry", &self.access_expiry)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_expiry", &self.refresh_expiry)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	refresh_expires_at: Option<OffsetDateTime>,
	refresh_expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	/// Sets the issued-at instant; relative expiries are measured from it.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute access expiry.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the access lifetime relative to the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Carries over an existing refresh secret and its absolute expiry.
	pub fn retained_refresh(mut self, token: TokenSecret, expiry: Option<OffsetDateTime>) -> Self {
		self.refresh_token = Some(token);
		self.refresh_expires_at = expiry;

		self
	}

	/// Sets an absolute refresh expiry.
	pub fn refresh_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.refresh_expires_at = Some(instant);

		self
	}

	/// Sets the refresh lifetime relative to the issued instant.
	pub fn refresh_expires_in(mut self, duration: Duration) -> Self {
		self.refresh_expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let access_expiry = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => offset_clamped(issued_at, delta),
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};
		let refresh_expiry = match (&self.refresh_token, self.refresh_expires_at, self.refresh_expires_in)
		{
			(None, ..) => None,
			(Some(_), Some(instant), _) => Some(instant),
			(Some(_), None, Some(delta)) => Some(offset_clamped(issued_at, delta)),
			(Some(_), None, None) => return Err(TokenRecordBuilderError::MissingRefreshExpiry),
		};

		Ok(TokenRecord {
			access_token,
			access_expiry,
			refresh_token: self.refresh_token,
			refresh_expiry,
			issued_at,
		})
	}
}
