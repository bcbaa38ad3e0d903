//! Serde-backed settings document shared by the token manager, API client, and room catalog.

// std
use std::path::Path;
// self
use crate::{
	_prelude::*,
	config::{Credentials, ServiceEndpoints},
	error::ConfigError,
};

/// Scope requested by the client-credentials grant unless overridden.
pub const DEFAULT_SCOPE: &str = "wsapi.guestrequests.read wsapi.shop.ratecalendar";

/// Per-endpoint overrides applied on top of the environment's built-in hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointOverrides {
	/// Token endpoint override.
	pub token: Option<Url>,
	/// Shop API base override.
	pub shop: Option<Url>,
	/// Distribution API base override.
	pub distribution: Option<Url>,
	/// Generic API base override.
	pub generic: Option<Url>,
}

/// Runtime configuration of the client.
///
/// Every field has a default so partial JSON documents load cleanly; durations are stored as
/// whole seconds to keep the document format flat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// OAuth client credentials and environment.
	pub credentials: Credentials,
	/// Optional endpoint overrides (staging proxies, local mocks).
	pub endpoints: EndpointOverrides,
	/// Hotel code used by the Shop API room list.
	pub hotel_code: Option<String>,
	/// Property identifier used by the rate calendar and descriptive-info calls.
	pub property_id: Option<String>,
	/// Space-delimited scope sent with the client-credentials grant.
	pub scope: String,
	/// HTTP timeout applied to every request.
	pub request_timeout_secs: u64,
	/// Access tokens expiring within this window are treated as stale.
	pub safety_margin_secs: u64,
	/// Access-token lifetime assumed when the grant omits `expires_in`.
	pub default_access_ttl_secs: u64,
	/// Refresh-token lifetime assumed when the grant omits `refresh_token_expires_in`.
	pub default_refresh_ttl_secs: u64,
	/// TTL of cached room lists.
	pub room_cache_ttl_secs: u64,
	/// Currency label attached to normalized rooms.
	pub currency: String,
	/// Booking-engine base URL used by deep links.
	pub booking_engine_url: Option<Url>,
}
impl Settings {
	/// Parses settings from a JSON document, reporting the failing field path on error.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de).map_err(ConfigError::SettingsParse)
	}

	/// Reads and parses a JSON settings file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path)?;

		Self::from_json_str(&raw)
	}

	/// Resolves the endpoint set for the configured environment, applying overrides.
	pub fn endpoints(&self) -> Result<ServiceEndpoints, ConfigError> {
		let defaults = ServiceEndpoints::for_environment(self.credentials.environment)?;
		let overrides = &self.endpoints;
		let endpoints = ServiceEndpoints::builder()
			.token(overrides.token.clone().unwrap_or(defaults.token))
			.shop(overrides.shop.clone().unwrap_or(defaults.shop))
			.distribution(overrides.distribution.clone().unwrap_or(defaults.distribution))
			.generic(overrides.generic.clone().unwrap_or(defaults.generic))
			.build()?;

		Ok(endpoints)
	}

	/// HTTP timeout as a [`std::time::Duration`].
	pub fn request_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.request_timeout_secs)
	}

	/// Safety margin subtracted from access-token expiry.
	pub fn safety_margin(&self) -> Duration {
		seconds(self.safety_margin_secs)
	}

	/// Fallback access-token lifetime.
	pub fn default_access_ttl(&self) -> Duration {
		seconds(self.default_access_ttl_secs)
	}

	/// Fallback refresh-token lifetime.
	pub fn default_refresh_ttl(&self) -> Duration {
		seconds(self.default_refresh_ttl_secs)
	}

	/// Room-list cache TTL.
	pub fn room_cache_ttl(&self) -> Duration {
		seconds(self.room_cache_ttl_secs)
	}

	/// Returns the configured hotel code, ignoring blank values.
	pub fn hotel_code(&self) -> Option<&str> {
		non_blank(self.hotel_code.as_deref())
	}

	/// Returns the configured property identifier, ignoring blank values.
	pub fn property_id(&self) -> Option<&str> {
		non_blank(self.property_id.as_deref())
	}
}
impl Default for Settings {
	fn default() -> Self {
		Self {
			credentials: Credentials::default(),
			endpoints: EndpointOverrides::default(),
			hotel_code: None,
			property_id: None,
			scope: DEFAULT_SCOPE.into(),
			request_timeout_secs: 30,
			safety_margin_secs: 300,
			default_access_ttl_secs: 3_600,
			default_refresh_ttl_secs: 30 * 24 * 3_600,
			room_cache_ttl_secs: 3_600,
			currency: "ZAR".into(),
			booking_engine_url: None,
		}
	}
}

fn seconds(value: u64) -> Duration {
	Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}
