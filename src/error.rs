//! Crate-level error types shared by the token manager, API client, and extractors.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout) while calling a data endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// No usable access token could be obtained.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// 200 response whose body is neither a JSON nor an XML document.
	#[error(transparent)]
	Parse(#[from] ParseError),

	/// Data endpoint answered with a non-200 status.
	#[error("API request failed with HTTP {code}: {message}.")]
	Api {
		/// HTTP status code.
		code: u16,
		/// Message extracted from the error body, or the status line.
		message: String,
	},
	/// No extractable room records and no fallback applies.
	#[error("No room records could be extracted from the response.")]
	NotFound,
}

/// Failures raised while obtaining an access token.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Client identifier or secret is empty.
	#[error("Client credentials are not configured.")]
	MissingCredentials,
	/// Token endpoint returned an OAuth error body.
	#[error("Token endpoint rejected the {grant} grant: {error}{}.", describe(.description))]
	Rejected {
		/// Grant label.
		grant: &'static str,
		/// OAuth `error` field.
		error: String,
		/// OAuth `error_description` field.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint answered with something that is neither a token nor an OAuth error.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that lacks required fields such as `access_token`.
	#[error("Token endpoint returned a malformed token response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Network failure while calling the token endpoint.
	#[error("Token endpoint could not be reached.")]
	Transport(#[source] TransportError),
	/// Token record could not be assembled from the grant response.
	#[error("Unable to build token record.")]
	RecordBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// Token endpoint URL rejected by the OAuth client.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenUrl {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
}
impl AuthError {
	/// HTTP status attached to the failure, if one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::TokenEndpoint { status, .. }
			| Self::MalformedResponse { status, .. } => *status,
			_ => None,
		}
	}
}

fn describe(description: &Option<String>) -> String {
	description.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Response bodies that could not be turned into a tree.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// Body was empty or whitespace only.
	#[error("Response body is empty.")]
	Empty,
	/// Body is not valid JSON and XML fallback does not apply to the endpoint.
	#[error("Response body is not valid JSON.")]
	Json(#[source] serde_json::Error),
	/// Body is neither valid JSON nor valid XML.
	#[error("Response body is neither JSON nor XML (XML error at byte {position}: {message}).")]
	Xml {
		/// Byte offset where the XML reader gave up.
		position: u64,
		/// Reader error message.
		message: String,
	},
	/// JSON parsed to a bare scalar instead of an object or array.
	#[error("Response body does not contain a structured document.")]
	Unstructured,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint set failed validation.
	#[error(transparent)]
	Endpoints(#[from] crate::config::EndpointError),
	/// Endpoint path and base URL do not form a valid URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidRequestUrl {
		/// Concatenated URL that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Neither a hotel code nor a property identifier is available.
	#[error("No hotel code or property ID is configured.")]
	MissingHotelIdentifier,
	/// Date could not be rendered into a query string.
	#[error("Date could not be formatted.")]
	DateFormat(#[source] time::error::Format),
	/// Deep links need a booking-engine base URL.
	#[error("No booking engine URL is configured.")]
	MissingBookingEngine,
	/// Settings file could not be read.
	#[error("Settings could not be read.")]
	SettingsIo(#[from] std::io::Error),
	/// Settings document is malformed.
	#[error("Settings document is malformed.")]
	SettingsParse(#[source] serde_path_to_error::Error<serde_json::error::Error>),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which endpoint family was being called.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request could not be turned into a transport request.
	#[error("HTTP request could not be constructed.")]
	Http(#[from] oauth2::http::Error),
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure without a typed source.
	#[error("HTTP client error occurred while calling {target}: {message}.")]
	Other {
		/// Which endpoint family was being called.
		target: &'static str,
		/// Transport-provided message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		target: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target, source: Box::new(src) }
	}
}
