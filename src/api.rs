//! Authenticated requests against the SHR Shop, IDS distribution, and generic API hosts.
//!
//! [`ApiClient::request`] attaches the bearer token from the [`TokenManager`], picks the base URL
//! and `Accept` header from the [`ApiClass`], records non-200 responses as an [`ApiErrorState`],
//! and turns 200 bodies into a [`Tree`]. Distribution and rate-calendar calls may answer in
//! XML, so those fall back to the XML parser when the body is not a JSON document.

pub mod hotel;

pub use hotel::*;
pub use oauth2::http::Method;

pub use crate::config::ApiClass;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest,
	http::{
		Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ServiceEndpoints,
	error::{ConfigError, ParseError},
	flows::TokenManager,
	http::{self, ApiHttpClient, ResponseMetadataSlot},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{self, CacheStore},
	tree::Tree,
};
#[cfg(feature = "reqwest")] use crate::{config::Settings, http::ReqwestHttpClient};

/// Cache key holding the most recent data-endpoint failure.
pub const API_ERROR_KEY: &str = "shr_stay_last_api_error";

const JSON_ACCEPT: &str = "application/json";
const XML_ACCEPT: &str = "application/xml, application/json, text/xml";
const BODY_PREVIEW_CHARS: usize = 500;
const ERROR_BODY_CHARS: usize = 200;

/// API client specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Last data-endpoint failure, kept for diagnostics and the room-detail 403 heuristic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorState {
	/// Message extracted from the error body.
	pub message: String,
	/// HTTP status code.
	pub code: u16,
	/// Request URL.
	pub url: String,
	/// Instant the failure was recorded.
	pub recorded_at: OffsetDateTime,
}

/// Issues authenticated data requests and normalizes their bodies.
pub struct ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	tokens: Arc<TokenManager<C>>,
	http_client: Arc<C>,
	store: Arc<dyn CacheStore>,
	endpoints: ServiceEndpoints,
	hotel: HotelRef,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that shares the token manager's transport.
	pub fn new(
		tokens: Arc<TokenManager<C>>,
		store: Arc<dyn CacheStore>,
		endpoints: ServiceEndpoints,
	) -> Self {
		let http_client = tokens.http_client().clone();

		Self { tokens, http_client, store, endpoints, hotel: HotelRef::default() }
	}

	/// Sets the hotel identifiers used when a query omits them.
	pub fn with_hotel(mut self, hotel: HotelRef) -> Self {
		self.hotel = hotel;

		self
	}

	/// Hotel identifiers used when a query omits them.
	pub fn hotel(&self) -> &HotelRef {
		&self.hotel
	}

	/// Token manager backing this client.
	pub fn tokens(&self) -> &Arc<TokenManager<C>> {
		&self.tokens
	}

	/// Sends an authenticated request to `endpoint` (path plus optional query) on `class`'s host.
	pub async fn request(
		&self,
		endpoint: &str,
		method: Method,
		body: Option<&Value>,
		class: ApiClass,
	) -> Result<Tree> {
		const KIND: FlowKind = FlowKind::ApiRequest;

		let span = FlowSpan::new(KIND, "request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute(endpoint, method, body, class)).await;

		obs::record_result(KIND, &result);

		result
	}

	/// Most recent data-endpoint failure, if no request succeeded since.
	pub async fn last_error(&self) -> Result<Option<ApiErrorState>> {
		Ok(store::load(self.store.as_ref(), API_ERROR_KEY).await?)
	}

	async fn execute(
		&self,
		endpoint: &str,
		method: Method,
		body: Option<&Value>,
		class: ApiClass,
	) -> Result<Tree> {
		let token = self.token_for(endpoint).await?;
		let url = self.endpoints.url_for(class, endpoint)?;
		let xml_capable = class == ApiClass::Distribution || endpoint.contains("ratecalendar");
		let request = build_request(&url, &method, &token, body, xml_capable)?;

		tracing::debug!(
			%url,
			%method,
			%class,
			token = %token.preview(),
			"Sending API request."
		);

		let handle = self.http_client.with_metadata(ResponseMetadataSlot::default());
		let response = handle
			.call(request)
			.await
			.map_err(|e| http::map_client_error("api_request", e))?;
		let code = response.status().as_u16();
		let body = String::from_utf8_lossy(response.body());

		tracing::debug!(
			code,
			body = %preview(&body, BODY_PREVIEW_CHARS),
			"Received API response."
		);

		obs::record_api_response(class, code);

		if code != 200 {
			let message = error_message(code, &body);

			self.remember_failure(&message, code, &url).await;

			return Err(Error::Api { code, message });
		}
		if let Err(e) = self.store.delete(API_ERROR_KEY).await {
			tracing::warn!(error = %e, "Failed to clear recorded API failure.");
		}

		parse_body(&body, xml_capable)
	}

	/// Fetches the bearer token, forcing a fresh one for room-detail calls after a recorded 403.
	async fn token_for(&self, endpoint: &str) -> Result<TokenSecret> {
		if is_room_detail(endpoint)
			&& self.last_error().await?.is_some_and(|state| state.code == 403)
		{
			tracing::info!(endpoint, "Previous room request was forbidden; re-authenticating.");

			self.tokens.clear_token().await?;
		}

		self.tokens.get_access_token().await
	}

	async fn remember_failure(&self, message: &str, code: u16, url: &Url) {
		let state = ApiErrorState {
			message: message.to_owned(),
			code,
			url: url.to_string(),
			recorded_at: OffsetDateTime::now_utc(),
		};

		tracing::warn!(code, %url, reason = message, "API request failed.");

		if let Err(e) = store::save(self.store.as_ref(), API_ERROR_KEY, &state, None).await {
			tracing::warn!(error = %e, "Failed to record API failure.");
		}
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Builds a reqwest-backed token manager and API client from `settings`.
	pub fn from_settings(store: Arc<dyn CacheStore>, settings: &Settings) -> Result<Self> {
		let endpoints = settings.endpoints()?;
		let tokens = TokenManager::new(store.clone(), settings)?;

		Ok(Self::new(Arc::new(tokens), store, endpoints).with_hotel(HotelRef::from_settings(settings)))
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("endpoints", &self.endpoints)
			.field("hotel", &self.hotel)
			.field("tokens", &self.tokens)
			.finish()
	}
}

fn build_request(
	url: &Url,
	method: &Method,
	token: &TokenSecret,
	body: Option<&Value>,
	xml_capable: bool,
) -> Result<HttpRequest, ConfigError> {
	let mut builder = Request::builder()
		.method(method.clone())
		.uri(url.as_str())
		.header(AUTHORIZATION, token.bearer())
		.header(ACCEPT, if xml_capable { XML_ACCEPT } else { JSON_ACCEPT });

	if *method != Method::GET && body.is_some() {
		builder = builder.header(CONTENT_TYPE, JSON_ACCEPT);
	}

	Ok(builder.body(body.map(|body| body.to_string().into_bytes()).unwrap_or_default())?)
}

fn parse_body(body: &str, xml_capable: bool) -> Result<Tree> {
	match Tree::parse_json(body) {
		Ok(tree) => Ok(tree),
		Err(ParseError::Empty) => Err(ParseError::Empty.into()),
		Err(e) if !xml_capable => Err(e.into()),
		Err(_) => {
			tracing::debug!("Body is not a JSON document; parsing as XML.");

			Ok(Tree::parse_xml(body)?)
		},
	}
}

/// Room-detail endpoints (`/hotelDetails/{code}/room`) are the only ones retried after a 403.
fn is_room_detail(endpoint: &str) -> bool {
	endpoint.contains("/hotelDetails/") && endpoint.contains("/room")
}

/// Extracts a human-readable message from a non-200 body.
fn error_message(code: u16, body: &str) -> String {
	let fields = match serde_json::from_str::<Value>(body) {
		Ok(Value::Object(fields)) => fields,
		Ok(Value::Array(_)) => return format!("HTTP {code}"),
		_ => return format!("HTTP {code}: {}", preview(body, ERROR_BODY_CHARS)),
	};

	if let Some(error) = fields.get("error") {
		let mut message = scalar_text(error);

		if let Some(detail) = fields.get("error_description").or_else(|| fields.get("message")) {
			message.push_str(": ");
			message.push_str(&scalar_text(detail));
		}

		message
	} else if let Some(message) = fields.get("message") {
		scalar_text(message)
	} else {
		format!("HTTP {code}")
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn preview(body: &str, chars: usize) -> String {
	body.chars().take(chars).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn room_detail_endpoints_are_recognized() {
		assert!(is_room_detail("/hotelDetails/ABC/room?channelId=1"));
		assert!(!is_room_detail("/wsapi/shop/ratecalendar?pcode=ABC"));
		assert!(!is_room_detail("/hotelDetails/ABC"));
	}

	#[test]
	fn error_messages_prefer_oauth_fields() {
		assert_eq!(
			error_message(403, r#"{"error":"insufficient_scope","error_description":"needs shop"}"#),
			"insufficient_scope: needs shop"
		);
		assert_eq!(
			error_message(400, r#"{"error":"bad_request","message":"missing pcode"}"#),
			"bad_request: missing pcode"
		);
		assert_eq!(error_message(404, r#"{"message":"Hotel not found"}"#), "Hotel not found");
		assert_eq!(error_message(500, r#"{"detail":"boom"}"#), "HTTP 500");
		assert_eq!(error_message(502, "<html>Bad gateway</html>"), "HTTP 502: <html>Bad gateway</html>");
	}

	#[test]
	fn raw_error_bodies_are_truncated() {
		let body = "x".repeat(300);

		assert_eq!(error_message(500, &body).len(), "HTTP 500: ".len() + ERROR_BODY_CHARS);
	}

	#[test]
	fn xml_fallback_only_applies_to_xml_capable_calls() {
		let xml = "<Root><Rate Amount=\"100\"/></Root>";

		assert!(parse_body(xml, true).is_ok());
		assert!(matches!(parse_body(xml, false), Err(Error::Parse(ParseError::Json(_)))));
		assert!(matches!(parse_body("", true), Err(Error::Parse(ParseError::Empty))));
		assert!(matches!(parse_body("not a document", true), Err(Error::Parse(ParseError::Xml { .. }))));
	}

	#[test]
	fn content_type_is_only_sent_with_bodies() {
		let url = Url::parse("https://apiuat.shrglobal.com/shop/x").expect("Fixture URL.");
		let token = TokenSecret::new("token");
		let body = serde_json::json!({ "a": 1 });
		let get = build_request(&url, &Method::GET, &token, Some(&body), false)
			.expect("GET request should build.");
		let post = build_request(&url, &Method::POST, &token, Some(&body), true)
			.expect("POST request should build.");

		assert!(get.headers().get(CONTENT_TYPE).is_none());
		assert_eq!(get.headers().get(ACCEPT).map(|v| v.as_bytes()), Some(JSON_ACCEPT.as_bytes()));
		assert_eq!(post.headers().get(CONTENT_TYPE).map(|v| v.as_bytes()), Some(b"application/json".as_slice()));
		assert_eq!(post.headers().get(ACCEPT).map(|v| v.as_bytes()), Some(XML_ACCEPT.as_bytes()));
		assert_eq!(post.body(), br#"{"a":1}"#);
	}
}
