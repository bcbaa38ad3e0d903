//! Token-endpoint facade over the `oauth2` crate.
//!
//! Both grants post `client_id`/`client_secret` in the form body alongside the configured scope
//! and decode the SHR token response, which extends the standard fields with
//! `refresh_token_expires_in`.

pub use oauth2;

// crates.io
use oauth2::{
	AccessToken, AuthType, Client, ClientId, ClientSecret as OAuthClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, RefreshToken, RequestTokenError, Scope, StandardRevocableToken,
	TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
use serde::{Deserializer, Serializer};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::Credentials,
	error::AuthError,
	http::{self, ApiHttpClient, ResponseMetadataSlot},
};

/// Token response decoded by both grants.
///
/// SHR omits `token_type` on some replies, so a missing or null value reads as `Bearer`. The
/// reply also carries `refresh_token_expires_in` next to the standard fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShrTokenResponse {
	access_token: AccessToken,
	#[serde(default = "bearer", deserialize_with = "deserialize_token_type")]
	token_type: BasicTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token_expires_in: Option<u64>,
	#[serde(
		rename = "scope",
		default,
		skip_serializing_if = "Option::is_none",
		deserialize_with = "deserialize_scopes",
		serialize_with = "serialize_scopes"
	)]
	scopes: Option<Vec<Scope>>,
}
impl ShrTokenResponse {
	/// Refresh-token lifetime in seconds, when the server sent one.
	pub fn refresh_token_expires_in(&self) -> Option<u64> {
		self.refresh_token_expires_in
	}
}
impl TokenResponse for ShrTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &BasicTokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		self.scopes.as_ref()
	}
}

fn bearer() -> BasicTokenType {
	BasicTokenType::Bearer
}

fn deserialize_token_type<'de, D>(deserializer: D) -> Result<BasicTokenType, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;

	Ok(match raw.as_deref().map(str::trim) {
		None | Some("") => BasicTokenType::Bearer,
		Some(name) if name.eq_ignore_ascii_case("bearer") => BasicTokenType::Bearer,
		Some(name) if name.eq_ignore_ascii_case("mac") => BasicTokenType::Mac,
		Some(name) => BasicTokenType::Extension(name.to_owned()),
	})
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Option<Vec<Scope>>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = Option::<String>::deserialize(deserializer)?;

	Ok(raw.map(|scope| scope.split_whitespace().map(|s| Scope::new(s.to_owned())).collect()))
}

fn serialize_scopes<S>(scopes: &Option<Vec<Scope>>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match scopes {
		Some(scopes) => serializer.serialize_some(
			&scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "),
		),
		None => serializer.serialize_none(),
	}
}

type ShrOAuthClient = Client<
	BasicErrorResponse,
	ShrTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Grant identifiers used for error context and instrumentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantKind {
	/// `client_credentials` grant.
	ClientCredentials,
	/// `refresh_token` grant.
	RefreshToken,
}
impl GrantKind {
	/// Wire name of the grant.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantKind::ClientCredentials => "client_credentials",
			GrantKind::RefreshToken => "refresh_token",
		}
	}
}

/// Successful grant decoded into lifetimes; defaults are applied by the caller.
#[derive(Clone, Debug)]
pub struct GrantOutcome {
	/// New access token.
	pub access_token: TokenSecret,
	/// `expires_in`, when the server sent one.
	pub expires_in: Option<Duration>,
	/// New refresh token, when the server issued or rotated one.
	pub refresh_token: Option<TokenSecret>,
	/// `refresh_token_expires_in`, when the server sent one.
	pub refresh_expires_in: Option<Duration>,
}
impl From<ShrTokenResponse> for GrantOutcome {
	fn from(response: ShrTokenResponse) -> Self {
		Self {
			access_token: TokenSecret::new(response.access_token().secret().to_owned()),
			expires_in: response.expires_in().map(std_to_time),
			refresh_token: response
				.refresh_token()
				.map(|token| TokenSecret::new(token.secret().to_owned())),
			refresh_expires_in: response.refresh_token_expires_in().map(std_seconds),
		}
	}
}

pub(crate) struct TokenEndpoint<C>
where
	C: ?Sized + ApiHttpClient,
{
	oauth_client: ShrOAuthClient,
	http_client: Arc<C>,
	scopes: Vec<Scope>,
}
impl<C> TokenEndpoint<C>
where
	C: ?Sized + ApiHttpClient,
{
	pub(crate) fn new(
		credentials: &Credentials,
		token_url: &Url,
		scope: &str,
		http_client: Arc<C>,
	) -> Result<Self, AuthError> {
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|source| AuthError::InvalidTokenUrl { source })?;
		let oauth_client = Client::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(OAuthClientSecret::new(
				credentials.client_secret.expose().to_owned(),
			))
			.set_auth_type(AuthType::RequestBody)
			.set_token_uri(token_url);
		let scopes = scope.split_whitespace().map(|s| Scope::new(s.to_owned())).collect();

		Ok(Self { oauth_client, http_client, scopes })
	}

	pub(crate) async fn client_credentials(&self) -> Result<GrantOutcome, AuthError> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.add_scopes(self.scopes.iter().cloned())
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(GrantKind::ClientCredentials, meta.take_status(), err))?;

		Ok(response.into())
	}

	pub(crate) async fn refresh(&self, refresh_token: &TokenSecret) -> Result<GrantOutcome, AuthError> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.add_scopes(self.scopes.iter().cloned())
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(GrantKind::RefreshToken, meta.take_status(), err))?;

		Ok(response.into())
	}
}

fn map_request_error<E>(
	grant: GrantKind,
	status: Option<u16>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> AuthError
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => AuthError::Rejected {
			grant: grant.as_str(),
			error: response.error().as_ref().to_owned(),
			description: response.error_description().cloned(),
			status,
		},
		RequestTokenError::Request(error) =>
			AuthError::Transport(http::map_client_error("token_endpoint", error)),
		RequestTokenError::Parse(source, _body) => AuthError::MalformedResponse { source, status },
		RequestTokenError::Other(message) => AuthError::TokenEndpoint { message, status },
	}
}

fn std_to_time(duration: std::time::Duration) -> Duration {
	Duration::try_from(duration).unwrap_or(Duration::MAX)
}

fn std_seconds(secs: u64) -> Duration {
	std_to_time(std::time::Duration::from_secs(secs))
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{config::Environment, http::ReqwestHttpClient};

	#[test]
	fn builds_request_body_client() {
		let credentials = Credentials::new("client-id", "secret", Environment::Uat);
		let token_url =
			Url::parse("https://iduat.shrglobal.com/connect/token").expect("Fixture URL.");
		let endpoint = TokenEndpoint::new(
			&credentials,
			&token_url,
			"wsapi.guestrequests.read wsapi.shop.ratecalendar",
			Arc::new(ReqwestHttpClient::default()),
		)
		.expect("Token endpoint facade should build.");

		assert_eq!(endpoint.scopes.len(), 2);
	}

	#[test]
	fn token_response_decodes_refresh_lifetime() {
		let response: ShrTokenResponse = serde_json::from_str(
			r#"{"access_token":"abc","token_type":"Bearer","expires_in":120,"refresh_token":"r1","refresh_token_expires_in":600}"#,
		)
		.expect("Token response fixture should decode.");
		let outcome = GrantOutcome::from(response);

		assert_eq!(outcome.access_token.expose(), "abc");
		assert_eq!(outcome.expires_in, Some(Duration::seconds(120)));
		assert_eq!(outcome.refresh_token.as_ref().map(TokenSecret::expose), Some("r1"));
		assert_eq!(outcome.refresh_expires_in, Some(Duration::minutes(10)));
	}

	#[test]
	fn token_response_without_optional_fields() {
		let response: ShrTokenResponse =
			serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer"}"#)
				.expect("Minimal token response should decode.");
		let outcome = GrantOutcome::from(response);

		assert_eq!(outcome.expires_in, None);
		assert!(outcome.refresh_token.is_none());
		assert_eq!(outcome.refresh_expires_in, None);
	}

	#[test]
	fn token_type_defaults_to_bearer() {
		let missing: ShrTokenResponse =
			serde_json::from_str(r#"{"access_token":"abc","expires_in":60}"#)
				.expect("Reply without token_type should decode.");
		let null: ShrTokenResponse =
			serde_json::from_str(r#"{"access_token":"abc","token_type":null}"#)
				.expect("Reply with a null token_type should decode.");
		let upper: ShrTokenResponse =
			serde_json::from_str(r#"{"access_token":"abc","token_type":"BEARER","scope":"a b"}"#)
				.expect("Upper-case token_type should decode.");

		assert_eq!(missing.token_type(), &BasicTokenType::Bearer);
		assert_eq!(null.token_type(), &BasicTokenType::Bearer);
		assert_eq!(upper.token_type(), &BasicTokenType::Bearer);
		assert_eq!(upper.scopes().map(Vec::len), Some(2));
		assert_eq!(GrantOutcome::from(missing).expires_in, Some(Duration::minutes(1)));
	}

	#[test]
	fn oversized_lifetimes_saturate() {
		let response: ShrTokenResponse = serde_json::from_str(
			r#"{"access_token":"abc","expires_in":18446744073709551615,"refresh_token":"r1","refresh_token_expires_in":18446744073709551615}"#,
		)
		.expect("Oversized lifetimes should decode.");
		let outcome = GrantOutcome::from(response);

		assert_eq!(outcome.expires_in, Some(Duration::MAX));
		assert_eq!(outcome.refresh_expires_in, Some(Duration::MAX));
	}
}
