//! Access-token lifecycle: cached token, then refresh grant, then client-credentials grant.
//!
//! [`TokenManager::get_access_token`] hands out the cached access token while it sits outside
//! the safety margin. Otherwise a single async guard serializes acquisition: the first caller
//! redeems the refresh token (if one is still valid), falls back to a client-credentials grant
//! when that fails, and stores the new record; callers that waited re-check the cache before
//! contacting the token endpoint themselves.

mod client_credentials;
mod metrics;
mod refresh;

pub use metrics::GrantMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenInfo, TokenRecord, TokenSecret, TokenStore},
	config::{Credentials, Settings},
	error::AuthError,
	http::ApiHttpClient,
	oauth::{GrantOutcome, TokenEndpoint},
	obs::{self, FlowKind, FlowOutcome},
	store::{self, CacheStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Cache key holding the most recent token-endpoint failure.
pub const AUTH_ERROR_KEY: &str = "shr_stay_last_auth_error";

/// Token manager specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenManager = TokenManager<ReqwestHttpClient>;

/// Last token-endpoint failure, kept for diagnostics until a grant succeeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorState {
	/// Rendered failure message.
	pub message: String,
	/// HTTP status, when a response arrived.
	pub status: Option<u16>,
	/// Grant that failed.
	pub grant: String,
	/// Instant the failure was recorded.
	pub recorded_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
struct GrantPolicy {
	credentials: Credentials,
	scope: String,
	safety_margin: Duration,
	default_access_ttl: Duration,
	default_refresh_ttl: Duration,
}
impl GrantPolicy {
	fn from_settings(settings: &Settings) -> Self {
		Self {
			credentials: settings.credentials.clone(),
			scope: settings.scope.clone(),
			safety_margin: settings.safety_margin(),
			default_access_ttl: settings.default_access_ttl(),
			default_refresh_ttl: settings.default_refresh_ttl(),
		}
	}
}

/// Obtains, caches, refreshes, and invalidates the client's access token.
pub struct TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	store: Arc<dyn CacheStore>,
	tokens: TokenStore,
	token_url: Url,
	policy: RwLock<GrantPolicy>,
	metrics: Arc<GrantMetrics>,
	acquire: AsyncMutex<()>,
}
impl<C> TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CacheStore>,
		settings: &Settings,
		token_url: Url,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			tokens: TokenStore::new(store.clone()),
			store,
			token_url,
			policy: RwLock::new(GrantPolicy::from_settings(settings)),
			metrics: Default::default(),
			acquire: AsyncMutex::new(()),
		}
	}

	/// Returns a usable access token, contacting the token endpoint only when needed.
	pub async fn get_access_token(&self) -> Result<TokenSecret> {
		if let Some(token) = self.cached_token(FlowKind::Cache, "get_access_token").await? {
			return Ok(token);
		}

		let _singleflight = self.acquire.lock().await;

		if let Some(token) = self.cached_token(FlowKind::Cache, "after_wait").await? {
			return Ok(token);
		}

		let policy = self.policy();

		if !policy.credentials.is_complete() {
			self.metrics.record_failure();
			tracing::warn!("Client credentials are not configured; no token can be obtained.");

			return Err(AuthError::MissingCredentials.into());
		}

		let now = OffsetDateTime::now_utc();
		let current = self.tokens.load().await?;

		if let Some(record) = current.as_ref().filter(|r| r.refreshable_at(now).is_some()) {
			match self.refresh_grant(&policy, record).await {
				Ok(updated) => return Ok(updated.access_token),
				Err(e) => {
					tracing::debug!(
						error = %e,
						"Refresh grant failed; falling back to client credentials."
					);
				},
			}
		}

		match self.client_credentials_grant(&policy).await {
			Ok(record) => Ok(record.access_token),
			Err(e) => {
				self.metrics.record_failure();

				Err(e)
			},
		}
	}

	/// Drops the cached token pair so the next call performs a client-credentials grant.
	pub async fn clear_token(&self) -> Result<()> {
		self.tokens.clear().await?;

		tracing::debug!("Cleared cached token record.");

		Ok(())
	}

	/// Returns `true` when a cached access token is usable right now.
	pub async fn is_token_valid(&self) -> Result<bool> {
		let margin = self.policy().safety_margin;
		let now = OffsetDateTime::now_utc();

		Ok(self.tokens.load().await?.is_some_and(|record| record.is_usable_at(now, margin)))
	}

	/// Diagnostics snapshot of the cached token pair.
	pub async fn token_info(&self) -> Result<TokenInfo> {
		let margin = self.policy().safety_margin;
		let record = self.tokens.load().await?;

		Ok(TokenInfo::from_record(record.as_ref(), OffsetDateTime::now_utc(), margin))
	}

	/// Replaces the client credentials and clears the cached token pair.
	pub async fn set_credentials(&self, credentials: Credentials) -> Result<()> {
		self.policy.write().credentials = credentials;

		self.clear_token().await
	}

	/// Most recent token-endpoint failure, if no grant succeeded since.
	pub async fn last_auth_error(&self) -> Result<Option<AuthErrorState>> {
		Ok(store::load(self.store.as_ref(), AUTH_ERROR_KEY).await?)
	}

	/// Grant counters for this manager.
	pub fn grant_metrics(&self) -> Arc<GrantMetrics> {
		self.metrics.clone()
	}

	/// Transport shared with API clients built on this manager.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	async fn cached_token(
		&self,
		kind: FlowKind,
		stage: &'static str,
	) -> Result<Option<TokenSecret>> {
		let margin = self.policy().safety_margin;
		let now = OffsetDateTime::now_utc();
		let Some(record) = self.tokens.load().await? else {
			return Ok(None);
		};

		if !record.is_usable_at(now, margin) {
			return Ok(None);
		}

		self.metrics.record_cache_hit();
		obs::record_flow_outcome(kind, FlowOutcome::Success);
		tracing::trace!(
			stage,
			token = %record.access_token.preview(),
			"Using cached access token."
		);

		Ok(Some(record.access_token))
	}

	fn policy(&self) -> GrantPolicy {
		self.policy.read().clone()
	}

	fn endpoint(&self, policy: &GrantPolicy) -> Result<TokenEndpoint<C>, AuthError> {
		TokenEndpoint::new(
			&policy.credentials,
			&self.token_url,
			&policy.scope,
			self.http_client.clone(),
		)
	}

	/// Builds a record from a grant outcome, applying lifetime defaults.
	///
	/// `retained` carries the previous refresh token when the server did not rotate it.
	fn record_from_outcome(
		policy: &GrantPolicy,
		outcome: GrantOutcome,
		retained: Option<(&TokenSecret, Option<OffsetDateTime>)>,
	) -> Result<TokenRecord, AuthError> {
		let mut builder = TokenRecord::builder()
			.issued_at(OffsetDateTime::now_utc())
			.access_token(outcome.access_token.expose())
			.expires_in(outcome.expires_in.unwrap_or(policy.default_access_ttl));

		match (outcome.refresh_token, retained) {
			(Some(fresh), _) => {
				let lifetime = outcome.refresh_expires_in.unwrap_or(policy.default_refresh_ttl);

				builder = builder.refresh_token(fresh.expose()).refresh_expires_in(lifetime);
			},
			(None, Some((previous, expiry))) => {
				builder = builder.retained_refresh(previous.clone(), expiry);
			},
			(None, None) => {},
		}

		Ok(builder.build()?)
	}

	async fn persist(&self, record: &TokenRecord) -> Result<()> {
		self.tokens.save(record).await?;
		self.store.delete(AUTH_ERROR_KEY).await?;

		Ok(())
	}

	async fn remember_failure(&self, grant: &'static str, err: &AuthError) {
		let state = AuthErrorState {
			message: err.to_string(),
			status: err.status(),
			grant: grant.into(),
			recorded_at: OffsetDateTime::now_utc(),
		};

		if let Err(e) = store::save(self.store.as_ref(), AUTH_ERROR_KEY, &state, None).await {
			tracing::warn!(error = %e, "Failed to record token endpoint failure.");
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager<ReqwestHttpClient> {
	/// Creates a manager with its own reqwest transport, endpoint, and timeout taken from
	/// `settings`.
	pub fn new(store: Arc<dyn CacheStore>, settings: &Settings) -> Result<Self> {
		let endpoints = settings.endpoints()?;
		let http_client = ReqwestHttpClient::with_timeout(settings.request_timeout())?;

		Ok(Self::with_http_client(store, settings, endpoints.token, http_client))
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let policy = self.policy.read();

		f.debug_struct("TokenManager")
			.field("token_url", &self.token_url.as_str())
			.field("client_id", &policy.credentials.client_id)
			.field("environment", &policy.credentials.environment)
			.field("tokens", &self.tokens)
			.finish()
	}
}
