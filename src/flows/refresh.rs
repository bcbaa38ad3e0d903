//! Refresh-token grant; the caller falls back to client credentials on any failure.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::AuthError,
	flows::{GrantPolicy, TokenManager},
	http::ApiHttpClient,
	oauth::GrantKind,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Redeems the refresh token held by `current` and stores the resulting record.
	///
	/// A refresh token returned by the server replaces the old one; otherwise the old secret
	/// and its original expiry carry over.
	pub(super) async fn refresh_grant(
		&self,
		policy: &GrantPolicy,
		current: &TokenRecord,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_grant");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<TokenRecord> = span
			.instrument(async move {
				let refresh_token = current
					.refresh_token
					.as_ref()
					.ok_or(AuthError::TokenEndpoint {
						message: "no refresh token is cached".into(),
						status: None,
					})?;
				let endpoint = self.endpoint(policy)?;

				self.metrics.record_refresh();

				let outcome = match endpoint.refresh(refresh_token).await {
					Ok(outcome) => outcome,
					Err(e) => {
						self.remember_failure(GrantKind::RefreshToken.as_str(), &e).await;

						return Err(e.into());
					},
				};
				let record = Self::record_from_outcome(
					policy,
					outcome,
					Some((refresh_token, current.refresh_expiry)),
				)?;

				self.persist(&record).await?;
				tracing::debug!(
					token = %record.access_token.preview(),
					expires_at = %record.access_expiry,
					"Refreshed access token."
				);

				Ok(record)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
