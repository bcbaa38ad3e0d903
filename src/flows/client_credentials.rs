//! Client-credentials grant: full re-authentication with the configured scope.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	flows::{GrantPolicy, TokenManager},
	http::ApiHttpClient,
	oauth::GrantKind,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> TokenManager<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Performs the `client_credentials` grant and replaces the cached record wholesale.
	pub(super) async fn client_credentials_grant(
		&self,
		policy: &GrantPolicy,
	) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "client_credentials_grant");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<TokenRecord> = span
			.instrument(async move {
				let endpoint = self.endpoint(policy)?;

				self.metrics.record_client_credentials();

				let outcome = match endpoint.client_credentials().await {
					Ok(outcome) => outcome,
					Err(e) => {
						tracing::warn!(error = %e, "Client credentials grant failed.");
						self.remember_failure(GrantKind::ClientCredentials.as_str(), &e).await;

						return Err(e.into());
					},
				};
				let record = Self::record_from_outcome(policy, outcome, None)?;

				self.persist(&record).await?;
				tracing::debug!(
					token = %record.access_token.preview(),
					expires_at = %record.access_expiry,
					has_refresh = record.refresh_token.is_some(),
					"Obtained access token via client credentials."
				);

				Ok(record)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}
