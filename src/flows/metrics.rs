// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how access tokens were obtained.
#[derive(Debug, Default)]
pub struct GrantMetrics {
	cache_hits: AtomicU64,
	refresh_grants: AtomicU64,
	client_credentials_grants: AtomicU64,
	failures: AtomicU64,
}
impl GrantMetrics {
	/// Tokens served from the cache without contacting the token endpoint.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// `refresh_token` grants sent, successful or not.
	pub fn refresh_grants(&self) -> u64 {
		self.refresh_grants.load(Ordering::Relaxed)
	}

	/// `client_credentials` grants sent, successful or not.
	pub fn client_credentials_grants(&self) -> u64 {
		self.client_credentials_grants.load(Ordering::Relaxed)
	}

	/// Calls to the token manager that ended without a token.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Total grants sent to the token endpoint.
	pub fn network_grants(&self) -> u64 {
		self.refresh_grants() + self.client_credentials_grants()
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refresh_grants.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_client_credentials(&self) {
		self.client_credentials_grants.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn network_grants_sum_both_grant_kinds() {
		let metrics = GrantMetrics::default();

		metrics.record_refresh();
		metrics.record_client_credentials();
		metrics.record_client_credentials();
		metrics.record_cache_hit();

		assert_eq!(metrics.network_grants(), 3);
		assert_eq!(metrics.cache_hits(), 1);
		assert_eq!(metrics.failures(), 0);
	}
}
