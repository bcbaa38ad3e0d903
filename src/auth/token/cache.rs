//! Token record slot persisted through the shared [`CacheStore`].

// self
use crate::{
	_prelude::*,
	auth::token::record::TokenRecord,
	store::{self, CacheStore, StoreError},
};

/// Cache key holding the current token record.
pub const TOKEN_RECORD_KEY: &str = "shr_stay_token_record";

/// Loads, replaces, and clears the single token record.
#[derive(Clone)]
pub struct TokenStore {
	store: Arc<dyn CacheStore>,
}
impl TokenStore {
	/// Wraps the shared cache backend.
	pub fn new(store: Arc<dyn CacheStore>) -> Self {
		Self { store }
	}

	/// Returns the cached record, if one is stored and not yet evicted.
	pub async fn load(&self) -> Result<Option<TokenRecord>, StoreError> {
		store::load(self.store.as_ref(), TOKEN_RECORD_KEY).await
	}

	/// Replaces the cached record wholesale, keeping it until its last useful instant.
	pub async fn save(&self, record: &TokenRecord) -> Result<(), StoreError> {
		let ttl = record.retain_until() - OffsetDateTime::now_utc();

		store::save(self.store.as_ref(), TOKEN_RECORD_KEY, record, Some(ttl.max(Duration::ZERO)))
			.await
	}

	/// Removes every token field.
	pub async fn clear(&self) -> Result<(), StoreError> {
		self.store.delete(TOKEN_RECORD_KEY).await
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("key", &TOKEN_RECORD_KEY).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn save_load_clear_cycle() {
		let backend = Arc::new(MemoryStore::default());
		let tokens = TokenStore::new(backend.clone());
		let rt = Runtime::new().expect("Failed to build Tokio runtime for token store test.");
		let record = TokenRecord::builder()
			.access_token("access")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Record should build.");

		rt.block_on(tokens.save(&record)).expect("Saving the record should succeed.");

		let loaded = rt.block_on(tokens.load()).expect("Loading should succeed.");

		assert_eq!(loaded, Some(record));

		rt.block_on(tokens.clear()).expect("Clearing should succeed.");

		assert!(rt.block_on(tokens.load()).expect("Loading should succeed.").is_none());
		assert!(backend.is_empty());
	}
}
