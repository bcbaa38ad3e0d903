//! Keyed cache contract with per-entry TTLs and the built-in store implementations.
//!
//! Token records, the last API/auth error state, and cached room lists all live behind the same
//! [`CacheStore`] so they can be shared by every service built on top of one backend.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::PrimitiveDateTime;
// self
use crate::_prelude::*;

/// Boxed future returned by [`CacheStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Mapping store with TTL: get/set/delete JSON values by key.
pub trait CacheStore
where
	Self: Send + Sync,
{
	/// Returns the live value stored under `key`, if any.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>>;

	/// Stores `value` under `key`, replacing any previous entry.
	///
	/// `ttl` of `None` keeps the entry until it is deleted.
	fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Option<Duration>) -> StoreFuture<'a, ()>;

	/// Removes the entry stored under `key`.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Removes every entry whose key starts with `prefix`, returning how many were removed.
	fn delete_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, usize>;
}

/// Error type produced by [`CacheStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend or typed helpers.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Stored value plus its absolute expiry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
	/// JSON payload.
	pub value: Value,
	/// Instant after which the entry is treated as absent.
	pub expires_at: Option<OffsetDateTime>,
}
impl CacheEntry {
	/// Builds an entry expiring `ttl` after `now`.
	pub fn new(value: Value, ttl: Option<Duration>, now: OffsetDateTime) -> Self {
		Self { value, expires_at: ttl.map(|ttl| offset_clamped(now, ttl)) }
	}

	/// Returns `true` once `instant` has reached the expiry.
	pub fn is_expired(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|at| instant >= at)
	}
}

/// Shifts `instant` by `delta`, pinning the result to the representable range instead of
/// overflowing.
pub fn offset_clamped(instant: OffsetDateTime, delta: Duration) -> OffsetDateTime {
	instant.checked_add(delta).unwrap_or_else(|| {
		if delta.is_negative() {
			PrimitiveDateTime::MIN.assume_utc()
		} else {
			PrimitiveDateTime::MAX.assume_utc()
		}
	})
}

/// Reads and deserializes a typed value.
///
/// Entries that no longer match `T` are treated as absent so schema changes never wedge callers.
pub async fn load<T>(store: &dyn CacheStore, key: &str) -> Result<Option<T>, StoreError>
where
	T: DeserializeOwned,
{
	let Some(value) = store.get(key).await? else {
		return Ok(None);
	};

	match serde_json::from_value(value) {
		Ok(typed) => Ok(Some(typed)),
		Err(e) => {
			tracing::warn!(key, error = %e, "Discarding cache entry with unexpected shape.");

			Ok(None)
		},
	}
}

/// Serializes and stores a typed value.
pub async fn save<T>(
	store: &dyn CacheStore,
	key: &str,
	value: &T,
	ttl: Option<Duration>,
) -> Result<(), StoreError>
where
	T: Serialize + ?Sized,
{
	let value = serde_json::to_value(value)
		.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

	store.set(key, value, ttl).await
}
