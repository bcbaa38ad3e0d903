//! Thread-safe in-memory [`CacheStore`] implementation for single-process deployments and tests.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	store::{CacheEntry, CacheStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Thread-safe storage backend that keeps entries in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of live (unexpired) entries.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|entry| !entry.is_expired(now)).count()
	}

	/// Returns `true` when no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns `true` if a live entry exists under `key`.
	pub fn contains(&self, key: &str) -> bool {
		Self::get_now(&self.0, key).is_some()
	}

	fn get_now(map: &StoreMap, key: &str) -> Option<Value> {
		let now = OffsetDateTime::now_utc();

		{
			let guard = map.read();

			match guard.get(key) {
				Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		map.write().remove(key);

		None
	}

	fn set_now(map: &StoreMap, key: &str, value: Value, ttl: Option<Duration>) {
		let entry = CacheEntry::new(value, ttl, OffsetDateTime::now_utc());

		map.write().insert(key.to_owned(), entry);
	}

	fn delete_prefix_now(map: &StoreMap, prefix: &str) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|key, _| !key.starts_with(prefix));

		before - guard.len()
	}
}
impl CacheStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, key)) })
	}

	fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Option<Duration>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			Self::set_now(&self.0, key, value, ttl);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().remove(key);

			Ok(())
		})
	}

	fn delete_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, usize> {
		Box::pin(async move { Ok(Self::delete_prefix_now(&self.0, prefix)) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	#[test]
	fn expired_entries_are_evicted_on_read() {
		let store = MemoryStore::default();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");

		rt.block_on(store.set("gone", Value::from(1), Some(Duration::seconds(-1))))
			.expect("Failed to seed expired entry.");
		rt.block_on(store.set("kept", Value::from(2), None)).expect("Failed to seed entry.");

		let gone = rt.block_on(store.get("gone")).expect("Read should succeed.");
		let kept = rt.block_on(store.get("kept")).expect("Read should succeed.");

		assert_eq!(gone, None);
		assert_eq!(kept, Some(Value::from(2)));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn delete_prefix_only_touches_matching_keys() {
		let store = MemoryStore::default();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");

		for key in ["room_list_a", "room_list_b", "token_record"] {
			rt.block_on(store.set(key, Value::Null, None)).expect("Failed to seed entry.");
		}

		let removed =
			rt.block_on(store.delete_prefix("room_list_")).expect("Prefix delete should succeed.");

		assert_eq!(removed, 2);
		assert!(store.contains("token_record"));
		assert!(!store.contains("room_list_a"));
	}
}
