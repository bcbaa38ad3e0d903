//! Simple file-backed [`CacheStore`] for deployments that must keep tokens across restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	store::{CacheEntry, CacheStore, StoreError, StoreFuture},
};

type Snapshot = HashMap<String, CacheEntry>;

/// Persists cache entries to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	///
	/// Entries that already expired are dropped while loading.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let mut snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };
		let now = OffsetDateTime::now_utc();

		snapshot.retain(|_, entry| !entry.is_expired(now));

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl CacheStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<Value>> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			Ok(self
				.inner
				.read()
				.get(key)
				.filter(|entry| !entry.is_expired(now))
				.map(|entry| entry.value.clone()))
		})
	}

	fn set<'a>(&'a self, key: &'a str, value: Value, ttl: Option<Duration>) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let entry = CacheEntry::new(value, ttl, OffsetDateTime::now_utc());
			let mut guard = self.inner.write();

			guard.insert(key.to_owned(), entry);
			self.persist_locked(&guard)
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if guard.remove(key).is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(())
		})
	}

	fn delete_prefix<'a>(&'a self, prefix: &'a str) -> StoreFuture<'a, usize> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let before = guard.len();

			guard.retain(|key, _| !key.starts_with(prefix));

			let removed = before - guard.len();

			if removed > 0 {
				self.persist_locked(&guard)?;
			}

			Ok(removed)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"shr_stay_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let payload = serde_json::json!({ "access_token": "abc" });

		rt.block_on(store.set("token_record", payload.clone(), Some(Duration::hours(1))))
			.expect("Failed to save fixture entry to file store.");
		rt.block_on(store.set("stale", Value::Null, Some(Duration::seconds(-5))))
			.expect("Failed to save stale entry to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.get("token_record"))
			.expect("Failed to fetch fixture entry from file store.")
			.expect("File store lost entry after reopen.");
		let stale = rt.block_on(reopened.get("stale")).expect("Read should succeed.");

		assert_eq!(fetched, payload);
		assert_eq!(stale, None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
