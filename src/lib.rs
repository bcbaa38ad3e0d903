//! OAuth-backed client for the SHR Shop and IDS hotel APIs.
//!
//! A [`flows::TokenManager`] keeps one cached access token alive through refresh and
//! client-credentials grants. [`api::ApiClient`] issues authenticated calls and turns JSON or OTA
//! XML bodies into a [`tree::Tree`], [`extract`] pulls room records out of whatever shape the API
//! returned, [`rooms::RoomCatalog`] caches the normalized list, and [`deep_link`] renders
//! booking-engine links.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod deep_link;
pub mod error;
pub mod extract;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod rooms;
pub mod store;
pub mod tree;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::ApiClient,
		config::{Credentials, Environment, ServiceEndpoints, Settings},
		flows::TokenManager,
		http::ReqwestHttpClient,
		rooms::RoomCatalog,
		store::{CacheStore, MemoryStore},
	};

	/// Catalog type alias used by reqwest-backed integration tests.
	pub type ReqwestTestCatalog = RoomCatalog<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Points every service endpoint at the provided mock server base URL.
	///
	/// The token endpoint lives at `/connect/token`, the shop API under `/shop`, the
	/// distribution API under `/ids-root`, and generic calls at the server root.
	pub fn test_endpoints(base: &str) -> ServiceEndpoints {
		let base = base.trim_end_matches('/');
		let parse = |suffix: &str| {
			Url::parse(&format!("{base}{suffix}")).expect("Mock endpoint URL should parse.")
		};

		ServiceEndpoints::builder()
			.token(parse("/connect/token"))
			.shop(parse("/shop"))
			.distribution(parse("/ids-root"))
			.generic(parse(""))
			.build()
			.expect("Mock endpoints should validate.")
	}

	/// Settings fixture carrying complete UAT credentials and the provided hotel code.
	pub fn test_settings(hotel_code: &str) -> Settings {
		Settings {
			credentials: Credentials::new("client-id", "client-secret", Environment::Uat),
			hotel_code: Some(hotel_code.into()),
			..Settings::default()
		}
	}

	/// Constructs a [`TokenManager`] backed by an in-memory store and the insecure reqwest
	/// transport used across integration tests.
	pub fn build_test_token_manager(
		settings: &Settings,
		endpoints: &ServiceEndpoints,
	) -> (TokenManager<ReqwestHttpClient>, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CacheStore> = store_backend.clone();
		let manager = TokenManager::with_http_client(
			store,
			settings,
			endpoints.token.clone(),
			test_reqwest_http_client(),
		);

		(manager, store_backend)
	}

	/// Constructs a [`RoomCatalog`] whose API client and token manager share one in-memory store.
	pub fn build_test_catalog(
		settings: Settings,
		endpoints: ServiceEndpoints,
	) -> (ReqwestTestCatalog, Arc<MemoryStore>) {
		let (manager, store_backend) = build_test_token_manager(&settings, &endpoints);
		let store: Arc<dyn CacheStore> = store_backend.clone();
		let api = ApiClient::new(Arc::new(manager), store.clone(), endpoints);
		let catalog = RoomCatalog::new(api, store, settings);

		(catalog, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
