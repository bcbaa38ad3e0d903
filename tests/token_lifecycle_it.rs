#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use shr_stay::{
	_preludet::*,
	auth::{TokenRecord, TokenStore},
	config::Settings,
	error::AuthError,
	store::MemoryStore,
};

const HOTEL_CODE: &str = "TOKENTEST";

fn token_body(access: &str, expires_in: u32) -> String {
	format!("{{\"access_token\":\"{access}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in}}}")
}

async fn seed_record(store: &Arc<MemoryStore>, access_expires_in: Duration, refresh_expires_in: Duration) {
	let now = OffsetDateTime::now_utc();
	let record = TokenRecord::builder()
		.issued_at(now - Duration::hours(1))
		.access_token("stale-access")
		.expires_at(now + access_expires_in)
		.refresh_token("seeded-refresh")
		.refresh_expires_at(now + refresh_expires_in)
		.build()
		.expect("Token record fixture should build successfully.");

	TokenStore::new(store.clone())
		.save(&record)
		.await
		.expect("Failed to seed token record into the store.");
}

#[tokio::test]
async fn cached_token_is_reused_without_second_grant() {
	let server = MockServer::start_async().await;
	let (manager, _store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("cached-token", 1800));
		})
		.await;
	let first = manager.get_access_token().await.expect("Initial token request should succeed.");
	let second = manager.get_access_token().await.expect("Cached token request should succeed.");

	assert_eq!(first.expose(), "cached-token");
	assert_eq!(second.expose(), "cached-token");
	assert!(manager.is_token_valid().await.expect("Token validity check should succeed."));
	assert_eq!(manager.grant_metrics().client_credentials_grants(), 1);
	assert!(manager.grant_metrics().cache_hits() >= 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_callers_share_one_grant() {
	let server = MockServer::start_async().await;
	let (manager, _store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("guard-token", 900));
		})
		.await;
	let (first, second) = tokio::join!(manager.get_access_token(), manager.get_access_token());

	assert_eq!(first.expect("First concurrent call should succeed.").expose(), "guard-token");
	assert_eq!(second.expect("Second concurrent call should succeed.").expose(), "guard-token");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn stale_access_token_is_refreshed_and_refresh_token_retained() {
	let server = MockServer::start_async().await;
	let (manager, store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));

	seed_record(&store, Duration::seconds(60), Duration::days(1)).await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "seeded-refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("refreshed-token", 1800));
		})
		.await;
	let credentials_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("full-auth-token", 1800));
		})
		.await;
	let token = manager.get_access_token().await.expect("Refresh should produce a token.");

	assert_eq!(token.expose(), "refreshed-token");

	refresh_mock.assert_calls_async(1).await;
	credentials_mock.assert_calls_async(0).await;

	let info = manager.token_info().await.expect("Token info should load.");

	assert!(info.access_valid);
	assert!(info.has_refresh_token);
	assert!(info.refresh_expires_in > 80_000);
	assert_eq!(manager.grant_metrics().refresh_grants(), 1);
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_client_credentials() {
	let server = MockServer::start_async().await;
	let (manager, store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));

	seed_record(&store, Duration::seconds(-30), Duration::days(1)).await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let credentials_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("fallback-token", 1800));
		})
		.await;
	let token = manager.get_access_token().await.expect("Fallback grant should succeed.");

	assert_eq!(token.expose(), "fallback-token");
	assert!(
		manager.last_auth_error().await.expect("Auth error state should load.").is_none(),
		"A successful grant clears the recorded refresh failure."
	);

	refresh_mock.assert_calls_async(1).await;
	credentials_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn clear_token_forces_full_authentication() {
	let server = MockServer::start_async().await;
	let (manager, store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("fresh-token", 1800));
		})
		.await;

	manager.get_access_token().await.expect("Initial grant should succeed.");
	manager.clear_token().await.expect("Clearing the token should succeed.");

	assert!(store.is_empty());
	assert!(!manager.is_token_valid().await.expect("Token validity check should succeed."));

	manager.get_access_token().await.expect("Second grant should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn missing_credentials_never_reach_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let settings = Settings { hotel_code: Some(HOTEL_CODE.into()), ..Settings::default() };
	let (manager, _store) = build_test_token_manager(&settings, &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("unused", 1800));
		})
		.await;
	let err = manager.get_access_token().await.expect_err("Missing credentials should fail.");

	assert!(matches!(err, Error::Auth(AuthError::MissingCredentials)));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_client_credentials_are_recorded() {
	let server = MockServer::start_async().await;
	let (manager, _store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\",\"error_description\":\"Unknown client.\"}");
		})
		.await;
	let err = manager.get_access_token().await.expect_err("Rejected grant should fail.");

	assert!(matches!(err, Error::Auth(AuthError::Rejected { .. })));

	let state = manager
		.last_auth_error()
		.await
		.expect("Auth error state should load.")
		.expect("Rejected grant should be recorded.");

	assert_eq!(state.grant, "client_credentials");
	assert_eq!(state.status, Some(401));
	assert!(state.message.contains("invalid_client"));
	assert_eq!(manager.grant_metrics().failures(), 1);

	mock.assert_async().await;
}

#[tokio::test]
async fn reply_without_token_type_is_accepted() {
	let server = MockServer::start_async().await;
	let (manager, _store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"typeless-token\",\"expires_in\":1800}");
		})
		.await;
	let token = manager.get_access_token().await.expect("Reply without token_type should succeed.");

	assert_eq!(token.expose(), "typeless-token");
	assert!(manager.last_auth_error().await.expect("Auth error state should load.").is_none());

	mock.assert_async().await;
}

#[tokio::test]
async fn rotated_refresh_token_replaces_the_stored_one() {
	let server = MockServer::start_async().await;
	let (manager, store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));

	seed_record(&store, Duration::seconds(60), Duration::days(1)).await;

	let mut first_refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "seeded-refresh");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"rotated-access\",\"token_type\":\"bearer\",\"expires_in\":1800,\
				 \"refresh_token\":\"rotated-refresh\",\"refresh_token_expires_in\":7200}",
			);
		})
		.await;
	let token = manager.get_access_token().await.expect("Refresh should produce a token.");

	assert_eq!(token.expose(), "rotated-access");

	first_refresh.assert_calls_async(1).await;
	first_refresh.delete_async().await;

	let record = TokenStore::new(store.clone())
		.load()
		.await
		.expect("Token record should load.")
		.expect("Refreshed record should be stored.");

	assert_eq!(record.refresh_token.as_ref().map(|token| token.expose()), Some("rotated-refresh"));

	let info = manager.token_info().await.expect("Token info should load.");

	assert!((7_190..=7_200).contains(&info.refresh_expires_in));

	let stale = TokenRecord::builder()
		.access_token("rotated-access")
		.expires_in(Duration::seconds(30))
		.retained_refresh(record.refresh_token.clone().expect("Rotated secret."), record.refresh_expiry)
		.build()
		.expect("Stale record fixture should build.");

	TokenStore::new(store.clone()).save(&stale).await.expect("Stale record should be saved.");

	let second_refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "refresh_token")
				.form_urlencoded_tuple("refresh_token", "rotated-refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("second-access", 1800));
		})
		.await;
	let token = manager.get_access_token().await.expect("Second refresh should produce a token.");

	assert_eq!(token.expose(), "second-access");
	assert_eq!(manager.grant_metrics().refresh_grants(), 2);

	second_refresh.assert_async().await;
}

#[tokio::test]
async fn oversized_lifetimes_are_clamped() {
	let server = MockServer::start_async().await;
	let (manager, _store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"long-lived\",\"token_type\":\"bearer\",\
				 \"expires_in\":18446744073709551615,\"refresh_token\":\"long-refresh\",\
				 \"refresh_token_expires_in\":18446744073709551615}",
			);
		})
		.await;
	let token = manager.get_access_token().await.expect("Oversized lifetimes should not fail.");

	assert_eq!(token.expose(), "long-lived");
	assert!(manager.is_token_valid().await.expect("Token validity check should succeed."));

	let info = manager.token_info().await.expect("Token info should load.");

	assert!(info.has_refresh_token);
	assert!(info.access_expires_in > 365 * 24 * 3_600);

	manager.get_access_token().await.expect("Cached token should be reused.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_lifetimes_fall_back_to_configured_defaults() {
	let server = MockServer::start_async().await;
	let (manager, _store) =
		build_test_token_manager(&test_settings(HOTEL_CODE), &test_endpoints(&server.base_url()));
	let mut bare = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"bare-token\"}");
		})
		.await;

	manager.get_access_token().await.expect("Reply without lifetimes should succeed.");

	let info = manager.token_info().await.expect("Token info should load.");

	assert!((3_590..=3_600).contains(&info.access_expires_in));
	assert!(!info.has_refresh_token);
	assert_eq!(info.refresh_expires_in, 0);

	bare.assert_async().await;
	bare.delete_async().await;
	manager.clear_token().await.expect("Clearing the token should succeed.");

	let with_refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"paired-token\",\"refresh_token\":\"paired-refresh\"}");
		})
		.await;

	manager.get_access_token().await.expect("Reply with an undated refresh token should succeed.");

	let info = manager.token_info().await.expect("Token info should load.");

	assert!(info.has_refresh_token);
	assert!((2_591_990..=2_592_000).contains(&info.refresh_expires_in));

	with_refresh.assert_async().await;
}
