//! Lists a hotel's rooms through a mocked SHR stack with the default reqwest transport and
//! in-memory cache, then renders a booking-engine link for the first room.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use shr_stay::{
	api::{ApiClient, RoomQuery},
	config::{Credentials, EndpointOverrides, Environment, Settings},
	deep_link::{BookingRequest, DeepLink},
	rooms::RoomCatalog,
	store::{CacheStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let rooms_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/shop/hotelDetails/DEMO/room");
			then.status(200).header("content-type", "application/json").body(
				"{\"productDetailList\":[{\"code\":\"STD\",\"name\":\"Standard\",\"productType\":\"roomtype\",\
				 \"totalOccupancy\":2,\"bedType\":\"Queen\",\"imageUrl\":\"https://img.example.com/std.jpg\"}]}",
			);
		})
		.await;
	let settings = Settings {
		credentials: Credentials::new("demo-client", "super-secret", Environment::Uat),
		endpoints: EndpointOverrides {
			token: Some(Url::parse(&server.url("/connect/token"))?),
			shop: Some(Url::parse(&server.url("/shop"))?),
			distribution: Some(Url::parse(&server.url("/ids"))?),
			generic: Some(Url::parse(&server.base_url())?),
		},
		hotel_code: Some("DEMO".into()),
		booking_engine_url: Some(Url::parse("https://be.example.com/book")?),
		..Settings::default()
	};
	let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::default());
	let api = ApiClient::from_settings(store.clone(), &settings)?;
	let catalog = RoomCatalog::new(api, store, settings.clone());
	let rooms = catalog.cached_room_list(&RoomQuery::default(), false).await?;

	for room in &rooms {
		println!("{} ({}): {}.", room.name, room.code, room.description);
	}

	let link = DeepLink::from_settings(&settings)?
		.build(&BookingRequest { adults: Some(2), rooms: Some(1), ..Default::default() })?;

	println!("Book at {link}.");

	token_mock.assert_async().await;
	rooms_mock.assert_async().await;

	Ok(())
}
