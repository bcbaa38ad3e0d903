//! Room-list pipeline: Shop API call, record location, normalization, images, and caching.
//!
//! [`RoomCatalog::room_list`] never surfaces an empty list for a hotel that answered: when no
//! record survives normalization the single [`NormalizedRoom::placeholder`] stands in so callers
//! can still offer a booking call-to-action. [`RoomCatalog::cached_room_list`] wraps the pipeline
//! in a read-through cache keyed by a digest of the query.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	api::{ApiClient, ApiErrorState, HotelRef, RoomQuery},
	auth::TokenInfo,
	config::Settings,
	extract::{self, NormalizedRoom, RecordLocator},
	flows::AuthErrorState,
	http::ApiHttpClient,
	obs::{self, CacheLookup, FlowKind, FlowOutcome, FlowSpan},
	store::{self, CacheStore},
	tree::Tree,
};

/// Prefix shared by every cached room list.
pub const ROOM_CACHE_PREFIX: &str = "shr_stay_room_list_";

/// Snapshot of the client's health for a configuration screen.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostics {
	/// Token pair status.
	pub token: TokenInfo,
	/// Most recent data-endpoint failure.
	pub last_api_error: Option<ApiErrorState>,
	/// Most recent token-endpoint failure.
	pub last_auth_error: Option<AuthErrorState>,
}

/// Produces normalized room lists for a hotel.
pub struct RoomCatalog<C>
where
	C: ?Sized + ApiHttpClient,
{
	api: ApiClient<C>,
	store: Arc<dyn CacheStore>,
	locator: RecordLocator,
	currency: String,
	cache_ttl: Duration,
}
impl<C> RoomCatalog<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a catalog; hotel identifiers missing from the client default to `settings`.
	pub fn new(api: ApiClient<C>, store: Arc<dyn CacheStore>, settings: Settings) -> Self {
		let hotel = api.hotel().or(&HotelRef::from_settings(&settings));

		Self {
			api: api.with_hotel(hotel),
			store,
			locator: RecordLocator::shop(),
			currency: settings.currency.clone(),
			cache_ttl: settings.room_cache_ttl(),
		}
	}

	/// Replaces the locator used on room-list responses.
	pub fn with_locator(mut self, locator: RecordLocator) -> Self {
		self.locator = locator;

		self
	}

	/// Underlying API client.
	pub fn api(&self) -> &ApiClient<C> {
		&self.api
	}

	/// Fetches and normalizes the hotel's rooms.
	///
	/// Rooms without an inline image are matched against the hotel's descriptive info, fetched
	/// at most once per call; a failed descriptive-info call only costs the images.
	pub async fn room_list(&self, query: &RoomQuery) -> Result<Vec<NormalizedRoom>> {
		const KIND: FlowKind = FlowKind::RoomList;

		let span = FlowSpan::new(KIND, "room_list");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.build_room_list(query)).await;

		obs::record_result(KIND, &result);

		result
	}

	/// Serves the room list from the cache, fetching and caching it on a miss.
	///
	/// `bypass` skips the cache read but still stores a fresh non-empty result.
	pub async fn cached_room_list(
		&self,
		query: &RoomQuery,
		bypass: bool,
	) -> Result<Vec<NormalizedRoom>> {
		let query = self.effective_query(query);
		let key = cache_key(&query)?;

		if bypass {
			obs::record_room_cache(CacheLookup::Bypass);
		} else if let Some(rooms) =
			store::load::<Vec<NormalizedRoom>>(self.store.as_ref(), &key).await?
		{
			obs::record_room_cache(CacheLookup::Hit);
			tracing::debug!(key, count = rooms.len(), "Serving cached room list.");

			return Ok(rooms);
		} else {
			obs::record_room_cache(CacheLookup::Miss);
		}

		let rooms = self.room_list(&query).await?;

		if !rooms.is_empty() {
			store::save(self.store.as_ref(), &key, &rooms, Some(self.cache_ttl)).await?;
		}

		Ok(rooms)
	}

	/// Drops the cached list for `query`, or every cached list when `query` is `None`.
	///
	/// Returns the number of removed entries.
	pub async fn clear_room_cache(&self, query: Option<&RoomQuery>) -> Result<usize> {
		match query {
			Some(query) => {
				let key = cache_key(&self.effective_query(query))?;
				let existed = self.store.get(&key).await?.is_some();

				self.store.delete(&key).await?;

				Ok(usize::from(existed))
			},
			None => Ok(self.store.delete_prefix(ROOM_CACHE_PREFIX).await?),
		}
	}

	/// Token status plus the last recorded API and token-endpoint failures.
	pub async fn diagnostics(&self) -> Result<Diagnostics> {
		let tokens = self.api.tokens();

		Ok(Diagnostics {
			token: tokens.token_info().await?,
			last_api_error: self.api.last_error().await?,
			last_auth_error: tokens.last_auth_error().await?,
		})
	}

	async fn build_room_list(&self, query: &RoomQuery) -> Result<Vec<NormalizedRoom>> {
		let response = self.api.rooms(query).await?;
		let mut rooms: Vec<NormalizedRoom> = self
			.locator
			.find_records(&response)
			.unwrap_or_default()
			.into_iter()
			.filter_map(|record| extract::normalize_room(record, &self.currency))
			.collect();

		self.attach_descriptive_images(query, &mut rooms).await;

		if rooms.is_empty() {
			tracing::info!("No room records extracted; using placeholder room.");

			rooms.push(NormalizedRoom::placeholder(&self.currency));
		} else {
			tracing::debug!(count = rooms.len(), "Normalized room list.");
		}

		Ok(rooms)
	}

	async fn attach_descriptive_images(&self, query: &RoomQuery, rooms: &mut [NormalizedRoom]) {
		if rooms.iter().all(|room| !room.image.is_empty()) {
			return;
		}

		let info: Tree = match self.api.hotel_descriptive_info(&query.hotel).await {
			Ok(info) => info,
			Err(e) => {
				tracing::debug!(error = %e, "Descriptive info unavailable; rooms keep no image.");

				return;
			},
		};

		for room in rooms.iter_mut().filter(|room| room.image.is_empty()) {
			if let Some(image) = extract::image_for_room(&room.code, &info) {
				room.image = image;
			}
		}
	}

	fn effective_query(&self, query: &RoomQuery) -> RoomQuery {
		RoomQuery { hotel: query.hotel.or(self.api.hotel()), ..query.clone() }
	}
}
impl<C> Debug for RoomCatalog<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RoomCatalog")
			.field("api", &self.api)
			.field("currency", &self.currency)
			.field("cache_ttl", &self.cache_ttl)
			.finish()
	}
}

/// Cache key of a room query: the prefix plus the unpadded URL-safe SHA-256 of its JSON form.
pub fn cache_key(query: &RoomQuery) -> Result<String> {
	let encoded = serde_json::to_vec(query)
		.map_err(|e| store::StoreError::Serialization { message: e.to_string() })?;
	let digest = Sha256::digest(&encoded);

	Ok(format!("{ROOM_CACHE_PREFIX}{}", URL_SAFE_NO_PAD.encode(digest)))
}
