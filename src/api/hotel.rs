//! Typed wrappers for the hotel endpoints: room list, rate calendar, and descriptive info.

// crates.io
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	api::{ApiClass, ApiClient, Method},
	config::{Settings, settings::non_blank},
	error::ConfigError,
	http::ApiHttpClient,
	tree::Tree,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Hotel identifiers; either one is enough for most endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HotelRef {
	/// Hotel code (`pcode`).
	pub hotel_code: Option<String>,
	/// Property identifier (`propertyID`).
	pub property_id: Option<String>,
}
impl HotelRef {
	/// Identifies a hotel by code.
	pub fn code(hotel_code: impl Into<String>) -> Self {
		Self { hotel_code: Some(hotel_code.into()), property_id: None }
	}

	/// Identifies a hotel by property identifier.
	pub fn property(property_id: impl Into<String>) -> Self {
		Self { hotel_code: None, property_id: Some(property_id.into()) }
	}

	/// Identifiers configured in `settings`.
	pub fn from_settings(settings: &Settings) -> Self {
		Self {
			hotel_code: settings.hotel_code().map(str::to_owned),
			property_id: settings.property_id().map(str::to_owned),
		}
	}

	/// Fills blank identifiers from `fallback`.
	pub fn or(&self, fallback: &HotelRef) -> Self {
		Self {
			hotel_code: non_blank(self.hotel_code.as_deref())
				.or(non_blank(fallback.hotel_code.as_deref()))
				.map(str::to_owned),
			property_id: non_blank(self.property_id.as_deref())
				.or(non_blank(fallback.property_id.as_deref()))
				.map(str::to_owned),
		}
	}

	/// Returns `true` when neither identifier is set.
	pub fn is_empty(&self) -> bool {
		non_blank(self.hotel_code.as_deref()).is_none()
			&& non_blank(self.property_id.as_deref()).is_none()
	}
}

/// Parameters of a Shop API room-list request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomQuery {
	/// Hotel to list; falls back to the client's configured hotel.
	pub hotel: HotelRef,
	/// Arrival date filter.
	pub checkin: Option<Date>,
	/// Departure date filter.
	pub checkout: Option<Date>,
}
impl RoomQuery {
	/// Room query for a hotel code.
	pub fn for_hotel(hotel_code: impl Into<String>) -> Self {
		Self { hotel: HotelRef::code(hotel_code), ..Default::default() }
	}

	/// Restricts the query to a stay.
	pub fn with_stay(mut self, checkin: Date, checkout: Date) -> Self {
		self.checkin = Some(checkin);
		self.checkout = Some(checkout);

		self
	}
}

/// Parameters of a Shop API rate-calendar request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RateCalendarQuery {
	/// Hotel to price; falls back to the client's configured hotel.
	pub hotel: HotelRef,
	/// Arrival date; tomorrow when omitted.
	pub checkin: Option<Date>,
	/// Departure date; three days out when omitted.
	pub checkout: Option<Date>,
	/// Adult guests.
	pub adults: Option<u32>,
	/// Child guests.
	pub children: Option<u32>,
	/// Number of rooms.
	pub rooms: Option<u32>,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Lists the hotel's room types: `GET /hotelDetails/{code}/room?channelId=1` on the shop host.
	///
	/// Only the hotel code identifies the hotel here; a property identifier alone is not enough.
	pub async fn rooms(&self, query: &RoomQuery) -> Result<Tree> {
		let hotel = query.hotel.or(self.hotel());
		let code = hotel.hotel_code.ok_or(ConfigError::MissingHotelIdentifier)?;
		let mut params = Serializer::new(String::new());

		params.append_pair("channelId", "1");

		if let Some(checkin) = query.checkin {
			params.append_pair("checkin", &format_date(checkin)?);
		}
		if let Some(checkout) = query.checkout {
			params.append_pair("checkout", &format_date(checkout)?);
		}

		let endpoint = format!("/hotelDetails/{code}/room?{}", params.finish());

		self.request(&endpoint, Method::GET, None, ApiClass::Shop).await
	}

	/// Fetches lowest per-room rates: `GET /wsapi/shop/ratecalendar` on the generic host.
	///
	/// Check-in defaults to tomorrow and check-out to three days out; `month`/`year` follow the
	/// requested check-in, or today when none was given.
	pub async fn rate_calendar(&self, query: &RateCalendarQuery) -> Result<Tree> {
		let hotel = self.resolve_hotel(&query.hotel)?;
		let today = OffsetDateTime::now_utc().date();
		let checkin = query.checkin.unwrap_or(today + Duration::days(1));
		let checkout = query.checkout.unwrap_or(today + Duration::days(3));
		let calendar_month = query.checkin.unwrap_or(today);
		let mut params = Serializer::new(String::new());

		append_hotel(&mut params, &hotel, "pcode");
		params.append_pair("checkin", &format_date(checkin)?);
		params.append_pair("checkout", &format_date(checkout)?);

		for (key, value) in
			[("adults", query.adults), ("children", query.children), ("rooms", query.rooms)]
		{
			if let Some(value) = value.filter(|value| *value > 0) {
				params.append_pair(key, &value.to_string());
			}
		}

		params.append_pair("RateReturnType", "MinPerRoom");
		params.append_pair("month", &format!("{:02}", u8::from(calendar_month.month())));
		params.append_pair("year", &calendar_month.year().to_string());

		let endpoint = format!("/wsapi/shop/ratecalendar?{}", params.finish());

		self.request(&endpoint, Method::GET, None, ApiClass::Generic).await
	}

	/// Fetches OTA descriptive info (rooms, multimedia): `GET /ids/hoteldescriptiveinfo` on the
	/// distribution host.
	pub async fn hotel_descriptive_info(&self, hotel: &HotelRef) -> Result<Tree> {
		let hotel = self.resolve_hotel(hotel)?;
		let mut params = Serializer::new(String::new());

		append_hotel(&mut params, &hotel, "hotelCode");

		let endpoint = format!("/ids/hoteldescriptiveinfo?{}", params.finish());

		self.request(&endpoint, Method::GET, None, ApiClass::Distribution).await
	}

	fn resolve_hotel(&self, hotel: &HotelRef) -> Result<HotelRef, ConfigError> {
		let hotel = hotel.or(self.hotel());

		if hotel.is_empty() {
			return Err(ConfigError::MissingHotelIdentifier);
		}

		Ok(hotel)
	}
}

fn append_hotel(params: &mut Serializer<'_, String>, hotel: &HotelRef, code_key: &str) {
	if let Some(property_id) = &hotel.property_id {
		params.append_pair("propertyID", property_id);
	}
	if let Some(code) = &hotel.hotel_code {
		params.append_pair(code_key, code);
	}
}

pub(crate) fn format_date(date: Date) -> Result<String, ConfigError> {
	date.format(DATE_FORMAT).map_err(ConfigError::DateFormat)
}
