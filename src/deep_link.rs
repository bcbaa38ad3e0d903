//! Booking-engine deep links pre-filled with the guest's search.

// crates.io
use time::Date;
// self
use crate::{
	_prelude::*,
	api::{HotelRef, hotel::format_date},
	config::Settings,
	error::ConfigError,
};

/// Search the guest wants to continue in the booking engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
	/// Hotel to book; falls back to the builder's hotel.
	pub hotel: HotelRef,
	/// Arrival date.
	pub checkin: Option<Date>,
	/// Departure date.
	pub checkout: Option<Date>,
	/// Adult guests.
	pub adults: Option<u32>,
	/// Child guests.
	pub children: Option<u32>,
	/// Number of rooms.
	pub rooms: Option<u32>,
	/// Promotion code; omitted from the link when blank.
	pub promo: Option<String>,
}

/// Renders booking-engine URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeepLink {
	base: Url,
	hotel: HotelRef,
}
impl DeepLink {
	/// Creates a builder for `base`, keeping any query parameters it already carries.
	pub fn new(base: Url) -> Self {
		Self { base, hotel: HotelRef::default() }
	}

	/// Builder for the configured booking engine and hotel.
	pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
		let base = settings.booking_engine_url.clone().ok_or(ConfigError::MissingBookingEngine)?;

		Ok(Self::new(base).with_hotel(HotelRef::from_settings(settings)))
	}

	/// Sets the hotel used when a request omits one.
	pub fn with_hotel(mut self, hotel: HotelRef) -> Self {
		self.hotel = hotel;

		self
	}

	/// Renders the link for `request`.
	///
	/// Parameters appear as `pcode`, `propertyID`, `checkin`, `checkout`, `adults`, `children`,
	/// `rooms`, and `Promo`; absent values are left out.
	pub fn build(&self, request: &BookingRequest) -> Result<Url, ConfigError> {
		let hotel = request.hotel.or(&self.hotel);
		let mut url = self.base.clone();

		{
			let mut pairs = url.query_pairs_mut();

			if let Some(code) = &hotel.hotel_code {
				pairs.append_pair("pcode", code);
			}
			if let Some(property_id) = &hotel.property_id {
				pairs.append_pair("propertyID", property_id);
			}
			if let Some(checkin) = request.checkin {
				pairs.append_pair("checkin", &format_date(checkin)?);
			}
			if let Some(checkout) = request.checkout {
				pairs.append_pair("checkout", &format_date(checkout)?);
			}
			for (key, value) in
				[("adults", request.adults), ("children", request.children), ("rooms", request.rooms)]
			{
				if let Some(value) = value {
					pairs.append_pair(key, &value.to_string());
				}
			}
			if let Some(promo) = request.promo.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
				pairs.append_pair("Promo", promo);
			}
		}

		if url.query() == Some("") {
			url.set_query(None);
		}

		Ok(url)
	}
}
