//! Canonical room record and the mapping from heterogeneous room items.

// self
use crate::{
	_prelude::*,
	extract::{self, first_text, text_of},
	tree::Tree,
};

/// Code of the placeholder room emitted when no room could be extracted.
pub const PLACEHOLDER_CODE: &str = "DEFAULT";

const DESCRIPTION_SEPARATOR: &str = " • ";
const DEFAULT_OCCUPANCY: u32 = 2;

/// Room as presented to callers, independent of the upstream response shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRoom {
	/// Room-type code; `UNKNOWN` when the record only carried a name.
	pub code: String,
	/// Display name.
	pub name: String,
	/// Synthesized summary of bed, category, smoking preference, and occupancy.
	pub description: String,
	/// Room size, when the upstream record carries one.
	pub size: String,
	/// Room view, when the upstream record carries one.
	pub view: String,
	/// Maximum number of guests.
	pub max_occupancy: u32,
	/// Amenity names in upstream order.
	pub amenities: Vec<String>,
	/// Display image URL, empty when none was found.
	pub image: String,
	/// Lowest nightly price, when priced.
	pub from_price: Option<f64>,
	/// ISO currency code of `from_price`.
	pub currency: String,
}
impl NormalizedRoom {
	/// Generic call-to-action record used when a successful call yields no rooms.
	pub fn placeholder(currency: impl Into<String>) -> Self {
		Self {
			code: PLACEHOLDER_CODE.into(),
			name: "Available Rooms".into(),
			description:
				"Click Book Now to view all available rooms and rates for your selected dates."
					.into(),
			size: String::new(),
			view: String::new(),
			max_occupancy: DEFAULT_OCCUPANCY,
			amenities: Vec::new(),
			image: String::new(),
			from_price: None,
			currency: currency.into(),
		}
	}

	/// Returns `true` for the [`NormalizedRoom::placeholder`] record.
	pub fn is_placeholder(&self) -> bool {
		self.code == PLACEHOLDER_CODE
	}
}

/// Maps one room item onto a [`NormalizedRoom`].
///
/// Returns `None` for non-mapping items, products whose `productType` is not `roomtype`, and
/// records carrying neither a name nor a code. The image is left empty when the item has none
/// inline; callers may fill it from descriptive info.
pub fn normalize_room(item: &Tree, currency: &str) -> Option<NormalizedRoom> {
	let fields = item.as_object().filter(|fields| !fields.is_empty())?;

	if let Some(product_type) = fields.get("productType").and_then(text_of)
		&& product_type != "roomtype"
	{
		return None;
	}

	let code = first_text(item, ["code"]).or_else(|| extract::room_code(item));
	let name = first_text(item, ["name", "title"]);

	if code.is_none() && name.is_none() {
		tracing::trace!("Skipping room record without name or code.");

		return None;
	}

	let max_occupancy = ["totalOccupancy", "adultOccupancy"]
		.into_iter()
		.find_map(|key| item.get(key)?.as_u32())
		.unwrap_or(DEFAULT_OCCUPANCY);

	Some(NormalizedRoom {
		name: name.or_else(|| code.clone()).unwrap_or_else(|| "Room".into()),
		code: code.unwrap_or_else(|| "UNKNOWN".into()),
		description: describe(item),
		size: first_text(item, ["size"]).unwrap_or_default(),
		view: first_text(item, ["view"]).unwrap_or_default(),
		max_occupancy,
		amenities: amenities(item),
		image: inline_image(item).unwrap_or_default(),
		from_price: None,
		currency: currency.to_owned(),
	})
}

fn describe(item: &Tree) -> String {
	let adults = item.get("adultOccupancy").and_then(Tree::as_u32);
	let children = item.get("childOccupancy").and_then(Tree::as_u32);
	let mut parts = Vec::new();

	if let Some(bed) = first_text(item, ["bedType"]) {
		parts.push(format!("{bed} bed"));
	}
	if let Some(category) = first_text(item, ["roomCategory"]) {
		parts.push(format!("{category} room"));
	}
	if let Some(smoking) = first_text(item, ["smokingPref"]).filter(|pref| pref != "Nonsmoking") {
		parts.push(smoking);
	}
	if let (Some(adults), Some(children)) = (adults, children) {
		let mut occupancy = format!("{adults} adult{}", if adults > 1 { "s" } else { "" });

		if children > 0 {
			let suffix = if children > 1 { "ren" } else { "" };

			occupancy.push_str(&format!(", {children} child{suffix}"));
		}

		parts.push(occupancy);
	}

	parts.join(DESCRIPTION_SEPARATOR)
}

fn amenities(item: &Tree) -> Vec<String> {
	let Some(list) = item.get("roomAmenities") else {
		return Vec::new();
	};

	list.items()
		.iter()
		.filter_map(|amenity| match amenity {
			Tree::Object(_) => amenity.get("amenityName").and_then(text_of),
			other => text_of(other),
		})
		.collect()
}

fn inline_image(item: &Tree) -> Option<String> {
	let from_images = item
		.get("images")
		.and_then(|images| images.as_array())
		.and_then(|images| images.first())
		.and_then(|first| match first {
			Tree::Object(_) => first_text(first, ["url", "imageUrl"]),
			other => text_of(other),
		});

	from_images
		.or_else(|| first_text(item, ["imageUrl", "image.url", "image", "imageURL"]))
		.or_else(|| extract::extract_room_image(item))
}
