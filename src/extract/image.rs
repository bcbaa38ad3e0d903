//! Room image and room code lookup in OTA multimedia structures.

// self
use crate::{
	extract::{RecordLocator, first_text, text_of},
	tree::Tree,
};

/// Candidate image paths inside one room record, most specific first.
pub const IMAGE_PATHS: &[&str] = &[
	"MultimediaDescriptions.MultimediaDescription.ImageItems.ImageItem.0.ImageFormat.URL",
	"MultimediaDescriptions.MultimediaDescription.ImageItems.ImageItem.ImageFormat.URL",
	"MultimediaDescriptions.MultimediaDescription.ImageItems.ImageItem.0.ImageFormat.url",
	"MultimediaDescriptions.MultimediaDescription.ImageItems.ImageItem.ImageFormat.url",
	"MultimediaDescriptions.ImageItems.ImageItem.0.ImageFormat.URL",
	"MultimediaDescriptions.ImageItems.ImageItem.ImageFormat.URL",
	"ImageItems.ImageItem.0.ImageFormat.URL",
	"ImageItems.ImageItem.ImageFormat.URL",
	"MediaItems.MediaItem.0.URL",
	"MediaItems.MediaItem.0.@attributes.URL",
	"MediaItems.MediaItem.URL",
	"MediaItems.MediaItem.@attributes.URL",
	"MediaItems.MediaItem.0.url",
	"MediaItems.MediaItem.0.@attributes.url",
	"Images.Image.0.URL",
	"Images.Image.0.@attributes.URL",
	"Images.Image.URL",
	"Images.Image.@attributes.URL",
	"image",
	"Image",
	"imageUrl",
	"imageURL",
];

/// Candidate room-type code paths inside one room record.
pub const ROOM_CODE_PATHS: &[&str] = &[
	"TypeRoom.@attributes.RoomTypeCode",
	"TypeRoom.RoomTypeCode",
	"RoomTypeCode",
	"@attributes.RoomTypeCode",
	"code",
	"roomCode",
	"roomTypeCode",
	"@attributes.code",
];

/// Extracts a display image URL from a room record.
///
/// The ordered [`IMAGE_PATHS`] only look at the first element of each sequence, so a second pass
/// walks every `MultimediaDescription`, `ImageItem`, `MediaItem`, and `Image` and returns the
/// first URL found.
pub fn extract_room_image(room: &Tree) -> Option<String> {
	if let Some(url) = first_text(room, IMAGE_PATHS.iter().copied()) {
		return Some(url);
	}

	let from_descriptions = room
		.path("MultimediaDescriptions.MultimediaDescription")
		.into_iter()
		.flat_map(Tree::items)
		.filter_map(|description| description.path("ImageItems.ImageItem"))
		.flat_map(Tree::items)
		.find_map(|item| {
			let format = item.get("ImageFormat")?;

			format.items().iter().find_map(|format| first_text(format, ["URL", "url"]))
		});

	from_descriptions
		.or_else(|| first_url(room, "MediaItems.MediaItem"))
		.or_else(|| first_url(room, "Images.Image"))
}

/// Reads the room-type code of an OTA or Shop API room record.
pub fn room_code(room: &Tree) -> Option<String> {
	first_text(room, ROOM_CODE_PATHS.iter().copied())
}

/// Finds the image of the room whose code equals `code` in a descriptive-info document.
///
/// Rooms that match the code but carry no image are skipped so a later duplicate may supply one.
pub fn image_for_room(code: &str, descriptive_info: &Tree) -> Option<String> {
	let code = code.trim();

	if code.is_empty() {
		return None;
	}

	let records = RecordLocator::ota().find_records(descriptive_info)?;
	let image = records
		.into_iter()
		.filter(|record| room_code(record).as_deref() == Some(code))
		.find_map(extract_room_image);

	if image.is_none() {
		tracing::debug!(code, "No descriptive-info image matched the room code.");
	}

	image
}

fn first_url(room: &Tree, path: &str) -> Option<String> {
	room.path(path)?
		.items()
		.iter()
		.find_map(|item| first_text(item, ["URL", "url", "@attributes.URL"]))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const URL: &str = "http://x/y.jpg";

	fn tree(raw: &str) -> Tree {
		Tree::parse_json(raw).expect("Fixture JSON should parse.")
	}

	#[test]
	fn singular_and_sequence_multimedia_shapes_resolve() {
		let shapes = [
			r#"{"MultimediaDescriptions":{"MultimediaDescription":{"ImageItems":{"ImageItem":{"ImageFormat":{"URL":"http://x/y.jpg"}}}}}}"#,
			r#"{"MultimediaDescriptions":{"MultimediaDescription":[{"ImageItems":{"ImageItem":[{"ImageFormat":{"URL":"http://x/y.jpg"}}]}}]}}"#,
			r#"{"MultimediaDescriptions":[{"MultimediaDescription":[{"ImageItems":[{"ImageItem":{"ImageFormat":[{"URL":"http://x/y.jpg"}]}}]}]}]}"#,
		];

		for shape in shapes {
			assert_eq!(extract_room_image(&tree(shape)).as_deref(), Some(URL), "{shape}");
		}
	}

	#[test]
	fn later_multimedia_items_are_searched() {
		let room = tree(
			r#"{"MultimediaDescriptions":{"MultimediaDescription":[
				{"TextItems":{"TextItem":{"Description":"Sea view"}}},
				{"ImageItems":{"ImageItem":[{"ImageFormat":{"Width":"10"}},{"ImageFormat":{"url":"http://x/y.jpg"}}]}}
			]}}"#,
		);

		assert_eq!(extract_room_image(&room).as_deref(), Some(URL));
	}

	#[test]
	fn media_items_and_direct_fields_are_fallbacks() {
		let media = Tree::parse_xml(
			r#"<GuestRoom><MediaItems><MediaItem URL="http://x/a.jpg"/><MediaItem URL="http://x/b.jpg"/></MediaItems></GuestRoom>"#,
		)
		.expect("Fixture XML should parse.");
		let direct = tree(r#"{"imageURL":"http://x/y.jpg"}"#);

		assert_eq!(extract_room_image(&media).as_deref(), Some("http://x/a.jpg"));
		assert_eq!(extract_room_image(&direct).as_deref(), Some(URL));
		assert_eq!(extract_room_image(&tree(r#"{"image":""}"#)), None);
	}

	#[test]
	fn image_is_matched_by_room_code_in_descriptive_info() {
		let info = Tree::parse_xml(
			r#"<OTA_HotelDescriptiveInfoRS>
				<HotelDescriptiveContents><HotelDescriptiveContent><FacilityInfo><GuestRooms>
					<GuestRoom><TypeRoom RoomTypeCode="STD"/>
						<MultimediaDescriptions><MultimediaDescription><ImageItems><ImageItem>
							<ImageFormat><URL>http://x/std.jpg</URL></ImageFormat>
						</ImageItem></ImageItems></MultimediaDescription></MultimediaDescriptions>
					</GuestRoom>
					<GuestRoom><TypeRoom RoomTypeCode="DLX"/>
						<MultimediaDescriptions><MultimediaDescription><ImageItems><ImageItem>
							<ImageFormat><URL>http://x/dlx.jpg</URL></ImageFormat>
						</ImageItem></ImageItems></MultimediaDescription></MultimediaDescriptions>
					</GuestRoom>
				</GuestRooms></FacilityInfo></HotelDescriptiveContent></HotelDescriptiveContents>
			</OTA_HotelDescriptiveInfoRS>"#,
		)
		.expect("Fixture XML should parse.");

		assert_eq!(image_for_room("DLX", &info).as_deref(), Some("http://x/dlx.jpg"));
		assert_eq!(image_for_room("STD", &info).as_deref(), Some("http://x/std.jpg"));
		assert_eq!(image_for_room("SUI", &info), None);
		assert_eq!(image_for_room(" ", &info), None);
	}

	#[test]
	fn room_code_prefers_ota_type_room() {
		let room = tree(r#"{"TypeRoom":{"@attributes":{"RoomTypeCode":"STD"}},"code":"other"}"#);

		assert_eq!(room_code(&room).as_deref(), Some("STD"));
		assert_eq!(room_code(&tree(r#"{"roomCode":"DLX"}"#)).as_deref(), Some("DLX"));
	}
}
