//! Ordered-path and heuristic record location.

// self
use crate::tree::{ATTRIBUTES_KEY, Fields, Tree};

/// Default recursion bound for the heuristic scan.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Room-list envelopes used by the Shop API, most specific first.
pub const SHOP_PATHS: &[&str] = &["productDetailList", "data", "rooms", "roomTypes"];

/// OTA descriptive-info envelopes followed by generic fallbacks.
pub const OTA_PATHS: &[&str] = &[
	"HotelDescriptiveContents.HotelDescriptiveContent.FacilityInfo.GuestRooms.GuestRoom",
	"OTA_HotelDescriptiveInfoRS.HotelDescriptiveContents.HotelDescriptiveContent.FacilityInfo.GuestRooms.GuestRoom",
	"HotelDescriptiveContent.FacilityInfo.GuestRooms.GuestRoom",
	"FacilityInfo.GuestRooms.GuestRoom",
	"GuestRooms.GuestRoom",
	"HotelDescriptiveContents.HotelDescriptiveContent.RoomTypes.RoomType",
	"OTA_HotelDescriptiveInfoRS.HotelDescriptiveContents.HotelDescriptiveContent.RoomTypes.RoomType",
	"HotelDescriptiveInfoRS.HotelDescriptiveInfo.RoomTypes.RoomType",
	"HotelDescriptiveInfoRS.RoomTypes.RoomType",
	"HotelDescriptiveInfo.RoomTypes.RoomType",
	"RoomTypes.RoomType",
	"roomTypes",
	"rooms",
	"RoomType",
	"GuestRoom",
	"data",
];

/// Property names (compared case-insensitively) that mark a mapping as room-shaped.
const ROOM_PROPERTIES: &[&str] = &["name", "code", "description", "roomtypecode", "roomtype", "title"];

/// Locates the sequence of room records inside a response tree.
///
/// Lookup runs in two tiers that both stop at the first success:
/// 1. [`RecordLocator::paths`] in order at the root (and, for locators built with
///    [`RecordLocator::shop`], a bare top-level sequence);
/// 2. a depth-bounded scan for keys whose lowercased name contains `room` and whose first item
///    is a mapping carrying a room-like property, re-trying the nested paths at every level.
///
/// Results are never merged across paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordLocator {
	/// Root-level candidate paths, most specific first.
	pub paths: Vec<String>,
	/// Paths re-tried at every level of the heuristic scan.
	pub nested_paths: Vec<String>,
	/// Accept a non-empty top-level sequence as the record list.
	pub root_sequence: bool,
	/// Recursion bound of the heuristic scan.
	pub max_depth: usize,
}
impl RecordLocator {
	/// Locator for Shop API room lists: `productDetailList`, `data`, `rooms`, `roomTypes`, a bare
	/// sequence, then the OTA envelopes.
	pub fn shop() -> Self {
		Self {
			paths: SHOP_PATHS.iter().chain(OTA_PATHS).map(|path| (*path).to_owned()).collect(),
			nested_paths: owned(OTA_PATHS),
			root_sequence: true,
			max_depth: DEFAULT_MAX_DEPTH,
		}
	}

	/// Locator for OTA descriptive-info documents.
	pub fn ota() -> Self {
		Self {
			paths: owned(OTA_PATHS),
			nested_paths: owned(OTA_PATHS),
			root_sequence: false,
			max_depth: DEFAULT_MAX_DEPTH,
		}
	}

	/// Overrides the heuristic recursion bound.
	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;

		self
	}

	/// Returns the located records, or `None` when neither tier matches.
	///
	/// A singular mapping found at a record path is treated as a one-element sequence.
	pub fn find_records<'a>(&self, tree: &'a Tree) -> Option<Vec<&'a Tree>> {
		if self.root_sequence
			&& let Tree::Array(items) = tree
			&& !items.is_empty()
		{
			return Some(items.iter().collect());
		}
		if let Some(found) = self.match_paths(tree, &self.paths) {
			return Some(found);
		}

		let found = self.scan(tree, 0);

		if let Some(records) = &found {
			tracing::debug!(count = records.len(), "Room records located by heuristic scan.");
		}

		found
	}

	fn match_paths<'a>(&self, tree: &'a Tree, paths: &[String]) -> Option<Vec<&'a Tree>> {
		paths
			.iter()
			.find_map(|path| tree.path_non_empty(path))
			.map(|found| found.items().iter().collect())
	}

	fn scan<'a>(&self, tree: &'a Tree, depth: usize) -> Option<Vec<&'a Tree>> {
		if depth >= self.max_depth {
			return None;
		}

		let children: Vec<(Option<&str>, &Tree)> = match tree {
			Tree::Object(fields) => fields.iter().map(|(key, value)| (Some(key), value)).collect(),
			Tree::Array(items) => items.iter().map(|item| (None, item)).collect(),
			Tree::Scalar(_) => return None,
		};

		if depth > 0
			&& let Some(found) = self.match_paths(tree, &self.nested_paths)
		{
			return Some(found);
		}

		for (key, value) in children {
			if matches!(value, Tree::Scalar(_)) {
				continue;
			}
			if key.is_some_and(|key| key.to_ascii_lowercase().contains("room"))
				&& !value.is_empty()
				&& looks_like_room(value)
			{
				return Some(value.items().iter().collect());
			}
			if let Some(found) = self.scan(value, depth + 1) {
				return Some(found);
			}
		}

		None
	}
}

fn looks_like_room(value: &Tree) -> bool {
	let Some(first) = value.path("0").and_then(Tree::as_object) else {
		return false;
	};
	let has_property = |fields: &Fields| {
		fields.iter().any(|(key, _)| ROOM_PROPERTIES.contains(&key.to_ascii_lowercase().as_str()))
	};

	has_property(first)
		|| first.get(ATTRIBUTES_KEY).and_then(Tree::as_object).is_some_and(has_property)
}

fn owned(paths: &[&str]) -> Vec<String> {
	paths.iter().map(|path| (*path).to_owned()).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn tree(raw: &str) -> Tree {
		Tree::parse_json(raw).expect("Fixture JSON should parse.")
	}

	#[test]
	fn first_non_empty_path_wins() {
		let doc = tree(r#"{"productDetailList":[],"rooms":[{"code":"A"}],"roomTypes":[{"code":"B"}]}"#);
		let records = RecordLocator::shop().find_records(&doc).expect("Rooms should be located.");

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].path("code").and_then(Tree::as_str), Some("A"));
	}

	#[test]
	fn bare_sequence_is_accepted_for_shop_lists() {
		let doc = tree(r#"[{"code":"A"},{"code":"B"}]"#);

		assert_eq!(RecordLocator::shop().find_records(&doc).map(|r| r.len()), Some(2));
		assert_eq!(RecordLocator::ota().with_max_depth(0).find_records(&doc), None);
	}

	#[test]
	fn heuristic_finds_room_like_keys() {
		let doc = tree(r#"{"result":{"meta":{"count":1},"availableRoomTypes":[{"Title":"Deluxe","code":"DLX"}]}}"#);
		let records = RecordLocator::shop().find_records(&doc).expect("Heuristic should match.");

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].path("code").and_then(Tree::as_str), Some("DLX"));
	}

	#[test]
	fn heuristic_reads_attribute_properties_and_singular_records() {
		let doc = Tree::parse_xml(
			r#"<Envelope><Body><Rooms><Room RoomTypeCode="STD"/></Rooms></Body></Envelope>"#,
		)
		.expect("Fixture XML should parse.");
		let records = RecordLocator::ota().find_records(&doc).expect("Heuristic should match.");

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].path("@attributes.RoomTypeCode").and_then(Tree::as_str), Some("STD"));
	}

	#[test]
	fn heuristic_respects_depth_and_room_shape() {
		let deep = tree(r#"{"a":{"b":{"c":{"rooms_here":[{"name":"X"}]}}}}"#);
		let shapeless = tree(r#"{"roomStats":[{"count":3}]}"#);

		assert!(RecordLocator::ota().find_records(&deep).is_some());
		assert!(RecordLocator::ota().with_max_depth(2).find_records(&deep).is_none());
		assert!(RecordLocator::shop().find_records(&shapeless).is_none());
	}

	#[test]
	fn nested_ota_envelope_is_found_below_the_root() {
		let doc = tree(
			r#"{"Success":{},"Wrapper":{"GuestRooms":{"GuestRoom":[{"Code":"A"},{"Code":"B"}]}}}"#,
		);
		let records = RecordLocator::ota().find_records(&doc).expect("Nested envelope should match.");

		assert_eq!(records.len(), 2);
	}
}
