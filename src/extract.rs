//! Schema-tolerant extraction of room records from Shop API and OTA documents.
//!
//! The upstream envelopes are undocumented and drift between endpoint versions, so every lookup
//! is an ordered list of candidate paths tried against a [`Tree`]; the first non-empty hit wins.
//! [`RecordLocator`] falls back to a bounded recursive key scan when no known path matches.

mod image;
mod locate;
mod room;

pub use image::*;
pub use locate::*;
pub use room::*;

// self
use crate::tree::{TEXT_KEY, Tree};

/// Reads trimmed text from a scalar or from the `$value` of an attributed element.
pub(crate) fn text_of(tree: &Tree) -> Option<String> {
	tree.as_text()
		.or_else(|| tree.as_object()?.get(TEXT_KEY)?.as_text())
		.map(|text| text.trim().to_owned())
		.filter(|text| !text.is_empty())
}

/// Returns the text of the first path in `paths` that resolves to a non-blank value.
pub(crate) fn first_text<'p>(tree: &Tree, paths: impl IntoIterator<Item = &'p str>) -> Option<String> {
	paths.into_iter().find_map(|path| tree.path(path).and_then(text_of))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn text_reads_scalars_and_attributed_elements() {
		let doc = Tree::parse_xml(r#"<Root><A Lang="en"> Sea view </A><B>7</B><C/></Root>"#)
			.expect("Fixture XML should parse.");

		assert_eq!(doc.path("A").and_then(text_of).as_deref(), Some("Sea view"));
		assert_eq!(first_text(&doc, ["C", "Missing", "B"]).as_deref(), Some("7"));
		assert_eq!(first_text(&doc, ["C"]), None);
	}
}
