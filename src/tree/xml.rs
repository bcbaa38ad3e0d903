//! Streaming XML to [`Tree`] conversion.

// std
use std::borrow::Cow;
// crates.io
use quick_xml::{
	Reader,
	escape::{self, resolve_predefined_entity},
	events::{BytesStart, Event},
};
// self
use crate::{
	error::ParseError,
	tree::{Fields, Tree},
};

/// Key under which element attributes are stored.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Key under which text is stored for elements that also carry attributes or children.
pub const TEXT_KEY: &str = "$value";

struct Frame {
	name: String,
	attributes: Fields,
	children: Fields,
	text: String,
}
impl Frame {
	fn open(start: &BytesStart) -> Self {
		let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
		let mut attributes = Fields::default();

		for attr in start.attributes().flatten() {
			let key = attr.key.as_ref();

			if key == b"xmlns" || key.starts_with(b"xmlns:") {
				continue;
			}

			let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
			let raw = String::from_utf8_lossy(&attr.value).into_owned();
			let value = match escape::unescape(&raw) {
				Ok(Cow::Owned(unescaped)) => unescaped,
				Ok(Cow::Borrowed(_)) | Err(_) => raw,
			};

			attributes.insert(key, Tree::text(value));
		}

		Self { name, attributes, children: Fields::default(), text: String::new() }
	}

	fn attach(&mut self, name: String, child: Tree) {
		match self.children.get_mut(&name) {
			Some(Tree::Array(items)) => items.push(child),
			Some(existing) => {
				let first = std::mem::replace(existing, Tree::Array(Vec::new()));

				*existing = Tree::Array(vec![first, child]);
			},
			None => self.children.insert(name, child),
		}
	}

	fn close(self) -> (String, Tree) {
		let text = self.text.trim();

		if self.attributes.is_empty() && self.children.is_empty() {
			return (self.name, Tree::text(text));
		}

		let mut fields = Fields::default();

		if !self.attributes.is_empty() {
			fields.insert(ATTRIBUTES_KEY, Tree::Object(self.attributes));
		}
		for (key, value) in self.children.iter() {
			fields.insert(key, value.clone());
		}
		if !text.is_empty() {
			fields.insert(TEXT_KEY, Tree::text(text));
		}

		(self.name, Tree::Object(fields))
	}
}

pub(super) fn parse(body: &str) -> Result<Tree, ParseError> {
	let mut reader = Reader::from_str(body);
	let mut stack: Vec<Frame> = Vec::new();
	let mut root: Option<Tree> = None;

	loop {
		let event = reader.read_event().map_err(|e| ParseError::Xml {
			position: reader.error_position(),
			message: e.to_string(),
		})?;

		match event {
			Event::Start(start) => {
				if root.is_some() && stack.is_empty() {
					return Err(malformed(&reader, "multiple root elements"));
				}

				stack.push(Frame::open(&start));
			},
			Event::Empty(start) => {
				if root.is_some() && stack.is_empty() {
					return Err(malformed(&reader, "multiple root elements"));
				}

				let (name, tree) = Frame::open(&start).close();

				finish(&mut stack, &mut root, name, tree);
			},
			Event::End(_) => {
				let Some(frame) = stack.pop() else {
					return Err(malformed(&reader, "unbalanced closing tag"));
				};
				let (name, tree) = frame.close();

				finish(&mut stack, &mut root, name, tree);
			},
			Event::Text(text) =>
				if let Some(frame) = stack.last_mut() {
					frame.text.push_str(&String::from_utf8_lossy(&text));
				},
			Event::CData(data) =>
				if let Some(frame) = stack.last_mut() {
					frame.text.push_str(&String::from_utf8_lossy(&data));
				},
			Event::GeneralRef(reference) =>
				if let Some(frame) = stack.last_mut() {
					let name = String::from_utf8_lossy(&reference).into_owned();

					match reference.resolve_char_ref() {
						Ok(Some(ch)) => frame.text.push(ch),
						_ => match resolve_predefined_entity(&name) {
							Some(resolved) => frame.text.push_str(resolved),
							None => {
								frame.text.push('&');
								frame.text.push_str(&name);
								frame.text.push(';');
							},
						},
					}
				},
			Event::Eof => break,
			_ => {},
		}
	}

	if !stack.is_empty() {
		return Err(malformed(&reader, "unexpected end of document"));
	}

	root.ok_or_else(|| malformed(&reader, "no root element"))
}

fn finish(stack: &mut [Frame], root: &mut Option<Tree>, name: String, tree: Tree) {
	match stack.last_mut() {
		Some(parent) => parent.attach(name, tree),
		None => *root = Some(tree),
	}
}

fn malformed(reader: &Reader<&[u8]>, message: &str) -> ParseError {
	ParseError::Xml { position: reader.buffer_position(), message: message.into() }
}
