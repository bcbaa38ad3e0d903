//! Type-erased document tree shared by JSON and XML responses.
//!
//! [`Tree::path`] walks dot-separated segments. Numeric segments index sequences, named
//! segments look up mapping keys. Upstream documents flip between a singular mapping and a
//! one-element sequence for the same field, so a named segment applied to a sequence reads its
//! first element and index `0` applied to a mapping yields the mapping itself; both shapes
//! resolve identically.

mod xml;

pub use xml::{ATTRIBUTES_KEY, TEXT_KEY};

// crates.io
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Number, Value};
// self
use crate::{_prelude::*, error::ParseError};

/// Leaf value of a [`Tree`].
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
	/// JSON `null`.
	Null,
	/// Boolean.
	Bool(bool),
	/// JSON number.
	Number(Number),
	/// String or XML text.
	String(String),
}

/// Mapping entries kept in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fields(Vec<(String, Tree)>);
impl Fields {
	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Tree> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Returns a mutable reference to the value stored under `key`.
	pub fn get_mut(&mut self, key: &str) -> Option<&mut Tree> {
		self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	/// Inserts or replaces `key`, keeping the original position on replacement.
	pub fn insert(&mut self, key: impl Into<String>, value: Tree) {
		let key = key.into();

		match self.get_mut(&key) {
			Some(slot) => *slot = value,
			None => self.0.push((key, value)),
		}
	}

	/// Iterates entries in document order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Tree)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the mapping has no entries.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl FromIterator<(String, Tree)> for Fields {
	fn from_iter<I: IntoIterator<Item = (String, Tree)>>(iter: I) -> Self {
		let mut fields = Fields::default();

		for (key, value) in iter {
			fields.insert(key, value);
		}

		fields
	}
}

/// Parsed response document: mapping, sequence, or scalar.
#[derive(Clone, Debug, PartialEq)]
pub enum Tree {
	/// Key/value mapping (JSON object or XML element with children/attributes).
	Object(Fields),
	/// Ordered sequence (JSON array or repeated XML siblings).
	Array(Vec<Tree>),
	/// Leaf value.
	Scalar(Scalar),
}
impl Tree {
	/// Parses a JSON body; bodies that decode to a bare scalar carry no structure.
	pub fn parse_json(body: &str) -> Result<Self, ParseError> {
		if body.trim().is_empty() {
			return Err(ParseError::Empty);
		}

		let value: Value = serde_json::from_str(body).map_err(ParseError::Json)?;

		match value {
			Value::Object(_) | Value::Array(_) => Ok(value.into()),
			_ => Err(ParseError::Unstructured),
		}
	}

	/// Parses an XML body into the same shape as a JSON document.
	///
	/// Attributes live under [`ATTRIBUTES_KEY`], repeated sibling elements become a sequence,
	/// text of elements that also carry attributes or children lives under [`TEXT_KEY`], and the
	/// root element is unwrapped.
	pub fn parse_xml(body: &str) -> Result<Self, ParseError> {
		if body.trim().is_empty() {
			return Err(ParseError::Empty);
		}

		xml::parse(body)
	}

	/// Resolves a dot-separated path such as `a.b.0.c`.
	pub fn path(&self, path: &str) -> Option<&Tree> {
		path.split('.').filter(|segment| !segment.is_empty()).try_fold(self, Tree::step)
	}

	/// Resolves `path` and returns its value when it is non-empty.
	pub fn path_non_empty(&self, path: &str) -> Option<&Tree> {
		self.path(path).filter(|tree| !tree.is_empty())
	}

	/// Looks up a mapping key, probing the first element of a sequence.
	pub fn get(&self, key: &str) -> Option<&Tree> {
		match self {
			Tree::Object(fields) => fields.get(key),
			Tree::Array(items) => items.first().and_then(|first| first.as_object()?.get(key)),
			Tree::Scalar(_) => None,
		}
	}

	/// Views the node as a sequence: sequences yield their items, anything else itself.
	pub fn items(&self) -> &[Tree] {
		match self {
			Tree::Array(items) => items,
			other => std::slice::from_ref(other),
		}
	}

	/// Returns the mapping entries, if this is a mapping.
	pub fn as_object(&self) -> Option<&Fields> {
		match self {
			Tree::Object(fields) => Some(fields),
			_ => None,
		}
	}

	/// Returns the sequence items, if this is a sequence.
	pub fn as_array(&self) -> Option<&[Tree]> {
		match self {
			Tree::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Returns the string value of a string scalar.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Tree::Scalar(Scalar::String(value)) => Some(value),
			_ => None,
		}
	}

	/// Renders string, number, and boolean scalars as text.
	pub fn as_text(&self) -> Option<String> {
		match self {
			Tree::Scalar(Scalar::String(value)) => Some(value.clone()),
			Tree::Scalar(Scalar::Number(value)) => Some(value.to_string()),
			Tree::Scalar(Scalar::Bool(value)) => Some(value.to_string()),
			_ => None,
		}
	}

	/// Reads a non-negative integer from a number or a numeric string.
	pub fn as_u32(&self) -> Option<u32> {
		match self {
			Tree::Scalar(Scalar::Number(value)) => value
				.as_u64()
				.or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
				.and_then(|v| u32::try_from(v).ok()),
			Tree::Scalar(Scalar::String(value)) => value.trim().parse().ok(),
			_ => None,
		}
	}

	/// Returns `true` for null, blank strings, empty mappings, and empty sequences.
	pub fn is_empty(&self) -> bool {
		match self {
			Tree::Object(fields) => fields.is_empty(),
			Tree::Array(items) => items.is_empty(),
			Tree::Scalar(Scalar::Null) => true,
			Tree::Scalar(Scalar::String(value)) => value.trim().is_empty(),
			Tree::Scalar(_) => false,
		}
	}

	/// Converts back into a [`serde_json::Value`].
	pub fn to_json(&self) -> Value {
		match self {
			Tree::Object(fields) =>
				Value::Object(fields.iter().map(|(k, v)| (k.to_owned(), v.to_json())).collect()),
			Tree::Array(items) => Value::Array(items.iter().map(Tree::to_json).collect()),
			Tree::Scalar(Scalar::Null) => Value::Null,
			Tree::Scalar(Scalar::Bool(value)) => Value::Bool(*value),
			Tree::Scalar(Scalar::Number(value)) => Value::Number(value.clone()),
			Tree::Scalar(Scalar::String(value)) => Value::String(value.clone()),
		}
	}

	pub(crate) fn text(value: impl Into<String>) -> Self {
		Tree::Scalar(Scalar::String(value.into()))
	}

	fn step<'a>(tree: &'a Tree, segment: &str) -> Option<&'a Tree> {
		let Ok(index) = segment.parse::<usize>() else {
			return tree.get(segment);
		};

		match tree {
			Tree::Array(items) => items.get(index),
			Tree::Object(fields) => fields.get(segment).or((index == 0).then_some(tree)),
			Tree::Scalar(_) => None,
		}
	}
}
impl From<Value> for Tree {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Tree::Scalar(Scalar::Null),
			Value::Bool(value) => Tree::Scalar(Scalar::Bool(value)),
			Value::Number(value) => Tree::Scalar(Scalar::Number(value)),
			Value::String(value) => Tree::Scalar(Scalar::String(value)),
			Value::Array(items) => Tree::Array(items.into_iter().map(Tree::from).collect()),
			Value::Object(map) =>
				Tree::Object(map.into_iter().map(|(k, v)| (k, Tree::from(v))).collect()),
		}
	}
}
impl Serialize for Tree {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Tree::Object(fields) => {
				let mut map = serializer.serialize_map(Some(fields.len()))?;

				for (key, value) in fields.iter() {
					map.serialize_entry(key, value)?;
				}

				map.end()
			},
			Tree::Array(items) => serializer.collect_seq(items),
			Tree::Scalar(Scalar::Null) => serializer.serialize_unit(),
			Tree::Scalar(Scalar::Bool(value)) => serializer.serialize_bool(*value),
			Tree::Scalar(Scalar::Number(value)) => value.serialize(serializer),
			Tree::Scalar(Scalar::String(value)) => serializer.serialize_str(value),
		}
	}
}
