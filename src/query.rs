//! Query-string parsing.
//!
//! Pairs split on `&`, keys and values on the first `=` only so `=` inside a
//! value (e.g. Base64) survives. Keys and values are percent-decoded.
//! Repeated keys keep the last occurrence; this router does not combine
//! repeats into arrays.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Decoded query parameters with last-occurrence-wins semantics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
	/// Parses a raw query string (without the leading `?`).
	pub fn parse(query: &str) -> Self {
		let mut map = HashMap::new();
		for pair in query.split('&') {
			if pair.is_empty() {
				continue;
			}
			let mut parts = pair.splitn(2, '=');
			let key = parts.next().unwrap_or("");
			let value = parts.next().unwrap_or("");
			if key.is_empty() {
				continue;
			}
			map.insert(decode(key), decode(value));
		}
		Self(map)
	}

	/// Returns the decoded value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Returns the number of distinct keys.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether no parameters were parsed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over `(key, value)` pairs in arbitrary order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

fn decode(raw: &str) -> String {
	percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
