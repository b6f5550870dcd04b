//! Path pattern compilation.
//!
//! A route pattern is a `/`-delimited template whose segments are either
//! literal text, a dynamic parameter (`:name`), or a terminal wildcard (`*`):
//!
//! - `/users` - static match
//! - `/users/:id` - single path parameter
//! - `/users/:user_id/posts/:post_id` - multiple parameters
//! - `/static/*` - wildcard matching the rest of the path
//!
//! Compilation is pure: the same input always yields structurally equal
//! output, and no matching happens here. Patterns are relative to their
//! position in the route tree; leading and trailing slashes are not
//! significant, so `/users/`, `/users`, and `users` compile identically and
//! `/` compiles to the empty segment list.

use crate::error::InvalidPatternError;

/// Maximum allowed length for a route pattern string in bytes.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a route pattern.
pub const MAX_PATTERN_SEGMENTS: usize = 32;

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// Matches exactly one path segment equal to the text.
	Static(String),
	/// Matches exactly one path segment unconditionally and binds it.
	Dynamic(String),
	/// Matches all remaining path segments as one opaque string.
	Wildcard,
}

/// A compiled, immutable route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
	/// The original pattern string.
	raw: String,
	/// Compiled segments in order.
	segments: Vec<Segment>,
}

impl RoutePattern {
	/// Compiles a pattern string.
	///
	/// # Errors
	///
	/// Returns [`InvalidPatternError`] when the pattern is empty, exceeds the
	/// length or segment-count guards, contains an empty segment, places a
	/// wildcard anywhere but last, mixes static and dynamic syntax inside one
	/// segment (`:id-:slug` is rejected - a dynamic segment must occupy a
	/// whole `/`-delimited segment), uses a non-identifier parameter name, or
	/// re-declares a parameter name.
	pub fn compile(pattern: &str) -> Result<Self, InvalidPatternError> {
		if pattern.is_empty() {
			return Err(InvalidPatternError::Empty);
		}
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(InvalidPatternError::TooLong {
				len: pattern.len(),
				max: MAX_PATTERN_LENGTH,
			});
		}

		let trimmed = pattern.trim_matches('/');
		let mut segments = Vec::new();
		if !trimmed.is_empty() {
			let raw_segments: Vec<&str> = trimmed.split('/').collect();
			if raw_segments.len() > MAX_PATTERN_SEGMENTS {
				return Err(InvalidPatternError::TooManySegments {
					count: raw_segments.len(),
					max: MAX_PATTERN_SEGMENTS,
				});
			}
			let last = raw_segments.len() - 1;
			for (index, raw_segment) in raw_segments.iter().enumerate() {
				let segment = Self::compile_segment(raw_segment, pattern)?;
				if segment == Segment::Wildcard && index != last {
					return Err(InvalidPatternError::WildcardNotLast {
						pattern: pattern.to_string(),
					});
				}
				if let Segment::Dynamic(name) = &segment {
					let duplicate = segments
						.iter()
						.any(|existing| matches!(existing, Segment::Dynamic(n) if n == name));
					if duplicate {
						return Err(InvalidPatternError::DuplicateParamName { name: name.clone() });
					}
				}
				segments.push(segment);
			}
		}

		Ok(Self {
			raw: pattern.to_string(),
			segments,
		})
	}

	/// Compiles a single `/`-delimited segment.
	fn compile_segment(raw: &str, pattern: &str) -> Result<Segment, InvalidPatternError> {
		if raw.is_empty() {
			return Err(InvalidPatternError::EmptySegment {
				pattern: pattern.to_string(),
			});
		}
		if raw == "*" {
			return Ok(Segment::Wildcard);
		}
		if let Some(name) = raw.strip_prefix(':') {
			if name.contains(':') || name.contains('*') {
				return Err(InvalidPatternError::MixedSegment {
					segment: raw.to_string(),
				});
			}
			if !Self::is_identifier(name) {
				return Err(InvalidPatternError::InvalidParamName {
					segment: raw.to_string(),
				});
			}
			return Ok(Segment::Dynamic(name.to_string()));
		}
		if raw.contains(':') || raw.contains('*') {
			return Err(InvalidPatternError::MixedSegment {
				segment: raw.to_string(),
			});
		}
		Ok(Segment::Static(raw.to_string()))
	}

	/// Parameter names must be identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
	fn is_identifier(name: &str) -> bool {
		let mut chars = name.chars();
		match chars.next() {
			Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
			_ => return false,
		}
		chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
	}

	/// Returns the original pattern string.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Returns the compiled segments in order.
	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	/// Returns the dynamic parameter names in declaration order.
	pub fn param_names(&self) -> Vec<&str> {
		self.segments
			.iter()
			.filter_map(|segment| match segment {
				Segment::Dynamic(name) => Some(name.as_str()),
				_ => None,
			})
			.collect()
	}

	/// Returns whether the terminal segment is a wildcard.
	pub fn has_wildcard(&self) -> bool {
		matches!(self.segments.last(), Some(Segment::Wildcard))
	}
}

impl std::fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.raw)
	}
}
