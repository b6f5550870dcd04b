//! Error types for route compilation, tree construction, and parameter access.
//!
//! Only malformed route *definitions* are fatal, and only at tree build time.
//! Runtime navigation outcomes are ordinary values: an unmatched path is
//! [`SessionOutcome::Unmatched`](crate::session::SessionOutcome), and a
//! back/forward call at the stack boundary is a `false` return, never an error.

use thiserror::Error;

/// Rejection reasons for [`RoutePattern::compile`](crate::pattern::RoutePattern::compile).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPatternError {
	/// The pattern string is empty.
	#[error("pattern is empty")]
	Empty,

	/// The pattern exceeds [`MAX_PATTERN_LENGTH`](crate::pattern::MAX_PATTERN_LENGTH).
	#[error("pattern length {len} exceeds maximum allowed length of {max} bytes")]
	TooLong { len: usize, max: usize },

	/// The pattern exceeds [`MAX_PATTERN_SEGMENTS`](crate::pattern::MAX_PATTERN_SEGMENTS).
	#[error("pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments { count: usize, max: usize },

	/// The pattern contains an empty segment (`//`).
	#[error("pattern '{pattern}' contains an empty path segment")]
	EmptySegment { pattern: String },

	/// A wildcard segment appears before the end of the pattern.
	#[error("wildcard must be the last segment of pattern '{pattern}'")]
	WildcardNotLast { pattern: String },

	/// A segment mixes static text with `:` or `*` syntax (e.g. `:id-:slug`).
	#[error("segment '{segment}' mixes static and dynamic syntax")]
	MixedSegment { segment: String },

	/// A dynamic segment name is empty or not an identifier.
	#[error("segment '{segment}' has an invalid parameter name")]
	InvalidParamName { segment: String },

	/// Two dynamic segments in the same pattern share a name.
	#[error("duplicate parameter name '{name}' in pattern")]
	DuplicateParamName { name: String },
}

/// Rejection reasons for [`RouteTree::build`](crate::tree::RouteTree::build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
	/// A route definition carries an uncompilable pattern.
	#[error("invalid pattern '{pattern}': {source}")]
	InvalidPattern {
		pattern: String,
		source: InvalidPatternError,
	},

	/// A view id appears twice while duplicates are forbidden.
	#[error("duplicate view id '{view}'")]
	DuplicateView { view: String },

	/// Two routes were registered under the same name.
	#[error("duplicate route name '{name}'")]
	DuplicateRouteName { name: String },

	/// A node whose pattern ends in a wildcard declares children; they could
	/// never be reached because the wildcard consumes the whole remainder.
	#[error("pattern '{pattern}' ends in a wildcard but declares child routes")]
	ChildrenBelowWildcard { pattern: String },
}

/// Failure to extract a typed value from matched path parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
	/// No binding exists under the requested name.
	#[error("missing parameter '{name}'")]
	Missing { name: String },

	/// The raw value failed to parse as the requested type.
	#[error("failed to parse parameter '{name}' value '{raw_value}' as {param_type}: {source_msg}")]
	Parse {
		name: String,
		param_type: &'static str,
		raw_value: String,
		source_msg: String,
	},
}

/// Failure to build a URL from a named route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReverseError {
	/// No route is registered under the requested name.
	#[error("unknown route name '{name}'")]
	UnknownName { name: String },

	/// The pattern chain requires a parameter the caller did not supply.
	#[error("missing parameter '{name}' for route '{route}'")]
	MissingParameter { name: String, route: String },
}
