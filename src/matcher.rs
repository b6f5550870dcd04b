//! Path matching against a route tree.
//!
//! # Algorithm
//!
//! Depth-first traversal starting at the roots in declaration order. At each
//! node the node's relative pattern is consumed against the next unconsumed
//! portion of the path:
//!
//! - a static segment consumes exactly one equal path segment (per the
//!   tree's [`MatchPolicy`]) or fails,
//! - a dynamic segment consumes exactly one path segment unconditionally and
//!   binds it percent-decoded,
//! - a wildcard consumes all remaining segments as one opaque, undecoded
//!   string.
//!
//! A node yields a leaf result if, after consuming its own pattern, (a) no
//! path remains, (b) a child fully consumes the remainder, or (c) no child
//! matches but the node declares a catch-all view. The first depth-first
//! success wins: siblings declared earlier shadow siblings declared later
//! even when the later one is more specific. Declaration order, not
//! specificity, is the tie-break.
//!
//! Matching is pure and deterministic: the same tree and path always yield
//! structurally equal results.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::error::ParamError;
use crate::pattern::{RoutePattern, Segment};
use crate::tree::{MatchPolicy, RouteNode, RouteTree, StaticCase, TrailingSlash, ViewId};

/// How the leaf of a match chain was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
	/// The chain's patterns consumed the whole path (a wildcard counts as
	/// consuming the remainder).
	Full,
	/// The leaf node's catch-all view absorbed an otherwise unmatched
	/// remainder.
	CatchAll,
}

/// Dynamic segment bindings extracted from a matched path.
///
/// Re-declaring a dynamic name deeper in the tree overwrites the shallower
/// binding: last match wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params(HashMap<String, String>);

impl Params {
	pub(crate) fn from_bindings(bindings: Vec<(String, String)>) -> Self {
		let mut map = HashMap::new();
		for (name, value) in bindings {
			map.insert(name, value);
		}
		Self(map)
	}

	/// Returns the decoded value bound to `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Parses the value bound to `name` as `T`.
	///
	/// # Errors
	///
	/// Returns [`ParamError::Missing`] when no binding exists and
	/// [`ParamError::Parse`] (carrying the raw value and target type) when
	/// parsing fails.
	pub fn get_as<T>(&self, name: &str) -> Result<T, ParamError>
	where
		T: std::str::FromStr,
		T::Err: std::fmt::Display,
	{
		let raw = self.0.get(name).ok_or_else(|| ParamError::Missing {
			name: name.to_string(),
		})?;
		raw.parse().map_err(|err: T::Err| ParamError::Parse {
			name: name.to_string(),
			param_type: std::any::type_name::<T>(),
			raw_value: raw.clone(),
			source_msg: err.to_string(),
		})
	}

	/// Returns the number of bindings.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether there are no bindings.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over `(name, value)` pairs in arbitrary order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

/// The result of matching one path against the tree.
///
/// The chain is stored as a child-index path into the producing tree, so the
/// result stays owned (no borrow of the tree) while remaining structurally
/// comparable. Resolve nodes through [`MatchResult::chain`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
	indices: Vec<usize>,
	params: Params,
	remainder: String,
	kind: MatchKind,
}

impl MatchResult {
	/// Resolves the matched nodes root-to-leaf against the tree that
	/// produced this result.
	pub fn chain<'t>(&self, tree: &'t RouteTree) -> Vec<&'t RouteNode> {
		(1..=self.indices.len())
			.filter_map(|depth| tree.node_at(&self.indices[..depth]))
			.collect()
	}

	/// Returns the child-index path of the chain (element `i` indexes into
	/// the children of the node at depth `i - 1`, element 0 into the roots).
	pub fn chain_indices(&self) -> &[usize] {
		&self.indices
	}

	/// Returns the view to render at the leaf: the leaf node's catch-all
	/// view when the match was absorbed by one, the leaf's own view
	/// otherwise.
	pub fn leaf_view<'t>(&self, tree: &'t RouteTree) -> Option<&'t ViewId> {
		let node = tree.node_at(&self.indices)?;
		match self.kind {
			MatchKind::CatchAll => Some(node.catch_all().unwrap_or_else(|| node.view())),
			MatchKind::Full => Some(node.view()),
		}
	}

	/// Returns the dynamic segment bindings.
	pub fn params(&self) -> &Params {
		&self.params
	}

	/// Returns the unconsumed path remainder: empty unless a wildcard
	/// absorbed it or a catch-all fired.
	pub fn remainder(&self) -> &str {
		&self.remainder
	}

	/// Returns how the leaf was reached.
	pub fn kind(&self) -> MatchKind {
		self.kind
	}
}

/// Outcome of consuming one node's pattern against the leading path segments.
struct PatternConsume {
	consumed: usize,
	bindings: Vec<(String, String)>,
	wildcard: Option<String>,
}

/// Outcome of a successful descent below a node.
enum LeafOutcome {
	Full,
	Wildcard(String),
	CatchAll(String),
}

impl RouteTree {
	/// Finds the best-matching leaf-to-root chain for `path`.
	///
	/// Returns `None` when no root matches at all; the caller treats that as
	/// a global 404. The router never synthesizes a default view.
	pub fn match_path(&self, path: &str) -> Option<MatchResult> {
		let mut segments = split_path(path);
		if self.policy().trailing_slash == TrailingSlash::Lenient
			&& segments.last() == Some(&"")
		{
			segments.pop();
		}

		let mut chain = Vec::new();
		let mut bindings = Vec::new();
		for (index, root) in self.roots().iter().enumerate() {
			if let Some(outcome) = descend(
				root,
				index,
				&segments,
				self.policy(),
				&mut chain,
				&mut bindings,
			) {
				let (remainder, kind) = match outcome {
					LeafOutcome::Full => (String::new(), MatchKind::Full),
					LeafOutcome::Wildcard(rest) => (rest, MatchKind::Full),
					LeafOutcome::CatchAll(rest) => (rest, MatchKind::CatchAll),
				};
				return Some(MatchResult {
					indices: chain,
					params: Params::from_bindings(bindings),
					remainder,
					kind,
				});
			}
		}
		None
	}
}

/// Splits a path into segments. `/` yields no segments; a trailing slash
/// yields a trailing empty segment (handled by the trailing-slash policy).
fn split_path(path: &str) -> Vec<&str> {
	let trimmed = path.strip_prefix('/').unwrap_or(path);
	if trimmed.is_empty() {
		Vec::new()
	} else {
		trimmed.split('/').collect()
	}
}

/// Depth-first descent. On failure the chain and bindings are restored to
/// their state at entry so sibling attempts start clean.
fn descend(
	node: &RouteNode,
	index: usize,
	segments: &[&str],
	policy: &MatchPolicy,
	chain: &mut Vec<usize>,
	bindings: &mut Vec<(String, String)>,
) -> Option<LeafOutcome> {
	let chain_mark = chain.len();
	let binding_mark = bindings.len();

	let consume = consume_pattern(node.pattern(), segments, policy)?;
	chain.push(index);
	bindings.extend(consume.bindings);

	if let Some(rest) = consume.wildcard {
		return Some(LeafOutcome::Wildcard(rest));
	}
	let rest = &segments[consume.consumed..];
	if rest.is_empty() {
		return Some(LeafOutcome::Full);
	}
	for (child_index, child) in node.children().iter().enumerate() {
		if let Some(outcome) = descend(child, child_index, rest, policy, chain, bindings) {
			return Some(outcome);
		}
	}
	if node.catch_all().is_some() {
		return Some(LeafOutcome::CatchAll(rest.join("/")));
	}

	chain.truncate(chain_mark);
	bindings.truncate(binding_mark);
	None
}

/// Consumes a pattern against the leading segments of `segments`.
fn consume_pattern(
	pattern: &RoutePattern,
	segments: &[&str],
	policy: &MatchPolicy,
) -> Option<PatternConsume> {
	let mut consumed = 0;
	let mut bindings = Vec::new();
	for segment in pattern.segments() {
		match segment {
			Segment::Static(text) => {
				let candidate = segments.get(consumed)?;
				let equal = match policy.static_case {
					StaticCase::Sensitive => *candidate == text.as_str(),
					StaticCase::Insensitive => candidate.eq_ignore_ascii_case(text),
				};
				if !equal {
					return None;
				}
				consumed += 1;
			}
			Segment::Dynamic(name) => {
				let candidate = segments.get(consumed)?;
				bindings.push((name.clone(), decode_segment(candidate)));
				consumed += 1;
			}
			Segment::Wildcard => {
				let rest = segments[consumed..].join("/");
				return Some(PatternConsume {
					consumed: segments.len(),
					bindings,
					wildcard: Some(rest),
				});
			}
		}
	}
	Some(PatternConsume {
		consumed,
		bindings,
		wildcard: None,
	})
}

/// Percent-decodes one bound path segment.
fn decode_segment(raw: &str) -> String {
	percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
