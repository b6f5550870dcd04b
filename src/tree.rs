//! Route tree construction and traversal.
//!
//! A route tree is a hierarchy of route definitions built once at startup and
//! immutable thereafter. Each node holds a pattern *relative to its parent*
//! (the full match path is the concatenation of ancestor patterns), an opaque
//! view id, an optional catch-all view id for 404 semantics below that node,
//! and ordered children. Nodes are exclusively owned by their parent; there
//! is no shared ownership and no cycle.
//!
//! The tree performs no matching itself. It exposes read-only depth-first
//! traversal in declaration order, which is also the tie-break priority used
//! by the matcher, and reverse URL lookup for named routes.

use std::collections::{HashMap, HashSet};

use crate::error::{ReverseError, TreeError};
use crate::pattern::{RoutePattern, Segment};

/// Opaque identifier of a view, resolved by the (external) view layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(String);

impl ViewId {
	/// Returns the id as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ViewId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

impl From<String> for ViewId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl std::fmt::Display for ViewId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Trailing-slash handling for *paths* being matched.
///
/// Patterns themselves never carry trailing-slash significance; this policy
/// decides whether `/user/42/` may match `/user/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingSlash {
	/// `/user/42/` does not match `/user/:id`; the trailing empty segment is
	/// part of the path and nothing consumes it.
	#[default]
	Strict,
	/// One trailing empty segment is dropped from the path before matching.
	Lenient,
}

/// Case handling for static segment comparison.
///
/// Dynamic bindings always preserve the original path text either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaticCase {
	/// Static segments compare byte-for-byte.
	#[default]
	Sensitive,
	/// Static segments compare ASCII-case-insensitively.
	Insensitive,
}

/// Matching policy, fixed at tree build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchPolicy {
	pub trailing_slash: TrailingSlash,
	pub static_case: StaticCase,
}

/// Tree construction options.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOptions {
	/// When set, registering the same view id on two routes fails the build.
	/// Off by default: multiple paths may render the same view.
	pub forbid_duplicate_views: bool,
	/// Matching policy applied by [`RouteTree::match_path`].
	pub policy: MatchPolicy,
}

/// A route definition supplied to [`RouteTree::build`].
#[derive(Debug, Clone)]
pub struct RouteDef {
	pattern: String,
	view: ViewId,
	name: Option<String>,
	catch_all: Option<ViewId>,
	children: Vec<RouteDef>,
}

impl RouteDef {
	/// Creates a definition from a pattern (relative to the parent) and the
	/// view it renders.
	pub fn new(pattern: impl Into<String>, view: impl Into<ViewId>) -> Self {
		Self {
			pattern: pattern.into(),
			view: view.into(),
			name: None,
			catch_all: None,
			children: Vec::new(),
		}
	}

	/// Registers this route under a name for reverse URL lookup.
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the view rendered when the path continues below this node but no
	/// child pattern matches the remainder.
	pub fn catch_all(mut self, view: impl Into<ViewId>) -> Self {
		self.catch_all = Some(view.into());
		self
	}

	/// Appends a child definition. Declaration order is match priority.
	pub fn child(mut self, child: RouteDef) -> Self {
		self.children.push(child);
		self
	}
}

/// A node of the built tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteNode {
	pattern: RoutePattern,
	view: ViewId,
	name: Option<String>,
	catch_all: Option<ViewId>,
	children: Vec<RouteNode>,
}

impl RouteNode {
	/// Returns the node's relative pattern.
	pub fn pattern(&self) -> &RoutePattern {
		&self.pattern
	}

	/// Returns the view id.
	pub fn view(&self) -> &ViewId {
		&self.view
	}

	/// Returns the route name, if registered.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Returns the catch-all view id, if declared.
	pub fn catch_all(&self) -> Option<&ViewId> {
		self.catch_all.as_ref()
	}

	/// Returns the children in declaration order.
	pub fn children(&self) -> &[RouteNode] {
		&self.children
	}
}

/// The immutable route tree.
#[derive(Debug, Clone)]
pub struct RouteTree {
	roots: Vec<RouteNode>,
	policy: MatchPolicy,
	/// Route name -> child-index path from the roots.
	names: HashMap<String, Vec<usize>>,
}

impl RouteTree {
	/// Builds a tree from definitions.
	///
	/// # Errors
	///
	/// Fails fast with [`TreeError`] on an uncompilable pattern, a duplicate
	/// route name, children declared below a wildcard pattern, or (when
	/// [`TreeOptions::forbid_duplicate_views`] is set) a duplicate view id.
	pub fn build(definitions: Vec<RouteDef>, options: TreeOptions) -> Result<Self, TreeError> {
		let mut names = HashMap::new();
		let mut views_seen = HashSet::new();
		let mut roots = Vec::with_capacity(definitions.len());
		for (index, definition) in definitions.into_iter().enumerate() {
			roots.push(Self::build_node(
				definition,
				vec![index],
				&options,
				&mut names,
				&mut views_seen,
			)?);
		}
		Ok(Self {
			roots,
			policy: options.policy,
			names,
		})
	}

	fn build_node(
		definition: RouteDef,
		path: Vec<usize>,
		options: &TreeOptions,
		names: &mut HashMap<String, Vec<usize>>,
		views_seen: &mut HashSet<ViewId>,
	) -> Result<RouteNode, TreeError> {
		let pattern = RoutePattern::compile(&definition.pattern).map_err(|source| {
			TreeError::InvalidPattern {
				pattern: definition.pattern.clone(),
				source,
			}
		})?;
		if pattern.has_wildcard() && !definition.children.is_empty() {
			return Err(TreeError::ChildrenBelowWildcard {
				pattern: definition.pattern.clone(),
			});
		}
		if options.forbid_duplicate_views && !views_seen.insert(definition.view.clone()) {
			return Err(TreeError::DuplicateView {
				view: definition.view.to_string(),
			});
		}
		if let Some(name) = &definition.name {
			if names.insert(name.clone(), path.clone()).is_some() {
				return Err(TreeError::DuplicateRouteName { name: name.clone() });
			}
		}

		let mut children = Vec::with_capacity(definition.children.len());
		for (index, child) in definition.children.into_iter().enumerate() {
			let mut child_path = path.clone();
			child_path.push(index);
			children.push(Self::build_node(
				child,
				child_path,
				options,
				names,
				views_seen,
			)?);
		}
		Ok(RouteNode {
			pattern,
			view: definition.view,
			name: definition.name,
			catch_all: definition.catch_all,
			children,
		})
	}

	/// Returns the root nodes in declaration order.
	pub fn roots(&self) -> &[RouteNode] {
		&self.roots
	}

	/// Returns the matching policy fixed at build time.
	pub fn policy(&self) -> &MatchPolicy {
		&self.policy
	}

	/// Resolves a child-index path (as stored in
	/// [`MatchResult`](crate::matcher::MatchResult)) to a node.
	pub fn node_at(&self, path: &[usize]) -> Option<&RouteNode> {
		let (first, rest) = path.split_first()?;
		let mut node = self.roots.get(*first)?;
		for index in rest {
			node = node.children.get(*index)?;
		}
		Some(node)
	}

	/// Depth-first pre-order traversal, children in declaration order.
	pub fn iter(&self) -> DfsIter<'_> {
		let mut stack: Vec<&RouteNode> = self.roots.iter().collect();
		stack.reverse();
		DfsIter { stack }
	}

	/// Builds the full path for a named route, substituting dynamic segments
	/// from `params`. A wildcard segment substitutes the `"*"` binding.
	///
	/// # Errors
	///
	/// Returns [`ReverseError`] for an unknown name or a missing parameter.
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, ReverseError> {
		let path = self
			.names
			.get(name)
			.ok_or_else(|| ReverseError::UnknownName {
				name: name.to_string(),
			})?;
		let lookup: HashMap<&str, &str> = params.iter().copied().collect();

		let mut rendered = Vec::new();
		let mut nodes = &self.roots;
		for index in path {
			// The stored index paths always resolve inside this tree.
			let Some(node) = nodes.get(*index) else {
				return Err(ReverseError::UnknownName {
					name: name.to_string(),
				});
			};
			for segment in node.pattern.segments() {
				match segment {
					Segment::Static(text) => rendered.push(text.as_str()),
					Segment::Dynamic(param) => {
						let value = lookup.get(param.as_str()).copied().ok_or_else(|| {
							ReverseError::MissingParameter {
								name: param.clone(),
								route: name.to_string(),
							}
						})?;
						rendered.push(value);
					}
					Segment::Wildcard => {
						let value = lookup.get("*").copied().ok_or_else(|| {
							ReverseError::MissingParameter {
								name: "*".to_string(),
								route: name.to_string(),
							}
						})?;
						rendered.push(value);
					}
				}
			}
			nodes = &node.children;
		}

		if rendered.is_empty() {
			Ok("/".to_string())
		} else {
			Ok(format!("/{}", rendered.join("/")))
		}
	}
}

/// Iterator returned by [`RouteTree::iter`].
pub struct DfsIter<'a> {
	stack: Vec<&'a RouteNode>,
}

impl<'a> Iterator for DfsIter<'a> {
	type Item = &'a RouteNode;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.stack.pop()?;
		self.stack.extend(node.children.iter().rev());
		Some(node)
	}
}
