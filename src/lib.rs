//! Declarative client-side router core.
//!
//! `waymark` maps URL paths onto a tree of view definitions, extracts
//! dynamic path and query parameters, and maintains an in-memory navigation
//! history without any host-environment dependency. It deliberately stops at
//! the view boundary: matching returns opaque view ids and parameter
//! bindings, and the view layer - a WASM frontend, a TUI, a test harness -
//! renders them through the callbacks on [`NavigationSession`].
//!
//! # Layers
//!
//! - [`pattern`] - compiles `/user/:id`-style pattern strings.
//! - [`tree`] - the immutable route hierarchy with nested children.
//! - [`matcher`] - depth-first matching producing a [`MatchResult`].
//! - [`history`] - the capped navigation stack with back/forward.
//! - [`session`] - the composed navigation surface consumed by a view layer.
//!
//! # Example
//!
//! ```
//! use waymark::{NavigateOptions, NavigationSession, RouteDef, RouteTree, TreeOptions};
//!
//! let tree = RouteTree::build(
//! 	vec![
//! 		RouteDef::new("/", "Home"),
//! 		RouteDef::new("/dashboard", "Dashboard")
//! 			.child(RouteDef::new("courses", "Courses")),
//! 	],
//! 	TreeOptions::default(),
//! )
//! .unwrap();
//!
//! let session = NavigationSession::new(tree).render_chain(|chain, params, _query| {
//! 	let views: Vec<&str> = chain.iter().map(|node| node.view().as_str()).collect();
//! 	assert!(params.is_empty());
//! 	println!("render {}", views.join(" > "));
//! });
//! session.start("/dashboard/courses");
//! session.navigate("/", NavigateOptions::default());
//! ```

pub mod error;
pub mod history;
pub mod matcher;
pub mod pattern;
pub mod query;
pub mod session;
pub mod tree;

pub use error::{InvalidPatternError, ParamError, ReverseError, TreeError};
pub use history::{HistoryEntry, HistoryListenerId, HistoryOp, HistoryStack};
pub use matcher::{MatchKind, MatchResult, Params};
pub use pattern::{RoutePattern, Segment};
pub use query::QueryParams;
pub use session::{
	NavigateOptions, NavigationEvent, NavigationSession, SessionOutcome, SubscriptionId,
};
pub use tree::{
	MatchPolicy, RouteDef, RouteNode, RouteTree, StaticCase, TrailingSlash, TreeOptions, ViewId,
};
