//! The navigation session: the glue object consumed by a view layer.
//!
//! A [`NavigationSession`] binds a [`RouteTree`] to a [`HistoryStack`] and
//! exposes the full navigation protocol: `navigate`, `back`/`forward`,
//! subscriptions, and the render-chain / unmatched callbacks that form the
//! boundary toward the (external) view layer. The session is explicit state
//! with an explicit lifecycle - built once, started on an initial path, torn
//! down when the host goes away - rather than ambient context.
//!
//! # Concurrency
//!
//! Everything here is single-threaded and cooperative: operations are
//! synchronous, non-blocking, and run to completion. Interior mutability is
//! `RefCell`/`Cell`, so the session is deliberately `!Sync`; a
//! multi-threaded host must serialize access itself. A `navigate`, `back`,
//! or `forward` issued from inside a notification callback is queued and
//! processed after the current fan-out fully completes, never recursively
//! interleaved, so subscribers never observe partial state.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::history::{HistoryEntry, HistoryStack};
use crate::matcher::{MatchKind, MatchResult, Params};
use crate::query::QueryParams;
use crate::tree::{RouteNode, RouteTree};

/// Options for [`NavigationSession::navigate`].
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
	/// Commit via `replace` instead of `push`.
	pub replace: bool,
	/// Opaque state payload stored on the history entry.
	pub state: serde_json::Value,
}

impl NavigateOptions {
	/// Options committing via `replace`.
	pub fn replace() -> Self {
		Self {
			replace: true,
			..Self::default()
		}
	}
}

/// Where the session currently stands.
///
/// `Unmatched` is a normal outcome, not an error: missing routes are
/// ordinary control flow and the view layer renders a deliberate fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
	/// No navigation has been committed yet.
	Idle,
	/// The last navigation matched.
	Matched {
		result: MatchResult,
		query: QueryParams,
	},
	/// The last navigation matched nothing; holds the offending path.
	Unmatched(String),
}

/// Payload handed to subscribers on every committed navigation.
#[derive(Debug)]
pub struct NavigationEvent<'a> {
	/// Matched nodes root-to-leaf, for nested outer-to-inner rendering.
	pub chain: &'a [&'a RouteNode],
	/// Decoded dynamic segment bindings.
	pub params: &'a Params,
	/// Decoded query parameters.
	pub query: &'a QueryParams,
	/// Unconsumed remainder (wildcard capture or catch-all leftover).
	pub remainder: &'a str,
	/// Whether the leaf matched fully or via catch-all.
	pub kind: MatchKind,
}

/// Handle returned by [`NavigationSession::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Rc<dyn Fn(&NavigationEvent<'_>)>;
type RenderChain = Rc<dyn Fn(&[&RouteNode], &Params, &QueryParams)>;
type UnmatchedHandler = Rc<dyn Fn(&str)>;

enum PendingOp {
	Navigate {
		path: String,
		options: NavigateOptions,
	},
	Back,
	Forward,
}

/// The glue object composing pattern compiler, route tree, matcher, and
/// history into one navigation surface.
pub struct NavigationSession {
	tree: RouteTree,
	history: RefCell<HistoryStack>,
	outcome: RefCell<SessionOutcome>,
	subscribers: RefCell<Vec<(SubscriptionId, Subscriber)>>,
	render_chain: RefCell<Option<RenderChain>>,
	on_unmatched: RefCell<Option<UnmatchedHandler>>,
	next_subscription: Cell<u64>,
	notifying: Cell<bool>,
	pending: RefCell<VecDeque<PendingOp>>,
	torn_down: Cell<bool>,
}

impl std::fmt::Debug for NavigationSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("NavigationSession")
			.field("outcome", &self.outcome.borrow())
			.field("history_len", &self.history.borrow().len())
			.field("subscriber_count", &self.subscribers.borrow().len())
			.field("torn_down", &self.torn_down.get())
			.finish()
	}
}

impl NavigationSession {
	/// Creates a session bound to a route tree.
	pub fn new(tree: RouteTree) -> Self {
		Self {
			tree,
			history: RefCell::new(HistoryStack::default()),
			outcome: RefCell::new(SessionOutcome::Idle),
			subscribers: RefCell::new(Vec::new()),
			render_chain: RefCell::new(None),
			on_unmatched: RefCell::new(None),
			next_subscription: Cell::new(0),
			notifying: Cell::new(false),
			pending: RefCell::new(VecDeque::new()),
			torn_down: Cell::new(false),
		}
	}

	/// Caps the history stack at `capacity` entries (drop-oldest eviction).
	pub fn with_history_capacity(self, capacity: usize) -> Self {
		self.history.replace(HistoryStack::with_capacity(capacity));
		self
	}

	/// Sets the view layer's consumption point, invoked once per committed
	/// navigation with the chain ordered root-to-leaf.
	pub fn render_chain<F>(self, callback: F) -> Self
	where
		F: Fn(&[&RouteNode], &Params, &QueryParams) + 'static,
	{
		self.render_chain.replace(Some(Rc::new(callback)));
		self
	}

	/// Sets the handler invoked instead of the render chain when no route
	/// matches.
	pub fn on_unmatched<F>(self, callback: F) -> Self
	where
		F: Fn(&str) + 'static,
	{
		self.on_unmatched.replace(Some(Rc::new(callback)));
		self
	}

	/// Commits the initial navigation.
	pub fn start(&self, initial_path: &str) {
		self.navigate(initial_path, NavigateOptions::default());
	}

	/// Navigates to `path` (optionally `path?query`, an eventual `#fragment`
	/// is dropped).
	///
	/// Never blocks, never retries, never fails: an unmatched path moves the
	/// session to [`SessionOutcome::Unmatched`] and fires the unmatched
	/// handler without committing a history entry. A call issued from inside
	/// a notification is queued until the current fan-out completes.
	pub fn navigate(&self, path: &str, options: NavigateOptions) {
		if self.torn_down.get() {
			return;
		}
		if self.notifying.get() {
			self.pending.borrow_mut().push_back(PendingOp::Navigate {
				path: path.to_string(),
				options,
			});
			return;
		}
		self.perform_navigate(path, options);
		self.drain_pending();
	}

	/// Moves back one history entry and re-commits it.
	///
	/// Returns `false` at the oldest entry (a reported no-op, not an error).
	/// A call issued from inside a notification is queued and reported as
	/// accepted.
	pub fn back(&self) -> bool {
		if self.torn_down.get() {
			return false;
		}
		if self.notifying.get() {
			self.pending.borrow_mut().push_back(PendingOp::Back);
			return true;
		}
		let moved = self.perform_back();
		self.drain_pending();
		moved
	}

	/// Moves forward one history entry and re-commits it.
	///
	/// Returns `false` at the newest entry. A call issued from inside a
	/// notification is queued and reported as accepted.
	pub fn forward(&self) -> bool {
		if self.torn_down.get() {
			return false;
		}
		if self.notifying.get() {
			self.pending.borrow_mut().push_back(PendingOp::Forward);
			return true;
		}
		let moved = self.perform_forward();
		self.drain_pending();
		moved
	}

	/// Registers a subscriber notified synchronously on every committed
	/// navigation, in subscription order.
	pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
	where
		F: Fn(&NavigationEvent<'_>) + 'static,
	{
		let id = SubscriptionId(self.next_subscription.get());
		self.next_subscription.set(id.0 + 1);
		self.subscribers.borrow_mut().push((id, Rc::new(listener)));
		id
	}

	/// Removes a subscriber. Returns whether it was registered.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut subscribers = self.subscribers.borrow_mut();
		let before = subscribers.len();
		subscribers.retain(|(subscription_id, _)| *subscription_id != id);
		subscribers.len() != before
	}

	/// Returns the current outcome.
	pub fn outcome(&self) -> SessionOutcome {
		self.outcome.borrow().clone()
	}

	/// Returns the bound route tree.
	pub fn tree(&self) -> &RouteTree {
		&self.tree
	}

	/// Returns the history entry at the cursor.
	pub fn current_entry(&self) -> Option<HistoryEntry> {
		self.history.borrow().current().cloned()
	}

	/// Returns all history entries oldest-first.
	pub fn history_entries(&self) -> Vec<HistoryEntry> {
		self.history.borrow().entries().to_vec()
	}

	/// Returns the history cursor index, or `None` before the first commit.
	pub fn history_cursor(&self) -> Option<usize> {
		self.history.borrow().cursor()
	}

	/// Unsubscribes all listeners, drops the view-layer callbacks, and
	/// releases the history stack. Subsequent navigation calls are ignored
	/// no-ops.
	pub fn teardown(&self) {
		self.torn_down.set(true);
		self.subscribers.borrow_mut().clear();
		self.render_chain.replace(None);
		self.on_unmatched.replace(None);
		self.pending.borrow_mut().clear();
		self.history.borrow_mut().clear();
		self.outcome.replace(SessionOutcome::Idle);
	}

	fn perform_navigate(&self, target: &str, options: NavigateOptions) {
		let (path, query_string) = split_target(target);
		let path = if path.is_empty() { "/" } else { path };

		match self.tree.match_path(path) {
			None => {
				tracing::debug!(path, "navigation matched no route");
				self.outcome
					.replace(SessionOutcome::Unmatched(path.to_string()));
				self.fire_unmatched(path);
			}
			Some(result) => {
				let entry = HistoryEntry::new(path)
					.with_query(query_string)
					.with_state(options.state);
				{
					let mut history = self.history.borrow_mut();
					if options.replace {
						history.replace(entry);
					} else {
						history.push(entry);
					}
				}
				tracing::debug!(path, replace = options.replace, "navigation committed");
				let query = QueryParams::parse(query_string);
				self.commit(result, query);
			}
		}
	}

	fn perform_back(&self) -> bool {
		let moved = self.history.borrow_mut().back();
		if moved {
			self.recommit_current();
		}
		moved
	}

	fn perform_forward(&self) -> bool {
		let moved = self.history.borrow_mut().forward();
		if moved {
			self.recommit_current();
		}
		moved
	}

	/// Re-matches the entry at the cursor after a cursor move. Every entry
	/// matched when it was committed and the tree is immutable, so the
	/// unmatched arm is unreachable in practice; it is kept as ordinary
	/// control flow rather than an assertion.
	fn recommit_current(&self) {
		let Some(entry) = self.history.borrow().current().cloned() else {
			return;
		};
		match self.tree.match_path(&entry.path) {
			Some(result) => {
				tracing::debug!(path = %entry.path, "history navigation committed");
				let query = QueryParams::parse(&entry.query);
				self.commit(result, query);
			}
			None => {
				self.outcome
					.replace(SessionOutcome::Unmatched(entry.path.clone()));
				self.fire_unmatched(&entry.path);
			}
		}
	}

	/// Stores the new outcome and runs the synchronous fan-out: render chain
	/// first, then subscribers in subscription order.
	fn commit(&self, result: MatchResult, query: QueryParams) {
		self.outcome.replace(SessionOutcome::Matched {
			result: result.clone(),
			query: query.clone(),
		});

		self.notifying.set(true);
		let chain = result.chain(&self.tree);
		let render = self.render_chain.borrow().clone();
		if let Some(render) = render {
			render(&chain, result.params(), &query);
		}
		let event = NavigationEvent {
			chain: &chain,
			params: result.params(),
			query: &query,
			remainder: result.remainder(),
			kind: result.kind(),
		};
		let subscribers: Vec<Subscriber> = self
			.subscribers
			.borrow()
			.iter()
			.map(|(_, subscriber)| Rc::clone(subscriber))
			.collect();
		for subscriber in subscribers {
			subscriber(&event);
		}
		self.notifying.set(false);
	}

	/// Fires the unmatched handler under the same re-entrancy gate as the
	/// match fan-out.
	fn fire_unmatched(&self, path: &str) {
		let handler = self.on_unmatched.borrow().clone();
		if let Some(handler) = handler {
			self.notifying.set(true);
			handler(path);
			self.notifying.set(false);
		}
	}

	/// Applies operations queued by re-entrant calls, in call order.
	fn drain_pending(&self) {
		loop {
			let op = self.pending.borrow_mut().pop_front();
			match op {
				None => break,
				Some(PendingOp::Navigate { path, options }) => {
					self.perform_navigate(&path, options);
				}
				Some(PendingOp::Back) => {
					self.perform_back();
				}
				Some(PendingOp::Forward) => {
					self.perform_forward();
				}
			}
		}
	}
}

/// Splits a navigation target into path and query portions, dropping any
/// `#fragment`.
fn split_target(target: &str) -> (&str, &str) {
	let without_fragment = match target.find('#') {
		Some(position) => &target[..position],
		None => target,
	};
	match without_fragment.find('?') {
		Some(position) => (&without_fragment[..position], &without_fragment[position + 1..]),
		None => (without_fragment, ""),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::{RouteDef, TreeOptions};
	use std::rc::Rc;

	fn sample_tree() -> RouteTree {
		RouteTree::build(
			vec![
				RouteDef::new("/", "Home"),
				RouteDef::new("/about", "About"),
				RouteDef::new("/user/:id", "UserDetail"),
			],
			TreeOptions::default(),
		)
		.unwrap()
	}

	fn matched_path(session: &NavigationSession) -> Option<String> {
		session.current_entry().map(|entry| entry.path)
	}

	#[test]
	fn test_start_commits_initial_navigation() {
		let session = NavigationSession::new(sample_tree());
		session.start("/");

		assert_eq!(matched_path(&session), Some("/".to_string()));
		assert!(matches!(
			session.outcome(),
			SessionOutcome::Matched { .. }
		));
	}

	#[test]
	fn test_navigate_pushes_entry() {
		let session = NavigationSession::new(sample_tree());
		session.start("/");
		session.navigate("/about", NavigateOptions::default());

		assert_eq!(session.history_entries().len(), 2);
		assert_eq!(matched_path(&session), Some("/about".to_string()));
	}

	#[test]
	fn test_navigate_replace_does_not_grow_stack() {
		let session = NavigationSession::new(sample_tree());
		session.start("/");
		session.navigate("/about", NavigateOptions::replace());

		assert_eq!(session.history_entries().len(), 1);
		assert_eq!(matched_path(&session), Some("/about".to_string()));
	}

	#[test]
	fn test_unmatched_path_does_not_commit_history() {
		let unmatched = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&unmatched);
		let session = NavigationSession::new(sample_tree())
			.on_unmatched(move |path| sink.borrow_mut().push(path.to_string()));
		session.start("/");
		session.navigate("/missing", NavigateOptions::default());

		assert_eq!(session.outcome(), SessionOutcome::Unmatched("/missing".to_string()));
		assert_eq!(*unmatched.borrow(), vec!["/missing".to_string()]);
		// The failed navigation left no history entry behind.
		assert_eq!(session.history_entries().len(), 1);
		assert_eq!(matched_path(&session), Some("/".to_string()));
	}

	#[test]
	fn test_subscribers_receive_params_and_query() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let session = NavigationSession::new(sample_tree());
		let sink = Rc::clone(&seen);
		session.subscribe(move |event| {
			sink.borrow_mut().push((
				event.params.get("id").map(str::to_string),
				event.query.get("tab").map(str::to_string),
			));
		});

		session.navigate("/user/42?tab=posts", NavigateOptions::default());

		assert_eq!(
			*seen.borrow(),
			vec![(Some("42".to_string()), Some("posts".to_string()))]
		);
	}

	#[test]
	fn test_render_chain_runs_before_subscribers() {
		let order = Rc::new(RefCell::new(Vec::new()));
		let render_sink = Rc::clone(&order);
		let session = NavigationSession::new(sample_tree())
			.render_chain(move |chain, _, _| {
				render_sink
					.borrow_mut()
					.push(format!("render:{}", chain.len()));
			});
		let subscriber_sink = Rc::clone(&order);
		session.subscribe(move |_| subscriber_sink.borrow_mut().push("subscriber".to_string()));

		session.navigate("/about", NavigateOptions::default());

		assert_eq!(*order.borrow(), vec!["render:1", "subscriber"]);
	}

	#[test]
	fn test_subscriber_order_is_subscription_order() {
		let order = Rc::new(RefCell::new(Vec::new()));
		let session = NavigationSession::new(sample_tree());
		let first = Rc::clone(&order);
		session.subscribe(move |_| first.borrow_mut().push("first"));
		let second = Rc::clone(&order);
		session.subscribe(move |_| second.borrow_mut().push("second"));

		session.navigate("/about", NavigateOptions::default());

		assert_eq!(*order.borrow(), vec!["first", "second"]);
	}

	#[test]
	fn test_unsubscribe_stops_delivery() {
		let count = Rc::new(RefCell::new(0));
		let session = NavigationSession::new(sample_tree());
		let sink = Rc::clone(&count);
		let id = session.subscribe(move |_| *sink.borrow_mut() += 1);

		session.navigate("/about", NavigateOptions::default());
		assert!(session.unsubscribe(id));
		session.navigate("/", NavigateOptions::default());

		assert_eq!(*count.borrow(), 1);
		assert!(!session.unsubscribe(id));
	}

	#[test]
	fn test_back_and_forward_recommit() {
		let paths = Rc::new(RefCell::new(Vec::new()));
		let session = NavigationSession::new(sample_tree());
		session.start("/");
		session.navigate("/about", NavigateOptions::default());

		let sink = Rc::clone(&paths);
		session.subscribe(move |event| {
			let chain_views: Vec<String> = event
				.chain
				.iter()
				.map(|node| node.view().to_string())
				.collect();
			sink.borrow_mut().push(chain_views.join("/"));
		});

		assert!(session.back());
		assert_eq!(matched_path(&session), Some("/".to_string()));
		assert!(session.forward());
		assert_eq!(matched_path(&session), Some("/about".to_string()));
		assert_eq!(*paths.borrow(), vec!["Home", "About"]);
	}

	#[test]
	fn test_back_at_first_entry_is_reported_noop() {
		let session = NavigationSession::new(sample_tree());
		session.start("/");

		assert!(!session.back());
		assert_eq!(matched_path(&session), Some("/".to_string()));
	}

	#[test]
	fn test_reentrant_navigate_is_queued_not_interleaved() {
		let order = Rc::new(RefCell::new(Vec::new()));
		let session = Rc::new(NavigationSession::new(sample_tree()));

		let redirecting = Rc::clone(&session);
		let redirect_log = Rc::clone(&order);
		session.subscribe(move |event| {
			redirect_log
				.borrow_mut()
				.push(format!("enter:{}", event.chain[event.chain.len() - 1].view()));
			if event.query.get("redirect").is_some() {
				redirecting.navigate("/about", NavigateOptions::default());
			}
			redirect_log
				.borrow_mut()
				.push(format!("exit:{}", event.chain[event.chain.len() - 1].view()));
		});

		session.navigate("/user/1?redirect=1", NavigateOptions::default());

		// The re-entrant navigation ran only after the first fan-out finished.
		assert_eq!(
			*order.borrow(),
			vec![
				"enter:UserDetail".to_string(),
				"exit:UserDetail".to_string(),
				"enter:About".to_string(),
				"exit:About".to_string(),
			]
		);
		assert_eq!(matched_path(&session), Some("/about".to_string()));
	}

	#[test]
	fn test_reentrant_calls_apply_in_call_order() {
		let session = Rc::new(NavigationSession::new(sample_tree()));
		session.start("/");

		let inner = Rc::clone(&session);
		let fired = Rc::new(Cell::new(false));
		let fired_once = Rc::clone(&fired);
		session.subscribe(move |_| {
			if !fired_once.get() {
				fired_once.set(true);
				inner.navigate("/about", NavigateOptions::default());
				inner.navigate("/user/7", NavigateOptions::default());
			}
		});

		session.navigate("/user/1", NavigateOptions::default());

		let entries: Vec<String> = session
			.history_entries()
			.into_iter()
			.map(|entry| entry.path)
			.collect();
		assert_eq!(entries, vec!["/", "/user/1", "/about", "/user/7"]);
		assert_eq!(matched_path(&session), Some("/user/7".to_string()));
	}

	#[test]
	fn test_history_capacity_is_configurable() {
		let session = NavigationSession::new(sample_tree()).with_history_capacity(2);
		session.start("/");
		session.navigate("/about", NavigateOptions::default());
		session.navigate("/user/1", NavigateOptions::default());

		let entries: Vec<String> = session
			.history_entries()
			.into_iter()
			.map(|entry| entry.path)
			.collect();
		assert_eq!(entries, vec!["/about", "/user/1"]);
	}

	#[test]
	fn test_state_payload_is_stored_on_entry() {
		let session = NavigationSession::new(sample_tree());
		session.navigate(
			"/about",
			NavigateOptions {
				replace: false,
				state: serde_json::json!({"scroll": 10}),
			},
		);

		let entry = session.current_entry().unwrap();
		assert_eq!(entry.state, serde_json::json!({"scroll": 10}));
	}

	#[test]
	fn test_fragment_is_dropped() {
		let session = NavigationSession::new(sample_tree());
		session.navigate("/about#team", NavigateOptions::default());

		assert_eq!(matched_path(&session), Some("/about".to_string()));
	}

	#[test]
	fn test_teardown_releases_everything() {
		let count = Rc::new(RefCell::new(0));
		let session = NavigationSession::new(sample_tree());
		let sink = Rc::clone(&count);
		session.subscribe(move |_| *sink.borrow_mut() += 1);
		session.start("/");

		session.teardown();
		session.navigate("/about", NavigateOptions::default());

		assert_eq!(*count.borrow(), 1);
		assert!(session.history_entries().is_empty());
		assert_eq!(session.outcome(), SessionOutcome::Idle);
		assert!(!session.back());
	}

	#[test]
	fn test_split_target() {
		assert_eq!(split_target("/a/b?x=1"), ("/a/b", "x=1"));
		assert_eq!(split_target("/a/b"), ("/a/b", ""));
		assert_eq!(split_target("/a?x=1#frag"), ("/a", "x=1"));
		assert_eq!(split_target("/a#frag"), ("/a", ""));
		assert_eq!(split_target(""), ("", ""));
	}
}
