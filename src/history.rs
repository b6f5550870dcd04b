//! In-memory navigation history.
//!
//! A [`HistoryStack`] is an ordered list of entries with a movable cursor,
//! the in-memory counterpart of the browser History API. Pushing from the
//! middle of the stack discards the old forward tail (standard
//! browser-history semantics); the stack is capped and evicts its oldest
//! entry when the cap is exceeded. Every mutating operation synchronously
//! notifies subscribers after the cursor settles, in subscription order,
//! with no batching or coalescing. Moving past either boundary is a
//! reported no-op, not an error.

use serde::{Deserialize, Serialize};

/// One committed navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
	/// The path portion, without query string.
	pub path: String,
	/// The raw query string, without the leading `?`.
	pub query: String,
	/// Opaque state payload supplied by the caller of `navigate`.
	#[serde(default)]
	pub state: serde_json::Value,
}

impl HistoryEntry {
	/// Creates an entry with an empty query and null state.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			query: String::new(),
			state: serde_json::Value::Null,
		}
	}

	/// Sets the query string.
	pub fn with_query(mut self, query: impl Into<String>) -> Self {
		self.query = query.into();
		self
	}

	/// Sets the state payload.
	pub fn with_state(mut self, state: serde_json::Value) -> Self {
		self.state = state;
		self
	}

	/// Returns `path?query`, or just the path when the query is empty.
	pub fn full_path(&self) -> String {
		if self.query.is_empty() {
			self.path.clone()
		} else {
			format!("{}?{}", self.path, self.query)
		}
	}
}

/// What a mutating operation did, reported to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOp {
	Push,
	Replace,
	Back,
	Forward,
}

/// Handle returned by [`HistoryStack::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryListenerId(u64);

type Listener = Box<dyn Fn(HistoryOp, &HistoryEntry)>;

/// Default maximum stack depth.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// The navigation stack.
pub struct HistoryStack {
	entries: Vec<HistoryEntry>,
	/// Index of the current entry; meaningless while `entries` is empty.
	cursor: usize,
	capacity: usize,
	listeners: Vec<(HistoryListenerId, Listener)>,
	next_listener: u64,
}

impl std::fmt::Debug for HistoryStack {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HistoryStack")
			.field("entries", &self.entries)
			.field("cursor", &self.cursor)
			.field("capacity", &self.capacity)
			.field("listener_count", &self.listeners.len())
			.finish()
	}
}

impl Default for HistoryStack {
	fn default() -> Self {
		Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
	}
}

impl HistoryStack {
	/// Creates an empty stack holding at most `capacity` entries (min 1).
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: Vec::new(),
			cursor: 0,
			capacity: capacity.max(1),
			listeners: Vec::new(),
			next_listener: 0,
		}
	}

	/// Appends an entry, discarding any forward tail beyond the cursor and
	/// evicting the oldest entry past the capacity cap.
	pub fn push(&mut self, entry: HistoryEntry) {
		if !self.entries.is_empty() {
			self.entries.truncate(self.cursor + 1);
		}
		self.entries.push(entry);
		self.cursor = self.entries.len() - 1;
		while self.entries.len() > self.capacity {
			self.entries.remove(0);
			self.cursor -= 1;
		}
		tracing::trace!(cursor = self.cursor, len = self.entries.len(), "history push");
		self.notify(HistoryOp::Push);
	}

	/// Overwrites the entry at the cursor in place; the cursor does not move
	/// and the stack does not grow. On an empty stack the entry becomes the
	/// first one.
	pub fn replace(&mut self, entry: HistoryEntry) {
		if self.entries.is_empty() {
			self.entries.push(entry);
			self.cursor = 0;
		} else {
			self.entries[self.cursor] = entry;
		}
		tracing::trace!(cursor = self.cursor, "history replace");
		self.notify(HistoryOp::Replace);
	}

	/// Moves the cursor one entry back. Returns `false` (and does not
	/// notify) when already at the oldest entry.
	pub fn back(&mut self) -> bool {
		if self.entries.is_empty() || self.cursor == 0 {
			return false;
		}
		self.cursor -= 1;
		tracing::trace!(cursor = self.cursor, "history back");
		self.notify(HistoryOp::Back);
		true
	}

	/// Moves the cursor one entry forward. Returns `false` (and does not
	/// notify) when already at the newest entry.
	pub fn forward(&mut self) -> bool {
		if self.entries.is_empty() || self.cursor + 1 >= self.entries.len() {
			return false;
		}
		self.cursor += 1;
		tracing::trace!(cursor = self.cursor, "history forward");
		self.notify(HistoryOp::Forward);
		true
	}

	/// Returns the entry at the cursor.
	pub fn current(&self) -> Option<&HistoryEntry> {
		self.entries.get(self.cursor)
	}

	/// Returns the cursor index, or `None` while the stack is empty.
	pub fn cursor(&self) -> Option<usize> {
		if self.entries.is_empty() {
			None
		} else {
			Some(self.cursor)
		}
	}

	/// Returns all entries oldest-first.
	pub fn entries(&self) -> &[HistoryEntry] {
		&self.entries
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns whether the stack is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the configured capacity.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// Registers a listener called synchronously after every mutation.
	pub fn subscribe<F>(&mut self, listener: F) -> HistoryListenerId
	where
		F: Fn(HistoryOp, &HistoryEntry) + 'static,
	{
		let id = HistoryListenerId(self.next_listener);
		self.next_listener += 1;
		self.listeners.push((id, Box::new(listener)));
		id
	}

	/// Removes a listener. Returns whether it was registered.
	pub fn unsubscribe(&mut self, id: HistoryListenerId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(listener_id, _)| *listener_id != id);
		self.listeners.len() != before
	}

	/// Drops all entries and resets the cursor. Listeners stay registered
	/// and are not notified.
	pub fn clear(&mut self) {
		self.entries.clear();
		self.cursor = 0;
	}

	fn notify(&self, op: HistoryOp) {
		if let Some(current) = self.entries.get(self.cursor) {
			for (_, listener) in &self.listeners {
				listener(op, current);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;
	use std::rc::Rc;

	fn entry(path: &str) -> HistoryEntry {
		HistoryEntry::new(path)
	}

	fn paths(stack: &HistoryStack) -> Vec<&str> {
		stack.entries().iter().map(|e| e.path.as_str()).collect()
	}

	#[test]
	fn test_push_advances_cursor() {
		let mut stack = HistoryStack::default();
		stack.push(entry("/a"));
		stack.push(entry("/b"));

		assert_eq!(paths(&stack), vec!["/a", "/b"]);
		assert_eq!(stack.cursor(), Some(1));
		assert_eq!(stack.current().map(|e| e.path.as_str()), Some("/b"));
	}

	#[test]
	fn test_push_from_middle_discards_forward_tail() {
		let mut stack = HistoryStack::default();
		stack.push(entry("/a"));
		stack.push(entry("/b"));
		assert!(stack.back());
		stack.push(entry("/c"));

		// The discarded-future invariant: [A, C] with the cursor at C.
		assert_eq!(paths(&stack), vec!["/a", "/c"]);
		assert_eq!(stack.current().map(|e| e.path.as_str()), Some("/c"));
	}

	#[test]
	fn test_replace_overwrites_in_place() {
		let mut stack = HistoryStack::default();
		stack.push(entry("/a"));
		stack.push(entry("/b"));
		stack.replace(entry("/b2"));

		assert_eq!(paths(&stack), vec!["/a", "/b2"]);
		assert_eq!(stack.cursor(), Some(1));
	}

	#[test]
	fn test_replace_on_empty_stack_inserts() {
		let mut stack = HistoryStack::default();
		stack.replace(entry("/a"));

		assert_eq!(paths(&stack), vec!["/a"]);
		assert_eq!(stack.cursor(), Some(0));
	}

	#[test]
	fn test_back_at_oldest_is_reported_noop() {
		let mut stack = HistoryStack::default();
		stack.push(entry("/a"));

		assert!(!stack.back());
		assert_eq!(stack.cursor(), Some(0));
	}

	#[test]
	fn test_forward_at_newest_is_reported_noop() {
		let mut stack = HistoryStack::default();
		stack.push(entry("/a"));

		assert!(!stack.forward());
	}

	#[test]
	fn test_back_then_forward_restores_cursor() {
		let mut stack = HistoryStack::default();
		stack.push(entry("/a"));
		stack.push(entry("/b"));

		assert!(stack.back());
		assert_eq!(stack.current().map(|e| e.path.as_str()), Some("/a"));
		assert!(stack.forward());
		assert_eq!(stack.current().map(|e| e.path.as_str()), Some("/b"));
	}

	#[test]
	fn test_capacity_evicts_oldest() {
		let mut stack = HistoryStack::with_capacity(2);
		stack.push(entry("/a"));
		stack.push(entry("/b"));
		stack.push(entry("/c"));

		assert_eq!(paths(&stack), vec!["/b", "/c"]);
		assert_eq!(stack.current().map(|e| e.path.as_str()), Some("/c"));
	}

	#[test]
	fn test_listeners_fire_in_subscription_order() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let mut stack = HistoryStack::default();

		let first = Rc::clone(&seen);
		stack.subscribe(move |op, _| first.borrow_mut().push(("first", op)));
		let second = Rc::clone(&seen);
		stack.subscribe(move |op, _| second.borrow_mut().push(("second", op)));

		stack.push(entry("/a"));

		assert_eq!(
			*seen.borrow(),
			vec![("first", HistoryOp::Push), ("second", HistoryOp::Push)]
		);
	}

	#[test]
	fn test_listener_sees_settled_cursor() {
		let seen = Rc::new(RefCell::new(Vec::new()));
		let mut stack = HistoryStack::default();
		let sink = Rc::clone(&seen);
		stack.subscribe(move |op, current| {
			sink.borrow_mut().push((op, current.path.clone()));
		});

		stack.push(entry("/a"));
		stack.push(entry("/b"));
		stack.back();

		assert_eq!(
			*seen.borrow(),
			vec![
				(HistoryOp::Push, "/a".to_string()),
				(HistoryOp::Push, "/b".to_string()),
				(HistoryOp::Back, "/a".to_string()),
			]
		);
	}

	#[test]
	fn test_boundary_noop_does_not_notify() {
		let count = Rc::new(RefCell::new(0));
		let mut stack = HistoryStack::default();
		let sink = Rc::clone(&count);
		stack.subscribe(move |_, _| *sink.borrow_mut() += 1);

		stack.push(entry("/a"));
		stack.back();

		assert_eq!(*count.borrow(), 1);
	}

	#[test]
	fn test_unsubscribe_stops_delivery() {
		let count = Rc::new(RefCell::new(0));
		let mut stack = HistoryStack::default();
		let sink = Rc::clone(&count);
		let id = stack.subscribe(move |_, _| *sink.borrow_mut() += 1);

		stack.push(entry("/a"));
		assert!(stack.unsubscribe(id));
		stack.push(entry("/b"));

		assert_eq!(*count.borrow(), 1);
		assert!(!stack.unsubscribe(id));
	}

	#[test]
	fn test_entry_full_path() {
		let bare = HistoryEntry::new("/users");
		assert_eq!(bare.full_path(), "/users");

		let with_query = HistoryEntry::new("/users").with_query("page=2");
		assert_eq!(with_query.full_path(), "/users?page=2");
	}

	#[test]
	fn test_entry_state_roundtrips_through_serde() {
		let entry = HistoryEntry::new("/users")
			.with_state(serde_json::json!({"scroll": 120}));

		let encoded = serde_json::to_string(&entry).unwrap();
		let decoded: HistoryEntry = serde_json::from_str(&encoded).unwrap();
		assert_eq!(decoded, entry);
	}
}
