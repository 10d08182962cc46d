//! The single mutable copy of the selection

use super::{Selection, SelectionUpdate, SelectionSubscriber};
use std::sync::{Arc, Weak};
use parking_lot::RwLock;

/// Holds the session's selection and notifies subscribers on change.
///
/// Readers only ever see whole snapshots; `commit` swaps the value under a
/// single write lock.
pub struct SelectionStore {
    state: Arc<RwLock<Selection>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn SelectionSubscriber>>>>,
}

impl SelectionStore {
    /// Create a store with nothing filtered
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(Selection::default())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Selection {
        *self.state.read()
    }

    /// Apply an update and return the resulting snapshot
    pub fn commit(&self, update: SelectionUpdate) -> Selection {
        self.commit_with(|_| update).1
    }

    /// Derive an update from the current snapshot and apply it under one lock.
    ///
    /// Returns `(previous, current)`.
    pub fn commit_with<F>(&self, derive: F) -> (Selection, Selection)
    where
        F: FnOnce(&Selection) -> SelectionUpdate,
    {
        let mut state = self.state.write();
        let previous = *state;
        let current = previous.apply(derive(&previous));
        *state = current;
        drop(state);

        if current != previous {
            tracing::info!(
                group = %current.active_group,
                region = ?current.active_region,
                "Selection committed"
            );
            self.notify_subscribers(&previous, &current);
        }

        (previous, current)
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn SelectionSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    fn notify_subscribers(&self, previous: &Selection, current: &Selection) {
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_selection_change(previous, current);
            }
        }
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}
