//! Selection subscriber trait

use super::Selection;

/// Trait for components that need to respond to selection changes
pub trait SelectionSubscriber: Send + Sync {
    /// Called after a commit that changed the selection
    fn on_selection_change(&self, previous: &Selection, current: &Selection);
}
