//! Interaction routing
//!
//! Turns raw interaction events into selection updates. This is the only
//! writer of the [`SelectionStore`].

use std::sync::Arc;
use tracing::debug;

use crate::events::InteractionEvent;
use crate::region::{RegionCode, RegionResolver};
use crate::selection::{Selection, SelectionStore, SelectionUpdate};

/// What routing an event did to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The event was applied; `previous == current` when it was a no-op
    Applied { previous: Selection, current: Selection },
    /// The event named no known region and was dropped
    Discarded,
}

impl RouteOutcome {
    /// Whether the selection value changed
    pub fn changed(&self) -> bool {
        match self {
            RouteOutcome::Applied { previous, current } => previous != current,
            RouteOutcome::Discarded => false,
        }
    }
}

/// Routes interaction events into the selection store
pub struct InteractionRouter {
    store: Arc<SelectionStore>,
    resolver: RegionResolver,
}

impl InteractionRouter {
    pub fn new(store: Arc<SelectionStore>, resolver: RegionResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &Arc<SelectionStore> {
        &self.store
    }

    /// Apply one event
    pub fn route(&self, event: &InteractionEvent) -> RouteOutcome {
        let update = match event {
            InteractionEvent::GroupSelected { group } => Pending::Update(SelectionUpdate::group(*group)),
            InteractionEvent::ResetAll => Pending::Update(SelectionUpdate::reset()),
            InteractionEvent::RegionSelected { key } => match self.resolver.resolve_region_code(key) {
                Some(region) => Pending::Toggle(region),
                None => {
                    debug!(key = %key, "Discarding region event with unknown key");
                    return RouteOutcome::Discarded;
                }
            },
            InteractionEvent::MarkActivated { lens, datum } => match self.resolver.extract_region(datum) {
                Some(region) => Pending::Toggle(region),
                None => {
                    debug!(lens = %lens, "Discarding mark activation without a region");
                    return RouteOutcome::Discarded;
                }
            },
        };

        let (previous, current) = match update {
            Pending::Update(update) => self.store.commit_with(|_| update),
            Pending::Toggle(region) => self.store.commit_with(|current| toggle_region(current, region)),
        };

        debug!(event = event.label(), changed = (previous != current), "Routed interaction");
        RouteOutcome::Applied { previous, current }
    }
}

enum Pending {
    Update(SelectionUpdate),
    Toggle(RegionCode),
}

/// Selecting the active region clears it; any other region replaces it
fn toggle_region(current: &Selection, region: RegionCode) -> SelectionUpdate {
    if current.active_region == Some(region) {
        SelectionUpdate::region(None)
    } else {
        SelectionUpdate::region(Some(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LensKind;
    use crate::selection::{GroupFilter, SelectionSubscriber, SpeciesGroup};
    use parking_lot::Mutex;
    use serde_json::json;

    fn router() -> InteractionRouter {
        InteractionRouter::new(Arc::new(SelectionStore::new()), RegionResolver::default())
    }

    fn click(datum: serde_json::Value) -> InteractionEvent {
        InteractionEvent::MarkActivated { lens: LensKind::Choropleth, datum }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Selection>>,
    }

    impl SelectionSubscriber for Recorder {
        fn on_selection_change(&self, _previous: &Selection, current: &Selection) {
            self.seen.lock().push(*current);
        }
    }

    #[test]
    fn test_map_click_toggles_region() {
        let router = router();
        let event = click(json!({ "properties": { "STE_NAME21": "Queensland" } }));

        router.route(&event);
        assert_eq!(router.store().snapshot().active_region, Some(RegionCode::Qld));

        router.route(&event);
        assert_eq!(router.store().snapshot().active_region, None);
    }

    #[test]
    fn test_different_region_switches_directly() {
        let router = router();
        let recorder = Arc::new(Recorder::default());
        router.store().add_subscriber(recorder.clone());

        router.route(&InteractionEvent::RegionSelected { key: "QLD".into() });
        router.route(&InteractionEvent::RegionSelected { key: "Tasmania".into() });

        let seen = recorder.seen.lock();
        let regions: Vec<_> = seen.iter().map(|s| s.active_region).collect();
        assert_eq!(regions, vec![Some(RegionCode::Qld), Some(RegionCode::Tas)]);
    }

    #[test]
    fn test_button_and_map_spellings_toggle_the_same_region() {
        let router = router();
        router.route(&InteractionEvent::RegionSelected { key: "VIC".into() });
        router.route(&click(json!({ "properties": { "STE_NAME16": "Victoria" } })));
        assert_eq!(router.store().snapshot().active_region, None);
    }

    #[test]
    fn test_unresolvable_events_are_discarded() {
        let router = router();
        router.route(&InteractionEvent::GroupSelected { group: GroupFilter::Only(SpeciesGroup::Fish) });
        let before = router.store().snapshot();

        let outcome = router.route(&click(json!({ "properties": { "name": "Coral Sea" } })));
        assert_eq!(outcome, RouteOutcome::Discarded);

        let outcome = router.route(&InteractionEvent::RegionSelected { key: "qld".into() });
        assert_eq!(outcome, RouteOutcome::Discarded);
        assert_eq!(router.store().snapshot(), before);
    }

    #[test]
    fn test_group_selection_is_idempotent() {
        let router = router();
        let event = InteractionEvent::GroupSelected { group: GroupFilter::Only(SpeciesGroup::Mammals) };

        assert!(router.route(&event).changed());
        assert!(!router.route(&event).changed());
        assert_eq!(router.store().snapshot().active_group, GroupFilter::Only(SpeciesGroup::Mammals));
    }

    #[test]
    fn test_reset_all_is_idempotent() {
        let router = router();
        router.route(&InteractionEvent::GroupSelected { group: GroupFilter::Only(SpeciesGroup::Birds) });
        router.route(&InteractionEvent::RegionSelected { key: "NT".into() });

        router.route(&InteractionEvent::ResetAll);
        let once = router.store().snapshot();
        router.route(&InteractionEvent::ResetAll);
        let twice = router.store().snapshot();

        assert_eq!(once, Selection::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reset_is_observed_as_one_change() {
        let router = router();
        router.route(&InteractionEvent::GroupSelected { group: GroupFilter::Only(SpeciesGroup::Birds) });
        router.route(&InteractionEvent::RegionSelected { key: "NT".into() });

        let recorder = Arc::new(Recorder::default());
        router.store().add_subscriber(recorder.clone());
        router.route(&InteractionEvent::ResetAll);

        assert_eq!(*recorder.seen.lock(), vec![Selection::default()]);
    }
}
