//! Text of the page around the lenses, derived from the selection

use parking_lot::RwLock;
use tv_core::{RegionCode, Selection, SelectionSubscriber, SpeciesGroup};

/// Heading of the insights section
pub fn insights_heading(selection: &Selection) -> String {
    match selection.active_region {
        Some(region) => format!("Conservation Snapshot: {}", region.display_name()),
        None => "Key Conservation Insights".to_string(),
    }
}

/// Caption under the status distribution lens
pub fn status_caption(selection: &Selection) -> String {
    match selection.active_region {
        Some(region) => format!("Conservation status distribution in {}", region.display_name()),
        None => "Conservation status distribution across Australia".to_string(),
    }
}

/// Whether the reset control is offered
pub fn show_reset(selection: &Selection) -> bool {
    selection.is_filtered()
}

/// Labels of the group dropdown, "All" first
pub fn group_options() -> Vec<&'static str> {
    std::iter::once("All")
        .chain(SpeciesGroup::ALL.iter().map(|group| group.as_str()))
        .collect()
}

/// Region buttons, by code
pub fn region_buttons() -> Vec<&'static str> {
    RegionCode::ALL.iter().map(|region| region.code()).collect()
}

pub fn region_narrative(region: RegionCode) -> &'static str {
    match region {
        RegionCode::Qld => {
            "Queensland hosts the highest number of threatened species in Australia, from tropical \
             rainforests to the Great Barrier Reef. Habitat clearing, climate change and coastal \
             development put these ecosystems under mounting pressure."
        }
        RegionCode::Nsw => {
            "New South Wales combines high species diversity with heavy pressure on coastal regions \
             and western woodlands. Urban expansion and agricultural intensification have fragmented \
             habitat for both terrestrial and marine species."
        }
        RegionCode::Wa => {
            "Western Australia holds many endemic species found nowhere else. Mining, introduced \
             predators such as foxes and cats, and shifting rainfall threaten its desert and \
             southwest forest ecosystems."
        }
        RegionCode::Vic => {
            "Victoria's agricultural landscape and dense urban centres have transformed much of its \
             original habitat. Grassland species and wetland fauna are particularly exposed, with many \
             listed as Vulnerable."
        }
        RegionCode::Tas => {
            "Tasmania's isolation has produced species assemblages that are highly sensitive to \
             change. Warming, invasive species and disease such as Devil facial tumour disease \
             compound the threats."
        }
        RegionCode::Sa => {
            "South Australia's arid and semi-arid environments support species adapted to harsh \
             conditions. Rising temperatures, prolonged drought and pastoral degradation threaten \
             these populations."
        }
        RegionCode::Nt => {
            "The Northern Territory's tropical and desert ecosystems face altered fire regimes, feral \
             herbivores and introduced predators. Indigenous land management supports monsoonal and \
             spinifex grassland species."
        }
        RegionCode::Act => {
            "The Australian Capital Territory keeps important habitat remnants inside an urban \
             landscape. Grassland birds and woodland mammals depend on careful management of the \
             urban edge."
        }
    }
}

/// Everything the page shows outside the lenses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellText {
    pub heading: String,
    pub caption: String,
    pub narrative: Option<&'static str>,
    pub show_reset: bool,
}

impl ShellText {
    pub fn for_selection(selection: &Selection) -> Self {
        Self {
            heading: insights_heading(selection),
            caption: status_caption(selection),
            narrative: selection.active_region.map(region_narrative),
            show_reset: show_reset(selection),
        }
    }
}

/// Keeps [`ShellText`] current by subscribing to the selection store
#[derive(Debug)]
pub struct PageShell {
    text: RwLock<ShellText>,
}

impl PageShell {
    pub fn new(selection: &Selection) -> Self {
        Self { text: RwLock::new(ShellText::for_selection(selection)) }
    }

    pub fn text(&self) -> ShellText {
        self.text.read().clone()
    }
}

impl SelectionSubscriber for PageShell {
    fn on_selection_change(&self, _previous: &Selection, current: &Selection) {
        *self.text.write() = ShellText::for_selection(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tv_core::{GroupFilter, SelectionStore, SelectionUpdate};

    #[test]
    fn test_unfiltered_text() {
        let text = ShellText::for_selection(&Selection::default());
        assert_eq!(text.heading, "Key Conservation Insights");
        assert_eq!(text.caption, "Conservation status distribution across Australia");
        assert_eq!(text.narrative, None);
        assert!(!text.show_reset);
    }

    #[test]
    fn test_reset_shown_for_group_only() {
        let selection = Selection { active_group: GroupFilter::Only(SpeciesGroup::Fish), active_region: None };
        assert!(show_reset(&selection));
        assert_eq!(insights_heading(&selection), "Key Conservation Insights");
    }

    #[test]
    fn test_every_region_has_a_narrative() {
        for region in RegionCode::ALL {
            assert!(region_narrative(region).contains(region.display_name().split(' ').last().unwrap()));
        }
    }

    #[test]
    fn test_controls() {
        assert_eq!(group_options(), vec!["All", "Mammals", "Birds", "Reptiles", "Amphibians", "Fish"]);
        assert_eq!(region_buttons(), vec!["NSW", "VIC", "QLD", "WA", "SA", "TAS", "NT", "ACT"]);
    }

    #[test]
    fn test_shell_follows_store() {
        let store = SelectionStore::new();
        let shell = Arc::new(PageShell::new(&store.snapshot()));
        store.add_subscriber(shell.clone());

        store.commit(SelectionUpdate::region(Some(RegionCode::Sa)));
        let text = shell.text();
        assert_eq!(text.heading, "Conservation Snapshot: South Australia");
        assert_eq!(text.caption, "Conservation status distribution in South Australia");
        assert!(text.narrative.is_some());
        assert!(text.show_reset);
    }
}
