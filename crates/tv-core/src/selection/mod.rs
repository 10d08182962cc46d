use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::region::RegionCode;
use crate::CoreError;

mod store;
mod subscriber;

pub use store::SelectionStore;
pub use subscriber::SelectionSubscriber;

/// Coarse taxonomic categories used as a filter axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeciesGroup {
    Mammals,
    Birds,
    Reptiles,
    Amphibians,
    Fish,
}

impl SpeciesGroup {
    /// All groups in dropdown order
    pub const ALL: [SpeciesGroup; 5] = [
        SpeciesGroup::Mammals,
        SpeciesGroup::Birds,
        SpeciesGroup::Reptiles,
        SpeciesGroup::Amphibians,
        SpeciesGroup::Fish,
    ];

    /// Spelling used in the tabular dataset's group column
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeciesGroup::Mammals => "Mammals",
            SpeciesGroup::Birds => "Birds",
            SpeciesGroup::Reptiles => "Reptiles",
            SpeciesGroup::Amphibians => "Amphibians",
            SpeciesGroup::Fish => "Fish",
        }
    }
}

impl fmt::Display for SpeciesGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The group axis of a selection: either no filter or exactly one group.
///
/// Serialized as the raw control value (`"All"`, `"Mammals"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroupFilter {
    #[default]
    All,
    Only(SpeciesGroup),
}

impl GroupFilter {
    /// The selected group, if any
    pub fn group(&self) -> Option<SpeciesGroup> {
        match self {
            GroupFilter::All => None,
            GroupFilter::Only(group) => Some(*group),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, GroupFilter::All)
    }
}

impl FromStr for GroupFilter {
    type Err = CoreError;

    /// Parses a raw control value. `"All"` is the reset sentinel.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(GroupFilter::All);
        }
        SpeciesGroup::ALL
            .iter()
            .find(|group| group.as_str() == s)
            .map(|group| GroupFilter::Only(*group))
            .ok_or_else(|| CoreError::UnknownGroup(s.to_string()))
    }
}

impl TryFrom<String> for GroupFilter {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupFilter> for String {
    fn from(filter: GroupFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupFilter::All => f.write_str("All"),
            GroupFilter::Only(group) => fmt::Display::fmt(group, f),
        }
    }
}

/// Ordered conservation severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConservationStatus {
    #[serde(rename = "Critically Endangered")]
    CriticallyEndangered,
    Endangered,
    Vulnerable,
}

impl ConservationStatus {
    pub const ALL: [ConservationStatus; 3] = [
        ConservationStatus::CriticallyEndangered,
        ConservationStatus::Endangered,
        ConservationStatus::Vulnerable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConservationStatus::CriticallyEndangered => "Critically Endangered",
            ConservationStatus::Endangered => "Endangered",
            ConservationStatus::Vulnerable => "Vulnerable",
        }
    }
}

/// Immutable snapshot of what is currently filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    pub active_group: GroupFilter,
    pub active_region: Option<RegionCode>,
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionUpdate {
    pub group: Option<GroupFilter>,
    pub region: Option<Option<RegionCode>>,
}

impl SelectionUpdate {
    pub fn group(group: GroupFilter) -> Self {
        Self { group: Some(group), region: None }
    }

    pub fn region(region: Option<RegionCode>) -> Self {
        Self { group: None, region: Some(region) }
    }

    /// Clears both axes in one update
    pub fn reset() -> Self {
        Self {
            group: Some(GroupFilter::All),
            region: Some(None),
        }
    }
}

impl Selection {
    /// Returns the selection with `update` applied. The receiver is left as is.
    pub fn apply(&self, update: SelectionUpdate) -> Selection {
        Selection {
            active_group: update.group.unwrap_or(self.active_group),
            active_region: update.region.unwrap_or(self.active_region),
        }
    }

    /// Whether any filter is active
    pub fn is_filtered(&self) -> bool {
        !self.active_group.is_all() || self.active_region.is_some()
    }
}
