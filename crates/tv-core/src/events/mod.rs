use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::fmt;

use crate::selection::GroupFilter;

/// The independent views driven by the shared selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LensKind {
    /// Geographic choropleth of totals per region
    Choropleth,
    /// Totals per conservation status
    StatusBar,
    /// Normalized status composition per region
    StackedBar,
    /// Status totals per species group, side by side
    GroupedBar,
    /// Group × status grid coloured by total
    Treemap,
}

impl LensKind {
    pub const ALL: [LensKind; 5] = [
        LensKind::Choropleth,
        LensKind::StatusBar,
        LensKind::StackedBar,
        LensKind::GroupedBar,
        LensKind::Treemap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LensKind::Choropleth => "choropleth",
            LensKind::StatusBar => "status-bar",
            LensKind::StackedBar => "stacked-bar",
            LensKind::GroupedBar => "grouped-bar",
            LensKind::Treemap => "treemap",
        }
    }
}

impl fmt::Display for LensKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw interaction events, as produced by controls and mounted lenses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// The species-group dropdown changed (`"All"` resets)
    GroupSelected { group: GroupFilter },

    /// A region button was pressed
    RegionSelected { key: String },

    /// The rendering engine reported an activated mark; `datum` is forwarded
    /// untouched from the engine
    MarkActivated { lens: LensKind, datum: Value },

    /// The reset-all control was pressed
    ResetAll,
}

impl InteractionEvent {
    /// Short label for logging
    pub fn label(&self) -> &'static str {
        match self {
            InteractionEvent::GroupSelected { .. } => "group_selected",
            InteractionEvent::RegionSelected { .. } => "region_selected",
            InteractionEvent::MarkActivated { .. } => "mark_activated",
            InteractionEvent::ResetAll => "reset_all",
        }
    }
}
