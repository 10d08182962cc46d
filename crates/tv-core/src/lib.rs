//! Core functionality for the threatened-species dashboard
//!
//! This crate holds the shared selection state, region key resolution and the
//! interaction router that is the selection's only writer.

pub mod events;
pub mod region;
pub mod router;
pub mod selection;

use thiserror::Error;

// Re-export commonly used types
pub use events::{InteractionEvent, LensKind};
pub use region::{RegionCode, RegionResolver, TabularKeyStyle};
pub use router::{InteractionRouter, RouteOutcome};
pub use selection::{
    ConservationStatus, GroupFilter, Selection, SelectionStore, SelectionSubscriber,
    SelectionUpdate, SpeciesGroup,
};

/// Errors raised at the boundary where raw control values enter the core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown species group: {0}")]
    UnknownGroup(String),
}
