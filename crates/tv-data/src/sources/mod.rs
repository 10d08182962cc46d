//! Local loaders for the two static datasets

pub mod boundary_source;
pub mod tabular_source;

pub use boundary_source::BoundaryDataset;
pub use tabular_source::{TabularDataset, TabularRow};
