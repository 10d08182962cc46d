//! Mounted lenses and the dashboard that coordinates them
//!
//! A [`Dashboard`] owns the selection, the event queue and one
//! [`LensMountAdapter`] per mounted lens. Every event is routed, committed and
//! then synced to each adapter before the next one is taken off the queue.

pub mod adapter;
pub mod dashboard;
pub mod queue;
pub mod shell;

#[cfg(test)]
mod test_engine;

use thiserror::Error;
use tv_data::DataError;
use tv_render::RenderError;

pub use adapter::{LensId, LensMountAdapter, SyncOutcome};
pub use dashboard::Dashboard;
pub use queue::{event_queue, EventQueue, EventSink};
pub use shell::PageShell;

/// Errors surfaced by mounted lenses
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Render failed for {lens}: {source}")]
    Render {
        lens: tv_core::LensKind,
        #[source]
        source: RenderError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] DataError),

    #[error("Lens {0} is already mounted")]
    AlreadyMounted(tv_core::LensKind),
}
