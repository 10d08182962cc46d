//! Rendering engine abstraction
//!
//! The dashboard never draws anything itself. It hands a [`ChartSpec`] to a
//! [`RenderEngine`] and keeps the returned [`RenderHandle`] for updates,
//! interaction callbacks and teardown.

pub mod json_engine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tv_data::{RenderConfig, RendererBackend};
use tv_spec::ChartSpec;

pub use json_engine::JsonEngine;

/// Called with the raw datum of every mark the user activates
pub type InteractionCallback = Box<dyn Fn(Value) + Send + Sync>;

/// Errors reported by a rendering engine
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render engine error: {0}")]
    Engine(String),

    #[error("No mounted view in container '{0}'")]
    Detached(String),

    #[error("Spec serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-lens presentation options passed through to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub show_export: bool,
    pub show_source: bool,
    pub show_editor: bool,
    pub renderer: RendererBackend,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            show_export: config.show_export,
            show_source: config.show_source,
            show_editor: config.show_editor,
            renderer: config.renderer,
        }
    }
}

/// An external chart renderer
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Draw `spec` into `container` and return a handle to the mounted view
    async fn render(
        &self,
        container: &str,
        spec: &ChartSpec,
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderHandle>, RenderError>;
}

/// A view mounted by a [`RenderEngine`]
#[async_trait]
pub trait RenderHandle: Send + Sync {
    /// Register the callback for mark activations. Replaces any earlier one.
    fn on_interaction(&self, callback: InteractionCallback);

    /// Replace the drawn spec
    async fn update_specification(&self, spec: &ChartSpec) -> Result<(), RenderError>;

    /// Release the view. No callbacks fire afterwards.
    async fn unmount(&self);
}
