//! Configuration for the datasets and lenses of one dashboard

use std::path::Path;
use serde::{Serialize, Deserialize};
use tv_core::TabularKeyStyle;

use crate::DataError;

/// Encoding of the boundary file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryFormat {
    Topojson,
    Geojson,
}

/// Which boundary file revision is in use
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundaryConfig {
    /// URL the rendering engine loads the shapes from
    pub url: String,

    pub format: BoundaryFormat,

    /// TopoJSON object holding the features
    pub feature: Option<String>,

    /// Feature property carrying the region name in this revision
    pub name_property: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            url: "/australia.json".to_string(),
            format: BoundaryFormat::Topojson,
            feature: Some("STE_2016_AUST".to_string()),
            name_property: "STE_NAME16".to_string(),
        }
    }
}

impl BoundaryConfig {
    /// Field path of the region name on a boundary record
    pub fn name_field(&self) -> String {
        format!("properties.{}", self.name_property)
    }
}

/// Renderer backend requested from the rendering engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererBackend {
    Svg,
    Canvas,
}

/// Presentation options passed to the rendering engine with every lens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub show_export: bool,
    pub show_source: bool,
    pub show_editor: bool,
    pub renderer: RendererBackend,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_export: true,
            show_source: false,
            show_editor: false,
            renderer: RendererBackend::Svg,
        }
    }
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// URL of the tabular counts file
    pub tabular_url: String,

    pub boundary: BoundaryConfig,

    /// How the tabular file spells regions
    pub tabular_key_style: TabularKeyStyle,

    /// Upper bound of the choropleth colour scale.
    ///
    /// Fixed per deployment; not derived from the data.
    pub choropleth_domain_max: u32,

    pub render: RenderConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tabular_url: "/threatened_species.csv".to_string(),
            boundary: BoundaryConfig::default(),
            tabular_key_style: TabularKeyStyle::DisplayName,
            choropleth_domain_max: 800,
            render: RenderConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, DataError> {
        let config: DashboardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Reject settings no compiled spec could satisfy
    pub fn validate(&self) -> Result<(), DataError> {
        if self.boundary.name_property.is_empty() {
            return Err(DataError::Config("boundary.name_property must not be empty".to_string()));
        }
        if self.boundary.format == BoundaryFormat::Topojson && self.boundary.feature.is_none() {
            return Err(DataError::Config("topojson boundaries need boundary.feature".to_string()));
        }
        if self.choropleth_domain_max == 0 {
            return Err(DataError::Config("choropleth_domain_max must be positive".to_string()));
        }
        Ok(())
    }
}
