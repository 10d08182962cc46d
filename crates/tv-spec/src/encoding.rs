//! Fixed visual vocabulary shared by all lenses

use tv_core::ConservationStatus;

use crate::spec::{ColorChannel, ColorScale, FieldType, PositionChannel, TooltipField};

/// Name of the summed count produced by every aggregation
pub const TOTAL_FIELD: &str = "total_count";

/// Status colours, in the order of [`ConservationStatus::ALL`]
pub const STATUS_PALETTE: [&str; 3] = ["#b30000", "#fc8d59", "#fcbf49"];

/// Default mark height in pixels
pub const CHART_HEIGHT: u32 = 320;

pub const CHOROPLETH_WIDTH: u32 = 600;
pub const CHOROPLETH_HEIGHT: u32 = 400;
pub const CHOROPLETH_STROKE: &str = "#4b6043";

/// Stroke width of the highlighted region on the choropleth
pub const HIGHLIGHT_STROKE_WIDTH: u32 = 3;

/// Status names in severity order
pub fn status_domain() -> Vec<String> {
    ConservationStatus::ALL.iter().map(|s| s.as_str().to_string()).collect()
}

/// Colour channel keyed on conservation status
pub fn status_color(title: Option<&str>, legend: bool) -> ColorChannel {
    ColorChannel {
        field: "status".to_string(),
        field_type: FieldType::Nominal,
        title: title.map(str::to_string),
        scale: ColorScale::Categorical {
            domain: status_domain(),
            range: STATUS_PALETTE.iter().map(|c| c.to_string()).collect(),
        },
        legend,
    }
}

pub fn nominal_axis(field: &str, title: &str) -> PositionChannel {
    PositionChannel {
        field: field.to_string(),
        field_type: FieldType::Nominal,
        title: title.to_string(),
        label_angle: Some(-45),
        sort: Vec::new(),
        stack: None,
        format: None,
    }
}

/// Y axis over the summed count
pub fn total_axis() -> PositionChannel {
    PositionChannel {
        field: TOTAL_FIELD.to_string(),
        field_type: FieldType::Quantitative,
        title: "Number of Species".to_string(),
        label_angle: None,
        sort: Vec::new(),
        stack: None,
        format: None,
    }
}

pub fn tooltip(field: &str, field_type: FieldType, title: &str) -> TooltipField {
    TooltipField {
        field: field.to_string(),
        field_type,
        title: title.to_string(),
        format: None,
    }
}

pub fn count_tooltip() -> TooltipField {
    tooltip(TOTAL_FIELD, FieldType::Quantitative, "Count")
}
